use std::{error::Error, fmt::Write};

use crate::models::{
    bar_table::BarTable,
    interval::IntervalRequest,
    request_params::BarsRequest,
    window::Window,
};

use super::commands::BarsArgs;

/// Plain integers are minute counts; everything else goes to the provider's
/// vocabulary as typed.
pub fn parse_interval(raw: &str) -> IntervalRequest {
    let raw = raw.trim();
    match raw.parse::<i64>() {
        Ok(minutes) => IntervalRequest::Minutes(minutes),
        Err(_) => IntervalRequest::Text(raw.to_string()),
    }
}

pub fn bars_request(args: &BarsArgs) -> Result<BarsRequest, Box<dyn Error>> {
    let window = Window::parse(args.start.as_deref(), args.end.as_deref())?;
    let mut request = BarsRequest::new(&args.symbol).with_window(window);
    if let Some(interval) = &args.interval {
        request = request.with_interval(parse_interval(interval));
    }
    Ok(request)
}

/// One bar per line, aligned columns.
pub fn format_table(table: &BarTable) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<19}  {:>10}  {:>10}  {:>10}  {:>10}  {:>12}",
        "timestamp", "open", "high", "low", "close", "volume"
    );
    for bar in table {
        let _ = writeln!(
            out,
            "{:<19}  {:>10.4}  {:>10.4}  {:>10.4}  {:>10.4}  {:>12}",
            bar.timestamp.format("%Y-%m-%d %H:%M:%S"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume
        );
    }
    out
}
