pub mod commands;
pub mod params;

use std::error::Error;

use tracing::{info, warn};

use crate::{
    chart::{ChartNaming, ChartOptions, chart_file_name, chart_time_frame, render_candlestick},
    config::Config,
    models::window::Window,
    providers::{BarProvider, ProviderKind, build_provider, first_available},
    session::Session,
    status::FetchOutcome,
};

use commands::{Cli, Commands};
use params::{bars_request, format_table};

pub async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::from_env()?,
    };
    let session = Session::new().with_time_zone(config.exchange_tz()?);

    match cli.command {
        Commands::Fetch { bars, json } => {
            let provider = select_provider(bars.provider, &config, &session).await?;
            let request = bars_request(&bars)?;
            let outcome = FetchOutcome::from(provider.fetch_bars(&session, &request).await);
            let FetchOutcome::Bars { table, warnings } = outcome else {
                return Err(outcome.to_string().into());
            };
            for warning in &warnings {
                eprintln!("WARNING: {warning}");
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&table)?);
            } else {
                print!("{}", format_table(&table));
            }
        }

        Commands::Chart {
            bars,
            trade_num,
            out,
            pad,
        } => {
            let provider = select_provider(bars.provider, &config, &session).await?;
            let mut request = bars_request(&bars)?;
            if pad {
                let resolved = request.resolve(session.local_now(), provider.vocabulary());
                let (begin, end) =
                    chart_time_frame(resolved.start, resolved.end, resolved.interval.minutes());
                request = request.with_window(Window::between(begin, end));
            }

            let outcome = FetchOutcome::from(provider.fetch_bars(&session, &request).await);
            let FetchOutcome::Bars { table, warnings } = outcome else {
                return Err(outcome.to_string().into());
            };
            for warning in &warnings {
                warn!("{warning}");
            }

            let path = match (out, table.first_timestamp(), table.last_timestamp()) {
                (Some(path), _, _) => path,
                (None, Some(begin), Some(end)) => chart_file_name(
                    &ChartNaming::new(&config.chart, provider.kind()),
                    trade_num,
                    table.symbol(),
                    begin,
                    end,
                ),
                (None, _, _) => return Err("no bars to name the chart after".into()),
            };
            let options = ChartOptions::from_config(&config.chart)
                .with_title(format!("{} {} ({})", table.symbol(), table.interval(), provider.kind()));
            render_candlestick(&table, &options, &path)?;
            info!(path = %path.display(), "chart written");
            println!("{}", path.display());
        }

        Commands::Limits => {
            for kind in ProviderKind::ALL {
                println!("{:<4} {:<20} {}", kind.code(), kind.name(), kind.limits());
            }
        }
    }
    Ok(())
}

async fn select_provider(
    kind: Option<ProviderKind>,
    config: &Config,
    session: &Session,
) -> Result<Box<dyn BarProvider>, Box<dyn Error>> {
    match kind {
        Some(kind) => Ok(build_provider(kind, config)?),
        None => first_available(config, session)
            .await
            .ok_or_else(|| "no provider available; check credentials and preferences".into()),
    }
}
