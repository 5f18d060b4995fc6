use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::{config::ChartConfig, providers::ProviderKind};

/// The fixed parts of a chart file name.
#[derive(Debug, Clone)]
pub struct ChartNaming {
    pub out_dir: PathBuf,
    pub base: String,
    pub extension: String,
    pub time_format: String,
    pub api: ProviderKind,
}

impl ChartNaming {
    pub fn new(config: &ChartConfig, api: ProviderKind) -> Self {
        Self {
            out_dir: PathBuf::from(&config.out_dir),
            base: config.base.clone(),
            extension: config.extension.clone(),
            time_format: config.time_format.clone(),
            api,
        }
    }
}

/// `{out_dir}/{base}{trade_num:02}_{symbol}_{begin}_{end}_{api}{extension}`,
/// with `begin` and `end` in `time_format`.
pub fn chart_file_name(
    naming: &ChartNaming,
    trade_num: u32,
    symbol: &str,
    begin: NaiveDateTime,
    end: NaiveDateTime,
) -> PathBuf {
    let name = format!(
        "{}{trade_num:02}_{symbol}_{}_{}_{}{}",
        naming.base,
        begin.format(&naming.time_format),
        end.format(&naming.time_format),
        naming.api,
        naming.extension,
    );
    naming.out_dir.join(name)
}
