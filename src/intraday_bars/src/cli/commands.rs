use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::providers::ProviderKind;

#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the config file (intraday_bars.toml). Defaults plus env vars when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// What to fetch; shared by `fetch` and `chart`.
#[derive(Args, Debug, Clone)]
pub struct BarsArgs {
    /// Data source: bc, av, iex or ib. The first available preference when omitted.
    #[arg(short, long)]
    pub provider: Option<ProviderKind>,

    /// Ticker symbol (e.g. "SQ")
    #[arg(short, long)]
    pub symbol: String,

    /// Window start, exchange-local (e.g. "2019-01-17 09:30")
    #[arg(long)]
    pub start: Option<String>,

    /// Window end, exchange-local (e.g. "2019-01-17 16:00")
    #[arg(short, long)]
    pub end: Option<String>,

    /// Candle length: minutes (5) or a provider token ("5min", "1 hour", "d")
    #[arg(short, long)]
    pub interval: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch bars and print them
    Fetch {
        #[command(flatten)]
        bars: BarsArgs,

        /// Print the table as JSON instead of columns
        #[arg(long)]
        json: bool,
    },

    /// Fetch bars and render a candlestick chart
    Chart {
        #[command(flatten)]
        bars: BarsArgs,

        /// Trade number used in the generated file name
        #[arg(long, default_value = "1")]
        trade_num: u32,

        /// Output path; generated from the [chart] config section when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Widen the window around start/end by some context, within market hours
        #[arg(long)]
        pad: bool,
    },

    /// Print each provider's published usage limits
    Limits,
}
