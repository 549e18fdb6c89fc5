use clap::Parser;
use std::path::PathBuf;

/// Replay a danmaku comment file through the overlay scheduler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Comment payload (JSON array, bucket map or `data` envelope)
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Playback position to start from, in seconds
    #[arg(long = "from", value_name = "SECS", default_value_t = 0.0)]
    pub from_secs: f64,

    /// Playback position to stop at, in seconds (default: last comment)
    #[arg(long = "to", value_name = "SECS")]
    pub to_secs: Option<f64>,

    /// Interval between position updates
    #[arg(long = "tick-ms", value_name = "MS", default_value_t = 500)]
    pub tick_ms: u64,

    /// Width of the virtual surface
    #[arg(long, value_name = "PX", default_value_t = 1920.0)]
    pub width: f32,

    /// Height of the virtual surface
    #[arg(long, value_name = "PX", default_value_t = 1080.0)]
    pub height: f32,

    /// Scheduler configuration (JSON, missing keys use defaults)
    #[arg(short = 'c', long = "config", value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Keep only the first comment for each text
    #[arg(long = "unique-texts")]
    pub unique_texts: bool,

    /// Keep at most N comments per playback minute
    #[arg(long = "max-per-minute", value_name = "N")]
    pub max_per_minute: Option<usize>,

    /// Keep at most N comments overall
    #[arg(long = "max-total", value_name = "N")]
    pub max_total: Option<usize>,

    /// Print final statistics as JSON
    #[arg(long = "json-stats")]
    pub json_stats: bool,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}
