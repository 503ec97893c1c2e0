use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "bucketmove")]
#[command(about = "Move every object from one bucket to another, with an audit trail")]
#[command(
    after_help = "Settings come from --config, then SRC_*/DST_*/MYSQL_DSN environment variables, then flags."
)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Source bucket (overrides config and SRC_BUCKET)
    #[arg(long, value_name = "BUCKET")]
    pub source_bucket: Option<String>,
    /// Destination bucket (overrides config and DST_BUCKET)
    #[arg(long, value_name = "BUCKET")]
    pub dest_bucket: Option<String>,
    /// Only move keys starting with this prefix
    #[arg(long)]
    pub prefix: Option<String>,
    /// Directory for the summary report
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<PathBuf>,
    /// Log per-object progress
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
