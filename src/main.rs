use clap::Parser;
use epoch::TransportKind;
use epoch::core::config::{self, CliOverrides, EpochConfig};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;

#[derive(Parser)]
#[command(name = "epoch", about = "Terminal chat client for financial insights")]
struct Args {
    /// Transport used to reach the insight service
    #[arg(short, long, value_enum)]
    transport: Option<TransportKind>,

    /// Endpoint for the selected transport
    #[arg(short, long)]
    url: Option<String>,

    /// User id sent with every query
    #[arg(long)]
    user_id: Option<String>,

    /// Log level written to epoch.log
    #[arg(long, default_value = "debug")]
    log_level: LevelFilter,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to epoch.log in current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    if let Ok(log_file) = File::create("epoch.log") {
        let _ = WriteLogger::init(args.log_level, log_config, log_file);
    }

    let file_config = config::load_config().unwrap_or_else(|e| {
        log::warn!("Using default configuration: {}", e);
        EpochConfig::default()
    });
    let resolved = config::resolve(
        &file_config,
        CliOverrides {
            transport: args.transport,
            url: args.url.as_deref(),
            user_id: args.user_id.as_deref(),
        },
    );

    log::info!(
        "Epoch starting up with {:?} transport to {}",
        resolved.transport,
        resolved.endpoint()
    );

    epoch::tui::run(resolved)
}
