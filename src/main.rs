//! cutelog - live viewer for Python logging over TCP
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::Parser;

use cutelog::Overrides;
use cutelog_app::SerializationFormat;

/// cutelog - receive and filter log records sent over TCP
#[derive(Parser, Debug)]
#[command(name = "cutelog")]
#[command(about = "Receive, filter and inspect log records sent over TCP", long_about = None)]
struct Args {
    /// Records files to load into tabs at startup
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Address to listen on
    #[arg(long, value_name = "HOST")]
    listen_host: Option<String>,

    /// Port to listen on (0 picks a free one)
    #[arg(long, value_name = "PORT")]
    listen_port: Option<u16>,

    /// Start a synthetic record source alongside the server
    #[arg(long)]
    benchmark: bool,

    /// Seconds between synthetic records
    #[arg(long, value_name = "SECONDS")]
    benchmark_interval: Option<f64>,

    /// Format new connections start in (pickle, json, msgpack, cbor)
    #[arg(long, value_name = "FORMAT")]
    default_serialization_format: Option<SerializationFormat>,

    /// Route every connection into one tab
    #[arg(long)]
    single_tab_mode: bool,

    /// Mirror internal diagnostics to stderr at this level (10 debug .. 50 critical)
    #[arg(long, value_name = "LEVEL")]
    console_logging_level: Option<u32>,

    /// Directory holding config.toml and presets.toml
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            listen_host: self.listen_host.clone(),
            listen_port: self.listen_port,
            benchmark: self.benchmark,
            benchmark_interval: self.benchmark_interval,
            default_serialization_format: self.default_serialization_format,
            single_tab_mode: self.single_tab_mode,
            console_logging_level: self.console_logging_level,
        }
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let overrides = args.overrides();
    cutelog::run(overrides, args.config_dir, args.files).await?;
    Ok(())
}
