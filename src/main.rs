//! Binary entrypoint for the aprsbbs CLI.
//!
//! Commands:
//! - `start [--callsign <CALL>] [--server <host>] [--port <n>] [--filter <f>] [--passcode <n>] [--ipv4]`
//!   - connect to APRS-IS and run the BBS
//! - `init` - write a starter `config.toml`
//! - `passcode <CALL>` - print the APRS-IS passcode for a callsign
//!
//! See the library crate docs for module-level details: `aprsbbs::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};

use aprsbbs::aprs::passcode;
use aprsbbs::bbs::BbsServer;
use aprsbbs::config::Config;

#[derive(Parser)]
#[command(name = "aprsbbs")]
#[command(about = "A Bulletin Board System for the APRS-IS network")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to APRS-IS and run the BBS
    Start {
        /// Station callsign (base or with SSID); overrides the config file
        #[arg(long)]
        callsign: Option<String>,

        /// APRS-IS server host
        #[arg(long)]
        server: Option<String>,

        /// APRS-IS server port
        #[arg(long)]
        port: Option<u16>,

        /// Server-side filter; defaults to messages for the callsign
        #[arg(long)]
        filter: Option<String>,

        /// APRS-IS passcode; derived from the base callsign when omitted
        #[arg(long, env = "APRS_PASSCODE")]
        passcode: Option<u32>,

        /// Only use IPv4 addresses for the server
        #[arg(long)]
        ipv4: bool,
    },
    /// Write a default configuration file
    Init,
    /// Print the APRS-IS passcode for a callsign
    Passcode {
        /// Callsign (any SSID is ignored)
        callsign: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Start {
            callsign,
            server,
            port,
            filter,
            passcode,
            ipv4,
        } => {
            let mut config = match pre_config {
                Some(cfg) => cfg,
                None if callsign.is_some() => {
                    warn!(
                        "No usable config at {}; using defaults with command-line overrides",
                        cli.config
                    );
                    Config::default()
                }
                None => Config::load(&cli.config).await?,
            };
            if let Some(callsign) = callsign {
                config.bbs.callsign = callsign;
            }
            if let Some(server) = server {
                config.aprs_is.server = server;
            }
            if let Some(port) = port {
                config.aprs_is.port = port;
            }
            if filter.is_some() {
                config.bbs.filter = filter;
            }
            if passcode.is_some() {
                config.aprs_is.passcode = passcode;
            }
            if ipv4 {
                config.aprs_is.ipv4_only = true;
            }

            info!("Starting aprsbbs v{}", env!("CARGO_PKG_VERSION"));
            let mut bbs = BbsServer::new(config)?;
            bbs.connect().await?;
            bbs.run().await?;
            info!("Shutting down BBS");
        }
        Commands::Init => {
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Passcode { callsign } => {
            println!("{}", passcode::generate(&callsign));
        }
    }

    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse::<log::LevelFilter>().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Foreground runs also echo to the console
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
