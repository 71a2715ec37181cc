//! slotwatch server
//!
//! Runs the availability monitor in the background and serves the
//! registration and admin HTTP endpoints.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use slotwatch::control::{AdminCredential, ControlSurface};
use slotwatch::http::{build_router, AppState};
use slotwatch::logging::init_logging;
use slotwatch::monitor::{Monitor, SystemState};
use slotwatch::notify::{Dispatcher, TwilioSender};
use slotwatch::probe::HttpPageSource;
use slotwatch::storage::{open_json_stores, DeliveryStore, JsonFileStores, RecipientStore};
use slotwatch::{Config, SlotwatchError};

/// Command-line overrides applied on top of the environment.
#[derive(Default)]
struct Args {
    port: Option<u16>,
    data_dir: Option<PathBuf>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" | "-p" => {
                if i + 1 < args.len() {
                    let port: u16 = args[i + 1].parse().unwrap_or_else(|_| {
                        eprintln!("error: invalid port number: {}", args[i + 1]);
                        std::process::exit(1);
                    });
                    parsed.port = Some(port);
                    i += 2;
                } else {
                    eprintln!("error: --port requires a value");
                    std::process::exit(1);
                }
            }
            "--data-dir" | "-d" => {
                if i + 1 < args.len() {
                    parsed.data_dir = Some(PathBuf::from(&args[i + 1]));
                    i += 2;
                } else {
                    eprintln!("error: --data-dir requires a value");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                println!("slotwatch-server - appointment availability watcher");
                println!();
                println!("USAGE:");
                println!("    slotwatch-server [OPTIONS]");
                println!();
                println!("OPTIONS:");
                println!("    -p, --port <PORT>         Port to listen on [env: PORT, default: 5000]");
                println!("    -d, --data-dir <DIR>      Directory of usuarios.json and historial.json [env: SLOTWATCH_DATA_DIR, default: .]");
                println!("    -h, --help                Print help information");
                println!();
                println!("Remaining settings are read from the environment (and a .env file).");
                std::process::exit(0);
            }
            arg => {
                eprintln!("error: unknown argument: {arg}");
                std::process::exit(1);
            }
        }
    }

    parsed
}

#[tokio::main]
async fn main() -> Result<(), SlotwatchError> {
    let args = parse_args();
    let _ = dotenvy::dotenv();

    let mut config = Config::from_env()?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }

    init_logging(config.log_json)?;
    info!(version = env!("CARGO_PKG_VERSION"), ?config, "starting slotwatch");

    let JsonFileStores {
        recipients,
        deliveries,
    } = open_json_stores(&config.data_dir)?;
    let recipients: Arc<dyn RecipientStore> = Arc::new(recipients);
    let deliveries: Arc<dyn DeliveryStore> = Arc::new(deliveries);

    if !config.twilio.is_configured() {
        warn!("Twilio credentials missing; every send will fail until they are set");
    }
    let sender = Arc::new(TwilioSender::new(config.twilio.clone(), config.fetch_timeout)?);
    let dispatcher = Arc::new(Dispatcher::new(
        sender,
        Arc::clone(&deliveries),
        config.alert_message.clone(),
    ));

    let state = Arc::new(SystemState::new(config.start_paused, config.start_simulation));
    let source = Arc::new(HttpPageSource::new(config.target_url.clone(), config.fetch_timeout)?);
    let monitor = Monitor::new(
        Arc::clone(&state),
        source,
        Arc::clone(&recipients),
        Arc::clone(&dispatcher),
    );
    let _monitor_task = monitor.spawn(config.poll_interval);

    let credential = AdminCredential::new(config.admin_key.as_deref());
    if !credential.is_configured() {
        warn!("SLOTWATCH_ADMIN_KEY is not set; admin endpoints will reject every request");
    }
    let app_state = AppState::new(
        ControlSurface::new(state),
        credential,
        recipients,
        deliveries,
        dispatcher,
    )
    .with_test_recipient(config.test_recipient.clone());

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, build_router(app_state))
        .with_graceful_shutdown(async {
            let _ = signal::ctrl_c().await;
        })
        .await?;

    info!("shut down");
    Ok(())
}
