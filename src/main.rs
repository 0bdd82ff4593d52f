use clap::Parser;
use log::{error, info};
use std::path::Path;

use pcapctl::capture::supervisor::Supervisor;
use pcapctl::configuration::config::CaptureConfig;
use pcapctl::web_interface::web_server::WebServer;

#[derive(Parser)]
#[command(name = "pcapctl")]
#[command(version = "0.1.0")]
#[command(about = "An HTTP-controlled packet capture daemon")]
struct Args {
    config_file: String,
}

#[tokio::main]
async fn main() {
    // Example how to log
    // https://docs.rs/env_logger/latest/env_logger/
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .init();

    println!(
        "
==============================================================================
                pcapctl - HTTP controlled packet capture v0.1.0
==============================================================================
"
    );

    info!("Importing configuration");

    // Get command-line arguments
    let args = Args::parse();

    let config = CaptureConfig::from_file(Path::new(args.config_file.as_str())).unwrap_or_else(|e| {
        error!("Unable to import configuration from file: {:?}", e);
        std::process::exit(1);
    });

    info!("Configuration imported successfully: {:?}", config);

    let (supervisor, control) = Supervisor::new(config.clone());

    tokio::spawn(async move {
        info!("Spawning the capture supervisor");
        if let Err(e) = supervisor.run().await {
            error!("Capture supervisor failed: {}, exiting...", e);
            std::process::exit(1);
        }
    });

    let server = WebServer::new(control, config.out_dir.clone());
    info!("Serving capture API on port {}", config.http_port);
    server.start(config.http_port).await;
}
