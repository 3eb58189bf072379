use static_server::config::Config;
use static_server::logger::{self, AccessLogger};
use static_server::server::signal;
use static_server::{ServerConfig, StaticServer};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg.logging)?;

    // Create Tokio runtime, worker count from configuration
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers.max(1));
        tracing::info!("Using {workers} worker threads");
    } else {
        tracing::info!("Using default worker threads (CPU cores)");
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let server_config = ServerConfig::from_config(&cfg)?;

    let mut server = StaticServer::new(server_config.clone());
    if let Some(access_logger) = AccessLogger::from_config(&cfg.logging, &server_config.root) {
        server = server.with_listener(access_logger);
    }

    let running = match server.start().await {
        Ok(running) => running,
        Err(e) if e.is_addr_in_use() => {
            tracing::error!("{e}: the port is already in use, pick another one");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    let addr = running.local_addr();
    logger::log_server_start(&addr, &server_config);
    tracing::info!("Press Ctrl+C to shutdown");

    let signal_name = signal::wait_for_shutdown().await;
    tracing::info!("{signal_name} received, shutting down");

    running.stop().await;
    logger::log_server_stop(&addr);
    Ok(())
}
