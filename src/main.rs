use std::sync::Arc;

use hxlayout::config::Config;
use hxlayout::server::{self, ConnectionLimits};
use hxlayout::{demo, logger, ServerError};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args().nth(1);
    let cfg = match config_path.as_deref() {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .map_err(ServerError::from)?;
    logger::init(&cfg).map_err(ServerError::from)?;
    logger::log_info(&format!(
        "Configuration loaded from {}",
        config_path.as_deref().unwrap_or(hxlayout::config::DEFAULT_CONFIG_PATH)
    ));

    // Worker count from config, CPU cores otherwise
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))?;
    Ok(())
}

async fn async_main(cfg: Config) -> Result<(), ServerError> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr)?;
    let app = Arc::new(demo::build_app(cfg.app_settings()));

    logger::log_server_start(&addr, &cfg);
    server::run(listener, app, ConnectionLimits::from_config(&cfg)).await;
    Ok(())
}
