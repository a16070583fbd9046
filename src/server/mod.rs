// Server module entry
// Accept loop, per-connection serving and listener setup

pub mod connection;
pub mod listener;

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::app::App;
use crate::logger;

pub use connection::{accept_connection, ConnectionLimits};
pub use listener::create_listener;

/// Accept connections until Ctrl-C
///
/// In-flight connections keep running in their own tasks after the loop
/// stops accepting.
pub async fn run(listener: TcpListener, app: Arc<App>, limits: ConnectionLimits) {
    let active_connections = Arc::new(AtomicUsize::new(0));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &app, &active_connections, &limits);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            signal = &mut shutdown => {
                if let Err(e) = signal {
                    logger::log_error(&format!("Failed to listen for shutdown signal: {e}"));
                }
                logger::log_server_stop();
                break;
            }
        }
    }
}
