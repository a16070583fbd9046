// Connection module
// Accepts a single TCP connection and serves it with the app

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;

use crate::app::App;
use crate::config::Config;
use crate::logger;

/// Per-connection limits taken from configuration
#[derive(Debug, Clone)]
pub struct ConnectionLimits {
    pub max_connections: Option<u64>,
    pub keep_alive: bool,
    pub timeout: Duration,
    pub log_connections: bool,
}

impl ConnectionLimits {
    pub fn from_config(config: &Config) -> Self {
        let perf = &config.performance;
        Self {
            max_connections: perf.max_connections,
            keep_alive: perf.keep_alive_timeout > 0,
            timeout: Duration::from_secs(std::cmp::max(perf.read_timeout, perf.write_timeout)),
            log_connections: config.logging.access_log,
        }
    }

    /// Whether one more connection fits, given the count before this one
    pub fn admits(&self, prev_count: usize) -> bool {
        self.max_connections
            .map_or(true, |max| prev_count < usize::try_from(max).unwrap_or(usize::MAX))
    }
}

/// Accept a connection, checking limits and logging.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `app` - Shared route table
/// * `conn_counter` - Active connection counter
/// * `limits` - Connection limits and timeouts
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    app: &Arc<App>,
    conn_counter: &Arc<AtomicUsize>,
    limits: &ConnectionLimits,
) {
    // Increment counter first, then check limit
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);
    if !limits.admits(prev_count) {
        conn_counter.fetch_sub(1, Ordering::SeqCst);
        logger::log_warning(&format!(
            "Max connections reached: {prev_count}/{}. Connection rejected.",
            limits.max_connections.unwrap_or_default()
        ));
        drop(stream);
        return;
    }

    if limits.log_connections {
        logger::log_connection_accepted(&peer_addr);
    }

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(app),
        Arc::clone(conn_counter),
        limits.clone(),
    );
}

/// Serve a single connection in a spawned task.
///
/// Applies the connection timeout and decrements the connection counter
/// when the connection ends.
fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    app: Arc<App>,
    conn_counter: Arc<AtomicUsize>,
    limits: ConnectionLimits,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let mut builder = http1::Builder::new();
        builder.keep_alive(limits.keep_alive);

        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let app = Arc::clone(&app);
                async move { Ok::<_, Infallible>(app.handle(req, Some(peer_addr)).await) }
            }),
        );

        match tokio::time::timeout(limits.timeout, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {} seconds",
                    limits.timeout.as_secs()
                ));
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
