//! The accept loop run on the server's background runtime.

use crate::dispatch::Dispatcher;
use crate::rpc::handle_rpc_request;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// Accept connections until `shutdown_rx` fires (or its sender is dropped),
/// then wait up to `drain` for open connections to finish.
pub(crate) async fn serve(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    mut shutdown_rx: oneshot::Receiver<()>,
    drain: Duration,
) {
    let graceful = GracefulShutdown::new();
    let port = listener.local_addr().map(|addr| addr.port()).unwrap_or(0);

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        let dispatcher = Arc::clone(&dispatcher);
                        let io = TokioIo::new(stream);
                        let service = service_fn(move |req| {
                            let dispatcher = Arc::clone(&dispatcher);
                            async move { handle_rpc_request(req, dispatcher).await }
                        });
                        let conn = graceful.watch(http1::Builder::new().serve_connection(io, service));
                        tokio::spawn(async move {
                            if let Err(e) = conn.await {
                                debug!("Connection error from {}: {}", peer, e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Accept error on port {}: {}", port, e);
                    }
                }
            }
            _ = &mut shutdown_rx => {
                info!("Listener on port {} shutting down", port);
                break;
            }
        }
    }

    drop(listener);

    tokio::select! {
        _ = graceful.shutdown() => {
            debug!("All connections on port {} closed", port);
        }
        _ = tokio::time::sleep(drain) => {
            warn!("Timed out after {:?} waiting for connections on port {} to close", drain, port);
        }
    }
}
