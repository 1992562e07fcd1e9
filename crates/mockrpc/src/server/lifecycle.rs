use super::listener::serve;
use super::network::bind_reusable_listener;
use crate::config::ListenConfig;
use crate::dispatch::Dispatcher;
use crate::error::SetupError;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::oneshot;
use tracing::{error, info};

/// Lifecycle state of a [`MockServer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServerState::Stopped => "stopped",
            ServerState::Starting => "starting",
            ServerState::Running => "running",
            ServerState::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

struct RunningListener {
    addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    thread: JoinHandle<()>,
}

/// A mock endpoint serving a frozen [`Dispatcher`] from a background thread.
///
/// `start` returns once the listener accepts connections and `stop` returns
/// once the port is released, so tests can restart a server back to back.
pub struct MockServer {
    dispatcher: Arc<Dispatcher>,
    listen: ListenConfig,
    /// Port to bind on the next start; filled in after the first ephemeral bind
    port: Option<u16>,
    state: ServerState,
    running: Option<RunningListener>,
}

impl MockServer {
    pub fn new(dispatcher: Dispatcher, listen: ListenConfig) -> Self {
        let port = listen.port;
        Self {
            dispatcher: Arc::new(dispatcher),
            listen,
            port,
            state: ServerState::Stopped,
            running: None,
        }
    }

    /// Bind and start serving. Blocks until the accept loop owns the listener.
    pub fn start(&mut self) -> Result<SocketAddr, SetupError> {
        if let Some(running) = &self.running {
            return Err(SetupError::AlreadyRunning(running.addr));
        }
        self.listen.validate()?;

        self.state = ServerState::Starting;
        match self.spawn_listener() {
            Ok(running) => {
                let addr = running.addr;
                self.port = Some(addr.port());
                self.running = Some(running);
                self.state = ServerState::Running;
                info!(
                    "mockrpc listening on {} ({} actions)",
                    addr,
                    self.dispatcher.len()
                );
                Ok(addr)
            }
            Err(e) => {
                self.state = ServerState::Stopped;
                Err(e)
            }
        }
    }

    /// [`start`](Self::start) with the host and port overridden for this and
    /// later starts. Overrides are ignored while the server is running.
    pub fn start_with(
        &mut self,
        host: Option<&str>,
        port: Option<u16>,
    ) -> Result<SocketAddr, SetupError> {
        if self.running.is_none() {
            if let Some(host) = host {
                self.listen.host = host.to_string();
            }
            if port.is_some() {
                self.port = port;
            }
        }
        self.start()
    }

    fn spawn_listener(&self) -> Result<RunningListener, SetupError> {
        let requested = SocketAddr::new(self.listen.ip()?, self.port.unwrap_or(0));
        let std_listener =
            bind_reusable_listener(requested).map_err(|e| SetupError::Bind(requested, e))?;
        let addr = std_listener
            .local_addr()
            .map_err(|e| SetupError::Bind(requested, e))?;

        let mut builder = tokio::runtime::Builder::new_multi_thread();
        builder.enable_all().thread_name("mockrpc-worker");
        if let Some(workers) = self.listen.workers {
            builder.worker_threads(workers);
        }
        let runtime = builder
            .build()
            .map_err(|e| SetupError::Startup(format!("failed to build runtime: {e}")))?;

        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), String>>(1);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let dispatcher = Arc::clone(&self.dispatcher);
        let drain = self.listen.drain_timeout();

        let thread = thread::Builder::new()
            .name(format!("mockrpc-{}", addr.port()))
            .spawn(move || {
                runtime.block_on(async move {
                    let listener = match tokio::net::TcpListener::from_std(std_listener) {
                        Ok(listener) => listener,
                        Err(e) => {
                            let _ = ready_tx.send(Err(e.to_string()));
                            return;
                        }
                    };
                    let _ = ready_tx.send(Ok(()));
                    serve(listener, dispatcher, shutdown_rx, drain).await;
                });
            })
            .map_err(|e| SetupError::Startup(format!("failed to spawn server thread: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(RunningListener {
                addr,
                shutdown_tx,
                thread,
            }),
            Ok(Err(message)) => {
                let _ = thread.join();
                Err(SetupError::Startup(message))
            }
            Err(_) => {
                let _ = thread.join();
                Err(SetupError::Startup(
                    "server thread exited before signalling readiness".to_string(),
                ))
            }
        }
    }

    /// Stop accepting, drain open connections and join the server thread.
    /// Does nothing when the server is not running.
    pub fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        self.state = ServerState::Stopping;
        info!("Stopping mockrpc on {}", running.addr);
        // An Err means the loop already exited; joining below still applies.
        let _ = running.shutdown_tx.send(());
        if running.thread.join().is_err() {
            error!("Server thread for {} panicked", running.addr);
        }
        self.state = ServerState::Stopped;
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ServerState::Running
    }

    pub fn host(&self) -> &str {
        &self.listen.host
    }

    /// Configured port, or the port picked by the first start.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.addr)
    }

    /// Base URL of the endpoint, once a port is known.
    pub fn url(&self) -> Option<String> {
        let port = self.port?;
        let url = match self.listen.ip() {
            Ok(IpAddr::V6(ip)) => format!("http://[{ip}]:{port}/"),
            Ok(IpAddr::V4(ip)) => format!("http://{ip}:{port}/"),
            Err(_) => format!("http://{}:{port}/", self.listen.host),
        };
        Some(url)
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for MockServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockServer")
            .field("host", &self.listen.host)
            .field("port", &self.port)
            .field("state", &self.state)
            .field("actions", &self.dispatcher.len())
            .finish()
    }
}
