//! The server supervisor: lifecycle state machine, accept loop and the
//! fixed pool of client workers.
//!
//! Workers are spawned once and parked on their slot's notifier; the
//! supervisor publishes accepted control sockets into free slots. A
//! slot's `pending` socket is strict producer/consumer: the supervisor
//! writes it only when empty and the worker is idle, the worker
//! consumes it. Cross-task signalling is limited to the `busy` and
//! `stop` flags.

use super::controlchan::Dispatcher;
use super::error::ServerError;
use super::options::{Credentials, ServerOptions, PORT_ROTATE_WINDOW};
use super::session::{Session, SessionEnv};
use super::state::{ServerFault, ServerState, ServerStats, ServerStatus};
use crate::hooks::{NopHooks, ServerHooks};
use crate::storage::{LocalFs, Storage};

use slog::o;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::time::{sleep, timeout};

const NO_CONN_ALLOWED: &[u8] = b"421 No more connections allowed\r\n";
const REFUSE_DELAY: Duration = Duration::from_millis(500);
const DRAIN_POLLS: u32 = 60;
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(100);
const IDLE_TICK: Duration = Duration::from_secs(1);

/// One position in the worker pool.
pub(crate) struct Slot {
    pub(crate) index: u8,
    pending: Mutex<Option<TcpStream>>,
    busy: AtomicBool,
    stop: AtomicBool,
    notify: Notify,
}

impl Slot {
    fn new(index: u8) -> Slot {
        Slot {
            index,
            pending: Mutex::new(None),
            busy: AtomicBool::new(false),
            stop: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    fn busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Publishes a control socket into this slot, unless the worker is
    /// busy or a socket is already waiting.
    async fn try_assign(&self, stream: TcpStream) -> Result<(), TcpStream> {
        let mut pending = self.pending.lock().await;
        if pending.is_some() || self.busy() {
            return Err(stream);
        }
        *pending = Some(stream);
        drop(pending);
        self.notify.notify_one();
        Ok(())
    }

    async fn take_pending(&self) -> TcpStream {
        loop {
            if let Some(stream) = self.pending.lock().await.take() {
                return stream;
            }
            self.notify.notified().await;
        }
    }
}

struct Shared<S>
where
    S: Storage + 'static,
{
    env: SessionEnv<S>,
    slots: Vec<Arc<Slot>>,
    logger: slog::Logger,
}

/// An instance of an FTP server. Configure it with the builder methods,
/// then drive its lifecycle with [`start`](Server::start) and
/// [`stop`](Server::stop); both may be called repeatedly over the
/// server's life.
///
/// # Example
///
/// ```no_run
/// use microftp::Server;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let server = Server::with_fs("/srv/ftp").control_port(2121).clients(2);
///     server.start().await.unwrap();
///     // ... later:
///     server.stop().unwrap();
/// }
/// ```
pub struct Server<S>
where
    S: Storage + 'static,
{
    opts: ServerOptions,
    storage: Arc<S>,
    hooks: Arc<dyn ServerHooks>,
    credentials: Arc<RwLock<Credentials>>,
    state: Arc<ServerState>,
    logger: slog::Logger,
    runtime: OnceLock<Arc<Shared<S>>>,
}

impl Server<LocalFs> {
    /// Creates a server over a local directory.
    pub fn with_fs<P: Into<PathBuf>>(root: P) -> Server<LocalFs> {
        Server::new(LocalFs::new(root))
    }
}

impl<S> Server<S>
where
    S: Storage + 'static,
{
    /// Creates a server over the given storage back-end, with default
    /// options and the default `user`/`pass` credentials.
    pub fn new(storage: S) -> Server<S> {
        Server {
            opts: ServerOptions::default(),
            storage: Arc::new(storage),
            hooks: Arc::new(NopHooks),
            credentials: Arc::new(RwLock::new(Credentials::default())),
            state: Arc::new(ServerState::new()),
            logger: slog::Logger::root(slog::Discard, o!()),
            runtime: OnceLock::new(),
        }
    }

    /// Sets the control-channel listen port (default 21). Zero is
    /// rejected at start time through the fault bitmap.
    pub fn control_port(mut self, port: u16) -> Self {
        self.opts.port = port;
        self
    }

    /// Sets the base of the passive data-port window (default 55600).
    pub fn data_port_base(mut self, port: u16) -> Self {
        self.opts.data_port_base = port;
        self
    }

    /// Sets the worker-pool size (default 1); also the number of
    /// concurrent clients.
    pub fn clients(mut self, clients: u8) -> Self {
        self.opts.clients = clients;
        self
    }

    /// Sets the greeting sent after connecting.
    pub fn greeting(mut self, greeting: &str) -> Self {
        self.opts.greeting = greeting.to_string();
        self
    }

    /// Sets the per-iteration control read timeout (default 1 s).
    pub fn read_timeout(mut self, window: Duration) -> Self {
        self.opts.read_timeout = window;
        self
    }

    /// Sets the bounded control write window (default 3 s).
    pub fn write_timeout(mut self, window: Duration) -> Self {
        self.opts.write_timeout = window;
        self
    }

    /// Sets how many read-timeout iterations a session may idle through
    /// before it is disconnected (default 60).
    pub fn inactive_count(mut self, count: u32) -> Self {
        self.opts.inactive_count = count;
        self
    }

    /// Sets the accept window for the control listener and the passive
    /// data listener (default 500 ms).
    pub fn accept_timeout(mut self, window: Duration) -> Self {
        self.opts.accept_timeout = window;
        self
    }

    /// Sets the passive listener setup window (default 5 s).
    pub fn listen_timeout(mut self, window: Duration) -> Self {
        self.opts.listen_timeout = window;
        self
    }

    /// Sets the STOR data-receive window (default 5 s).
    pub fn stor_recv_timeout(mut self, window: Duration) -> Self {
        self.opts.stor_recv_timeout = window;
        self
    }

    /// Enables or disables passive mode (default enabled). When
    /// disabled, PASV answers 421.
    pub fn passive_mode(mut self, enabled: bool) -> Self {
        self.opts.use_passive = enabled;
        self
    }

    /// Sets the transfer-buffer multiplier: the buffer is `1024 × mult`
    /// bytes (default 32, i.e. 32 KiB).
    pub fn buffer_mult(mut self, mult: usize) -> Self {
        self.opts.buf_size_mult = mult;
        self
    }

    /// Installs host observability hooks.
    pub fn hooks(mut self, hooks: Arc<dyn ServerHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Sets the structured logger; the default discards everything.
    pub fn logger(mut self, logger: slog::Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Replaces the accepted credentials. Sessions already past login
    /// keep their acceptance; both fields are truncated to 32 bytes.
    pub async fn set_credentials(&self, user: &str, pass: &str) {
        let mut credentials = self.credentials.write().await;
        credentials.set_username(user);
        credentials.set_password(pass);
    }

    /// Starts the server: legal from `Idle` and from `Error`. The first
    /// call spawns the supervisor and the worker pool; later calls
    /// reuse them.
    ///
    /// Must be called within a tokio runtime.
    pub async fn start(&self) -> Result<(), ServerError> {
        if !self
            .state
            .transition(&[ServerStatus::Idle, ServerStatus::Error], ServerStatus::Starting)
        {
            return Err(ServerError::InvalidTransition {
                action: "start",
                status: self.state.status(),
            });
        }
        self.runtime.get_or_init(|| {
            let slots: Vec<Arc<Slot>> = (0..self.opts.clients.max(1))
                .map(|index| Arc::new(Slot::new(index)))
                .collect();
            let shared = Arc::new(Shared {
                env: SessionEnv {
                    storage: self.storage.clone(),
                    state: self.state.clone(),
                    opts: Arc::new(self.opts.clone()),
                    hooks: self.hooks.clone(),
                    credentials: self.credentials.clone(),
                },
                slots,
                logger: self.logger.clone(),
            });
            for slot in &shared.slots {
                tokio::spawn(worker_loop(shared.clone(), slot.clone()));
            }
            tokio::spawn(supervise(shared.clone()));
            shared
        });
        Ok(())
    }

    /// Requests a graceful stop: legal only from `Running`. The
    /// supervisor drops the listener, signals every busy worker and
    /// waits up to six seconds for the pool to drain; watch
    /// [`status`](Server::status) for `Idle` (or `Error` with the
    /// [`NotAllTasksDisabled`](ServerFault::NotAllTasksDisabled) bit).
    pub fn stop(&self) -> Result<(), ServerError> {
        if !self
            .state
            .transition(&[ServerStatus::Running], ServerStatus::Stopping)
        {
            return Err(ServerError::InvalidTransition {
                action: "stop",
                status: self.state.status(),
            });
        }
        Ok(())
    }

    /// Current lifecycle status.
    pub fn status(&self) -> ServerStatus {
        self.state.status()
    }

    /// Current fault bitmap; see [`ServerFault`] for the bit layout.
    pub fn faults(&self) -> u32 {
        self.state.faults()
    }

    /// Clears the fault bitmap. Only effective while the status is
    /// `Error`.
    pub fn clear_errors(&self) {
        self.state.clear_faults();
    }

    /// A snapshot of the session statistics.
    pub fn stats(&self) -> ServerStats {
        self.state.snapshot(self.opts.clients.max(1) as u32)
    }

    /// The storage back-end this server serves.
    pub fn storage(&self) -> &S {
        &self.storage
    }
}

async fn supervise<S>(shared: Arc<Shared<S>>)
where
    S: Storage + 'static,
{
    let logger = shared.logger.new(o!("task" => "ftp-supervisor"));
    let state = shared.env.state.clone();
    let opts = shared.env.opts.clone();
    let mut listener: Option<TcpListener> = None;

    loop {
        match state.status() {
            ServerStatus::Idle | ServerStatus::Error => sleep(IDLE_TICK).await,
            ServerStatus::Starting => {
                if opts.port == 0 {
                    slog::error!(logger, "control port 0 is not bindable");
                    state.fault(ServerFault::BindPortZero);
                    state.set_status(ServerStatus::ErrorStopping);
                    continue;
                }
                match TcpListener::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, opts.port))).await {
                    Ok(bound) => {
                        slog::info!(logger, "listening for clients"; "port" => opts.port);
                        listener = Some(bound);
                        state.set_status(ServerStatus::Running);
                    }
                    Err(err) => {
                        slog::error!(logger, "cannot bind control listener";
                            "port" => opts.port, "error" => %err);
                        state.fault(ServerFault::ListenerBind);
                        state.set_status(ServerStatus::ErrorStopping);
                    }
                }
            }
            ServerStatus::Running => match listener.as_ref() {
                Some(bound) => accept_clients(&shared, bound, &logger).await,
                None => state.set_status(ServerStatus::ErrorStopping),
            },
            ServerStatus::Stopping | ServerStatus::ErrorStopping => {
                let clean = state.status() == ServerStatus::Stopping;
                listener = None;
                let drained = drain_workers(&shared.slots).await;
                if !drained {
                    slog::warn!(logger, "workers still busy after the drain window");
                    state.fault(ServerFault::NotAllTasksDisabled);
                }
                let next = if clean && drained {
                    ServerStatus::Idle
                } else {
                    ServerStatus::Error
                };
                slog::info!(logger, "server stopped"; "status" => ?next);
                state.set_status(next);
            }
        }
    }
}

/// Accepts clients until the server leaves `Running` or a fault is
/// recorded.
async fn accept_clients<S>(shared: &Arc<Shared<S>>, listener: &TcpListener, logger: &slog::Logger)
where
    S: Storage + 'static,
{
    let state = &shared.env.state;
    let opts = &shared.env.opts;
    loop {
        if state.faults() != 0 {
            state.set_status(ServerStatus::ErrorStopping);
            return;
        }
        if state.status() != ServerStatus::Running {
            return;
        }
        match timeout(opts.accept_timeout, listener.accept()).await {
            Err(_) => continue,
            Ok(Err(err)) => {
                slog::warn!(logger, "accept failed"; "error" => %err);
                continue;
            }
            Ok(Ok((stream, peer))) => {
                slog::info!(logger, "incoming control connection"; "peer" => %peer);
                assign_client(shared, stream, logger).await;
            }
        }
    }
}

async fn assign_client<S>(shared: &Arc<Shared<S>>, stream: TcpStream, logger: &slog::Logger)
where
    S: Storage + 'static,
{
    let mut pending = Some(stream);
    for slot in &shared.slots {
        if slot.busy() {
            continue;
        }
        let Some(stream) = pending.take() else {
            break;
        };
        match slot.try_assign(stream).await {
            Ok(()) => {
                slog::debug!(logger, "client assigned"; "slot" => slot.index);
                return;
            }
            Err(stream) => pending = Some(stream),
        }
    }

    if let Some(mut stream) = pending {
        slog::warn!(logger, "connection denied, all slots in use");
        let window = shared.env.opts.write_timeout;
        if let Ok(Err(err)) = timeout(window, stream.write_all(NO_CONN_ALLOWED)).await {
            slog::debug!(logger, "could not send refusal"; "error" => %err);
        }
        drop(stream);
        sleep(REFUSE_DELAY).await;
    }
}

/// Signals every busy worker and polls the pool for up to six seconds.
async fn drain_workers(slots: &[Arc<Slot>]) -> bool {
    for slot in slots {
        if slot.busy() {
            slot.stop.store(true, Ordering::SeqCst);
        }
    }
    for _ in 0..DRAIN_POLLS {
        if slots.iter().all(|slot| !slot.busy()) {
            return true;
        }
        sleep(DRAIN_POLL_INTERVAL).await;
    }
    slots.iter().all(|slot| !slot.busy())
}

async fn worker_loop<S>(shared: Arc<Shared<S>>, slot: Arc<Slot>)
where
    S: Storage + 'static,
{
    let dispatcher = Dispatcher::new();
    let logger = shared.logger.new(o!("slot" => slot.index));
    let mut port_offset: u8 = 0;

    loop {
        let stream = slot.take_pending().await;
        slot.stop.store(false, Ordering::SeqCst);
        slot.busy.store(true, Ordering::SeqCst);

        // Rotate the passive port window before every session so a
        // lingering TIME_WAIT from the last one cannot collide.
        port_offset = (port_offset + 1) % PORT_ROTATE_WINDOW;

        shared.env.state.client_connected();
        shared.env.hooks.connected();

        match endpoints_v4(&stream) {
            Ok((server_ip, client_ip)) => {
                let session_logger = logger.new(o!("peer" => client_ip.to_string()));
                let mut session = Session::new(
                    stream,
                    server_ip,
                    client_ip,
                    slot.clone(),
                    port_offset,
                    &shared.env,
                    session_logger,
                );
                session.service(&dispatcher).await;
            }
            Err(err) => {
                slog::warn!(logger, "rejecting connection"; "error" => %err);
            }
        }

        shared.env.hooks.disconnected();
        shared.env.state.client_disconnected();
        slot.busy.store(false, Ordering::SeqCst);
    }
}

fn endpoints_v4(stream: &TcpStream) -> io::Result<(Ipv4Addr, Ipv4Addr)> {
    let local = stream.local_addr()?;
    let peer = stream.peer_addr()?;
    match (local, peer) {
        (SocketAddr::V4(local), SocketAddr::V4(peer)) => Ok((*local.ip(), *peer.ip())),
        _ => Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "only IPv4 control connections are supported",
        )),
    }
}
