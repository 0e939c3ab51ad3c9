//! RPC service lifecycle: listeners, concurrency, cooperative shutdown.
//!
//! A service moves Constructed → Listening (listeners added) → Draining
//! (shutdown requested) → Stopped (all workers joined). The procedure
//! table is mutable only before [`RpcService::handle_clients`]; the
//! serving path reads it through a shared snapshot and takes no locks.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use reef_xdr::Encode;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::dispatch::{dispatch, HandlerError, ProcedureTable};
use crate::framing::{read_message, write_message};

/// Listener protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Tcp,
    Udp,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Tcp => write!(f, "tcp"),
            Transport::Udp => write!(f, "udp"),
        }
    }
}

/// Big enough for any UDP datagram; a read that fills it completely may
/// have been truncated by the kernel and is dropped as malformed.
const UDP_RECV_BUFFER: usize = 64 * 1024;

enum Binding {
    Tcp(TcpListener),
    Udp(UdpSocket),
}

/// State shared between the service front and its worker tasks.
struct Shared {
    label: &'static str,
    program: u32,
    version: u32,
    /// Set once when serving starts; read-only from then on.
    table: OnceLock<ProcedureTable>,
    listening: AtomicBool,
    shutdown: Notify,
}

impl Shared {
    fn listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    fn table(&self) -> &ProcedureTable {
        self.table.get_or_init(ProcedureTable::new)
    }
}

/// Requests shutdown of a running service from another task.
#[derive(Clone)]
pub struct ShutdownHandle {
    shared: Arc<Shared>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.shared.listening.store(false, Ordering::SeqCst);
        self.shared.shutdown.notify_waiters();
    }
}

/// One RPC program bound to any number of TCP/UDP listeners.
pub struct RpcService {
    shared: Arc<Shared>,
    table: ProcedureTable,
    bindings: Vec<Binding>,
    workers: Vec<JoinHandle<()>>,
}

impl RpcService {
    pub fn new(label: &'static str, program: u32, version: u32) -> Self {
        Self {
            shared: Arc::new(Shared {
                label,
                program,
                version,
                table: OnceLock::new(),
                listening: AtomicBool::new(false),
                shutdown: Notify::new(),
            }),
            table: ProcedureTable::new(),
            bindings: Vec::new(),
            workers: Vec::new(),
        }
    }

    pub fn label(&self) -> &'static str {
        self.shared.label
    }

    pub fn program(&self) -> u32 {
        self.shared.program
    }

    pub fn version(&self) -> u32 {
        self.shared.version
    }

    /// Register a procedure handler. Re-registering a number replaces the
    /// previous handler. Must happen before [`Self::handle_clients`].
    pub fn register_procedure<F>(&mut self, procedure: u32, handler: F)
    where
        F: Fn(&[u8]) -> Result<Box<dyn Encode + Send>, HandlerError> + Send + Sync + 'static,
    {
        self.table.register(procedure, handler);
    }

    /// Bind a listener. The service accepts connections/datagrams on it
    /// once [`Self::handle_clients`] runs. Returns the bound address
    /// (useful with port 0).
    pub async fn add_listener(
        &mut self,
        transport: Transport,
        address: &str,
    ) -> io::Result<SocketAddr> {
        let (binding, local) = match transport {
            Transport::Tcp => {
                let listener = TcpListener::bind(address).await?;
                let local = listener.local_addr()?;
                (Binding::Tcp(listener), local)
            }
            Transport::Udp => {
                let socket = UdpSocket::bind(address).await?;
                let local = socket.local_addr()?;
                (Binding::Udp(socket), local)
            }
        };
        info!(service = self.shared.label, %transport, %local, "listening");
        self.shared.listening.store(true, Ordering::SeqCst);
        self.bindings.push(binding);
        Ok(local)
    }

    /// Start serving: one worker per listener, one task per accepted TCP
    /// connection, one task per UDP datagram. The procedure table is
    /// frozen from here on.
    pub fn handle_clients(&mut self) {
        // Freeze the table; workers read this snapshot without locking.
        let _ = self.shared.table.set(self.table.clone());

        for binding in self.bindings.drain(..) {
            let shared = self.shared.clone();
            let worker = match binding {
                Binding::Tcp(listener) => tokio::spawn(tcp_accept_loop(shared, listener)),
                Binding::Udp(socket) => tokio::spawn(udp_loop(shared, socket)),
            };
            self.workers.push(worker);
        }
    }

    /// A handle other tasks can use to request shutdown.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            shared: self.shared.clone(),
        }
    }

    /// Stop listening. Worker loops observe the flag and exit; errors from
    /// sockets woken by this are expected and not logged.
    pub fn shutdown(&self) {
        info!(service = self.shared.label, "shutdown requested");
        self.shared.listening.store(false, Ordering::SeqCst);
        self.shared.shutdown.notify_waiters();
    }

    /// Wait for every listener worker to exit.
    pub async fn wait_until_done(&mut self) {
        for worker in self.workers.drain(..) {
            let _ = worker.await;
        }
    }
}

async fn tcp_accept_loop(shared: Arc<Shared>, listener: TcpListener) {
    loop {
        let stop = shared.shutdown.notified();
        tokio::pin!(stop);
        stop.as_mut().enable();
        if !shared.listening() {
            break;
        }

        tokio::select! {
            _ = &mut stop => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(service = shared.label, %peer, "client connected");
                    let shared = shared.clone();
                    tokio::spawn(tcp_connection_loop(shared, stream, peer));
                }
                Err(error) => {
                    // An accept error after shutdown is the socket closing.
                    if !shared.listening() {
                        break;
                    }
                    warn!(service = shared.label, %error, "accept failed");
                }
            },
        }
    }
    trace!(service = shared.label, "tcp listener drained");
}

/// Serial read-dispatch-write loop for one connection: replies go out in
/// request order.
async fn tcp_connection_loop(shared: Arc<Shared>, mut stream: TcpStream, peer: SocketAddr) {
    loop {
        let stop = shared.shutdown.notified();
        tokio::pin!(stop);
        stop.as_mut().enable();
        if !shared.listening() {
            break;
        }

        let message = tokio::select! {
            _ = &mut stop => break,
            read = read_message(&mut stream) => match read {
                Ok(Some(message)) => message,
                Ok(None) => {
                    trace!(service = shared.label, %peer, "client disconnected");
                    break;
                }
                Err(error) => {
                    if shared.listening() {
                        debug!(service = shared.label, %peer, %error, "dropping connection");
                    }
                    break;
                }
            },
        };

        let reply = match dispatch(&message, shared.program, shared.version, shared.table()) {
            Ok(reply) => reply,
            Err(error) => {
                debug!(service = shared.label, %peer, %error, "dropping connection");
                break;
            }
        };

        if let Err(error) = write_message(&mut stream, &reply).await {
            if shared.listening() {
                debug!(service = shared.label, %peer, %error, "write failed");
            }
            break;
        }
    }
}

async fn udp_loop(shared: Arc<Shared>, socket: UdpSocket) {
    let socket = Arc::new(socket);
    let mut buf = vec![0u8; UDP_RECV_BUFFER];
    loop {
        let stop = shared.shutdown.notified();
        tokio::pin!(stop);
        stop.as_mut().enable();
        if !shared.listening() {
            break;
        }

        let (len, peer) = tokio::select! {
            _ = &mut stop => break,
            received = socket.recv_from(&mut buf) => match received {
                Ok(received) => received,
                Err(error) => {
                    if !shared.listening() {
                        break;
                    }
                    warn!(service = shared.label, %error, "udp receive failed");
                    continue;
                }
            },
        };

        if len == buf.len() {
            debug!(service = shared.label, %peer, "dropping possibly-truncated datagram");
            continue;
        }

        let message = buf[..len].to_vec();
        let shared = shared.clone();
        let socket = socket.clone();
        tokio::spawn(async move {
            match dispatch(&message, shared.program, shared.version, shared.table()) {
                Ok(reply) => {
                    if let Err(error) = socket.send_to(&reply, peer).await {
                        debug!(service = shared.label, %peer, %error, "udp send failed");
                    }
                }
                Err(error) => {
                    debug!(service = shared.label, %peer, %error, "dropping datagram");
                }
            }
        });
    }
    trace!(service = shared.label, "udp listener drained");
}
