use std::net::SocketAddr;
use std::sync::Arc;
use std::{fmt, io};

use bytes::BytesMut;
use parking_lot::Mutex;
use tokio::net::UdpSocket;

/// Fixed size of a pooled receive buffer (§4.B: "65535 bytes each, pooled").
const RECV_BUFFER_SIZE: usize = u16::MAX as usize;

/// Abstraction over a datagram/stream transport (§4.B, §6).
///
/// Mirrors the teacher's `sip_core::transport::Transport` trait, trimmed to
/// what the transaction layer actually consumes: a name for diagnostics, a
/// reliability flag, and best-effort send. Connection lifecycle, transport
/// selection/factories and TLS are the embedder's business, out of scope
/// here (§1 Non-goals).
#[async_trait::async_trait]
pub trait Transport: fmt::Debug + Send + Sync + 'static {
    /// Name used only for diagnostics (`"UDP"`, `"TCP"`, `"TLS"`, ...), per §6.
    fn protocol(&self) -> &'static str;

    /// Whether the substrate guarantees in-order, at-least-once delivery.
    /// `true` relaxes retransmission timers (§3, §4.B).
    fn reliable(&self) -> bool;

    /// Best-effort datagram send (§4.B).
    async fn send(&self, remote: SocketAddr, bytes: &[u8]) -> io::Result<()>;
}

/// Where a message is being sent: the transport to use plus the remote
/// address, bundled so a transaction record can carry a single field (§3:
/// "remote endpoint" + "reliability flag of its transport").
#[derive(Clone)]
pub struct Destination {
    pub remote: SocketAddr,
    pub transport: Arc<dyn Transport>,
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Destination")
            .field("remote", &self.remote)
            .field("protocol", &self.transport.protocol())
            .finish()
    }
}

impl Destination {
    pub fn reliable(&self) -> bool {
        self.transport.reliable()
    }

    pub async fn send(&self, bytes: &[u8]) -> io::Result<()> {
        self.transport.send(self.remote, bytes).await
    }
}

/// Pool of fixed-size receive buffers, shared across transport receive loops
/// (§4.B, §5 "Shared resources"): dequeue before each receive, enqueue after
/// dispatch. Grounded in the teacher's single-buffer-per-loop pattern in
/// `transport/udp.rs::receive_task`, generalized into an actual pool since
/// the spec calls for one explicitly.
#[derive(Debug, Clone)]
pub struct BufferPool {
    free: Arc<Mutex<Vec<BytesMut>>>,
}

impl Default for BufferPool {
    fn default() -> Self {
        BufferPool {
            free: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dequeue a buffer, allocating a fresh one if the pool is empty.
    pub fn take(&self) -> BytesMut {
        let mut free = self.free.lock();
        free.pop()
            .unwrap_or_else(|| BytesMut::zeroed(RECV_BUFFER_SIZE))
    }

    /// Return a buffer to the pool after dispatch, clearing its contents
    /// first so the next `take()` doesn't see stale bytes beyond its cursor.
    pub fn give_back(&self, mut buf: BytesMut) {
        buf.clear();
        buf.resize(RECV_BUFFER_SIZE, 0);
        self.free.lock().push(buf);
    }
}

/// A datagram failed to decode into a [`sip_tsx_types::MessageView`].
#[derive(Debug)]
pub struct DecodeError(pub String);

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse failure: {}", self.0)
    }
}

impl std::error::Error for DecodeError {}

/// External collaborator turning raw datagram bytes into a message view.
///
/// This is the boundary §7.3 describes: a decode failure is handled entirely
/// here (logged, datagram dropped, buffer returned) and never reaches
/// [`crate::manager::TransactionManager`].
pub trait Decoder<M>: Send + Sync + 'static {
    fn decode(&self, bytes: &[u8], source: SocketAddr) -> Result<M, DecodeError>;
}

/// External collaborator turning a message view back into wire bytes.
///
/// The other half of the serialization boundary: the state machines in
/// `transaction/` only ever emit a [`sip_tsx_types::MessageView`] value for
/// an action's `send(msg)`; this is where it becomes the `bytes` that
/// [`Transport::send`] actually transmits. Serialization/grammar stays
/// entirely outside the core, same as decoding.
pub trait Encoder<M>: Send + Sync + 'static {
    fn encode(&self, msg: &M) -> bytes::Bytes;
}

/// UDP transport adapter: binds a socket, runs a receive loop pulling
/// buffers from a shared [`BufferPool`], decodes each datagram and pushes
/// successful decodes to a channel for the manager to consume.
///
/// Grounded in the teacher's `transport::udp::Udp` + its `receive_task`.
#[derive(Debug)]
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
    local_addr: SocketAddr,
}

impl fmt::Display for UdpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "udp:bound={}", self.local_addr)
    }
}

impl UdpTransport {
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        let local_addr = socket.local_addr()?;

        log::info!("bound UDP transport to {local_addr}");
        tracing::info!(%local_addr, "bound UDP transport");

        Ok(UdpTransport {
            socket: Arc::new(socket),
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Spawn the receive loop: dequeue a buffer, receive into it, decode,
    /// forward successful decodes on `sink`, log and drop failures, then
    /// return the buffer to the pool and loop (§4.B, §7.3).
    pub fn spawn_receive_loop<M>(
        &self,
        pool: BufferPool,
        decoder: Arc<dyn Decoder<M>>,
        sink: tokio::sync::mpsc::UnboundedSender<(M, SocketAddr)>,
    ) where
        M: Send + 'static,
    {
        let socket = self.socket.clone();

        tokio::spawn(async move {
            loop {
                let mut buf = pool.take();

                let result = socket.recv_from(&mut buf).await;

                match result {
                    Ok((len, remote)) => match decoder.decode(&buf[..len], remote) {
                        Ok(msg) => {
                            if sink.send((msg, remote)).is_err() {
                                pool.give_back(buf);
                                return;
                            }
                        }
                        Err(err) => {
                            tracing::warn!(%remote, %err, "dropping undecodable datagram");
                        }
                    },
                    Err(err) => {
                        log::error!("UDP recv error {err:?}");
                    }
                }

                pool.give_back(buf);
            }
        });
    }
}

#[async_trait::async_trait]
impl Transport for UdpTransport {
    fn protocol(&self) -> &'static str {
        "UDP"
    }

    fn reliable(&self) -> bool {
        false
    }

    async fn send(&self, remote: SocketAddr, bytes: &[u8]) -> io::Result<()> {
        self.socket.send_to(bytes, remote).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_reuses_returned_buffers() {
        let pool = BufferPool::new();
        let buf = pool.take();
        assert_eq!(buf.len(), RECV_BUFFER_SIZE);
        pool.give_back(buf);

        let reused = pool.take();
        assert_eq!(reused.len(), RECV_BUFFER_SIZE);
        assert_eq!(pool.free.lock().len(), 0);
    }

    #[tokio::test]
    async fn udp_transport_reports_unreliable() {
        let transport = UdpTransport::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(transport.protocol(), "UDP");
        assert!(!transport.reliable());
    }
}
