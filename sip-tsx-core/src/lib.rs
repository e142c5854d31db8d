//! The SIP transaction layer (RFC 3261 §17) and the datagram transport
//! adapter that feeds it.
//!
//! This crate sits between a transport (UDP/TCP) and the transaction user
//! (TU — the dialog/call logic above it). It absorbs retransmissions,
//! enforces response orderings, drives per-transaction timers, and delivers
//! exactly-once logical request/response events to the TU over an inherently
//! lossy, unordered datagram substrate.
//!
//! Message parsing/serialization, URI and header grammars, TLS,
//! authentication, registrar/proxy logic, the dialog layer and SDP are all
//! external collaborators; see [`sip_tsx_types`] for the narrow surface this
//! crate consumes from a parsed message.

pub mod config;
pub mod error;
pub mod manager;
pub mod timer;
pub mod transaction;
pub mod transport;

pub use error::{Error, Result};
pub use manager::TransactionManager;
pub use transaction::{
    ClientTxHandle, IncomingRequestHandler, ServerTxHandle, TransactionCallback, TsxKey,
};
pub use transport::{BufferPool, Decoder, Destination, Encoder, Transport, UdpTransport};
