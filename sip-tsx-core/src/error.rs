use std::io;

/// Crate-local result alias, matching the teacher's `sip-core::Result`.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors the transaction layer itself can produce.
///
/// Message parse failures are deliberately not a variant here: per §7.3 they
/// never reach the core in the first place (the transport's `Decoder` drops
/// them before a `TransactionManager` method is ever called).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport send or bind failed (§7.2).
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// A caller asked the core to do something the contract forbids, e.g.
    /// open a client transaction for an ACK (§7.4).
    #[error("contract violation: {0}")]
    ContractViolation(&'static str),
}
