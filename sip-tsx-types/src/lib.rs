//! Message-level types shared between the SIP transaction core and the
//! parser/transport it is plugged into.
//!
//! This crate knows nothing about SIP wire grammar: it defines the narrow
//! read-only view of a message the transaction layer needs (method, status,
//! branch, CSeq method, top Via protocol) and the factory used to build the
//! handful of messages the core synthesizes itself (provisional responses,
//! ACKs). A real parser/serializer lives above this crate and implements
//! [`MessageView`]/[`MessageFactory`] for its own message type.

mod code;
mod message;
mod method;
pub mod testing;

pub use code::{Code, CodeKind};
pub use message::{MessageFactory, MessageView};
pub use method::Method;
