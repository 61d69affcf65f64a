//! # Transport Abstraction
//!
//! A minimal, async interface for moving frames between a client and a ledger endpoint.
//!
//! ## Philosophy
//!
//! - **Byte-Oriented**: The Transport knows nothing about frames, values or types.
//!   It moves opaque buffers.
//! - **Request-Response**: Every interaction is "send bytes, await bytes". Each ledger
//!   operation gets its own entry point so an endpoint can route them differently.

use std::fmt;

/// Errors that occur at the network/transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The endpoint is unreachable or the connection was dropped.
    ConnectionLost(String),
    /// The operation timed out before a response was received.
    Timeout,
    /// The endpoint rejected the payload size.
    PayloadTooLarge,
    /// Generic I/O error or internal transport failure.
    Io(String),
    /// The transport does not offer this operation.
    Unsupported(&'static str),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionLost(msg) => write!(f, "Connection lost: {}", msg),
            Self::Timeout => write!(f, "Request timed out"),
            Self::PayloadTooLarge => write!(f, "Payload too large for transport"),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
            Self::Unsupported(op) => write!(f, "Transport does not support {}", op),
        }
    }
}

impl std::error::Error for TransportError {}

pub type Result<T> = std::result::Result<T, TransportError>;

/// A mechanism to send a frame to the ledger and receive its answer.
///
/// This trait is designed to be object-safe (`Arc<dyn Transport>`).
///
/// # invariants
/// - Must return `Ok(vec)` with the raw answer bytes on success.
/// - Must return `Err` if the network fails.
/// - Should not interpret the payload content.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Carries an Invoke frame; answers with a Reply.
    async fn invoke(&self, frame: &[u8]) -> Result<Vec<u8>>;

    /// Carries a Submit frame; answers with a Reply or a Pending acknowledgement.
    async fn submit(&self, frame: &[u8]) -> Result<Vec<u8>>;

    /// Carries a Poll frame; answers with a Reply or another Pending.
    async fn poll(&self, _frame: &[u8]) -> Result<Vec<u8>> {
        Err(TransportError::Unsupported("poll"))
    }

    /// Carries a Deploy frame; answers with Deployed.
    async fn deploy(&self, _frame: &[u8]) -> Result<Vec<u8>> {
        Err(TransportError::Unsupported("deploy"))
    }
}

/// A transport for clients that only build envelopes and never talk to a ledger.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

#[async_trait::async_trait]
impl Transport for Offline {
    async fn invoke(&self, _frame: &[u8]) -> Result<Vec<u8>> {
        Err(TransportError::Unsupported("invoke"))
    }

    async fn submit(&self, _frame: &[u8]) -> Result<Vec<u8>> {
        Err(TransportError::Unsupported("submit"))
    }
}
