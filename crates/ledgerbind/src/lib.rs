//! # LedgerBind
//!
//! Typed bindings for ledger-hosted contracts. A contract's schema is decoded once into
//! a method table; a `Client` then turns named arguments into encoded Invoke frames,
//! sends them through a `Transport` (or packages them as envelopes for offline
//! signing), and decodes the replies with the declared return types.

pub mod client;
pub mod config;
pub mod contracts;
pub mod deploy;
pub mod envelope;
pub mod error;
pub mod mock;
pub mod network;
pub mod table;
pub mod transport;

pub use client::CallOutcome;
pub use client::Client;
pub use client::Method;
pub use config::ClientOptions;
pub use config::DeployOptions;
pub use config::Mode;
pub use config::Target;
pub use deploy::deploy;
pub use envelope::Envelope;
pub use envelope::PendingCall;
pub use envelope::Submission;
pub use envelope::SubmittedCall;
pub use error::ArgumentError;
pub use error::Error;
pub use error::Result;
pub use network::NetworkEntry;
pub use network::NetworkRegistry;
pub use table::Args;
pub use table::MethodTable;
pub use transport::Transport;
pub use transport::TransportError;

pub use ledgerrpc::Address;
pub use ledgerrpc::Schema;
pub use ledgerrpc::Value;

#[cfg(test)]
mod tests;
