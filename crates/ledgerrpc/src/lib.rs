//! # LedgerRPC
//!
//! A strict, schema-driven call protocol for ledger-hosted contracts, layered over Ledgerpack.
//!
//! ## Architecture
//!
//! - `schema` turns the contract's XDR spec entries into method signatures and resolved types.
//! - `codec` moves native `Value`s on and off the wire, verified against a `TypeDesc`.
//! - `frame` defines the request, reply, submission and deployment envelopes.
//!
//! Every decode path is checked against the descriptor the schema declared; nothing is
//! coerced or defaulted.

pub mod codec;
pub mod error;
pub mod frame;
pub mod schema;
pub mod types;
pub mod value;
pub mod xdr;

pub use codec::decode;
pub use codec::decode_args;
pub use codec::decode_value;
pub use codec::encode;
pub use codec::encode_value;
pub use error::FailureReason;
pub use error::Result;
pub use error::RpcError;
pub use frame::Deploy;
pub use frame::Deployed;
pub use frame::InvokeDecoder;
pub use frame::InvokeEncoder;
pub use frame::Pending;
pub use frame::Poll;
pub use frame::ReplyDecoder;
pub use frame::ReplyErrEncoder;
pub use frame::ReplyOkEncoder;
pub use frame::RpcFrame;
pub use frame::SubmitDecoder;
pub use frame::SubmitEncoder;
pub use schema::ErrorCase;
pub use schema::ErrorTable;
pub use schema::Schema;
pub use schema::SchemaError;
pub use schema::SchemaErrorKind;
pub use types::EnumCase;
pub use types::EnumDesc;
pub use types::Field;
pub use types::IntWidth;
pub use types::MethodSignature;
pub use types::Param;
pub use types::RecordDesc;
pub use types::TypeDesc;
pub use types::UnionCase;
pub use types::UnionDesc;
pub use value::Address;
pub use value::AddressError;
pub use value::AddressKind;
pub use value::Value;
