//! # Error Definitions
//!
//! Every failure a binding can surface to its caller. Local failures (schema, arguments,
//! codec, configuration) are raised before any transport call is made.

use ledgerrpc::FailureReason;
use ledgerrpc::RpcError;
use ledgerrpc::SchemaError;

use crate::transport::TransportError;

/// Why a set of named arguments does not fit a method signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    /// A declared parameter was not supplied.
    Missing(String),
    /// A supplied name is not a parameter of the method.
    Unexpected(String),
    /// The same name was supplied twice.
    Duplicate(String),
}

impl std::fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(name) => write!(f, "missing argument '{}'", name),
            Self::Unexpected(name) => write!(f, "unexpected argument '{}'", name),
            Self::Duplicate(name) => write!(f, "argument '{}' given more than once", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The contract schema could not be decoded.
    Schema(SchemaError),
    /// The method name is not in the contract's method table.
    UnknownMethod(String),
    /// Arguments do not match the method's parameters.
    Argument { method: String, error: ArgumentError },
    /// A value does not fit its declared type.
    Codec(RpcError),
    /// Options name no usable target, or a value in them is malformed.
    Configuration(String),
    Transport(TransportError),
    /// The ledger rejected or trapped the call.
    RemoteExecution {
        method: String,
        reason: FailureReason,
        /// Name of the contract error, when the code is in the error table.
        name: Option<String>,
    },
    /// Installing a new contract instance failed; carries the underlying cause.
    Deployment(Box<Error>),
    /// The ledger answered with a malformed or unexpected frame.
    Rpc(RpcError),
    /// A serialized envelope is unreadable or does not belong to this client.
    Envelope(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schema(e) => write!(f, "Schema error: {}", e),
            Self::UnknownMethod(name) => write!(f, "Unknown method '{}'", name),
            Self::Argument { method, error } => write!(f, "Argument error in {}: {}", method, error),
            Self::Codec(e) => write!(f, "Codec error: {}", e),
            Self::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            Self::Transport(e) => write!(f, "Transport error: {}", e),
            Self::RemoteExecution { method, reason, name } => match name {
                Some(name) => write!(f, "Remote failure in {}: {} ({})", method, reason, name),
                None => write!(f, "Remote failure in {}: {}", method, reason),
            },
            Self::Deployment(cause) => write!(f, "Deployment failed: {}", cause),
            Self::Rpc(e) => write!(f, "RPC error: {}", e),
            Self::Envelope(msg) => write!(f, "Envelope error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Schema(e) => Some(e),
            Self::Codec(e) | Self::Rpc(e) => Some(e),
            Self::Transport(e) => Some(e),
            Self::Deployment(cause) => Some(cause.as_ref()),
            _ => None,
        }
    }
}

impl From<SchemaError> for Error {
    fn from(e: SchemaError) -> Self {
        Self::Schema(e)
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

/// Frame-level failures are protocol errors; everything else is about a value.
impl From<RpcError> for Error {
    fn from(e: RpcError) -> Self {
        match e {
            RpcError::ProtocolViolation(_) | RpcError::Serialization(_) => Self::Rpc(e),
            other => Self::Codec(other),
        }
    }
}

impl From<ledgerpack::Error> for Error {
    fn from(e: ledgerpack::Error) -> Self {
        Self::from(RpcError::from(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Envelope(e.to_string())
    }
}

impl Error {
    /// Wraps this error as the cause of a failed deployment.
    pub fn into_deployment(self) -> Self {
        match self {
            Self::Deployment(_) => self,
            other => Self::Deployment(Box::new(other)),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
