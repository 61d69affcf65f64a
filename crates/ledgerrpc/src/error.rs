//! # Error Definitions
//!
//! The central ledger of codec and protocol failures.

use ledgerpack::Error as PackError;

use crate::value::AddressError;

/// Operational failures within the codec and the call protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcError {
    /// The underlying Ledgerpack serialization failed (e.g., truncated buffer).
    Serialization(PackError),
    /// An integer does not fit the width its descriptor declares.
    Range { ty: String, value: String },
    /// Arity, field set, case name or canonical order disagrees with the descriptor.
    ShapeMismatch(String),
    /// The value (or wire tag) is of a different type than the descriptor.
    TypeMismatch { expected: String, found: String },
    /// A wire tag or descriptor outside the closed type set.
    UnsupportedType(String),
    /// An address failed validation.
    Address(AddressError),
    /// The internal structure of the message was malformed (e.g., missing Sequence header).
    ProtocolViolation(String),
    /// The nested depth of the values exceeded the safety limit.
    RecursionLimitExceeded,
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serialization(e) => write!(f, "serialization error: {}", e),
            Self::Range { ty, value } => write!(f, "range error: {} does not fit {}", value, ty),
            Self::ShapeMismatch(msg) => write!(f, "shape mismatch: {}", msg),
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {}, found {}", expected, found)
            }
            Self::UnsupportedType(what) => write!(f, "unsupported type: {}", what),
            Self::Address(e) => write!(f, "invalid address: {}", e),
            Self::ProtocolViolation(msg) => write!(f, "protocol violation: {}", msg),
            Self::RecursionLimitExceeded => write!(f, "value nesting exceeds the recursion limit"),
        }
    }
}

impl std::error::Error for RpcError {}

impl From<PackError> for RpcError {
    fn from(e: PackError) -> Self {
        match e {
            PackError::InvalidTag(b) => Self::UnsupportedType(format!("wire tag {:#04x}", b)),
            PackError::UnexpectedTag { expected, found } => Self::TypeMismatch {
                expected: format!("{:?}", expected),
                found: format!("{:?}", found),
            },
            PackError::CountMismatch { declared, found } => Self::ShapeMismatch(format!(
                "sequence declares {} items, body holds {}", declared, found
            )),
            other => Self::Serialization(other),
        }
    }
}

impl From<AddressError> for RpcError {
    fn from(e: AddressError) -> Self { Self::Address(e) }
}

/// A specialized Result type for RPC operations.
pub type Result<T> = std::result::Result<T, RpcError>;

/// Reasons for a remote failure (The "Err" side of a Reply).
///
/// These are distinct from `RpcError`; these represent the *remote* program or
/// host failing, whereas `RpcError` represents the local codec or protocol failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The program raised one of its declared error codes.
    Contract { code: u32 },
    /// The program trapped (panic, failed assertion, arithmetic overflow).
    Trapped { message: String },
    /// The target contract id is not deployed on this network.
    ContractNotFound,
    /// The method does not exist on the contract.
    MethodNotFound,
    /// Arguments provided did not match the method signature.
    BadArguments,
    /// A required authorization signature is missing or invalid.
    Unauthorized,
    /// The frame could not be understood by the remote side.
    ProtocolViolation(String),
}

impl FailureReason {
    /// Wire name of this failure.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Contract { .. } => "Contract",
            Self::Trapped { .. } => "Trapped",
            Self::ContractNotFound => "NoContract",
            Self::MethodNotFound => "NoMethod",
            Self::BadArguments => "BadArgs",
            Self::Unauthorized => "Unauthorized",
            Self::ProtocolViolation(_) => "Protocol",
        }
    }

    /// Remote error code, when the program raised a declared one.
    pub fn code(&self) -> Option<u32> {
        match self {
            Self::Contract { code } => Some(*code),
            _ => None,
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contract { code } => write!(f, "contract error #{}", code),
            Self::Trapped { message } => write!(f, "trapped: {}", message),
            Self::ContractNotFound => write!(f, "contract not found"),
            Self::MethodNotFound => write!(f, "method not found"),
            Self::BadArguments => write!(f, "arguments do not match the method signature"),
            Self::Unauthorized => write!(f, "missing or invalid authorization"),
            Self::ProtocolViolation(msg) => write!(f, "remote protocol violation: {}", msg),
        }
    }
}
