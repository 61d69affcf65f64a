//! # Invocation Client
//!
//! A `Client` binds a decoded schema to one deployed contract. Each call walks
//! `encoding -> dispatched -> decoded | failed`; those transitions are traced.
//!
//! In connected mode a call is sent through `Transport::invoke` and its reply decoded
//! with the method's return type. In disconnected mode the call stops once the
//! request is encoded, handing back an unsigned `Envelope` for signing elsewhere.

use std::fmt;
use std::sync::Arc;

use ledgerrpc::Address;
use ledgerrpc::ErrorTable;
use ledgerrpc::FailureReason;
use ledgerrpc::InvokeEncoder;
use ledgerrpc::MethodSignature;
use ledgerrpc::ReplyDecoder;
use ledgerrpc::RpcError;
use ledgerrpc::RpcFrame;
use ledgerrpc::Schema;
use ledgerrpc::Value;
use tracing::debug;
use tracing::instrument;
use tracing::warn;

use crate::config::ClientOptions;
use crate::config::Mode;
use crate::config::Target;
use crate::envelope::Envelope;
use crate::error::Error;
use crate::error::Result;
use crate::network::NetworkRegistry;
use crate::table;
use crate::table::Args;
use crate::table::MethodTable;
use crate::transport::Transport;

/// What a call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// Connected mode: the decoded return value.
    Returned(Value),
    /// Disconnected mode: the request, ready to be signed and submitted.
    Unsigned(Envelope),
}

impl CallOutcome {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Returned(v) => Some(v),
            Self::Unsigned(_) => None,
        }
    }

    pub fn into_envelope(self) -> Option<Envelope> {
        match self {
            Self::Unsigned(e) => Some(e),
            Self::Returned(_) => None,
        }
    }
}

/// A typed handle on one deployed contract.
///
/// Cheap to clone; clones share the schema, method table and transport.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

#[derive(Clone)]
struct Inner {
    schema: Arc<Schema>,
    table: MethodTable,
    target: Target,
    source: Option<Address>,
    mode: Mode,
    /// Names supplied by the binding for codes the schema does not declare.
    extra_errors: ErrorTable,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("target", &self.inner.target)
            .field("mode", &self.inner.mode)
            .field("methods", &self.inner.table.len())
            .finish()
    }
}

impl Client {
    /// Builds a client for an explicitly targeted contract.
    ///
    /// Without a registry, options must carry a contract id; the passphrase may come
    /// from a well-known network name.
    pub fn new(schema: Arc<Schema>, options: &ClientOptions, transport: Arc<dyn Transport>) -> Result<Self> {
        Self::with_registry(schema, options, &NetworkRegistry::empty(), transport)
    }

    /// Builds a client, resolving a network name through `registry`.
    pub fn with_registry(
        schema: Arc<Schema>,
        options: &ClientOptions,
        registry: &NetworkRegistry,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let target = options.resolve(registry)?;
        let source = options.source_address()?;
        debug!(contract = %target.contract_id, mode = ?options.mode, "client bound");
        Ok(Self::from_target(schema, target, options.mode, source, transport))
    }

    pub fn from_target(
        schema: Arc<Schema>,
        target: Target,
        mode: Mode,
        source: Option<Address>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let table = MethodTable::build(&schema);
        Self {
            inner: Arc::new(Inner {
                schema,
                table,
                target,
                source,
                mode,
                extra_errors: ErrorTable::default(),
                transport,
            }),
        }
    }

    /// Adds names for remote error codes the schema itself does not declare.
    pub fn with_error_names<'a>(mut self, names: impl IntoIterator<Item = (u32, &'a str)>) -> Self {
        Arc::make_mut(&mut self.inner).extra_errors = ErrorTable::from_pairs(names);
        self
    }

    /// A callable handle on one of the contract's methods.
    pub fn method(&self, name: &str) -> Result<Method<'_>> {
        let sig = self.inner.table.lookup(name)?;
        Ok(Method { client: self, sig })
    }

    /// Shorthand for `method(name)?.call(args)`.
    pub async fn call(&self, name: &str, args: Args) -> Result<CallOutcome> {
        self.method(name)?.call(args).await
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodSignature> {
        self.inner.table.iter()
    }

    pub fn table(&self) -> &MethodTable {
        &self.inner.table
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.inner.schema
    }

    pub fn target(&self) -> &Target {
        &self.inner.target
    }

    pub fn mode(&self) -> Mode {
        self.inner.mode
    }

    pub fn source(&self) -> Option<&Address> {
        self.inner.source.as_ref()
    }

    /// Name of a remote error code, from the schema or the binding.
    pub fn error_name(&self, code: u32) -> Option<&str> {
        self.inner.schema.errors().name(code).or_else(|| self.inner.extra_errors.name(code))
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    /// Decodes a Reply answering request `seq`.
    pub(crate) fn read_reply(&self, sig: &MethodSignature, seq: u64, bytes: &[u8]) -> Result<Value> {
        match RpcFrame::from_bytes(bytes)? {
            RpcFrame::Reply(reply) => self.settle(sig, seq, reply),
            _ => Err(protocol("expected a Reply frame")),
        }
    }

    pub(crate) fn settle(&self, sig: &MethodSignature, seq: u64, reply: ReplyDecoder<'_>) -> Result<Value> {
        check_seq(seq, reply.seq)?;
        match reply.status {
            Ok(mut dec) => {
                let value = ledgerrpc::decode_value(&mut dec, &sig.returns)?;
                if dec.remaining() != 0 {
                    return Err(protocol("trailing bytes after result"));
                }
                debug!(result = value.kind(), "decoded");
                Ok(value)
            }
            Err(reason) => Err(self.remote_failure(&sig.name, reason)),
        }
    }

    pub(crate) fn remote_failure(&self, method: &str, reason: FailureReason) -> Error {
        let name = reason.code().and_then(|c| self.error_name(c)).map(String::from);
        warn!(method, %reason, name = name.as_deref(), "remote execution failed");
        Error::RemoteExecution { method: method.to_string(), reason, name }
    }
}

/// One method of a bound client.
#[derive(Clone, Copy)]
pub struct Method<'a> {
    client: &'a Client,
    sig: &'a MethodSignature,
}

impl fmt::Debug for Method<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Method({})", self.sig)
    }
}

impl<'a> Method<'a> {
    pub fn name(&self) -> &'a str {
        &self.sig.name
    }

    pub fn signature(&self) -> &'a MethodSignature {
        self.sig
    }

    /// Validates and encodes `args`, then sends or packages the request.
    ///
    /// Argument and codec failures are raised before the transport is touched.
    #[instrument(
        skip(self, args),
        fields(method = %self.sig.name, contract = %self.client.target().contract_id)
    )]
    pub async fn call(&self, args: Args) -> Result<CallOutcome> {
        debug!(args = args.len(), "encoding");
        let encoded = table::encode_args(self.sig, &args)?;

        let seq: u64 = rand::random();
        let target = self.client.target();
        let frame = InvokeEncoder::new(
            seq,
            &target.network_passphrase,
            target.contract_id.as_str(),
            &self.sig.name,
            &encoded,
        )
        .to_bytes()?;

        if self.client.mode() == Mode::Disconnected {
            debug!(seq, bytes = frame.len(), "envelope built");
            let envelope = Envelope::unsigned(self.client, &self.sig.name, seq, frame);
            return Ok(CallOutcome::Unsigned(envelope));
        }

        debug!(seq, bytes = frame.len(), "dispatched");
        let reply = self.client.transport().invoke(&frame).await?;
        let value = self.client.read_reply(self.sig, seq, &reply)?;
        Ok(CallOutcome::Returned(value))
    }
}

pub(crate) fn protocol(msg: impl Into<String>) -> Error {
    Error::Rpc(RpcError::ProtocolViolation(msg.into()))
}

pub(crate) fn check_seq(expected: u64, found: u64) -> Result<()> {
    if expected != found {
        return Err(protocol(format!("answer seq {} does not match request {}", found, expected)));
    }
    Ok(())
}
