//! # Protocol Frames
//!
//! Defines the envelopes exchanged with the ledger: invocation, reply, submission of a
//! signed payload, pending acknowledgement, polling and deployment.
//!
//! Every frame is a `Variant(kind, body)` whose body is a Record of named header fields.
//!
//! ## Invariants
//! - **Panic Safety**: All decoding paths return `Result`, never panicking on unknown data.
//! - **Forward Compatibility**: Unknown header fields are safely skipped.
//! - **Opaque Arguments**: Arguments and results travel pre-encoded; frames never need a
//!   type descriptor.

use crate::error::FailureReason;
use crate::error::Result;
use crate::error::RpcError;

use ledgerpack::Decoder;
use ledgerpack::Encoder;

fn missing(field: &str) -> RpcError {
    RpcError::ProtocolViolation(format!("Missing {}", field))
}

/// Encodes an outbound Invoke frame.
pub struct InvokeEncoder<'a> {
    pub seq: u64,
    pub network: &'a str,
    pub contract: &'a str,
    pub method: &'a str,
    /// Each argument already encoded as one ledgerpack item.
    pub args: &'a [Vec<u8>],
}

impl<'a> InvokeEncoder<'a> {
    pub fn new(seq: u64, network: &'a str, contract: &'a str, method: &'a str, args: &'a [Vec<u8>]) -> Self {
        Self { seq, network, contract, method, args }
    }

    /// Encode this invocation into the encoder.
    pub fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.variant_begin("Invoke")?;
        enc.record_begin()?;

        write_field_u64(enc, "seq", self.seq)?;
        write_field_str(enc, "network", self.network)?;
        write_field_str(enc, "contract", self.contract)?;
        write_field_str(enc, "method", self.method)?;

        enc.variant_begin("args")?;
        enc.list_begin()?;
        for arg in self.args {
            enc.raw_item(arg)?;
        }
        enc.list_end()?;
        enc.variant_end()?;

        enc.record_end()?;
        enc.variant_end()?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut enc = Encoder::new();
        self.encode(&mut enc)?;
        Ok(enc.into_bytes()?)
    }
}

/// Decodes an inbound Invoke frame.
///
/// **Invariant**: The `args` decoder points to a List container holding the arguments.
#[derive(Debug, Clone)]
pub struct InvokeDecoder<'a> {
    pub seq: u64,
    pub network: &'a str,
    pub contract: &'a str,
    pub method: &'a str,
    /// Use `decode_args` with this decoder and the method signature.
    pub args: Decoder<'a>,
}

impl<'a> InvokeDecoder<'a> {
    pub fn decode(mut dec: Decoder<'a>) -> Result<Self> {
        let mut rec = dec.record()?;
        let mut seq = None;
        let mut network = None;
        let mut contract = None;
        let mut method = None;
        let mut args = None;

        while let Some((key, mut val)) = rec.next()? {
            match key {
                "seq" => seq = Some(val.u64()?),
                "network" => network = Some(val.str()?),
                "contract" => contract = Some(val.str()?),
                "method" => method = Some(val.str()?),
                "args" => args = Some(val),
                _ => val.skip()?,
            }
        }

        Ok(InvokeDecoder {
            seq: seq.ok_or_else(|| missing("seq"))?,
            network: network.ok_or_else(|| missing("network"))?,
            contract: contract.ok_or_else(|| missing("contract"))?,
            method: method.ok_or_else(|| missing("method"))?,
            args: args.ok_or_else(|| missing("args"))?,
        })
    }
}

/// Encodes an outbound Reply frame (success).
pub struct ReplyOkEncoder<'a> {
    pub seq: u64,
    /// The return value, already encoded as one item.
    pub result: &'a [u8],
}

impl<'a> ReplyOkEncoder<'a> {
    pub fn new(seq: u64, result: &'a [u8]) -> Self {
        Self { seq, result }
    }

    pub fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.variant_begin("Reply")?;
        enc.result_ok_begin()?;
        enc.record_begin()?;

        write_field_u64(enc, "seq", self.seq)?;
        enc.variant_begin("result")?;
        enc.raw_item(self.result)?;
        enc.variant_end()?;

        enc.record_end()?;
        enc.result_ok_end()?;
        enc.variant_end()?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut enc = Encoder::new();
        self.encode(&mut enc)?;
        Ok(enc.into_bytes()?)
    }
}

/// Encodes an outbound Reply frame (failure).
pub struct ReplyErrEncoder<'a> {
    pub seq: u64,
    pub reason: &'a FailureReason,
}

impl<'a> ReplyErrEncoder<'a> {
    pub fn new(seq: u64, reason: &'a FailureReason) -> Self {
        Self { seq, reason }
    }

    pub fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.variant_begin("Reply")?;
        enc.result_err_begin()?;
        enc.record_begin()?;

        write_field_u64(enc, "seq", self.seq)?;
        enc.variant_begin("reason")?;
        encode_reason(enc, self.reason)?;
        enc.variant_end()?;

        enc.record_end()?;
        enc.result_err_end()?;
        enc.variant_end()?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut enc = Encoder::new();
        self.encode(&mut enc)?;
        Ok(enc.into_bytes()?)
    }
}

/// Decodes an inbound Reply frame.
#[derive(Debug, Clone)]
pub struct ReplyDecoder<'a> {
    pub seq: u64,
    /// The outcome of the call.
    /// - `Ok(Decoder)`: Success. Points at the single encoded return value.
    /// - `Err(FailureReason)`: The remote side failed.
    pub status: std::result::Result<Decoder<'a>, FailureReason>,
}

impl<'a> ReplyDecoder<'a> {
    pub fn decode(mut dec: Decoder<'a>) -> Result<Self> {
        match dec.result()? {
            Ok(ok_body) => Self::decode_success(ok_body),
            Err(err_body) => Self::decode_failure(err_body),
        }
    }

    fn decode_success(mut ok_body: Decoder<'a>) -> Result<Self> {
        let mut rec = ok_body.record()?;
        let mut seq = None;
        let mut result = None;

        while let Some((key, mut val)) = rec.next()? {
            match key {
                "seq" => seq = Some(val.u64()?),
                "result" => result = Some(val),
                _ => val.skip()?,
            }
        }

        Ok(ReplyDecoder {
            seq: seq.ok_or_else(|| missing("seq"))?,
            status: Ok(result.ok_or_else(|| missing("result"))?),
        })
    }

    fn decode_failure(mut err_body: Decoder<'a>) -> Result<Self> {
        let mut rec = err_body.record()?;
        let mut seq = None;
        let mut reason = None;

        while let Some((key, mut val)) = rec.next()? {
            match key {
                "seq" => seq = Some(val.u64()?),
                "reason" => reason = Some(decode_reason(&mut val)?),
                _ => val.skip()?,
            }
        }

        Ok(ReplyDecoder {
            seq: seq.ok_or_else(|| missing("seq"))?,
            status: Err(reason.ok_or_else(|| missing("reason"))?),
        })
    }
}

/// Encodes a signed payload for submission.
pub struct SubmitEncoder<'a> {
    /// A complete Invoke frame.
    pub payload: &'a [u8],
    /// `(signer address, signature)` pairs.
    pub signatures: &'a [(String, Vec<u8>)],
}

impl<'a> SubmitEncoder<'a> {
    pub fn new(payload: &'a [u8], signatures: &'a [(String, Vec<u8>)]) -> Self {
        Self { payload, signatures }
    }

    pub fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.variant_begin("Submit")?;
        enc.record_begin()?;

        enc.variant_begin("payload")?;
        enc.bytes(self.payload)?;
        enc.variant_end()?;

        enc.variant_begin("signatures")?;
        enc.list_begin()?;
        for (signer, sig) in self.signatures {
            enc.tuple_begin()?;
            enc.address(signer)?;
            enc.bytes(sig)?;
            enc.tuple_end()?;
        }
        enc.list_end()?;
        enc.variant_end()?;

        enc.record_end()?;
        enc.variant_end()?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut enc = Encoder::new();
        self.encode(&mut enc)?;
        Ok(enc.into_bytes()?)
    }
}

/// Decodes an inbound Submit frame.
#[derive(Debug, Clone)]
pub struct SubmitDecoder<'a> {
    pub payload: &'a [u8],
    pub signatures: Vec<(&'a str, &'a [u8])>,
}

impl<'a> SubmitDecoder<'a> {
    pub fn decode(mut dec: Decoder<'a>) -> Result<Self> {
        let mut rec = dec.record()?;
        let mut payload = None;
        let mut signatures = None;

        while let Some((key, mut val)) = rec.next()? {
            match key {
                "payload" => payload = Some(val.bytes()?),
                "signatures" => {
                    let mut list = val.list()?;
                    let mut sigs = Vec::with_capacity(list.count().min(64) as usize);
                    while let Some(mut item) = list.next()? {
                        let mut pair = item.tuple()?;
                        let (Some(mut signer), Some(mut sig)) = (pair.next()?, pair.next()?) else {
                            return Err(RpcError::ProtocolViolation("Signature entry too short".into()));
                        };
                        sigs.push((signer.address()?, sig.bytes()?));
                    }
                    signatures = Some(sigs);
                }
                _ => val.skip()?,
            }
        }

        Ok(SubmitDecoder {
            payload: payload.ok_or_else(|| missing("payload"))?,
            signatures: signatures.ok_or_else(|| missing("signatures"))?,
        })
    }
}

/// Acknowledges a submission that has not settled yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending<'a> {
    pub seq: u64,
    /// Handle to poll with.
    pub hash: &'a str,
}

impl<'a> Pending<'a> {
    pub fn new(seq: u64, hash: &'a str) -> Self {
        Self { seq, hash }
    }

    pub fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.variant_begin("Pending")?;
        enc.record_begin()?;
        write_field_u64(enc, "seq", self.seq)?;
        write_field_str(enc, "hash", self.hash)?;
        enc.record_end()?;
        enc.variant_end()?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut enc = Encoder::new();
        self.encode(&mut enc)?;
        Ok(enc.into_bytes()?)
    }

    pub fn decode(mut dec: Decoder<'a>) -> Result<Self> {
        let mut rec = dec.record()?;
        let mut seq = None;
        let mut hash = None;
        while let Some((key, mut val)) = rec.next()? {
            match key {
                "seq" => seq = Some(val.u64()?),
                "hash" => hash = Some(val.str()?),
                _ => val.skip()?,
            }
        }
        Ok(Pending {
            seq: seq.ok_or_else(|| missing("seq"))?,
            hash: hash.ok_or_else(|| missing("hash"))?,
        })
    }
}

/// Asks for the status of a pending submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poll<'a> {
    pub hash: &'a str,
}

impl<'a> Poll<'a> {
    pub fn new(hash: &'a str) -> Self {
        Self { hash }
    }

    pub fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.variant_begin("Poll")?;
        enc.record_begin()?;
        write_field_str(enc, "hash", self.hash)?;
        enc.record_end()?;
        enc.variant_end()?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut enc = Encoder::new();
        self.encode(&mut enc)?;
        Ok(enc.into_bytes()?)
    }

    pub fn decode(mut dec: Decoder<'a>) -> Result<Self> {
        let mut rec = dec.record()?;
        let mut hash = None;
        while let Some((key, mut val)) = rec.next()? {
            match key {
                "hash" => hash = Some(val.str()?),
                _ => val.skip()?,
            }
        }
        Ok(Poll { hash: hash.ok_or_else(|| missing("hash"))? })
    }
}

/// Requests installation of a new contract instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deploy<'a> {
    pub seq: u64,
    pub network: &'a str,
    pub wasm_hash: &'a [u8],
    pub salt: &'a [u8],
    /// Deploying account, when the caller names one.
    pub source: Option<&'a str>,
}

impl<'a> Deploy<'a> {
    pub fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.variant_begin("Deploy")?;
        enc.record_begin()?;

        write_field_u64(enc, "seq", self.seq)?;
        write_field_str(enc, "network", self.network)?;
        enc.variant_begin("wasm_hash")?;
        enc.bytes(self.wasm_hash)?;
        enc.variant_end()?;
        enc.variant_begin("salt")?;
        enc.bytes(self.salt)?;
        enc.variant_end()?;
        enc.variant_begin("source")?;
        match self.source {
            Some(s) => {
                enc.option_some_begin()?;
                enc.address(s)?;
                enc.option_some_end()?;
            }
            None => enc.option_none()?,
        }
        enc.variant_end()?;

        enc.record_end()?;
        enc.variant_end()?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut enc = Encoder::new();
        self.encode(&mut enc)?;
        Ok(enc.into_bytes()?)
    }

    pub fn decode(mut dec: Decoder<'a>) -> Result<Self> {
        let mut rec = dec.record()?;
        let mut seq = None;
        let mut network = None;
        let mut wasm_hash = None;
        let mut salt = None;
        let mut source = None;

        while let Some((key, mut val)) = rec.next()? {
            match key {
                "seq" => seq = Some(val.u64()?),
                "network" => network = Some(val.str()?),
                "wasm_hash" => wasm_hash = Some(val.bytes()?),
                "salt" => salt = Some(val.bytes()?),
                "source" => {
                    source = Some(match val.option()? {
                        Some(mut s) => Some(s.address()?),
                        None => None,
                    });
                }
                _ => val.skip()?,
            }
        }

        Ok(Deploy {
            seq: seq.ok_or_else(|| missing("seq"))?,
            network: network.ok_or_else(|| missing("network"))?,
            wasm_hash: wasm_hash.ok_or_else(|| missing("wasm_hash"))?,
            salt: salt.ok_or_else(|| missing("salt"))?,
            source: source.flatten(),
        })
    }
}

/// Outcome of a Deploy request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployed<'a> {
    pub seq: u64,
    /// The new contract id, or why installation failed.
    pub status: std::result::Result<&'a str, FailureReason>,
}

impl<'a> Deployed<'a> {
    pub fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.variant_begin("Deployed")?;
        match &self.status {
            Ok(contract) => {
                enc.result_ok_begin()?;
                enc.record_begin()?;
                write_field_u64(enc, "seq", self.seq)?;
                write_field_str(enc, "contract", contract)?;
                enc.record_end()?;
                enc.result_ok_end()?;
            }
            Err(reason) => {
                enc.result_err_begin()?;
                enc.record_begin()?;
                write_field_u64(enc, "seq", self.seq)?;
                enc.variant_begin("reason")?;
                encode_reason(enc, reason)?;
                enc.variant_end()?;
                enc.record_end()?;
                enc.result_err_end()?;
            }
        }
        enc.variant_end()?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut enc = Encoder::new();
        self.encode(&mut enc)?;
        Ok(enc.into_bytes()?)
    }

    pub fn decode(mut dec: Decoder<'a>) -> Result<Self> {
        let (ok, mut body) = match dec.result()? {
            Ok(b) => (true, b),
            Err(b) => (false, b),
        };
        let mut rec = body.record()?;
        let mut seq = None;
        let mut contract = None;
        let mut reason = None;
        while let Some((key, mut val)) = rec.next()? {
            match key {
                "seq" => seq = Some(val.u64()?),
                "contract" => contract = Some(val.str()?),
                "reason" => reason = Some(decode_reason(&mut val)?),
                _ => val.skip()?,
            }
        }
        let seq = seq.ok_or_else(|| missing("seq"))?;
        let status = if ok {
            Ok(contract.ok_or_else(|| missing("contract"))?)
        } else {
            Err(reason.ok_or_else(|| missing("reason"))?)
        };
        Ok(Deployed { seq, status })
    }
}

/// Top-level frame decoder.
#[derive(Debug, Clone)]
pub enum RpcFrame<'a> {
    Invoke(InvokeDecoder<'a>),
    Reply(ReplyDecoder<'a>),
    Submit(SubmitDecoder<'a>),
    Pending(Pending<'a>),
    Poll(Poll<'a>),
    Deploy(Deploy<'a>),
    Deployed(Deployed<'a>),
}

impl<'a> RpcFrame<'a> {
    /// Decode an RPC frame from the decoder.
    pub fn decode(dec: &mut Decoder<'a>) -> Result<Self> {
        let (kind, body) = dec.variant()?;
        match kind {
            "Invoke" => Ok(RpcFrame::Invoke(InvokeDecoder::decode(body)?)),
            "Reply" => Ok(RpcFrame::Reply(ReplyDecoder::decode(body)?)),
            "Submit" => Ok(RpcFrame::Submit(SubmitDecoder::decode(body)?)),
            "Pending" => Ok(RpcFrame::Pending(Pending::decode(body)?)),
            "Poll" => Ok(RpcFrame::Poll(Poll::decode(body)?)),
            "Deploy" => Ok(RpcFrame::Deploy(Deploy::decode(body)?)),
            "Deployed" => Ok(RpcFrame::Deployed(Deployed::decode(body)?)),
            _ => Err(RpcError::ProtocolViolation(format!("Unknown frame kind: {}", kind))),
        }
    }

    /// Decodes a whole buffer holding exactly one frame.
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self> {
        let mut dec = Decoder::new(bytes);
        let frame = Self::decode(&mut dec)?;
        if dec.remaining() != 0 {
            return Err(RpcError::ProtocolViolation("Trailing bytes after frame".into()));
        }
        Ok(frame)
    }
}

// Helper functions

fn write_field_u64(enc: &mut Encoder, key: &str, val: u64) -> Result<()> {
    enc.variant_begin(key)?;
    enc.u64(val)?;
    enc.variant_end()?;
    Ok(())
}

fn write_field_str(enc: &mut Encoder, key: &str, val: &str) -> Result<()> {
    enc.variant_begin(key)?;
    enc.str(val)?;
    enc.variant_end()?;
    Ok(())
}

/// Encodes a failure as `Variant(tag, payload)`.
fn encode_reason(enc: &mut Encoder, reason: &FailureReason) -> Result<()> {
    enc.variant_begin(reason.as_tag())?;
    match reason {
        FailureReason::Contract { code } => enc.u32(*code)?,
        FailureReason::Trapped { message } => enc.str(message)?,
        FailureReason::ProtocolViolation(msg) => enc.str(msg)?,
        _ => enc.void()?,
    }
    enc.variant_end()?;
    Ok(())
}

fn decode_reason(dec: &mut Decoder) -> Result<FailureReason> {
    let (tag, mut body) = dec.variant()?;
    Ok(match tag {
        "Contract" => FailureReason::Contract { code: body.u32()? },
        "Trapped" => FailureReason::Trapped { message: body.str()?.to_string() },
        "Protocol" => FailureReason::ProtocolViolation(body.str()?.to_string()),
        "NoContract" => { body.void()?; FailureReason::ContractNotFound }
        "NoMethod" => { body.void()?; FailureReason::MethodNotFound }
        "BadArgs" => { body.void()?; FailureReason::BadArguments }
        "Unauthorized" => { body.void()?; FailureReason::Unauthorized }
        other => return Err(RpcError::ProtocolViolation(format!("Unknown failure reason: {}", other))),
    })
}
