//! # Invocation Envelopes
//!
//! A disconnected client hands back an unsigned `Envelope`: the encoded Invoke frame
//! plus the target it was built for. Envelopes serialize to JSON (byte fields in
//! base64) so they can travel to whoever holds the signing keys, and come back through
//! `Client::from_json` as a `PendingCall` that can be signed and submitted.

use serde::Deserialize;
use serde::Serialize;

use ledgerrpc::Address;
use ledgerrpc::Poll;
use ledgerrpc::RpcFrame;
use ledgerrpc::SubmitEncoder;
use ledgerrpc::Value;
use tracing::debug;
use tracing::instrument;

use crate::client::Client;
use crate::client::check_seq;
use crate::client::protocol;
use crate::error::Error;
use crate::error::Result;

pub const ENVELOPE_VERSION: u32 = 1;

/// A prepared call, possibly carrying signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub version: u32,
    pub method: String,
    pub network_passphrase: String,
    pub contract_id: String,
    /// Account expected to sign, when the client was given one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub seq: u64,
    /// The encoded Invoke frame.
    #[serde(with = "base64_bytes")]
    pub payload: Vec<u8>,
    #[serde(default)]
    pub signatures: Vec<SignatureEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEntry {
    pub signer: String,
    #[serde(with = "base64_bytes")]
    pub signature: Vec<u8>,
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text.as_bytes()).map_err(serde::de::Error::custom)
    }
}

impl Envelope {
    pub(crate) fn unsigned(client: &Client, method: &str, seq: u64, payload: Vec<u8>) -> Self {
        let target = client.target();
        Self {
            version: ENVELOPE_VERSION,
            method: method.to_string(),
            network_passphrase: target.network_passphrase.clone(),
            contract_id: target.contract_id.to_string(),
            source: client.source().map(|a| a.to_string()),
            seq,
            payload,
            signatures: Vec::new(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_signed(&self) -> bool {
        !self.signatures.is_empty()
    }

    /// Attaches a signature; a second signature from the same signer replaces the first.
    pub fn sign_with(&mut self, signer: &Address, signature: Vec<u8>) {
        let signer = signer.to_string();
        match self.signatures.iter_mut().find(|s| s.signer == signer) {
            Some(entry) => entry.signature = signature,
            None => self.signatures.push(SignatureEntry { signer, signature }),
        }
    }
}

impl Client {
    /// Rebuilds a call of `method` from a serialized envelope.
    ///
    /// The envelope must target this client's contract and network, and its payload
    /// must be an Invoke of `method` whose arguments fit the signature.
    pub fn from_json(&self, method: &str, json: &str) -> Result<PendingCall> {
        self.pending(method, Envelope::from_json(json)?)
    }

    pub fn pending(&self, method: &str, envelope: Envelope) -> Result<PendingCall> {
        let sig = self.table().lookup(method)?;
        let target = self.target();

        if envelope.version != ENVELOPE_VERSION {
            return Err(Error::Envelope(format!("unsupported envelope version {}", envelope.version)));
        }
        if envelope.method != method {
            return Err(Error::Envelope(format!("envelope calls '{}', not '{}'", envelope.method, method)));
        }
        if envelope.network_passphrase != target.network_passphrase {
            return Err(Error::Envelope("envelope was built for another network".into()));
        }
        if envelope.contract_id != target.contract_id.as_str() {
            return Err(Error::Envelope(format!("envelope targets contract {}", envelope.contract_id)));
        }
        for entry in &envelope.signatures {
            Address::parse(&entry.signer)
                .map_err(|e| Error::Envelope(format!("signer '{}': {}", entry.signer, e)))?;
        }

        let args = {
            let frame = RpcFrame::from_bytes(&envelope.payload)
                .map_err(|e| Error::Envelope(format!("payload: {}", e)))?;
            let RpcFrame::Invoke(invoke) = frame else {
                return Err(Error::Envelope("payload is not an Invoke frame".into()));
            };
            if invoke.seq != envelope.seq
                || invoke.method != envelope.method
                || invoke.network != envelope.network_passphrase
                || invoke.contract != envelope.contract_id
            {
                return Err(Error::Envelope("payload disagrees with the envelope header".into()));
            }
            ledgerrpc::decode_args(invoke.args, sig.param_types())
                .map_err(|e| Error::Envelope(format!("arguments: {}", e)))?
        };

        Ok(PendingCall { client: self.clone(), method: method.to_string(), envelope, args })
    }
}

/// A call rebuilt from an envelope, waiting for signatures and submission.
#[derive(Debug, Clone)]
pub struct PendingCall {
    client: Client,
    method: String,
    envelope: Envelope,
    args: Vec<Value>,
}

impl PendingCall {
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Arguments decoded from the payload, in parameter order.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn sign_with(mut self, signer: &Address, signature: impl Into<Vec<u8>>) -> Self {
        self.envelope.sign_with(signer, signature.into());
        self
    }

    pub fn to_json(&self) -> Result<String> {
        self.envelope.to_json()
    }

    /// Sends the signed payload. The ledger either settles it at once or acknowledges
    /// it as pending; nothing here waits or retries.
    #[instrument(skip(self), fields(method = %self.method, seq = self.envelope.seq))]
    pub async fn submit(&self) -> Result<Submission> {
        if !self.envelope.is_signed() {
            return Err(Error::Envelope("envelope carries no signatures".into()));
        }
        let signatures: Vec<(String, Vec<u8>)> = self
            .envelope
            .signatures
            .iter()
            .map(|s| (s.signer.clone(), s.signature.clone()))
            .collect();
        let frame = SubmitEncoder::new(&self.envelope.payload, &signatures).to_bytes()?;

        debug!(signatures = signatures.len(), "submitting");
        let answer = self.client.transport().submit(&frame).await?;
        settle_submission(&self.client, &self.method, self.envelope.seq, &answer)
    }
}

/// Result of a submission or a poll.
#[derive(Debug, Clone)]
pub enum Submission {
    /// The call settled; the decoded return value.
    Confirmed(Value),
    /// Accepted but not yet settled.
    Pending(SubmittedCall),
}

impl Submission {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Confirmed(v) => Some(v),
            Self::Pending(_) => None,
        }
    }
}

/// A submission the ledger has acknowledged but not settled.
#[derive(Debug, Clone)]
pub struct SubmittedCall {
    client: Client,
    method: String,
    seq: u64,
    hash: String,
}

impl SubmittedCall {
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Asks the ledger once for the outcome.
    #[instrument(skip(self), fields(method = %self.method, hash = %self.hash))]
    pub async fn poll(&self) -> Result<Submission> {
        let frame = Poll::new(&self.hash).to_bytes()?;
        let answer = self.client.transport().poll(&frame).await?;
        settle_submission(&self.client, &self.method, self.seq, &answer)
    }
}

fn settle_submission(client: &Client, method: &str, seq: u64, answer: &[u8]) -> Result<Submission> {
    let sig = client.table().lookup(method)?;
    match RpcFrame::from_bytes(answer)? {
        RpcFrame::Reply(reply) => Ok(Submission::Confirmed(client.settle(sig, seq, reply)?)),
        RpcFrame::Pending(pending) => {
            check_seq(seq, pending.seq)?;
            debug!(hash = pending.hash, "pending");
            Ok(Submission::Pending(SubmittedCall {
                client: client.clone(),
                method: method.to_string(),
                seq,
                hash: pending.hash.to_string(),
            }))
        }
        _ => Err(protocol("expected a Reply or Pending frame")),
    }
}
