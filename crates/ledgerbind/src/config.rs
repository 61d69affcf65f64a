//! # Client Configuration
//!
//! Options select where calls go: a network passphrase, a contract id and an endpoint.
//! They come from code (builder methods), from JSON, or from `LEDGERBIND_*` environment
//! variables, and are resolved against a binding's `NetworkRegistry`.

use serde::Deserialize;
use serde::Serialize;

use ledgerrpc::Address;
use ledgerrpc::AddressKind;

use crate::error::Error;
use crate::error::Result;
use crate::network::DEFAULT_RPC_URL;
use crate::network::NetworkEntry;
use crate::network::NetworkRegistry;
use crate::network::well_known_passphrase;

pub const ENV_NETWORK: &str = "LEDGERBIND_NETWORK";
pub const ENV_RPC_URL: &str = "LEDGERBIND_RPC_URL";
pub const ENV_CONTRACT_ID: &str = "LEDGERBIND_CONTRACT_ID";
pub const ENV_NETWORK_PASSPHRASE: &str = "LEDGERBIND_NETWORK_PASSPHRASE";
pub const ENV_SOURCE: &str = "LEDGERBIND_SOURCE";

/// Whether calls are sent, or only prepared for signing elsewhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Connected,
    Disconnected,
}

/// Caller-supplied options for a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientOptions {
    /// Name to look up in the binding's registry.
    pub network: Option<String>,
    /// Overrides the passphrase found in the registry.
    pub network_passphrase: Option<String>,
    /// Overrides the contract id found in the registry.
    pub contract_id: Option<String>,
    pub rpc_url: Option<String>,
    /// Account that will sign envelopes built by this client.
    pub source: Option<String>,
    pub mode: Mode,
}

/// Where a client sends its calls, fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub network_passphrase: String,
    pub contract_id: Address,
    pub rpc_url: String,
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn network(mut self, name: impl Into<String>) -> Self {
        self.network = Some(name.into());
        self
    }

    pub fn network_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.network_passphrase = Some(passphrase.into());
        self
    }

    pub fn contract_id(mut self, id: impl Into<String>) -> Self {
        self.contract_id = Some(id.into());
        self
    }

    pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    pub fn source(mut self, account: impl Into<String>) -> Self {
        self.source = Some(account.into());
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn disconnected(self) -> Self {
        self.mode(Mode::Disconnected)
    }

    /// Reads the `LEDGERBIND_*` variables; unset or empty ones are left as `None`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            network: get(ENV_NETWORK),
            network_passphrase: get(ENV_NETWORK_PASSPHRASE),
            contract_id: get(ENV_CONTRACT_ID),
            rpc_url: get(ENV_RPC_URL),
            source: get(ENV_SOURCE),
            mode: Mode::Connected,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Configuration(format!("invalid options: {}", e)))
    }

    /// Resolves the call target.
    ///
    /// Explicit values win over the registry. A network name is only required to be in
    /// the registry when no explicit contract id is given; otherwise it must at least be
    /// a well-known name.
    pub fn resolve(&self, registry: &NetworkRegistry) -> Result<Target> {
        let entry = match (&self.network, &self.contract_id) {
            (Some(name), None) => Some(registry.lookup(name)?),
            (Some(name), Some(_)) => known_network(name, registry)?,
            (None, _) => None,
        };

        let contract_id = match (&self.contract_id, entry) {
            (Some(id), _) => parse_contract(id)?,
            (None, Some(entry)) => parse_contract(entry.contract_id)?,
            (None, None) => {
                return Err(Error::Configuration(
                    "no target: name a registered network or give a contract id".into(),
                ));
            }
        };

        let network_passphrase = resolve_passphrase(
            self.network.as_deref(),
            self.network_passphrase.as_deref(),
            entry,
        )?;

        Ok(Target {
            network_passphrase,
            contract_id,
            rpc_url: self.rpc_url.clone().unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
        })
    }

    /// The signing account, validated.
    pub fn source_address(&self) -> Result<Option<Address>> {
        self.source.as_deref().map(parse_source).transpose()
    }
}

/// Options for installing a new contract instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployOptions {
    pub network: Option<String>,
    pub network_passphrase: Option<String>,
    pub rpc_url: Option<String>,
    /// Hash of the uploaded program code; 32 bytes.
    pub wasm_hash: Vec<u8>,
    /// Chosen at random when absent.
    pub salt: Option<[u8; 32]>,
    pub source: Option<String>,
    /// Mode of the client returned on success.
    pub mode: Mode,
}

impl DeployOptions {
    pub fn new(wasm_hash: impl Into<Vec<u8>>) -> Self {
        Self { wasm_hash: wasm_hash.into(), ..Self::default() }
    }

    pub fn network(mut self, name: impl Into<String>) -> Self {
        self.network = Some(name.into());
        self
    }

    pub fn network_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.network_passphrase = Some(passphrase.into());
        self
    }

    pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    pub fn salt(mut self, salt: [u8; 32]) -> Self {
        self.salt = Some(salt);
        self
    }

    pub fn source(mut self, account: impl Into<String>) -> Self {
        self.source = Some(account.into());
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Passphrase of the network to deploy on: explicit, registered, or well known.
    pub fn passphrase(&self, registry: &NetworkRegistry) -> Result<String> {
        let entry = match self.network.as_deref() {
            Some(name) => known_network(name, registry)?,
            None => None,
        };
        resolve_passphrase(self.network.as_deref(), self.network_passphrase.as_deref(), entry)
    }

    pub fn wasm_hash(&self) -> Result<[u8; 32]> {
        <[u8; 32]>::try_from(self.wasm_hash.as_slice()).map_err(|_| {
            Error::Configuration(format!("wasm hash must be 32 bytes, got {}", self.wasm_hash.len()))
        })
    }

    pub fn source_address(&self) -> Result<Option<Address>> {
        self.source.as_deref().map(parse_source).transpose()
    }
}

/// Registry entry for `name`; a miss is only allowed for well-known network names.
fn known_network(name: &str, registry: &NetworkRegistry) -> Result<Option<&'static NetworkEntry>> {
    match registry.get(name) {
        Some(entry) => Ok(Some(entry)),
        None if well_known_passphrase(name).is_some() => Ok(None),
        None => Err(Error::Configuration(format!(
            "network '{}' is neither registered nor well known",
            name
        ))),
    }
}

fn resolve_passphrase(
    network: Option<&str>,
    explicit: Option<&str>,
    entry: Option<&NetworkEntry>,
) -> Result<String> {
    explicit
        .or_else(|| entry.map(|e| e.passphrase))
        .or_else(|| network.and_then(well_known_passphrase))
        .map(String::from)
        .ok_or_else(|| match network {
            Some(name) => Error::Configuration(format!("no passphrase known for network '{}'", name)),
            None => Error::Configuration("no network or passphrase given".into()),
        })
}

fn parse_contract(id: &str) -> Result<Address> {
    let address = Address::parse(id)
        .map_err(|e| Error::Configuration(format!("contract id '{}': {}", id, e)))?;
    if address.kind() != AddressKind::Contract {
        return Err(Error::Configuration(format!("'{}' is an account, not a contract", id)));
    }
    Ok(address)
}

fn parse_source(account: &str) -> Result<Address> {
    Address::parse(account).map_err(|e| Error::Configuration(format!("source '{}': {}", account, e)))
}
