//! # Network Registry
//!
//! Maps a network name to the passphrase that identifies it and the contract id a
//! binding was deployed under there. Registries are compile-time constants carried by
//! generated bindings.

use crate::error::Error;
use crate::error::Result;

pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";
pub const FUTURENET_PASSPHRASE: &str = "Test SDF Future Network ; October 2022";
pub const MAINNET_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";
pub const STANDALONE_PASSPHRASE: &str = "Standalone Network ; February 2017";

/// Endpoint used when options do not name one.
pub const DEFAULT_RPC_URL: &str = "http://localhost:8000/soroban/rpc";

const WELL_KNOWN: &[(&str, &str)] = &[
    ("testnet", TESTNET_PASSPHRASE),
    ("futurenet", FUTURENET_PASSPHRASE),
    ("mainnet", MAINNET_PASSPHRASE),
    ("public", MAINNET_PASSPHRASE),
    ("standalone", STANDALONE_PASSPHRASE),
];

/// Passphrase of a public network, by its conventional name.
pub fn well_known_passphrase(name: &str) -> Option<&'static str> {
    WELL_KNOWN.iter().find(|(n, _)| *n == name).map(|(_, p)| *p)
}

/// One deployment of a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkEntry {
    pub name: &'static str,
    pub passphrase: &'static str,
    pub contract_id: &'static str,
}

/// A fixed set of deployments, looked up by network name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkRegistry {
    entries: &'static [NetworkEntry],
}

impl NetworkRegistry {
    pub const fn new(entries: &'static [NetworkEntry]) -> Self {
        Self { entries }
    }

    /// A registry with no deployments; targets must be given explicitly.
    pub const fn empty() -> Self {
        Self { entries: &[] }
    }

    pub fn get(&self, name: &str) -> Option<&'static NetworkEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Like `get`, but an unknown name is a configuration error.
    pub fn lookup(&self, name: &str) -> Result<&'static NetworkEntry> {
        self.get(name).ok_or_else(|| {
            Error::Configuration(format!(
                "network '{}' is not in the registry (known: {})",
                name,
                self.names().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.entries.iter().map(|e| e.name)
    }

    pub fn entries(&self) -> &'static [NetworkEntry] {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::empty()
    }
}
