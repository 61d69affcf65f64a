//! # Profit Token Binding
//!
//! Fungible token minted to DAO investors: balances, allowances and an admin.

use std::sync::Arc;
use std::sync::OnceLock;

use ledgerrpc::Schema;
use ledgerrpc::SchemaError;

use crate::client::Client;
use crate::config::ClientOptions;
use crate::config::DeployOptions;
use crate::deploy::deploy_with_registry;
use crate::error::Error;
use crate::error::Result;
use crate::network::NetworkEntry;
use crate::network::NetworkRegistry;
use crate::network::TESTNET_PASSPHRASE;
use crate::transport::Transport;

/// Schema entries, one base64 XDR blob per function.
pub const SPEC: &[&str] = &[
    "AAAAAAAAAAAAAAAOaW5pdGlhbGl6ZV9wdGMAAAAAAAEAAAAAAAAABWFkbWluAAAAAAAAEwAAAAA=",
    "AAAAAAAAAAAAAAAJZ2V0X2FkbWluAAAAAAAAAAAAAAEAAAAT",
    "AAAAAAAAAAAAAAAEbWludAAAAAIAAAAAAAAAAnRvAAAAAAATAAAAAAAAAAZhbW91bnQAAAAAAAsAAAAA",
    "AAAAAAAAAAAAAAAEYnVybgAAAAIAAAAAAAAABGZyb20AAAATAAAAAAAAAAZhbW91bnQAAAAAAAsAAAAA",
    "AAAAAAAAAAAAAAAIdHJhbnNmZXIAAAADAAAAAAAAAARmcm9tAAAAEwAAAAAAAAACdG8AAAAAABMAAAAAAAAABmFtb3VudAAAAAAACwAAAAA=",
    "AAAAAAAAAAAAAAAHYXBwcm92ZQAAAAADAAAAAAAAAAVvd25lcgAAAAAAABMAAAAAAAAAB3NwZW5kZXIAAAAAEwAAAAAAAAAGYW1vdW50AAAAAAALAAAAAA==",
    "AAAAAAAAAAAAAAAJYWxsb3dhbmNlAAAAAAAAAgAAAAAAAAAFb3duZXIAAAAAAAATAAAAAAAAAAdzcGVuZGVyAAAAABMAAAABAAAACw==",
    "AAAAAAAAAAAAAAANdHJhbnNmZXJfZnJvbQAAAAAAAAQAAAAAAAAAB3NwZW5kZXIAAAAAEwAAAAAAAAAEZnJvbQAAABMAAAAAAAAAAnRvAAAAAAATAAAAAAAAAAZhbW91bnQAAAAAAAsAAAAA",
    "AAAAAAAAAAAAAAAHYmFsYW5jZQAAAAABAAAAAAAAAAN3aG8AAAAAEwAAAAEAAAAL",
    "AAAAAAAAAAAAAAAMdG90YWxfc3VwcGx5AAAAAAAAAAEAAAAL",
];

pub static NETWORKS: NetworkRegistry = NetworkRegistry::new(&[NetworkEntry {
    name: "testnet",
    passphrase: TESTNET_PASSPHRASE,
    contract_id: "CCFU4LOQZK2TWIQIN6FLDERPAAJ2U2J6Q6DMTPUADGZTBHBFT5XENNLF",
}]);

/// Remote error codes and their names. The contract declares none.
pub const ERRORS: &[(u32, &str)] = &[];

static SCHEMA: OnceLock<std::result::Result<Arc<Schema>, SchemaError>> = OnceLock::new();

/// The decoded schema, shared by every client of this binding.
pub fn schema() -> Result<Arc<Schema>> {
    SCHEMA.get_or_init(|| Schema::from_base64(SPEC).map(Arc::new)).clone().map_err(Error::from)
}

pub fn client(options: &ClientOptions, transport: Arc<dyn Transport>) -> Result<Client> {
    let client = Client::with_registry(schema()?, options, &NETWORKS, transport)?;
    Ok(client.with_error_names(ERRORS.iter().copied()))
}

/// Installs a new instance of the profit-token program and binds a client to it.
pub async fn deploy(options: DeployOptions, transport: Arc<dyn Transport>) -> Result<Client> {
    let schema = schema().map_err(Error::into_deployment)?;
    let client = deploy_with_registry(schema, options, &NETWORKS, transport).await?;
    Ok(client.with_error_names(ERRORS.iter().copied()))
}
