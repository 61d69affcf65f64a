//! # DAO Binding
//!
//! Investment DAO: funding rounds, proposals, votes and profit distributions.
//! The schema also carries the profit-token functions the DAO program links in.

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
    "AAAAAAAAAAAAAAAOaW5pdGlhbGl6ZV9kYW8AAAAAAAUAAAAAAAAABG5hbWUAAAARAAAAAAAAAAtkZXNjcmlwdGlvbgAAAAARAAAAAAAAAAxmdW5kaW5nX2dvYWwAAAAGAAAAAAAAAAdjcmVhdG9yAAAAABMAAAAAAAAAEXRva2VuX2NvbnRyYWN0X2lkAAAAAAAAEwAAAAA=",
    "AAAAAAAAAAAAAAAGaW52ZXN0AAAAAAACAAAAAAAAAAhpbnZlc3RvcgAAABMAAAAAAAAABmFtb3VudAAAAAAABgAAAAA=",
    "AAAAAAAAAAAAAAAPY3JlYXRlX3Byb3Bvc2FsAAAAAAEAAAAAAAAAB2RldGFpbHMAAAAAEQAAAAEAAAAG",
    "AAAAAAAAAAAAAAAEdm90ZQAAAAMAAAAAAAAABXZvdGVyAAAAAAAAEwAAAAAAAAALcHJvcG9zYWxfaWQAAAAABgAAAAAAAAAHc3VwcG9ydAAAAAABAAAAAA==",
    "AAAAAAAAAAAAAAAQZXhlY3V0ZV9wcm9wb3NhbAAAAAEAAAAAAAAAC3Byb3Bvc2FsX2lkAAAAAAYAAAAA",
    "AAAAAAAAAAAAAAATcmVjb3JkX2Rpc3RyaWJ1dGlvbgAAAAACAAAAAAAAAAl0aW1lc3RhbXAAAAAAAAAGAAAAAAAAAAZhbW91bnQAAAAAAAYAAAAA",
    "AAAAAAAAAAAAAAAYZ2V0X2Rpc3RyaWJ1dGlvbl9oaXN0b3J5AAAAAAAAAAEAAAPqAAAD7QAAAAIAAAAGAAAABg==",
    "AAAAAAAAAAAAAAATZ2V0X3Byb3Bvc2Fsc19jb3VudAAAAAAAAAAAAQAAAAY=",
    "AAAAAAAAAAAAAAAUZ2V0X3Byb3Bvc2FsX2RldGFpbHMAAAABAAAAAAAAAAtwcm9wb3NhbF9pZAAAAAAGAAAAAQAAABE=",
    "AAAAAAAAAAAAAAASZ2V0X3Byb3Bvc2FsX3ZvdGVzAAAAAAABAAAAAAAAAAtwcm9wb3NhbF9pZAAAAAAGAAAAAQAAAAs=",
    "AAAAAAAAAAAAAAAVZ2V0X3Byb3Bvc2FsX2V4ZWN1dGVkAAAAAAAAAQAAAAAAAAALcHJvcG9zYWxfaWQAAAAABgAAAAEAAAAB",
    "AAAAAAAAAAAAAAAQZ2V0X3ZvdGluZ19wb3dlcgAAAAEAAAAAAAAABXZvdGVyAAAAAAAAEwAAAAEAAAAL",
    "AAAAAAAAAAAAAAAQZ2V0X3RvdGFsX3JhaXNlZAAAAAAAAAABAAAABg==",
    "AAAAAAAAAAAAAAAXaXNfZnVuZGluZ19nb2FsX3JlYWNoZWQAAAAAAAAAAAEAAAAB",
    "AAAAAAAAAAAAAAANZ2V0X2ludmVzdG9ycwAAAAAAAAAAAAABAAAD6gAAABM=",
    "AAAAAAAAAAAAAAASZ2V0X3Rva2VuX2NvbnRyYWN0AAAAAAAAAAAAAQAAABM=",
    "AAAAAAAAAAAAAAAPZ2V0X2ludmVzdG1lbnRzAAAAAAAAAAABAAAD7AAAABMAAAAG",
    "AAAAAAAAAAAAAAAIZ2V0X25hbWUAAAAAAAAAAQAAABE=",
    "AAAAAAAAAAAAAAAPZ2V0X2Rlc2NyaXB0aW9uAAAAAAAAAAABAAAAEQ==",
    "AAAAAAAAAAAAAAAQZ2V0X2Z1bmRpbmdfZ29hbAAAAAAAAAABAAAABg==",
    "AAAAAAAAAAAAAAALZ2V0X2NyZWF0b3IAAAAAAAAAAAEAAAAT",
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
    contract_id: "CCS6L527IZSNIOGLAYPJLGJXNZ7XY3YMUY2EVRDXA7SOFKS2PGPG56RV",
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

/// Installs a new instance of the DAO program and binds a client to it.
pub async fn deploy(options: DeployOptions, transport: Arc<dyn Transport>) -> Result<Client> {
    let schema = schema().map_err(Error::into_deployment)?;
    let client = deploy_with_registry(schema, options, &NETWORKS, transport).await?;
    Ok(client.with_error_names(ERRORS.iter().copied()))
}
