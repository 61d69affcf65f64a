//! # Deployment
//!
//! Installs a new instance of an uploaded program and binds a client to it.

use std::sync::Arc;

use ledgerrpc::Address;
use ledgerrpc::AddressKind;
use ledgerrpc::Deploy;
use ledgerrpc::Deployed;
use ledgerrpc::RpcFrame;
use ledgerrpc::Schema;
use tracing::debug;
use tracing::instrument;
use tracing::warn;

use crate::client::Client;
use crate::client::check_seq;
use crate::client::protocol;
use crate::config::DeployOptions;
use crate::config::Target;
use crate::error::Error;
use crate::error::Result;
use crate::network::DEFAULT_RPC_URL;
use crate::network::NetworkRegistry;
use crate::transport::Transport;

/// Deploys on a network named by passphrase or by a well-known name.
pub async fn deploy(schema: Arc<Schema>, options: DeployOptions, transport: Arc<dyn Transport>) -> Result<Client> {
    deploy_with_registry(schema, options, &NetworkRegistry::empty(), transport).await
}

/// Deploys, resolving the network name through `registry` first.
///
/// Every failure, local or remote, is reported as `Error::Deployment`; no client is
/// returned unless the ledger confirms the new contract.
#[instrument(skip_all, fields(network = options.network.as_deref()))]
pub async fn deploy_with_registry(
    schema: Arc<Schema>,
    options: DeployOptions,
    registry: &NetworkRegistry,
    transport: Arc<dyn Transport>,
) -> Result<Client> {
    install(schema, &options, registry, transport).await.map_err(|e| {
        warn!(error = %e, "deployment failed");
        e.into_deployment()
    })
}

async fn install(
    schema: Arc<Schema>,
    options: &DeployOptions,
    registry: &NetworkRegistry,
    transport: Arc<dyn Transport>,
) -> Result<Client> {
    let passphrase = options.passphrase(registry)?;
    let wasm_hash = options.wasm_hash()?;
    let source = options.source_address()?;
    let salt = options.salt.unwrap_or_else(rand::random);

    let seq: u64 = rand::random();
    let frame = Deploy {
        seq,
        network: &passphrase,
        wasm_hash: &wasm_hash,
        salt: &salt,
        source: source.as_ref().map(|a| a.as_str()),
    }
    .to_bytes()?;

    debug!(seq, "dispatched");
    let answer = transport.deploy(&frame).await?;
    let RpcFrame::Deployed(Deployed { seq: answered, status }) = RpcFrame::from_bytes(&answer)? else {
        return Err(protocol("expected a Deployed frame"));
    };
    check_seq(seq, answered)?;

    let contract = status.map_err(|reason| Error::RemoteExecution {
        method: "deploy".to_string(),
        reason,
        name: None,
    })?;
    let contract_id = Address::parse(contract)
        .map_err(|e| protocol(format!("ledger returned a bad contract id: {}", e)))?;
    if contract_id.kind() != AddressKind::Contract {
        return Err(protocol(format!("ledger returned an account id: {}", contract_id)));
    }
    debug!(contract = %contract_id, "deployed");

    let target = Target {
        network_passphrase: passphrase,
        contract_id,
        rpc_url: options.rpc_url.clone().unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
    };
    Ok(Client::from_target(schema, target, options.mode, source, transport))
}
