//! Deploying new contract instances.

use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use ledgerbind::contracts::profit_token;
use ledgerbind::mock::MockLedger;
use ledgerbind::network::TESTNET_PASSPHRASE;
use ledgerbind::transport::Offline;
use ledgerbind::Args;
use ledgerbind::DeployOptions;
use ledgerbind::Error;
use ledgerbind::Mode;
use ledgerbind::TransportError;
use ledgerbind::Value;
use ledgerrpc::AddressKind;
use ledgerrpc::FailureReason;
use tracing_subscriber::EnvFilter;

const WASM_HASH: [u8; 32] = [0x5A; 32];
const TOKEN_ID: &str = "CCFU4LOQZK2TWIQIN6FLDERPAAJ2U2J6Q6DMTPUADGZTBHBFT5XENNLF";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ledgerbind=debug")),
        )
        .with_test_writer()
        .try_init();
}

fn ledger() -> Result<Arc<MockLedger>> {
    init_tracing();
    let ledger = MockLedger::new(TESTNET_PASSPHRASE)?;
    ledger.install(WASM_HASH);
    Ok(Arc::new(ledger))
}

#[tokio::test]
async fn test_deploy_returns_bound_client() -> Result<()> {
    let ledger = ledger()?;
    let options = DeployOptions::new(WASM_HASH).network("testnet").salt([1; 32]);
    let client = profit_token::deploy(options, ledger.clone()).await?;

    let contract = client.target().contract_id.clone();
    assert_eq!(contract.kind(), AddressKind::Contract);
    assert_ne!(contract.as_str(), TOKEN_ID);
    assert_eq!(client.target().network_passphrase, TESTNET_PASSPHRASE);
    assert!(ledger.is_registered(contract.as_str()));

    let supply = client.call("total_supply", Args::new()).await?.into_value().context("value")?;
    assert_eq!(supply, Value::Int(0));
    Ok(())
}

#[tokio::test]
async fn test_deploy_with_explicit_passphrase() -> Result<()> {
    let ledger = ledger()?;
    let schema = profit_token::schema()?;
    let options = DeployOptions::new(WASM_HASH).network_passphrase(TESTNET_PASSPHRASE);
    let client = ledgerbind::deploy(schema, options, ledger.clone()).await?;
    assert_eq!(client.methods().count(), 10);
    Ok(())
}

#[tokio::test]
async fn test_random_salts_give_distinct_contracts() -> Result<()> {
    let ledger = ledger()?;
    let first = profit_token::deploy(DeployOptions::new(WASM_HASH).network("testnet"), ledger.clone()).await?;
    let second = profit_token::deploy(DeployOptions::new(WASM_HASH).network("testnet"), ledger.clone()).await?;
    assert_ne!(first.target().contract_id, second.target().contract_id);
    Ok(())
}

#[tokio::test]
async fn test_deploy_rejections_return_no_client() -> Result<()> {
    let ledger = ledger()?;

    let options = DeployOptions::new(WASM_HASH).network("testnet").salt([2; 32]);
    profit_token::deploy(options.clone(), ledger.clone()).await?;
    match profit_token::deploy(options, ledger.clone()).await {
        Err(Error::Deployment(cause)) => assert!(
            matches!(*cause, Error::RemoteExecution { reason: FailureReason::Trapped { .. }, .. }),
            "{:?}",
            cause
        ),
        other => panic!("expected a deployment error, got {:?}", other),
    }

    let unknown = DeployOptions::new([0u8; 32]).network("testnet");
    let err = profit_token::deploy(unknown, ledger.clone()).await.unwrap_err();
    assert!(matches!(err, Error::Deployment(_)), "{:?}", err);
    Ok(())
}

#[tokio::test]
async fn test_deploy_local_failures_send_nothing() -> Result<()> {
    let ledger = ledger()?;

    let short_hash = DeployOptions::new(vec![1u8; 4]).network("testnet");
    let err = profit_token::deploy(short_hash, ledger.clone()).await.unwrap_err();
    assert!(matches!(err, Error::Deployment(ref c) if matches!(**c, Error::Configuration(_))), "{:?}", err);

    let nowhere = DeployOptions::new(WASM_HASH).network("devnet");
    let err = profit_token::deploy(nowhere, ledger.clone()).await.unwrap_err();
    assert!(matches!(err, Error::Deployment(ref c) if matches!(**c, Error::Configuration(_))), "{:?}", err);

    assert_eq!(ledger.frames_received(), 0);
    Ok(())
}

#[tokio::test]
async fn test_deploy_needs_a_capable_transport() -> Result<()> {
    init_tracing();
    let options = DeployOptions::new(WASM_HASH).network("testnet");
    let err = profit_token::deploy(options, Arc::new(Offline)).await.unwrap_err();
    assert_eq!(err, Error::Deployment(Box::new(Error::Transport(TransportError::Unsupported("deploy")))));
    Ok(())
}

#[tokio::test]
async fn test_deployed_client_keeps_mode() -> Result<()> {
    let ledger = ledger()?;
    let options = DeployOptions::new(WASM_HASH).network("testnet").mode(Mode::Disconnected);
    let client = profit_token::deploy(options, ledger.clone()).await?;

    let frames = ledger.frames_received();
    let envelope = client.call("total_supply", Args::new()).await?.into_envelope().context("envelope")?;
    assert_eq!(envelope.contract_id, client.target().contract_id.as_str());
    assert_eq!(ledger.frames_received(), frames);
    Ok(())
}
