use std::sync::Arc;

use ledgerrpc::FailureReason;
use ledgerrpc::Pending;
use ledgerrpc::ReplyErrEncoder;
use ledgerrpc::ReplyOkEncoder;
use ledgerrpc::RpcError;
use ledgerrpc::RpcFrame;
use ledgerrpc::TypeDesc;

use crate::contracts::dao;
use crate::contracts::profit_token;
use crate::envelope::ENVELOPE_VERSION;
use crate::mock::CallTransport;
use crate::network::FUTURENET_PASSPHRASE;
use crate::network::TESTNET_PASSPHRASE;
use crate::network::well_known_passphrase;
use crate::transport;
use crate::transport::Offline;
use crate::*;

// ============================================================================
//  FIXTURES
// ============================================================================

const TOKEN_ID: &str = "CCFU4LOQZK2TWIQIN6FLDERPAAJ2U2J6Q6DMTPUADGZTBHBFT5XENNLF";
const DAO_ID: &str = "CCS6L527IZSNIOGLAYPJLGJXNZ7XY3YMUY2EVRDXA7SOFKS2PGPG56RV";

static SANDBOX: NetworkRegistry = NetworkRegistry::new(&[
    NetworkEntry { name: "testnet", passphrase: TESTNET_PASSPHRASE, contract_id: TOKEN_ID },
    NetworkEntry { name: "sandbox", passphrase: "Sandbox ; 2026", contract_id: DAO_ID },
]);

fn account(fill: char) -> Address {
    Address::parse(&format!("G{}", fill.to_string().repeat(55))).expect("valid address")
}

fn token_client(transport: Arc<dyn Transport>) -> Client {
    profit_token::client(&ClientOptions::new().network("testnet"), transport).expect("client")
}

fn offline_token_client() -> Client {
    let options = ClientOptions::new().network("testnet").source(account('S').to_string()).disconnected();
    profit_token::client(&options, Arc::new(Offline)).expect("client")
}

fn invoke_seq(frame: &[u8]) -> u64 {
    match RpcFrame::from_bytes(frame).expect("frame") {
        RpcFrame::Invoke(invoke) => invoke.seq,
        other => panic!("expected Invoke, got {:?}", other),
    }
}

/// Replies to every invoke with `value` encoded as `ty`.
fn replying(
    value: Value,
    ty: TypeDesc,
) -> Arc<CallTransport<impl Fn(&[u8]) -> transport::Result<Vec<u8>> + Send + Sync + 'static>> {
    Arc::new(CallTransport::new(move |frame: &[u8]| {
        let result = ledgerrpc::encode(&value, &ty).expect("encode result");
        Ok(ReplyOkEncoder::new(invoke_seq(frame), &result).to_bytes().expect("reply"))
    }))
}

fn failing(
    reason: FailureReason,
) -> Arc<CallTransport<impl Fn(&[u8]) -> transport::Result<Vec<u8>> + Send + Sync + 'static>> {
    Arc::new(CallTransport::new(move |frame: &[u8]| {
        Ok(ReplyErrEncoder::new(invoke_seq(frame), &reason).to_bytes().expect("reply"))
    }))
}

// ============================================================================
//  1. METHOD TABLE & ARGUMENTS
// ============================================================================

#[test]
fn test_table_profit_token() {
    let schema = profit_token::schema().expect("schema");
    let table = MethodTable::build(&schema);
    assert_eq!(table.len(), 10);
    assert_eq!(
        table.names().collect::<Vec<_>>(),
        [
            "initialize_ptc", "get_admin", "mint", "burn", "transfer", "approve", "allowance",
            "transfer_from", "balance", "total_supply",
        ]
    );
    assert_eq!(table.get("balance").expect("balance").to_string(), "balance(who: address) -> i128");
    assert!(table.get("nope").is_none());
    assert_eq!(table.lookup("nope").unwrap_err(), Error::UnknownMethod("nope".into()));
}

#[test]
fn test_table_dao() {
    let schema = dao::schema().expect("schema");
    let table = MethodTable::build(&schema);
    assert_eq!(table.len(), 31);
    assert_eq!(table.iter().next().map(|m| m.name.as_str()), Some("initialize_dao"));
    assert_eq!(
        table.get("get_distribution_history").expect("method").returns.to_string(),
        "vec<(u64, u64)>"
    );
    assert_eq!(table.get("get_investments").expect("method").returns.to_string(), "map<address, u64>");
    assert_eq!(
        table.get("vote").expect("method").to_string(),
        "vote(voter: address, proposal_id: u64, support: bool) -> void"
    );
    // The profit-token functions are linked into the DAO program.
    assert!(table.get("total_supply").is_some());
    assert!(dao::schema().expect("schema").errors().is_empty());
}

#[test]
fn test_schema_is_shared() {
    let a = profit_token::schema().expect("schema");
    let b = profit_token::schema().expect("schema");
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_args_ordering() {
    let schema = profit_token::schema().expect("schema");
    let sig = schema.method("transfer").expect("transfer");
    let (a, b) = (account('A'), account('B'));

    // Callers may name arguments in any order.
    let args = Args::new().arg("amount", 5i128).arg("to", &b).arg("from", &a);
    let ordered = table::order_args(sig, &args).expect("ordered");
    assert_eq!(ordered, [&Value::from(&a), &Value::from(&b), &Value::Int(5)]);
}

#[test]
fn test_args_errors_name_the_parameter() {
    let schema = profit_token::schema().expect("schema");
    let sig = schema.method("transfer").expect("transfer");
    let (a, b) = (account('A'), account('B'));

    let missing = Args::new().arg("from", &a).arg("to", &b);
    assert_eq!(
        table::encode_args(sig, &missing).unwrap_err(),
        Error::Argument { method: "transfer".into(), error: ArgumentError::Missing("amount".into()) }
    );

    let unexpected = Args::new().arg("from", &a).arg("to", &b).arg("amount", 1i128).arg("memo", "hi");
    assert_eq!(
        table::encode_args(sig, &unexpected).unwrap_err(),
        Error::Argument { method: "transfer".into(), error: ArgumentError::Unexpected("memo".into()) }
    );

    let duplicate = Args::new().arg("from", &a).arg("from", &b).arg("to", &b).arg("amount", 1i128);
    assert_eq!(
        table::encode_args(sig, &duplicate).unwrap_err(),
        Error::Argument { method: "transfer".into(), error: ArgumentError::Duplicate("from".into()) }
    );
}

#[test]
fn test_args_positional_and_collect() {
    let schema = profit_token::schema().expect("schema");
    let sig = schema.method("approve").expect("approve");
    let (a, b) = (account('A'), account('B'));

    let positional = Args::positional(sig, [Value::from(&a), Value::from(&b), Value::Int(9)]);
    let collected: Args = [("owner", Value::from(&a)), ("spender", Value::from(&b)), ("amount", Value::Int(9))]
        .into_iter()
        .collect();
    assert_eq!(positional, collected);
    assert_eq!(
        table::encode_args(sig, &positional).expect("encode"),
        table::encode_args(sig, &collected).expect("encode")
    );
}

#[test]
fn test_args_codec_errors() {
    let schema = profit_token::schema().expect("schema");
    let sig = schema.method("balance").expect("balance");
    let err = table::encode_args(sig, &Args::new().arg("who", 7u32)).unwrap_err();
    assert!(matches!(err, Error::Codec(RpcError::TypeMismatch { .. })), "{:?}", err);
}

// ============================================================================
//  2. NETWORK REGISTRY & OPTIONS
// ============================================================================

#[test]
fn test_registry_lookup() {
    assert_eq!(SANDBOX.len(), 2);
    assert_eq!(SANDBOX.get("sandbox").map(|e| e.contract_id), Some(DAO_ID));
    assert!(SANDBOX.get("mainnet").is_none());
    match SANDBOX.lookup("mainnet") {
        Err(Error::Configuration(msg)) => assert!(msg.contains("testnet, sandbox"), "{}", msg),
        other => panic!("expected configuration error, got {:?}", other),
    }
    assert!(NetworkRegistry::empty().is_empty());
}

#[test]
fn test_binding_registries() {
    assert_eq!(profit_token::NETWORKS.get("testnet").map(|e| e.contract_id), Some(TOKEN_ID));
    assert_eq!(dao::NETWORKS.get("testnet").map(|e| e.contract_id), Some(DAO_ID));
    assert_eq!(dao::NETWORKS.get("testnet").map(|e| e.passphrase), Some(TESTNET_PASSPHRASE));
    assert!(profit_token::ERRORS.is_empty());
    assert!(dao::ERRORS.is_empty());
}

#[test]
fn test_well_known_passphrases() {
    assert_eq!(well_known_passphrase("testnet"), Some("Test SDF Network ; September 2015"));
    assert_eq!(well_known_passphrase("futurenet"), Some(FUTURENET_PASSPHRASE));
    assert_eq!(well_known_passphrase("mainnet"), Some("Public Global Stellar Network ; September 2015"));
    assert_eq!(well_known_passphrase("standalone"), Some("Standalone Network ; February 2017"));
    assert_eq!(well_known_passphrase("devnet"), None);
}

#[test]
fn test_options_resolve_by_network() {
    let target = ClientOptions::new().network("sandbox").resolve(&SANDBOX).expect("target");
    assert_eq!(target.network_passphrase, "Sandbox ; 2026");
    assert_eq!(target.contract_id.as_str(), DAO_ID);
    assert_eq!(target.rpc_url, network::DEFAULT_RPC_URL);
}

#[test]
fn test_options_explicit_values_win() {
    let target = ClientOptions::new()
        .network("testnet")
        .contract_id(DAO_ID)
        .network_passphrase("Custom ; 1")
        .rpc_url("http://ledger.test/rpc")
        .resolve(&SANDBOX)
        .expect("target");
    assert_eq!(target.contract_id.as_str(), DAO_ID);
    assert_eq!(target.network_passphrase, "Custom ; 1");
    assert_eq!(target.rpc_url, "http://ledger.test/rpc");
}

#[test]
fn test_options_unregistered_network_with_explicit_contract() {
    // Passphrase falls back to the well-known table.
    let target = ClientOptions::new()
        .network("futurenet")
        .contract_id(TOKEN_ID)
        .resolve(&SANDBOX)
        .expect("target");
    assert_eq!(target.network_passphrase, FUTURENET_PASSPHRASE);

    let err = ClientOptions::new().network("devnet").contract_id(TOKEN_ID).resolve(&SANDBOX).unwrap_err();
    assert!(matches!(err, Error::Configuration(ref m) if m.contains("devnet")), "{:?}", err);
}

#[test]
fn test_options_unknown_network_rejected_even_when_explicit() {
    let err = ClientOptions::new()
        .network("devnet")
        .contract_id(TOKEN_ID)
        .network_passphrase("Custom ; 1")
        .resolve(&SANDBOX)
        .unwrap_err();
    assert!(matches!(err, Error::Configuration(ref m) if m.contains("devnet")), "{:?}", err);

    // Registered and well-known names still defer to the explicit values.
    for name in ["sandbox", "mainnet"] {
        let target = ClientOptions::new()
            .network(name)
            .contract_id(TOKEN_ID)
            .network_passphrase("Custom ; 1")
            .resolve(&SANDBOX)
            .expect("target");
        assert_eq!(target.network_passphrase, "Custom ; 1");
        assert_eq!(target.contract_id.as_str(), TOKEN_ID);
    }

    let deploy = DeployOptions::new(vec![7u8; 32]).network("devnet").network_passphrase("Custom ; 1");
    assert!(matches!(deploy.passphrase(&SANDBOX), Err(Error::Configuration(_))));
}

#[test]
fn test_options_without_target() {
    let err = ClientOptions::new().resolve(&SANDBOX).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)), "{:?}", err);

    let err = ClientOptions::new().network("mainnet").resolve(&SANDBOX).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)), "{:?}", err);

    // Contract id alone is not enough without a passphrase.
    let err = ClientOptions::new().contract_id(TOKEN_ID).resolve(&SANDBOX).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)), "{:?}", err);
}

#[test]
fn test_options_reject_bad_ids() {
    let err = ClientOptions::new().network("testnet").contract_id("CABC").resolve(&SANDBOX).unwrap_err();
    assert!(matches!(err, Error::Configuration(ref m) if m.contains("CABC")), "{:?}", err);

    let err = ClientOptions::new()
        .network("testnet")
        .contract_id(account('A').to_string())
        .resolve(&SANDBOX)
        .unwrap_err();
    assert!(matches!(err, Error::Configuration(ref m) if m.contains("account")), "{:?}", err);

    let err = ClientOptions::new().source("nobody").source_address().unwrap_err();
    assert!(matches!(err, Error::Configuration(_)), "{:?}", err);
}

#[test]
fn test_options_from_lookup() {
    let env = [
        (config::ENV_NETWORK, "testnet".to_string()),
        (config::ENV_RPC_URL, "http://rpc.test".to_string()),
        (config::ENV_CONTRACT_ID, String::new()),
        (config::ENV_SOURCE, account('A').to_string()),
    ];
    let options = ClientOptions::from_lookup(|key| {
        env.iter().find(|(k, _)| *k == key).map(|(_, v)| v.clone())
    });
    assert_eq!(options.network.as_deref(), Some("testnet"));
    assert_eq!(options.rpc_url.as_deref(), Some("http://rpc.test"));
    assert_eq!(options.contract_id, None);
    assert_eq!(options.network_passphrase, None);
    assert_eq!(options.source_address().expect("source"), Some(account('A')));
    assert_eq!(options.mode, Mode::Connected);
}

#[test]
fn test_options_from_json() {
    let options = ClientOptions::from_json(
        r#"{"network":"testnet","contractId":"CCFU4LOQZK2TWIQIN6FLDERPAAJ2U2J6Q6DMTPUADGZTBHBFT5XENNLF","mode":"disconnected"}"#,
    )
    .expect("options");
    assert_eq!(options, ClientOptions::new().network("testnet").contract_id(TOKEN_ID).disconnected());

    let err = ClientOptions::from_json(r#"{"mode":"sometimes"}"#).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)), "{:?}", err);
}

#[test]
fn test_deploy_options() {
    let options = DeployOptions::new(vec![7u8; 32]).network("testnet");
    assert_eq!(options.passphrase(&NetworkRegistry::empty()).expect("passphrase"), TESTNET_PASSPHRASE);
    assert_eq!(options.wasm_hash().expect("hash"), [7u8; 32]);

    let options = DeployOptions::new(vec![7u8; 31]).network_passphrase("Custom ; 1");
    assert_eq!(options.passphrase(&NetworkRegistry::empty()).expect("passphrase"), "Custom ; 1");
    assert!(matches!(options.wasm_hash(), Err(Error::Configuration(_))));

    let options = DeployOptions::new(vec![7u8; 32]).network("sandbox");
    assert_eq!(options.passphrase(&SANDBOX).expect("passphrase"), "Sandbox ; 2026");
    assert!(options.passphrase(&NetworkRegistry::empty()).is_err());
}

// ============================================================================
//  3. CLIENT
// ============================================================================

#[test]
fn test_client_construction() {
    let client = token_client(Arc::new(Offline));
    assert_eq!(client.target().contract_id.as_str(), TOKEN_ID);
    assert_eq!(client.target().network_passphrase, TESTNET_PASSPHRASE);
    assert_eq!(client.mode(), Mode::Connected);
    assert_eq!(client.methods().count(), 10);

    // Without the binding's registry a bare network name is not a target.
    let schema = profit_token::schema().expect("schema");
    let err = Client::new(schema.clone(), &ClientOptions::new().network("testnet"), Arc::new(Offline)).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)), "{:?}", err);

    let client = Client::new(schema, &ClientOptions::new().network("testnet").contract_id(DAO_ID), Arc::new(Offline))
        .expect("client");
    assert_eq!(client.target().contract_id.as_str(), DAO_ID);
}

#[test]
fn test_client_unknown_method() {
    let client = token_client(Arc::new(Offline));
    assert_eq!(client.method("steal").unwrap_err(), Error::UnknownMethod("steal".into()));
    let method = client.method("balance").expect("method");
    assert_eq!(method.name(), "balance");
    assert_eq!(method.signature().returns, TypeDesc::I128);
}

#[tokio::test]
async fn test_call_decodes_return() {
    let transport = replying(Value::Int(1_000), TypeDesc::I128);
    let client = token_client(transport.clone());
    let outcome = client.call("balance", Args::new().arg("who", account('A'))).await.expect("call");
    assert_eq!(outcome, CallOutcome::Returned(Value::Int(1_000)));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_call_argument_errors_skip_transport() {
    let transport = replying(Value::Void, TypeDesc::Void);
    let client = token_client(transport.clone());

    let err = client.call("balance", Args::new()).await.unwrap_err();
    assert!(matches!(err, Error::Argument { error: ArgumentError::Missing(_), .. }), "{:?}", err);

    let err = client.call("balance", Args::new().arg("who", "not an address")).await.unwrap_err();
    assert!(matches!(err, Error::Codec(_)), "{:?}", err);

    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_call_remote_failure_carries_reason() {
    let client = token_client(failing(FailureReason::Trapped { message: "Insufficient balance".into() }));
    let args = Args::new().arg("from", account('A')).arg("to", account('B')).arg("amount", 5i128);
    match client.call("transfer", args).await {
        Err(Error::RemoteExecution { method, reason, name }) => {
            assert_eq!(method, "transfer");
            assert_eq!(reason, FailureReason::Trapped { message: "Insufficient balance".into() });
            assert_eq!(name, None);
        }
        other => panic!("expected remote failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_call_remote_error_code_is_named() {
    let client = token_client(failing(FailureReason::Contract { code: 3 }))
        .with_error_names([(3, "NotInitialized")]);
    assert_eq!(client.error_name(3), Some("NotInitialized"));
    let err = client.call("get_admin", Args::new()).await.unwrap_err();
    assert_eq!(
        err,
        Error::RemoteExecution {
            method: "get_admin".into(),
            reason: FailureReason::Contract { code: 3 },
            name: Some("NotInitialized".into()),
        }
    );
    assert!(err.to_string().contains("NotInitialized"));
}

#[tokio::test]
async fn test_call_transport_failure() {
    let transport = Arc::new(CallTransport::new(|_: &[u8]| Err(TransportError::Timeout)));
    let client = token_client(transport.clone());
    let err = client.call("total_supply", Args::new()).await.unwrap_err();
    assert_eq!(err, Error::Transport(TransportError::Timeout));
    // Never retried.
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_call_rejects_mismatched_seq() {
    let transport = Arc::new(CallTransport::new(|frame: &[u8]| {
        let result = ledgerrpc::encode(&Value::Int(0), &TypeDesc::I128).expect("encode");
        Ok(ReplyOkEncoder::new(invoke_seq(frame).wrapping_add(1), &result).to_bytes().expect("reply"))
    }));
    let err = token_client(transport).call("total_supply", Args::new()).await.unwrap_err();
    assert!(matches!(err, Error::Rpc(RpcError::ProtocolViolation(_))), "{:?}", err);
}

#[tokio::test]
async fn test_call_rejects_wrong_frame() {
    let transport = Arc::new(CallTransport::new(|frame: &[u8]| {
        Ok(Pending::new(invoke_seq(frame), "abc").to_bytes().expect("pending"))
    }));
    let err = token_client(transport).call("total_supply", Args::new()).await.unwrap_err();
    assert!(matches!(err, Error::Rpc(RpcError::ProtocolViolation(_))), "{:?}", err);

    let garbage = Arc::new(CallTransport::new(|_: &[u8]| Ok(vec![0xFF, 0x00])));
    let err = token_client(garbage).call("total_supply", Args::new()).await.unwrap_err();
    assert!(matches!(err, Error::Codec(_) | Error::Rpc(_)), "{:?}", err);
}

#[tokio::test]
async fn test_call_result_must_match_return_type() {
    let client = token_client(replying(Value::String("lots".into()), TypeDesc::String));
    let err = client.call("total_supply", Args::new()).await.unwrap_err();
    assert!(matches!(err, Error::Codec(RpcError::TypeMismatch { .. })), "{:?}", err);
}

#[tokio::test]
async fn test_client_is_shareable() {
    let client = token_client(replying(Value::Int(42), TypeDesc::I128));
    let mut handles = Vec::new();
    for i in 0..8 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            let who = if i % 2 == 0 { account('A') } else { account('B') };
            client.call("balance", Args::new().arg("who", who)).await
        }));
    }
    for handle in handles {
        let outcome = handle.await.expect("join").expect("call");
        assert_eq!(outcome.into_value(), Some(Value::Int(42)));
    }
}

// ============================================================================
//  4. ENVELOPES
// ============================================================================

#[tokio::test]
async fn test_disconnected_call_builds_envelope() {
    let client = offline_token_client();
    let outcome = client.call("balance", Args::new().arg("who", account('A'))).await.expect("call");
    let envelope = outcome.into_envelope().expect("envelope");

    assert_eq!(envelope.version, ENVELOPE_VERSION);
    assert_eq!(envelope.method, "balance");
    assert_eq!(envelope.contract_id, TOKEN_ID);
    assert_eq!(envelope.network_passphrase, TESTNET_PASSPHRASE);
    assert_eq!(envelope.source, Some(account('S').to_string()));
    assert!(!envelope.is_signed());
    assert_eq!(invoke_seq(&envelope.payload), envelope.seq);
}

#[tokio::test]
async fn test_envelope_json_shape() {
    let client = offline_token_client();
    let envelope = client
        .call("total_supply", Args::new())
        .await
        .expect("call")
        .into_envelope()
        .expect("envelope");

    let json: serde_json::Value = serde_json::from_str(&envelope.to_json().expect("json")).expect("parse");
    assert_eq!(json["method"], "total_supply");
    assert_eq!(json["contractId"], TOKEN_ID);
    assert_eq!(json["networkPassphrase"], TESTNET_PASSPHRASE);
    assert!(json["payload"].is_string());
    assert_eq!(json["signatures"], serde_json::json!([]));

    assert_eq!(Envelope::from_json(&envelope.to_json().expect("json")).expect("envelope"), envelope);
}

#[tokio::test]
async fn test_from_json_rebuilds_call() {
    let client = offline_token_client();
    let args = Args::new().arg("to", account('B')).arg("amount", 50i128);
    let json = client
        .call("mint", args)
        .await
        .expect("call")
        .into_envelope()
        .expect("envelope")
        .to_json()
        .expect("json");

    let pending = client.from_json("mint", &json).expect("pending");
    assert_eq!(pending.method(), "mint");
    assert_eq!(pending.args(), [Value::from(account('B')), Value::Int(50)]);

    let signed = pending.sign_with(&account('A'), vec![1u8; 64]).sign_with(&account('A'), vec![2u8; 64]);
    assert_eq!(signed.envelope().signatures.len(), 1);
    assert_eq!(signed.envelope().signatures[0].signature, vec![2u8; 64]);

    // Signatures survive a round trip through JSON.
    let again = client.from_json("mint", &signed.to_json().expect("json")).expect("pending");
    assert_eq!(again.envelope(), signed.envelope());
}

#[tokio::test]
async fn test_from_json_rejects_foreign_envelopes() {
    let client = offline_token_client();
    let envelope = client
        .call("balance", Args::new().arg("who", account('A')))
        .await
        .expect("call")
        .into_envelope()
        .expect("envelope");

    let expect_envelope_err = |e: Envelope, method: &str| {
        let err = client.pending(method, e).unwrap_err();
        assert!(matches!(err, Error::Envelope(_)), "{:?}", err);
    };

    expect_envelope_err(envelope.clone(), "total_supply");
    expect_envelope_err(Envelope { version: 9, ..envelope.clone() }, "balance");
    expect_envelope_err(Envelope { contract_id: DAO_ID.into(), ..envelope.clone() }, "balance");
    expect_envelope_err(Envelope { network_passphrase: FUTURENET_PASSPHRASE.into(), ..envelope.clone() }, "balance");
    expect_envelope_err(Envelope { seq: envelope.seq.wrapping_add(1), ..envelope.clone() }, "balance");

    let mut truncated = envelope.clone();
    truncated.payload.truncate(truncated.payload.len() - 3);
    expect_envelope_err(truncated, "balance");

    let mut bad_signer = envelope.clone();
    bad_signer.signatures.push(envelope::SignatureEntry { signer: "me".into(), signature: vec![1] });
    expect_envelope_err(bad_signer, "balance");

    assert!(matches!(client.from_json("balance", "{not json"), Err(Error::Envelope(_))));
    let json = envelope.to_json().expect("json");
    assert!(matches!(client.from_json("nope", &json), Err(Error::UnknownMethod(_))));
}

#[tokio::test]
async fn test_from_json_rejects_payload_for_other_signature() {
    // An envelope whose payload calls `balance` relabelled as `get_admin`.
    let client = offline_token_client();
    let envelope = client
        .call("balance", Args::new().arg("who", account('A')))
        .await
        .expect("call")
        .into_envelope()
        .expect("envelope");
    let relabelled = Envelope { method: "get_admin".into(), ..envelope };
    assert!(matches!(client.pending("get_admin", relabelled), Err(Error::Envelope(_))));
}

#[tokio::test]
async fn test_submit_requires_signature() {
    let client = offline_token_client();
    let json = client
        .call("total_supply", Args::new())
        .await
        .expect("call")
        .into_envelope()
        .expect("envelope")
        .to_json()
        .expect("json");
    let err = client.from_json("total_supply", &json).expect("pending").submit().await.unwrap_err();
    assert!(matches!(err, Error::Envelope(_)), "{:?}", err);
}

// ============================================================================
//  5. ERRORS
// ============================================================================

#[test]
fn test_error_conversions() {
    assert_eq!(
        Error::from(RpcError::ProtocolViolation("x".into())),
        Error::Rpc(RpcError::ProtocolViolation("x".into()))
    );
    assert_eq!(
        Error::from(RpcError::ShapeMismatch("x".into())),
        Error::Codec(RpcError::ShapeMismatch("x".into()))
    );
    let inner = Error::Transport(TransportError::Unsupported("deploy"));
    let wrapped = inner.clone().into_deployment();
    assert_eq!(wrapped, Error::Deployment(Box::new(inner)));
    assert_eq!(wrapped.clone().into_deployment(), wrapped);
}

#[test]
fn test_error_display() {
    let err = Error::Argument { method: "mint".into(), error: ArgumentError::Missing("to".into()) };
    assert_eq!(err.to_string(), "Argument error in mint: missing argument 'to'");
    let err = Error::Deployment(Box::new(Error::Configuration("no network or passphrase given".into())));
    assert_eq!(err.to_string(), "Deployment failed: Configuration error: no network or passphrase given");
    assert_eq!(
        TransportError::Unsupported("poll").to_string(),
        "Transport does not support poll"
    );
}
