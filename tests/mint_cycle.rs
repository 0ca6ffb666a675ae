//! End-to-end mint cycles against a mock node over HTTP.

mod common;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde_json::json;

use common::{ok, rpc_error, start_mock_node, v4_tx_hex, RpcCall};
use zrc20_minter::automation::{run_mode, Mode};
use zrc20_minter::inscription::contains_mint_of;
use zrc20_minter::lifecycle::{build_runtime, load_and_validate, StartupError};
use zrc20_minter::Shutdown;

const WALLET: &str = "t1MockWalletAddress";

/// Mock node state shared with the assertions.
#[derive(Default)]
struct Ledger {
    methods: Vec<String>,
    broadcast: Vec<String>,
    mempool: Vec<(String, String)>,
}

async fn mock_node(ledger: Arc<Mutex<Ledger>>) -> std::net::SocketAddr {
    start_mock_node(move |call: RpcCall| {
        let mut ledger = ledger.lock().unwrap();
        ledger.methods.push(call.method.clone());
        match call.method.as_str() {
            "listunspent" => ok(json!([{
                "txid": "aa".repeat(32),
                "vout": 0,
                "address": WALLET,
                "amount": 0.001,
                "amountZat": 100_000,
                "confirmations": 6,
                "spendable": true
            }])),
            "estimatesmartfee" => ok(json!({"feerate": 0.0001, "blocks": 2})),
            "createrawtransaction" => ok(json!(v4_tx_hex(1, &[]))),
            "signrawtransaction" => ok(json!({"hex": v4_tx_hex(1, &[0x30; 72]), "complete": true})),
            "sendrawtransaction" => {
                let hex = call.params[0].as_str().unwrap_or_default().to_string();
                ledger.broadcast.push(hex);
                ok(json!("bb".repeat(32)))
            }
            "getrawmempool" => {
                let txids: Vec<String> = ledger.mempool.iter().map(|(id, _)| id.clone()).collect();
                ok(json!(txids))
            }
            "getrawtransaction" => {
                let wanted = call.params[0].as_str().unwrap_or_default();
                match ledger.mempool.iter().find(|(id, _)| id == wanted) {
                    Some((_, hex)) => ok(json!(hex)),
                    None => rpc_error(-5, "No such mempool or blockchain transaction"),
                }
            }
            other => rpc_error(-32601, &format!("Method not found: {}", other)),
        }
    })
    .await
}

fn write_config(name: &str, addr: std::net::SocketAddr, mempool_guard: bool) -> PathBuf {
    let path = std::env::temp_dir().join(format!("zrc20-minter-{}-{}.toml", name, std::process::id()));
    let toml = format!(
        r#"
wallet_strategy = "round_robin"

[network]
timeout_secs = 5
max_attempts = 1

[[network.rpc_nodes]]
url = "http://{addr}"
user = "rpcuser"
password = "rpcpass"

[[wallets]]
address = "{wallet}"
label = "main"

[fee]
dynamic = true
floor_rate = 5

[retry]
max_retries = 1
base_delay_ms = 10
max_delay_ms = 20
jitter = false

[mint]
postage_sats = 1000

[[mint.targets]]
tick = "ZORD"
amount = 1000

[mempool]
enabled = {mempool_guard}
"#,
        addr = addr,
        wallet = WALLET,
        mempool_guard = mempool_guard,
    );
    std::fs::write(&path, toml).unwrap();
    path
}

#[tokio::test]
async fn test_once_mode_mints_and_broadcasts() {
    let ledger = Arc::new(Mutex::new(Ledger::default()));
    let addr = mock_node(ledger.clone()).await;
    let path = write_config("once", addr, true);

    let config = load_and_validate(&path, None).unwrap();
    let runtime = build_runtime(config).unwrap();
    let totals = run_mode(&runtime, Mode::Once, &Shutdown::new()).await;
    let _ = std::fs::remove_file(&path);

    assert_eq!(totals.cycles(), 1);
    assert_eq!(totals.failed_targets(), 0);

    let ledger = ledger.lock().unwrap();
    assert_eq!(ledger.broadcast.len(), 1);
    let raw = hex::decode(&ledger.broadcast[0]).unwrap();
    assert!(contains_mint_of(&raw, "ZORD"));

    let position = |method: &str| ledger.methods.iter().position(|m| m == method).unwrap();
    assert!(position("getrawmempool") < position("estimatesmartfee"));
    assert!(position("createrawtransaction") < position("signrawtransaction"));
    assert!(position("signrawtransaction") < position("sendrawtransaction"));
}

#[tokio::test]
async fn test_pending_mint_skips_target() {
    let ledger = Arc::new(Mutex::new(Ledger::default()));
    let addr = mock_node(ledger.clone()).await;

    // a previous run already broadcast a mint of the same tick
    let pending = {
        let runtime_ledger = Arc::new(Mutex::new(Ledger::default()));
        let first_addr = mock_node(runtime_ledger.clone()).await;
        let path = write_config("seed", first_addr, false);
        let runtime = build_runtime(load_and_validate(&path, None).unwrap()).unwrap();
        run_mode(&runtime, Mode::Once, &Shutdown::new()).await;
        let _ = std::fs::remove_file(&path);
        let broadcast = runtime_ledger.lock().unwrap().broadcast.clone();
        broadcast[0].clone()
    };
    ledger
        .lock()
        .unwrap()
        .mempool
        .push(("cc".repeat(32), pending));

    let path = write_config("skip", addr, true);
    let runtime = build_runtime(load_and_validate(&path, None).unwrap()).unwrap();
    let totals = run_mode(&runtime, Mode::Once, &Shutdown::new()).await;
    let _ = std::fs::remove_file(&path);

    assert_eq!(totals.cycles(), 1);
    assert_eq!(totals.failed_targets(), 0);
    let ledger = ledger.lock().unwrap();
    assert!(ledger.broadcast.is_empty());
    assert!(!ledger.methods.iter().any(|m| m == "createrawtransaction"));
}

#[tokio::test]
async fn test_rejected_broadcast_counts_as_failure() {
    let addr = start_mock_node(|call: RpcCall| match call.method.as_str() {
        "listunspent" => ok(json!([{
            "txid": "aa".repeat(32),
            "vout": 0,
            "address": WALLET,
            "amount": 0.001,
            "confirmations": 6
        }])),
        "estimatesmartfee" => ok(json!({"feerate": 0.0001})),
        "createrawtransaction" => ok(json!(v4_tx_hex(1, &[]))),
        "signrawtransaction" => ok(json!({"hex": v4_tx_hex(1, &[0x30; 72]), "complete": true})),
        "sendrawtransaction" => rpc_error(-26, "16: bad-txns-oversize"),
        "getrawmempool" => ok(json!([])),
        _ => rpc_error(-32601, "Method not found"),
    })
    .await;
    let path = write_config("rejected", addr, false);

    let runtime = build_runtime(load_and_validate(&path, None).unwrap()).unwrap();
    let totals = run_mode(&runtime, Mode::Once, &Shutdown::new()).await;
    let _ = std::fs::remove_file(&path);

    assert_eq!(totals.cycles(), 1);
    assert_eq!(totals.failed_targets(), 1);
}

#[test]
fn test_missing_config_is_startup_error() {
    let path = std::env::temp_dir().join("zrc20-minter-does-not-exist.toml");
    let result = load_and_validate(&path, None);
    assert!(matches!(result, Err(StartupError::Config(_))));
}
