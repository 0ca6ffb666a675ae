//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// One decoded JSON-RPC request.
#[derive(Debug, Clone)]
pub struct RpcCall {
    pub method: String,
    pub params: Value,
    pub authorization: Option<String>,
}

/// Reply as (HTTP status, body).
pub type Reply = (u16, String);

/// Body of a successful JSON-RPC reply.
pub fn ok(result: Value) -> Reply {
    (200, json!({"result": result, "error": null, "id": 1}).to_string())
}

/// Body of a JSON-RPC error reply, sent with HTTP 500 like zcashd does.
pub fn rpc_error(code: i64, message: &str) -> Reply {
    (
        500,
        json!({"result": null, "error": {"code": code, "message": message}, "id": 1}).to_string(),
    )
}

/// Start a mock JSON-RPC node on an ephemeral port.
pub async fn start_mock_node<F>(handler: F) -> SocketAddr
where
    F: Fn(RpcCall) -> Reply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        serve(socket, handler.as_ref()).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
    addr
}

/// An address nothing listens on.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

async fn serve<F>(mut socket: TcpStream, handler: &F)
where
    F: Fn(RpcCall) -> Reply,
{
    let Some(call) = read_call(&mut socket).await else {
        return;
    };
    let (status, body) = handler(call);
    let status_text = match status {
        200 => "200 OK",
        401 => "401 Unauthorized",
        403 => "403 Forbidden",
        429 => "429 Too Many Requests",
        500 => "500 Internal Server Error",
        502 => "502 Bad Gateway",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

async fn read_call(socket: &mut TcpStream) -> Option<RpcCall> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let header = |name: &str| {
        head.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    };
    let length: usize = header("content-length")?.parse().ok()?;
    while buf.len() < header_end + length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let request: Value = serde_json::from_slice(&buf[header_end..header_end + length]).ok()?;
    Some(RpcCall {
        method: request["method"].as_str()?.to_string(),
        params: request["params"].clone(),
        authorization: header("authorization"),
    })
}

/// Unsigned v4 transaction hex with `inputs` empty scriptSigs and one output.
pub fn v4_tx_hex(inputs: u8, script_sig: &[u8]) -> String {
    let mut tx = Vec::new();
    tx.extend_from_slice(&(4u32 | 1 << 31).to_le_bytes());
    tx.extend_from_slice(&0x892f_2085u32.to_le_bytes());
    tx.push(inputs);
    for i in 0..inputs {
        tx.extend_from_slice(&[i; 32]);
        tx.extend_from_slice(&0u32.to_le_bytes());
        tx.push(script_sig.len() as u8);
        tx.extend_from_slice(script_sig);
        tx.extend_from_slice(&0xffff_ffffu32.to_le_bytes());
    }
    tx.push(1);
    tx.extend_from_slice(&1_000u64.to_le_bytes());
    tx.push(0);
    tx.extend_from_slice(&[0u8; 8]);
    hex::encode(tx)
}
