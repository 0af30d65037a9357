//! End-to-end tests: real listener, real WebSocket client

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use local_llm_backend::create_server;
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

mod fixtures;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct TestServer {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = create_server(fixtures::test_config("http://127.0.0.1:9")).unwrap();
        let (shutdown, signal) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            server
                .serve(listener, async {
                    let _ = signal.await;
                })
                .await
        });

        Self {
            addr,
            shutdown,
            handle,
        }
    }

    async fn connect(&self) -> Client {
        let (client, _) = connect_async(format!("ws://{}/mcp", self.addr))
            .await
            .expect("WebSocket handshake failed");
        client
    }

    async fn stop(self) {
        let _ = self.shutdown.send(());
        let result = tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not shut down");
        result.unwrap().unwrap();
    }
}

async fn next_json(client: &mut Client) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection ended")
            .expect("read failed");
        if let Message::Text(text) = message {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn call(client: &mut Client, request: Value) -> Value {
    client.send(Message::Text(request.to_string())).await.unwrap();
    next_json(client).await
}

#[tokio::test]
async fn test_session_round_trip() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;

    let welcome = next_json(&mut client).await;
    assert_eq!(welcome["method"], "session/welcome");
    assert_eq!(welcome["params"]["message"], "MCP server ready");

    let pong = call(&mut client, fixtures::requests::ping_request(1)).await;
    assert_eq!(pong, json!({ "jsonrpc": "2.0", "id": 1, "result": { "pong": true } }));

    let listing = call(&mut client, fixtures::requests::list_resources_request(2)).await;
    assert_eq!(
        listing["result"]["resources"],
        json!([{ "name": "status", "description": "Static server status resource." }])
    );

    let status = call(&mut client, fixtures::requests::read_resource_request(3, "status")).await;
    assert_eq!(status["id"], 3);
    assert_eq!(status["result"]["content"]["state"], "ok");
    assert_eq!(status["result"]["content"]["details"]["models_loaded"], json!([]));

    let unknown = call(&mut client, fixtures::requests::unknown_method_request(4)).await;
    assert_eq!(unknown["error"]["code"], -32601);
    assert!(unknown.get("result").is_none());

    client.close(None).await.unwrap();
    server.stop().await;
}

#[tokio::test]
async fn test_bad_frames_do_not_close_connection() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;
    next_json(&mut client).await;

    client.send(Message::Text("{\"jsonrpc\":".into())).await.unwrap();
    let parse_error = next_json(&mut client).await;
    assert_eq!(parse_error["error"]["code"], -32700);
    assert_eq!(parse_error["id"], Value::Null);

    client.send(Message::Binary(vec![0xff, 0xfe, 0x00])).await.unwrap();
    let binary_error = next_json(&mut client).await;
    assert_eq!(binary_error["error"]["code"], -32700);

    let read = call(
        &mut client,
        json!({ "jsonrpc": "2.0", "id": "r", "method": "resources/read", "params": {} }),
    )
    .await;
    assert_eq!(read["id"], "r");
    assert_eq!(read["error"]["code"], -32602);

    let pong = call(&mut client, fixtures::requests::ping_request(5)).await;
    assert_eq!(pong["result"]["pong"], true);

    client.close(None).await.unwrap();
    server.stop().await;
}

#[tokio::test]
async fn test_connections_are_independent() {
    let server = TestServer::start().await;
    let mut first = server.connect().await;
    let mut second = server.connect().await;
    next_json(&mut first).await;
    next_json(&mut second).await;

    first
        .send(Message::Text(fixtures::requests::ping_request(10).to_string()))
        .await
        .unwrap();
    second
        .send(Message::Text(fixtures::requests::ping_request(20).to_string()))
        .await
        .unwrap();

    assert_eq!(next_json(&mut second).await["id"], 20);
    assert_eq!(next_json(&mut first).await["id"], 10);

    // Dropping one client leaves the other usable.
    first.close(None).await.unwrap();
    let pong = call(&mut second, fixtures::requests::ping_request(21)).await;
    assert_eq!(pong["id"], 21);

    second.close(None).await.unwrap();
    server.stop().await;
}

#[tokio::test]
async fn test_health_served_alongside_socket() {
    let server = TestServer::start().await;

    let body: Value = reqwest::get(format!("http://{}/health", server.addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "status": "ok" }));

    server.stop().await;
}
