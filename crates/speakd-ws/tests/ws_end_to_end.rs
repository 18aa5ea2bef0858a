//! End-to-end tests over a real socket, using `tokio-tungstenite` as the
//! client and the real WAV writer.

mod common;

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use speakd_voice::WavFileWriter;
use speakd_ws::{AppState, serve_on};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use common::{MockPipeline, harness_with_writer};

type Socket =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn start_server(state: AppState) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        serve_on(listener, state).await.unwrap();
    });
    (format!("ws://{addr}"), server)
}

async fn send(socket: &mut Socket, request: Value) {
    socket
        .send(Message::Text(request.to_string().into()))
        .await
        .unwrap();
}

async fn recv(socket: &mut Socket) -> Value {
    let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .expect("reply within timeout")
        .expect("socket open")
        .unwrap();
    match frame {
        Message::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("unexpected frame: {other:?}"),
    }
}

async fn recv_status(socket: &mut Socket) -> String {
    recv(socket).await["status"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn full_session_over_websocket_writes_wav() {
    let dir = tempfile::tempdir().unwrap();
    let save_path = dir.path().join("sessions/greeting.wav");

    let h = harness_with_writer(Some(Arc::new(WavFileWriter)));
    let (url, _server) = start_server(h.state.clone()).await;
    let (mut socket, _) = tokio_tungstenite::connect_async(format!("{url}/any/path"))
        .await
        .unwrap();

    send(&mut socket, json!({"action": "ping"})).await;
    assert_eq!(recv_status(&mut socket).await, "pong");

    send(
        &mut socket,
        json!({
            "action": "start_session",
            "session_id": "greeting",
            "save_path": save_path,
            "autoplay": false,
            "total_chunks": 2
        }),
    )
    .await;
    assert_eq!(recv_status(&mut socket).await, "session_started");

    send(
        &mut socket,
        json!({"action": "speak", "session_id": "greeting", "text": "Hello"}),
    )
    .await;
    assert_eq!(recv_status(&mut socket).await, "generating");
    let generated = recv(&mut socket).await;
    assert_eq!(generated["status"], "generated");
    assert_eq!(generated["is_last_chunk"], false);

    send(
        &mut socket,
        json!({
            "action": "speak",
            "session_id": "greeting",
            "text": "there",
            "voice": "bf_emma",
            "is_last_chunk": true
        }),
    )
    .await;
    assert_eq!(recv_status(&mut socket).await, "generating");
    let stats = recv(&mut socket).await;
    assert_eq!(stats["status"], "session_stats");
    assert_eq!(stats["stats"]["total_characters"], 10);
    assert_eq!(stats["stats"]["chunks"], 2);
    let generated = recv(&mut socket).await;
    assert_eq!(generated["is_last_chunk"], true);

    let mut reader = hound::WavReader::open(&save_path).unwrap();
    assert_eq!(reader.spec().sample_rate, 24_000);
    assert_eq!(reader.spec().sample_format, hound::SampleFormat::Float);
    let samples: Vec<f32> = reader.samples::<f32>().map(Result::unwrap).collect();
    let mut expected = MockPipeline::render("Hello");
    expected.extend(MockPipeline::render("there"));
    assert_eq!(samples, expected);

    h.state.shutdown.trigger();
}

#[tokio::test]
async fn malformed_frame_gets_error_and_socket_stays_open() {
    let h = harness_with_writer(None);
    let (url, _server) = start_server(h.state.clone()).await;
    let (mut socket, _) = tokio_tungstenite::connect_async(url).await.unwrap();

    socket
        .send(Message::Text("{oops".into()))
        .await
        .unwrap();
    let reply = recv(&mut socket).await;
    assert_eq!(reply["status"], "error");
    assert_eq!(reply["message"], "Invalid JSON");

    send(&mut socket, json!({"action": "ping"})).await;
    assert_eq!(recv_status(&mut socket).await, "pong");

    h.state.shutdown.trigger();
}

#[tokio::test]
async fn stop_from_one_connection_invalidates_another() {
    let h = harness_with_writer(None);
    let (url, _server) = start_server(h.state.clone()).await;
    let (mut first, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();
    let (mut second, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();

    send(
        &mut first,
        json!({"action": "start_session", "session_id": "a", "autoplay": false}),
    )
    .await;
    assert_eq!(recv_status(&mut first).await, "session_started");

    send(&mut second, json!({"action": "stop"})).await;
    assert_eq!(recv_status(&mut second).await, "stopped");

    send(
        &mut first,
        json!({"action": "speak", "session_id": "a", "text": "late"}),
    )
    .await;
    let reply = recv(&mut first).await;
    assert_eq!(reply["status"], "error");
    assert_eq!(reply["message"], "Invalid session ID: a");

    h.state.shutdown.trigger();
}

#[tokio::test]
async fn shutdown_closes_connections_and_returns() {
    let h = harness_with_writer(None);
    let (url, server) = start_server(h.state.clone()).await;
    let (mut socket, _) = tokio_tungstenite::connect_async(url).await.unwrap();

    send(&mut socket, json!({"action": "ping"})).await;
    assert_eq!(recv_status(&mut socket).await, "pong");

    assert!(h.state.shutdown.trigger());

    tokio::time::timeout(Duration::from_secs(10), server)
        .await
        .expect("server stops after shutdown")
        .unwrap();

    // The server side closed: the stream ends with a close frame or EOF.
    let next = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .expect("socket observes shutdown");
    assert!(matches!(next, None | Some(Ok(Message::Close(_)) | Err(_))));
    assert_eq!(h.output.stops.load(std::sync::atomic::Ordering::SeqCst), 1);
}
