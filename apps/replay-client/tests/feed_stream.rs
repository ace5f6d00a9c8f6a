//! Feed Stream Integration Tests
//!
//! Tests the full flow from a WebSocket server to decoded records in the
//! client buffer, using a local mock replay server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rust_decimal::Decimal;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};

use replay_client::{
    CandleClient, CandleCodec, ClientConfig, ClientState, FeedEvent, OrderClient, OrderCodec,
    ReplayClientError, RetryConfig, SubscriptionAction, SubscriptionRequest,
};

/// Bind a listener on a random port and return it with its feed URL.
async fn bind_server() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/v1/ws", listener.local_addr().unwrap());
    (listener, url)
}

/// Accept one WebSocket connection from the listener.
async fn accept_ws(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = timeout(Duration::from_secs(2), listener.accept())
        .await
        .expect("timed out waiting for connection")
        .unwrap();
    accept_async(stream).await.unwrap()
}

/// Receive the next feed event, failing the test on a stall.
async fn next_event<R>(events: &mut mpsc::Receiver<FeedEvent<R>>) -> FeedEvent<R> {
    timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("timed out waiting for feed event")
        .expect("feed event channel closed")
}

/// Client configuration with a fast retry for tests.
fn test_config(url: &str) -> ClientConfig {
    ClientConfig::new(url).with_retry(RetryConfig::new(Duration::from_millis(50)))
}

#[tokio::test]
async fn subscribe_request_reaches_server_verbatim() {
    let (listener, url) = bind_server().await;

    let (client, mut events) = OrderClient::connect(test_config(&url), OrderCodec::new());

    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        let frame = timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for subscribe")
            .unwrap()
            .unwrap();
        let Message::Text(text) = frame else {
            panic!("expected a text frame");
        };
        serde_json::from_str::<SubscriptionRequest>(text.as_str()).unwrap()
    });

    assert!(matches!(next_event(&mut events).await, FeedEvent::Opened));
    assert_eq!(client.state(), ClientState::Open);

    let request = SubscriptionRequest::subscribe()
        .with_topic("transaction/BTC/USD")
        .with_request_id("req-1")
        .with_replay_rate(10);
    client.send(&request).unwrap();

    let received = server.await.unwrap();
    assert_eq!(received.action, SubscriptionAction::Subscribe);
    assert_eq!(received.name.as_deref(), Some("transaction/BTC/USD"));
    assert_eq!(received.id.as_deref(), Some("req-1"));
    assert_eq!(received.replay_rate, Some(10));
    assert_eq!(received.granularity, None);

    client.shutdown();
}

#[tokio::test]
async fn records_are_buffered_in_arrival_order() {
    let (listener, url) = bind_server().await;

    let (client, mut events) = OrderClient::connect(test_config(&url), OrderCodec::new());

    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        for (price, quantity) in [("100.5", 1), ("101.0", 2), ("99.75", 3)] {
            let frame = format!(
                r#"{{"price":"{price}","quantity":{quantity},"aggressor":"bid","timestamp":1700000000000}}"#
            );
            ws.send(Message::Text(frame.into())).await.unwrap();
        }
        // Keep the connection open until the test is done
        let _ = timeout(Duration::from_secs(2), ws.next()).await;
    });

    assert!(matches!(next_event(&mut events).await, FeedEvent::Opened));
    for _ in 0..3 {
        assert!(matches!(
            next_event(&mut events).await,
            FeedEvent::Record(_)
        ));
    }

    let records = client.records();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].price, Decimal::new(1005, 1));
    assert_eq!(records[1].quantity, 2);
    assert_eq!(records[2].price, Decimal::new(9975, 2));
    assert_eq!(client.record_count(), 3);

    client.shutdown();
    server.abort();
}

#[tokio::test]
async fn junk_frames_are_dropped() {
    let (listener, url) = bind_server().await;

    let (client, mut events) = OrderClient::connect(test_config(&url), OrderCodec::new());

    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        ws.send(Message::Text("not json at all".into()))
            .await
            .unwrap();
        ws.send(Message::Text(r#"{"code":200,"msg":"ok"}"#.into()))
            .await
            .unwrap();
        ws.send(Message::Text(
            r#"{"price":"50","quantity":1,"aggressor":"ask","timestamp":1}"#.into(),
        ))
        .await
        .unwrap();
        let _ = timeout(Duration::from_secs(2), ws.next()).await;
    });

    assert!(matches!(next_event(&mut events).await, FeedEvent::Opened));

    // Only the valid fill produces an event; the junk frames are logged and dropped
    let event = next_event(&mut events).await;
    let FeedEvent::Record(fill) = event else {
        panic!("expected the valid fill, got {event:?}");
    };
    assert_eq!(fill.price, Decimal::new(50, 0));
    assert_eq!(client.record_count(), 1);

    client.shutdown();
    server.abort();
}

#[tokio::test]
async fn end_of_feed_is_emitted_but_not_buffered() {
    let (listener, url) = bind_server().await;

    let (client, mut events) = OrderClient::connect(test_config(&url), OrderCodec::new());

    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        ws.send(Message::Text(
            r#"{"price":"10","quantity":4,"aggressor":"bid","timestamp":5}"#.into(),
        ))
        .await
        .unwrap();
        ws.send(Message::Text(r#"{"request_id":"req-9"}"#.into()))
            .await
            .unwrap();
        let _ = timeout(Duration::from_secs(2), ws.next()).await;
    });

    assert!(matches!(next_event(&mut events).await, FeedEvent::Opened));
    assert!(matches!(
        next_event(&mut events).await,
        FeedEvent::Record(_)
    ));

    let event = next_event(&mut events).await;
    let FeedEvent::EndOfFeed(eof) = event else {
        panic!("expected end of feed, got {event:?}");
    };
    assert_eq!(eof.request_id, "req-9");

    // The completion marker never lands in the record buffer
    assert_eq!(client.record_count(), 1);

    client.shutdown();
    server.abort();
}

#[tokio::test]
async fn candle_with_request_id_field_is_still_a_record() {
    let (listener, url) = bind_server().await;

    let (client, mut events) = CandleClient::connect(test_config(&url), CandleCodec::new());

    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        ws.send(Message::Text(
            r#"{"timestamp":60000,"low":"9","high":"11","open":"10","close":"10.5","volume":42,"granularity":60,"request_id":"req-1"}"#.into(),
        ))
        .await
        .unwrap();
        let _ = timeout(Duration::from_secs(2), ws.next()).await;
    });

    assert!(matches!(next_event(&mut events).await, FeedEvent::Opened));

    let event = next_event(&mut events).await;
    let FeedEvent::Record(candle) = event else {
        panic!("expected a candle record, got {event:?}");
    };
    assert_eq!(candle.timestamp, 60_000);
    assert_eq!(candle.close, Decimal::new(105, 1));
    assert_eq!(client.record_count(), 1);

    client.shutdown();
    server.abort();
}

#[tokio::test]
async fn clear_empties_the_buffer() {
    let (listener, url) = bind_server().await;

    let (client, mut events) = OrderClient::connect(test_config(&url), OrderCodec::new());

    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        ws.send(Message::Text(
            r#"{"price":"7","quantity":7,"aggressor":"ask","timestamp":7}"#.into(),
        ))
        .await
        .unwrap();
        let _ = timeout(Duration::from_secs(2), ws.next()).await;
    });

    assert!(matches!(next_event(&mut events).await, FeedEvent::Opened));
    assert!(matches!(
        next_event(&mut events).await,
        FeedEvent::Record(_)
    ));
    assert_eq!(client.record_count(), 1);

    client.clear();
    assert_eq!(client.record_count(), 0);
    assert!(client.records().is_empty());

    client.shutdown();
    server.abort();
}

#[tokio::test]
async fn send_after_disconnect_is_rejected() {
    let (listener, url) = bind_server().await;

    let (client, mut events) = OrderClient::connect(test_config(&url), OrderCodec::new());

    let mut ws = accept_ws(&listener).await;
    assert!(matches!(next_event(&mut events).await, FeedEvent::Opened));

    // Close the connection and the listener so no reconnect can succeed
    ws.close(None).await.unwrap();
    drop(ws);
    drop(listener);

    loop {
        match next_event(&mut events).await {
            FeedEvent::Closed { .. } => break,
            FeedEvent::Error { .. } => {}
            other => panic!("unexpected event before close: {other:?}"),
        }
    }

    let request = SubscriptionRequest::subscribe().with_topic("transaction/*/*");
    let err = client.send(&request).unwrap_err();
    assert!(matches!(err, ReplayClientError::SendRejected { .. }));

    client.shutdown();
}
