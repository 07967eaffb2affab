//! End-to-end transfers between two in-process connections.
//!
//! Each test binds two loopback sockets, wires them to each other and runs
//! the sending and receiving halves as separate tokio tasks so they make
//! progress concurrently.

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::time::Duration;

use udp_arq::simulator::{Simulator, SimulatorConfig};
use udp_arq::{Config, Connection, Socket};

/// Timeouts generous enough for a loaded CI machine.
fn test_config() -> Config {
    Config {
        recv_timeout: Duration::from_millis(10),
        ..Config::default()
    }
}

/// Two loopback sockets pointed at each other.
async fn socket_pair() -> (Socket, Socket) {
    let loopback: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let mut a = Socket::bind(loopback, loopback).await.expect("bind a");
    let b = Socket::bind(loopback, a.local_addr).await.expect("bind b");
    a.set_peer(b.local_addr);
    (a, b)
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

const GUARD: Duration = Duration::from_secs(20);

// ---------------------------------------------------------------------------
// Lossless channel
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lossless_round_trip_various_sizes() {
    for len in [1usize, 499, 500, 501, 1200, 10_000] {
        let (a, b) = socket_pair().await;
        let data = pattern(len);
        let expected = data.clone();

        let sender = tokio::spawn(async move {
            let mut conn = Connection::new(a, test_config()).unwrap();
            let sent = conn.send(&data).await.expect("send");
            (sent, conn.next_send_seq())
        });
        let receiver = tokio::spawn(async move {
            let mut conn = Connection::new(b, test_config()).unwrap();
            let got = conn.recv(len).await.expect("recv");
            (got, conn.next_expected_seq())
        });

        let (sr, rr) = tokio::time::timeout(GUARD, async { tokio::join!(sender, receiver) })
            .await
            .expect("transfer timed out");
        let (sent, next_send) = sr.unwrap();
        let (got, next_expected) = rr.unwrap();

        assert_eq!(sent, len);
        assert_eq!(got, expected, "payload of {len} bytes corrupted");
        assert_eq!(next_send, 1 + len as u32);
        assert_eq!(next_expected, 1 + len as u32);
    }
}

#[tokio::test]
async fn consecutive_sends_continue_one_stream() {
    let (a, b) = socket_pair().await;

    let sender = tokio::spawn(async move {
        let mut conn = Connection::new(a, test_config()).unwrap();
        conn.send(b"hello").await.expect("first send");
        conn.send(b", world").await.expect("second send");
        conn.next_send_seq()
    });
    let receiver = tokio::spawn(async move {
        let mut conn = Connection::new(b, test_config()).unwrap();
        let first = conn.recv(5).await.expect("first recv");
        let second = conn.recv(7).await.expect("second recv");
        (first, second)
    });

    let (sr, rr) = tokio::time::timeout(GUARD, async { tokio::join!(sender, receiver) })
        .await
        .expect("transfer timed out");
    assert_eq!(sr.unwrap(), 13);
    let (first, second) = rr.unwrap();
    assert_eq!(first, b"hello");
    assert_eq!(second, b", world");
}

#[tokio::test]
async fn surplus_bytes_kept_for_next_recv() {
    let (a, b) = socket_pair().await;
    let data = pattern(1200);
    let expected = data.clone();

    let sender = tokio::spawn(async move {
        let mut conn = Connection::new(a, test_config()).unwrap();
        conn.send(&data).await.expect("send")
    });
    let receiver = tokio::spawn(async move {
        let mut conn = Connection::new(b, test_config()).unwrap();
        let mut got = conn.recv(700).await.expect("first recv");
        assert_eq!(got.len(), 700);
        got.extend(conn.recv(500).await.expect("second recv"));
        got
    });

    let (sr, rr) = tokio::time::timeout(GUARD, async { tokio::join!(sender, receiver) })
        .await
        .expect("transfer timed out");
    assert_eq!(sr.unwrap(), 1200);
    assert_eq!(rr.unwrap(), expected);
}

#[tokio::test]
async fn recv_zero_returns_immediately() {
    let (_a, b) = socket_pair().await;
    let mut conn = Connection::new(b, test_config()).unwrap();
    let got = tokio::time::timeout(Duration::from_secs(1), conn.recv(0))
        .await
        .expect("recv(0) blocked")
        .unwrap();
    assert!(got.is_empty());
}

#[tokio::test]
async fn empty_send_completes_without_traffic() {
    let (a, _b) = socket_pair().await;
    let mut conn = Connection::new(a, test_config()).unwrap();
    assert_eq!(conn.send(&[]).await.unwrap(), 0);
    assert_eq!(conn.next_send_seq(), 1);
}

// ---------------------------------------------------------------------------
// Faulty channel
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lossy_reordering_channel_still_delivers_in_order() {
    const LEN: usize = 20_000;
    let (a, b) = socket_pair().await;
    let data = pattern(LEN);
    let expected = data.clone();

    let faults = SimulatorConfig {
        loss_rate: 0.2,
        duplicate_rate: 0.1,
        reorder_rate: 0.2,
        seed: 7,
    };

    let sender = tokio::spawn(async move {
        let mut conn = Connection::new(Simulator::new(a, faults), test_config()).unwrap();
        let sent = conn.send(&data).await.expect("send over lossy link");
        let dropped = conn.channel().stats.dropped.load(Ordering::Relaxed);
        (sent, dropped)
    });
    let receiver = tokio::spawn(async move {
        let mut conn = Connection::new(b, test_config()).unwrap();
        conn.recv(LEN).await.expect("recv over lossy link")
    });

    let (sr, rr) = tokio::time::timeout(GUARD, async { tokio::join!(sender, receiver) })
        .await
        .expect("transfer timed out");
    let (sent, dropped) = sr.unwrap();
    assert_eq!(sent, LEN);
    assert!(dropped > 0, "simulator never dropped anything");
    assert_eq!(rr.unwrap(), expected);
}

#[tokio::test]
async fn larger_window_round_trip() {
    const LEN: usize = 8_000;
    let (a, b) = socket_pair().await;
    let data = pattern(LEN);
    let expected = data.clone();
    let config = Config {
        send_window: 8,
        recv_window: 10,
        ..test_config()
    };
    let peer_config = config.clone();

    let sender = tokio::spawn(async move {
        let mut conn = Connection::new(a, config).unwrap();
        conn.send(&data).await.expect("send")
    });
    let receiver = tokio::spawn(async move {
        let mut conn = Connection::new(b, peer_config).unwrap();
        conn.recv(LEN).await.expect("recv")
    });

    let (sr, rr) = tokio::time::timeout(GUARD, async { tokio::join!(sender, receiver) })
        .await
        .expect("transfer timed out");
    assert_eq!(sr.unwrap(), LEN);
    assert_eq!(rr.unwrap(), expected);
}

#[tokio::test]
async fn invalid_config_rejected_at_construction() {
    let (a, _b) = socket_pair().await;
    let config = Config {
        retries: 0,
        ..Config::default()
    };
    let err = Connection::new(a, config).unwrap_err();
    assert!(matches!(err, udp_arq::ConnError::Config(_)), "got {err:?}");
}
