//! Integration tests for the full remote-call path.
//!
//! Each test starts a real bridge on an ephemeral port, drives it with
//! blocking gRPC clients on std threads, and runs the cooperative domain on the
//! test's current-thread runtime.

use std::thread;
use std::time::Duration;
use tickbridge::bridge::{BridgeSupervisor, StopCondition, StopReason, SupervisorConfig};
use tickbridge::server::{ClientError, RemoteClient};
use tokio::sync::oneshot;
use tonic::Code;

// =============================================================================
// Test Helpers
// =============================================================================

fn config() -> SupervisorConfig {
    SupervisorConfig {
        address: "127.0.0.1:0".to_string(),
        clock_period: Duration::from_micros(200),
        ..SupervisorConfig::default()
    }
}

fn start(config: SupervisorConfig) -> (BridgeSupervisor, String) {
    let bridge = BridgeSupervisor::start(config).expect("bridge should start");
    let address = bridge.local_addr().expect("service is bound").to_string();
    (bridge, address)
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_ten_remote_calls_complete_in_order() {
    let (mut bridge, address) = start(config());

    let client = thread::spawn(move || {
        let mut client = RemoteClient::connect(&address).unwrap();
        (0..10u64)
            .map(|i| client.add(i, i * 2).unwrap())
            .collect::<Vec<_>>()
    });

    let summary = bridge
        .run_until(StopCondition::Transactions(10))
        .await
        .unwrap();
    assert_eq!(summary.reason, StopReason::ConditionMet);
    assert_eq!(summary.transactions, 10);

    let results = client.join().unwrap();
    assert_eq!(results, (0..10u64).map(|i| i * 3).collect::<Vec<_>>());
    bridge.shutdown();
}

#[tokio::test]
async fn test_idle_client_does_not_starve_single_worker() {
    let (mut bridge, address) = start(SupervisorConfig {
        workers: 1,
        ..config()
    });
    let transactions = bridge.transactions();

    // Connected first and never calls until released.
    let (connected_tx, connected_rx) = oneshot::channel();
    let (release_tx, release_rx) = oneshot::channel::<()>();
    let idle = {
        let address = address.clone();
        thread::spawn(move || {
            let client = RemoteClient::connect(&address).unwrap();
            connected_tx.send(()).unwrap();
            let _ = release_rx.blocking_recv();
            drop(client);
        })
    };
    connected_rx.await.unwrap();

    let caller = thread::spawn(move || {
        let mut client = RemoteClient::connect(&address).unwrap();
        client.add(3, 4)
    });

    let summary = bridge
        .run_until(StopCondition::Transactions(1))
        .await
        .unwrap();
    assert_eq!(summary.reason, StopReason::ConditionMet);

    assert_eq!(caller.join().unwrap().unwrap(), 7);
    assert_eq!(transactions.get(), 1);
    release_tx.send(()).unwrap();
    idle.join().unwrap();
    bridge.shutdown();
}

#[test]
fn test_shutdown_cancels_blocked_remote_call() {
    let (bridge, address) = start(config());

    let client = thread::spawn(move || {
        let mut client = RemoteClient::connect(&address).unwrap();
        client.add(1, 2)
    });

    // The cooperative domain never runs, so the call stays blocked.
    thread::sleep(Duration::from_millis(100));
    bridge.shutdown();

    let err = client.join().unwrap().unwrap_err();
    assert_eq!(err.code(), Some(Code::Cancelled));
}

#[test]
fn test_abandoned_request_fills_bounded_queue() {
    let (bridge, address) = start(SupervisorConfig {
        request_capacity: Some(1),
        call_timeout: Some(Duration::from_millis(50)),
        ..config()
    });

    let mut client = RemoteClient::connect(&address).unwrap();
    let first = client.add(1, 1).unwrap_err();
    assert_eq!(first.code(), Some(Code::DeadlineExceeded));

    // The timed-out request is still queued and occupies the only slot.
    let second = client.add(2, 2).unwrap_err();
    assert_eq!(second.code(), Some(Code::ResourceExhausted));

    drop(client);
    bridge.shutdown();
}

#[tokio::test]
async fn test_concurrent_clients_are_served_one_call_at_a_time() {
    let (mut bridge, address) = start(SupervisorConfig {
        workers: 2,
        ..config()
    });

    let clients: Vec<_> = (0..2u64)
        .map(|c| {
            let address = address.clone();
            thread::spawn(move || {
                let mut client = RemoteClient::connect(&address).unwrap();
                (0..5u64)
                    .map(|i| client.add(c * 100, i).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let summary = bridge
        .run_until(StopCondition::Transactions(10))
        .await
        .unwrap();
    assert_eq!(summary.transactions, 10);

    for (c, client) in clients.into_iter().enumerate() {
        let expected: Vec<u64> = (0..5u64).map(|i| c as u64 * 100 + i).collect();
        assert_eq!(client.join().unwrap(), expected);
    }
    bridge.shutdown();
}

#[test]
fn test_connecting_to_a_stopped_bridge_fails() {
    let (bridge, address) = start(config());
    bridge.shutdown();

    thread::sleep(Duration::from_millis(50));
    match RemoteClient::connect(&address) {
        Err(ClientError::Transport(_)) => {}
        Ok(mut client) => assert!(client.add(1, 1).is_err()),
        Err(other) => panic!("unexpected error: {}", other),
    }
}
