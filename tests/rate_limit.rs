//! Rate limiter tests against a windowed fake budget.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use dib_gateway::{Gateway, LimitKind, Page, RateLimiter, Session};

use common::{FakeChart, FakeSession, SnapshotQuery, init_tracing};

#[test]
fn test_reads_live_counters() {
    let session = FakeSession::limited(3, Duration::from_secs(60));
    let limiter = RateLimiter::new(session.clone());

    assert_eq!(limiter.remaining_calls(LimitKind::NonTrade), 3);
    assert!(session.spend());
    assert_eq!(limiter.remaining_calls(LimitKind::NonTrade), 2);
    assert!(limiter.remaining_millis(LimitKind::NonTrade) <= 60_000);
}

#[test]
fn test_block_waits_for_window_reset() {
    let session = FakeSession::limited(1, Duration::from_millis(150));
    let limiter = RateLimiter::new(session.clone());

    assert!(session.spend());
    let started = Instant::now();
    limiter.block_until_available(LimitKind::NonTrade);

    assert!(started.elapsed() >= Duration::from_millis(100));
    assert_eq!(limiter.remaining_calls(LimitKind::NonTrade), 1);
}

#[tokio::test]
async fn test_wait_returns_immediately_with_budget() {
    let session = FakeSession::limited(5, Duration::from_secs(60));
    let limiter = RateLimiter::new(session);

    let started = Instant::now();
    limiter.wait_until_available(LimitKind::Trade).await;
    assert!(started.elapsed() < Duration::from_millis(50));
}

#[test]
fn test_blocking_sends_never_exceed_budget() {
    init_tracing();
    let session = FakeSession::limited(2, Duration::from_millis(100));
    let gateway = Gateway::builder()
        .session(session.clone() as Arc<dyn Session>)
        .build()
        .unwrap();
    let chart = FakeChart::new(10, 10).spending(session).into_arc();
    let tx = gateway.transaction(chart.clone());

    let started = Instant::now();
    for _ in 0..5 {
        tx.blocking_send(SnapshotQuery, |_page: &Page<'_>| Ok(())).unwrap();
    }

    assert_eq!(chart.blocking_requests(), 5);
    assert_eq!(chart.budget_violations(), 0);
    // 2 + 2 + 1 sends need two resets.
    assert!(started.elapsed() >= Duration::from_millis(150));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_sends_never_exceed_budget() {
    let session = FakeSession::limited(1, Duration::from_millis(80));
    let gateway = Gateway::builder()
        .session(session.clone() as Arc<dyn Session>)
        .max_workers(1)
        .build()
        .unwrap();
    let chart = FakeChart::new(10, 10).spending(session).into_arc();
    let tx = gateway.transaction(chart.clone());

    for _ in 0..3 {
        tx.submit(SnapshotQuery).await.unwrap();
    }

    assert_eq!(chart.requests(), 3);
    assert_eq!(chart.budget_violations(), 0);

    gateway.shutdown_async(false).await.unwrap();
}
