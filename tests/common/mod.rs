//! Shared fakes for integration tests.
//!
//! - [`FakeChart`]: deterministic chart provider serving newest-first daily
//!   rows, `page_size` at a time
//! - [`FakeSession`]: connectivity flag and a windowed call budget
//! - Query types driving the three pagers

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use dib_gateway::transaction::date_to_int;
use dib_gateway::{
    CountPager, Error, EventPort, LimitKind, Pager, Provider, Query, Result, Session, TermPager,
};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;

// ============================================================================
// Field Layout
// ============================================================================

pub const ROWS_HEADER: i32 = 3;
pub const COUNT_INPUT: i32 = 4;
pub const END_DATE_INPUT: i32 = 2;
pub const DATE_COLUMN: i32 = 0;

// ============================================================================
// Tracing & Polling
// ============================================================================

/// Installs a test subscriber honoring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Polls `condition` until it holds, failing the test after five seconds.
pub async fn eventually(condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

// ============================================================================
// FakeSession
// ============================================================================

struct Window {
    started: Instant,
    remaining: i64,
}

/// Session with a fixed quota per time window, shared by all categories.
pub struct FakeSession {
    connected: AtomicBool,
    quota: i64,
    length: Duration,
    window: Mutex<Window>,
}

impl FakeSession {
    /// Connected, effectively unlimited.
    pub fn new() -> Arc<Self> {
        Self::limited(i64::MAX, Duration::from_secs(3600))
    }

    /// Connected, `quota` calls per `length`.
    pub fn limited(quota: i64, length: Duration) -> Arc<Self> {
        Arc::new(Self {
            connected: AtomicBool::new(true),
            quota,
            length,
            window: Mutex::new(Window {
                started: Instant::now(),
                remaining: quota,
            }),
        })
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Spends one call. Returns `false` if the budget was already empty.
    pub fn spend(&self) -> bool {
        let mut window = self.roll();
        if window.remaining <= 0 {
            return false;
        }
        window.remaining -= 1;
        true
    }

    fn roll(&self) -> parking_lot::MutexGuard<'_, Window> {
        let mut window = self.window.lock();
        if window.started.elapsed() >= self.length {
            window.started = Instant::now();
            window.remaining = self.quota;
        }
        window
    }
}

impl Session for FakeSession {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn limit_remain_count(&self, _kind: LimitKind) -> i64 {
        self.roll().remaining
    }

    fn limit_remain_time(&self, _kind: LimitKind) -> u64 {
        let window = self.roll();
        let left = self.length.saturating_sub(window.started.elapsed());
        left.as_millis() as u64
    }
}

// ============================================================================
// FakeChart
// ============================================================================

#[derive(Default)]
struct ChartState {
    /// Rows already served.
    cursor: usize,
    /// Dates of the last response, newest first.
    last: Vec<i64>,
    more: bool,
    inputs: FxHashMap<i32, Value>,
    ports: Vec<EventPort>,
    request_threads: Vec<Option<String>>,
}

/// Chart provider over `total` consecutive days ending at `latest`.
pub struct FakeChart {
    dates: Vec<i64>,
    page_size: usize,
    fail_on_request: Option<usize>,
    post_events: bool,
    session: Option<Arc<FakeSession>>,
    requests: AtomicUsize,
    blocking_requests: AtomicUsize,
    budget_violations: AtomicUsize,
    state: Mutex<ChartState>,
}

impl FakeChart {
    pub fn new(total: usize, page_size: usize) -> Self {
        let latest = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let dates = std::iter::successors(Some(latest), |date| date.pred_opt())
            .take(total)
            .map(date_to_int)
            .collect();

        Self {
            dates,
            page_size,
            fail_on_request: None,
            post_events: true,
            session: None,
            requests: AtomicUsize::new(0),
            blocking_requests: AtomicUsize::new(0),
            budget_violations: AtomicUsize::new(0),
            state: Mutex::new(ChartState::default()),
        }
    }

    /// Reports dib status 1 just before the `n`th request (1-based).
    pub fn failing_on(mut self, n: usize) -> Self {
        self.fail_on_request = Some(n);
        self
    }

    /// Never raises a received event.
    pub fn silent(mut self) -> Self {
        self.post_events = false;
        self
    }

    /// Spends the session's budget on every request.
    pub fn spending(mut self, session: Arc<FakeSession>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn blocking_requests(&self) -> usize {
        self.blocking_requests.load(Ordering::SeqCst)
    }

    pub fn budget_violations(&self) -> usize {
        self.budget_violations.load(Ordering::SeqCst)
    }

    pub fn input(&self, field: i32) -> Option<Value> {
        self.state.lock().inputs.get(&field).cloned()
    }

    pub fn advised(&self) -> usize {
        self.state.lock().ports.len()
    }

    pub fn request_threads(&self) -> Vec<Option<String>> {
        self.state.lock().request_threads.clone()
    }

    /// Raises a received event on every attached port.
    pub fn notify_all(&self) -> usize {
        let ports = self.state.lock().ports.clone();
        ports.iter().filter(|port| port.received()).count()
    }

    fn serve(&self) {
        if let Some(session) = &self.session
            && !session.spend()
        {
            self.budget_violations.fetch_add(1, Ordering::SeqCst);
        }

        let mut state = self.state.lock();
        state
            .request_threads
            .push(thread::current().name().map(str::to_string));

        let wanted = state
            .inputs
            .get(&COUNT_INPUT)
            .and_then(Value::as_u64)
            .map_or(self.page_size, |n| n as usize);
        let start = state.cursor;
        let end = (start + wanted.min(self.page_size)).min(self.dates.len());

        state.last = self.dates[start..end].to_vec();
        state.cursor = end;
        state.more = end < self.dates.len();
    }
}

impl Provider for FakeChart {
    fn set_input_value(&self, field: i32, value: Value) -> Result<()> {
        self.state.lock().inputs.insert(field, value);
        Ok(())
    }

    fn get_header_value(&self, field: i32) -> Result<Value> {
        let state = self.state.lock();
        match field {
            ROWS_HEADER => Ok(Value::from(state.last.len())),
            _ => Ok(Value::Null),
        }
    }

    fn get_data_value(&self, column: i32, row: i32) -> Result<Value> {
        let state = self.state.lock();
        if column != DATE_COLUMN {
            return Ok(Value::Null);
        }
        usize::try_from(row)
            .ok()
            .and_then(|row| state.last.get(row))
            .map(|date| Value::from(*date))
            .ok_or_else(|| Error::provider(format!("row {row} out of range")))
    }

    fn request(&self) -> Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.serve();
        if self.post_events {
            self.notify_all();
        }
        Ok(())
    }

    fn block_request(&self) -> Result<()> {
        self.blocking_requests.fetch_add(1, Ordering::SeqCst);
        self.serve();
        Ok(())
    }

    fn dib_status(&self) -> i32 {
        let issued = self.requests() + self.blocking_requests();
        match self.fail_on_request {
            Some(n) if issued + 1 == n => 1,
            _ => 0,
        }
    }

    fn has_continue(&self) -> bool {
        self.state.lock().more
    }

    fn advise(&self, port: EventPort) -> Result<()> {
        self.state.lock().ports.push(port);
        Ok(())
    }

    fn unadvise(&self, port: &EventPort) -> Result<()> {
        self.state.lock().ports.retain(|p| p != port);
        Ok(())
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Last `n` daily rows.
pub struct CountQuery(pub u64);

impl Query for CountQuery {
    fn serialize(&self, provider: &dyn Provider) -> Result<()> {
        provider.set_input_value(COUNT_INPUT, Value::from(self.0))
    }

    fn pager(&self) -> Box<dyn Pager> {
        Box::new(CountPager::new(self.0))
    }
}

/// Every daily row from `begin` on.
pub struct TermQuery(pub NaiveDate);

impl Query for TermQuery {
    fn serialize(&self, provider: &dyn Provider) -> Result<()> {
        provider.set_input_value(COUNT_INPUT, Value::Null)
    }

    fn pager(&self) -> Box<dyn Pager> {
        Box::new(TermPager::new(self.0))
    }
}

/// Single-shot request.
pub struct SnapshotQuery;

impl Query for SnapshotQuery {
    fn serialize(&self, provider: &dyn Provider) -> Result<()> {
        provider.set_input_value(COUNT_INPUT, Value::from(1))
    }
}
