//! Rate limiting middleware
//!
//! In-memory per-client request counter. A client's count accumulates while
//! it keeps sending requests less than one window apart and resets once a
//! full window has passed since its last admitted request.
//!
//! The whole table sits behind one mutex so the read-check-increment for an
//! address happens as a single step: concurrent requests from the same client
//! can never both observe a count below the ceiling and slip through.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::{error::AppError, middleware::client_addr, routes::metrics, AppState};

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests admitted per client within one window
    pub max_requests: u32,
    /// Window length
    pub window: Duration,
    /// Maximum number of client records kept in memory
    pub max_clients: usize,
}

impl RateLimitConfig {
    pub fn with_max_clients(max_clients: usize) -> Self {
        Self {
            max_clients,
            ..Self::default()
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window: Duration::from_secs(60),
            max_clients: 100_000,
        }
    }
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Admitted; `count` is the client's count including this request
    Allowed { count: u32 },
    /// Rejected; the window lapses after `retry_after`
    Limited { retry_after: Duration },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }
}

#[derive(Debug)]
struct Visitor {
    last_seen: Instant,
    count: u32,
}

/// Visitor records plus an index ordered by `last_seen`.
///
/// Every record has exactly one `(last_seen, addr)` entry in `by_seen`.
#[derive(Default)]
struct VisitorTable {
    visitors: HashMap<String, Visitor>,
    by_seen: BTreeSet<(Instant, String)>,
}

impl VisitorTable {
    fn len(&self) -> usize {
        self.visitors.len()
    }

    fn touch(&mut self, addr: &str, previous: Instant, now: Instant) {
        if previous != now {
            self.by_seen.remove(&(previous, addr.to_string()));
            self.by_seen.insert((now, addr.to_string()));
        }
    }

    fn insert(&mut self, addr: &str, now: Instant) {
        self.visitors.insert(
            addr.to_string(),
            Visitor {
                last_seen: now,
                count: 1,
            },
        );
        self.by_seen.insert((now, addr.to_string()));
    }

    fn pop_oldest(&mut self) -> Option<(Instant, String)> {
        let (seen, addr) = self.by_seen.pop_first()?;
        self.visitors.remove(&addr);
        Some((seen, addr))
    }

    fn oldest_seen(&self) -> Option<Instant> {
        self.by_seen.first().map(|(seen, _)| *seen)
    }
}

/// Process-wide visitor table
pub struct RateLimiter {
    config: RateLimitConfig,
    table: Mutex<VisitorTable>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            table: Mutex::new(VisitorTable::default()),
        }
    }

    /// Number of client records currently held
    pub fn tracked_clients(&self) -> usize {
        self.table.lock().len()
    }

    /// Check (and count) a request from `addr` arriving now.
    pub fn check(&self, addr: &str) -> RateLimitDecision {
        self.check_at(addr, Instant::now())
    }

    pub fn check_at(&self, addr: &str, now: Instant) -> RateLimitDecision {
        let window = self.config.window;
        let mut table = self.table.lock();

        if let Some(visitor) = table.visitors.get_mut(addr) {
            let idle = now.saturating_duration_since(visitor.last_seen);
            if idle > window {
                info!(client = %addr, "Rate limit counter reset");
                visitor.count = 0;
            }

            if visitor.count >= self.config.max_requests {
                return RateLimitDecision::Limited {
                    retry_after: window.saturating_sub(idle),
                };
            }

            visitor.count += 1;
            let count = visitor.count;
            let previous = std::mem::replace(&mut visitor.last_seen, now);
            table.touch(addr, previous, now);
            return RateLimitDecision::Allowed { count };
        }

        if table.len() >= self.config.max_clients {
            Self::make_room(&mut table, now, window);
        }

        debug!(client = %addr, "New visitor");
        table.insert(addr, now);

        RateLimitDecision::Allowed { count: 1 }
    }

    /// Free at least one slot.
    ///
    /// Records idle for more than a window are dropped first, oldest first;
    /// their next request would restart at 1 either way. If the oldest record
    /// is still live, only that one is evicted.
    fn make_room(table: &mut VisitorTable, now: Instant, window: Duration) {
        let mut evicted = 0usize;

        while let Some(seen) = table.oldest_seen() {
            let lapsed = now.saturating_duration_since(seen) > window;
            if !lapsed && evicted > 0 {
                break;
            }
            table.pop_oldest();
            evicted += 1;
            if !lapsed {
                break;
            }
        }

        debug!(
            evicted,
            remaining = table.len(),
            "Visitor table at capacity"
        );
    }
}

/// Rate limiting middleware
///
/// Returns 429 with `Retry-After` once a client exceeds its allowance.
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let addr = client_addr(&request);

    match state.rate_limiter.check(&addr) {
        RateLimitDecision::Allowed { count } => {
            debug!(client = %addr, count, "Request within rate limit");
            next.run(request).await
        }
        RateLimitDecision::Limited { retry_after } => {
            warn!(
                client = %addr,
                retry_after_secs = retry_after.as_secs(),
                "Rate limit exceeded"
            );
            metrics::record_rate_limited();

            AppError::RateLimitExceeded {
                retry_after_secs: retry_after.as_secs_f64().ceil() as u64,
            }
            .into_response()
        }
    }
}
