//! Request budgets for the trade endpoints.
//!
//! Each endpoint group (search, fetch) is guarded by several fixed windows at once, e.g.
//! 5 requests per 10s *and* 15 per 60s. A request proceeds only when every window of the
//! group has room. The trade site reports its own view of those windows in response
//! headers and that view always wins over local accounting:
//!
//! ```text
//! X-Rate-Limit-Rules: Ip
//! X-Rate-Limit-Ip: 5:10:60,15:60:300
//! X-Rate-Limit-Ip-State: 1:10:0,1:60:0
//! ```

use parking_lot::{Mutex, RwLock};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};
use crate::errors::{Result, TradeError};

/// Upper bound for windows and restrictions; keeps instant arithmetic in range.
const MAX_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default = "default_policy")]
    pub policy: String,
    pub capacity: u32,
    pub window_secs: u64,
}

fn default_policy() -> String {
    "Ip".to_string()
}

impl RuleConfig {
    pub fn new(capacity: u32, window_secs: u64) -> Self {
        Self {
            policy: default_policy(),
            capacity,
            window_secs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleSnapshot {
    pub capacity: u32,
    pub window: Duration,
    pub used: u32,
    pub queued: u32,
    pub restricted_for: Option<Duration>,
}

#[derive(Debug)]
struct RuleState {
    capacity: u32,
    window: Duration,
    used: u32,
    window_started_at: Instant,
    restricted_until: Option<Instant>,
}

impl RuleState {
    fn roll_window(&mut self, now: Instant) {
        if now.saturating_duration_since(self.window_started_at) >= self.window {
            self.used = 0;
            self.window_started_at = now;
        }
        if self.restricted_until.is_some_and(|until| until <= now) {
            self.restricted_until = None;
        }
    }

    fn window_end(&self) -> Instant {
        self.window_started_at + self.window
    }

    /// When this rule admits the next request, `None` if it does right now.
    fn ready_at(&self) -> Option<Instant> {
        let full = (self.used >= self.capacity).then(|| self.window_end());
        match (full, self.restricted_until) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }

    fn time_until_reset(&self, now: Instant) -> Duration {
        let window_left = self.window_end().saturating_duration_since(now);
        let restriction_left = self.restricted_until
            .map(|until| until.saturating_duration_since(now))
            .unwrap_or_default();
        window_left.max(restriction_left)
    }
}

/// One provider-enforced window: at most `capacity` requests per `window`.
#[derive(Debug)]
pub struct RateLimitRule {
    name: String,
    state: Mutex<RuleState>,
    // Fair mutex, waiters on one rule are served in arrival order
    gate: tokio::sync::Mutex<()>,
    queued: AtomicU32,
}

impl RateLimitRule {
    pub fn new(name: impl Into<String>, capacity: u32, window: Duration) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(RuleState {
                capacity,
                window: window.min(MAX_WINDOW),
                used: 0,
                window_started_at: Instant::now(),
                restricted_until: None,
            }),
            gate: tokio::sync::Mutex::new(()),
            queued: AtomicU32::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn snapshot(&self) -> RuleSnapshot {
        let now = Instant::now();
        let mut state = self.state.lock();
        state.roll_window(now);
        RuleSnapshot {
            capacity: state.capacity,
            window: state.window,
            used: state.used,
            queued: self.queued.load(Ordering::SeqCst),
            restricted_for: state.restricted_until.map(|until| until.saturating_duration_since(now)),
        }
    }

    /// Time until this rule's current window (or active restriction) is over.
    pub fn time_until_reset(&self) -> Duration {
        let now = Instant::now();
        let mut state = self.state.lock();
        state.roll_window(now);
        state.time_until_reset(now)
    }

    fn sync(&self, window: &ReportedWindow, now: Instant) {
        let mut state = self.state.lock();
        let reported_window = window.window.min(MAX_WINDOW);

        state.capacity = window.capacity;
        if state.window != reported_window {
            state.window = reported_window;
            state.window_started_at = now;
        }
        state.used = window.used;
        state.restricted_until = (!window.restricted.is_zero())
            .then(|| now + window.restricted.min(MAX_WINDOW));
    }
}

/// Keeps `queued` accurate even when a waiting future is dropped.
struct QueueTicket<'a> {
    rule: &'a RateLimitRule,
}

impl<'a> QueueTicket<'a> {
    fn new(rule: &'a RateLimitRule) -> Self {
        rule.queued.fetch_add(1, Ordering::SeqCst);
        Self { rule }
    }
}

impl Drop for QueueTicket<'_> {
    fn drop(&mut self) {
        self.rule.queued.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The set of rules guarding one endpoint.
#[derive(Debug)]
pub struct RateLimitGroup {
    name: String,
    rules: RwLock<Vec<Arc<RateLimitRule>>>,
}

impl RateLimitGroup {
    pub fn new(name: impl Into<String>, rules: &[RuleConfig]) -> Self {
        let name = name.into();
        let rules = rules
            .iter()
            .map(|rule| {
                let window = Duration::from_secs(rule.window_secs);
                Arc::new(RateLimitRule::new(
                    rule_name(&name, &rule.policy, window),
                    rule.capacity,
                    window,
                ))
            })
            .collect();

        Self {
            name,
            rules: RwLock::new(rules),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> Vec<Arc<RateLimitRule>> {
        self.rules.read().clone()
    }

    /// [`wait_for`] on this group's rules, including windows reported while waiting.
    pub async fn acquire(&self) -> Result<()> {
        let mut charged = self.rules();
        wait_for(&charged).await?;

        loop {
            let added: Vec<Arc<RateLimitRule>> = self
                .rules()
                .into_iter()
                .filter(|rule| !charged.iter().any(|c| Arc::ptr_eq(c, rule)))
                .collect();
            if added.is_empty() {
                return Ok(());
            }

            debug!(group = %self.name, windows = added.len(), "Waiting on windows reported meanwhile");
            wait_for(&added).await?;
            charged.extend(added);
        }
    }

    fn replace(&self, reported: Vec<ReportedWindow>) {
        let now = Instant::now();
        let mut rules = self.rules.write();

        let next: Vec<Arc<RateLimitRule>> = reported
            .iter()
            .map(|window| {
                let name = rule_name(&self.name, &window.policy, window.window);
                let rule = rules
                    .iter()
                    .find(|rule| rule.name == name)
                    .cloned()
                    .unwrap_or_else(|| {
                        debug!(rule = %name, "New rate limit window reported");
                        Arc::new(RateLimitRule::new(name, window.capacity, window.window))
                    });
                rule.sync(window, now);
                rule
            })
            .collect();

        *rules = next;
    }
}

fn rule_name(group: &str, policy: &str, window: Duration) -> String {
    format!("{}:{}:{}s", group, policy, window.as_secs())
}

/// Suspends until every rule has budget, then takes one request from each.
/// Fails for a rule that admits nothing at all, as it would never free up.
pub async fn wait_for(rules: &[Arc<RateLimitRule>]) -> Result<()> {
    let mut ordered: Vec<&Arc<RateLimitRule>> = rules.iter().collect();
    // Same lock order for every caller
    ordered.sort_by(|a, b| {
        a.name.cmp(&b.name).then_with(|| Arc::as_ptr(a).cmp(&Arc::as_ptr(b)))
    });
    ordered.dedup_by(|a, b| Arc::ptr_eq(a, b));

    let _tickets: Vec<QueueTicket<'_>> = ordered.iter().map(|rule| QueueTicket::new(rule)).collect();

    let mut _gates = Vec::with_capacity(ordered.len());
    for rule in &ordered {
        _gates.push(rule.gate.lock().await);
    }

    loop {
        let now = Instant::now();
        let wake_at = {
            let mut states: Vec<_> = ordered.iter().map(|rule| rule.state.lock()).collect();
            if let Some(closed) = states.iter().position(|state| state.capacity == 0) {
                let rule = &ordered[closed].name;
                warn!(rule = %rule, "Rate limit rule admits no requests");
                return Err(TradeError::RateLimitError {
                    rule: rule.clone(),
                    retry_after: None,
                });
            }

            let wake_at = states
                .iter_mut()
                .filter_map(|state| {
                    state.roll_window(now);
                    state.ready_at()
                })
                .max();

            if wake_at.is_none() {
                for state in states.iter_mut() {
                    state.used += 1;
                }
            }
            wake_at
        };

        match wake_at {
            None => return Ok(()),
            Some(at) => {
                debug!(wait_ms = at.saturating_duration_since(now).as_millis() as u64, "Waiting for rate limit budget");
                tokio::time::sleep_until(at).await;
            }
        }
    }
}

/// Demand a caller is about to place on a group.
pub struct QueueDemand<'a> {
    pub count: u32,
    pub group: &'a RateLimitGroup,
}

impl<'a> QueueDemand<'a> {
    pub fn new(count: u32, group: &'a RateLimitGroup) -> Self {
        Self { count, group }
    }
}

/// Fails fast when a request could not be served within the current windows.
pub fn prevent_queue_creation(demands: &[QueueDemand<'_>]) -> Result<()> {
    let now = Instant::now();

    for demand in demands {
        for rule in demand.group.rules() {
            let queued = rule.queued.load(Ordering::SeqCst);
            let mut state = rule.state.lock();
            state.roll_window(now);

            if let Some(until) = state.restricted_until {
                warn!(rule = %rule.name, "Rate limit restriction active");
                return Err(TradeError::RateLimitError {
                    rule: rule.name.clone(),
                    retry_after: Some(until.saturating_duration_since(now)),
                });
            }

            if queued.saturating_add(demand.count) > state.capacity {
                warn!(rule = %rule.name, queued, capacity = state.capacity, "Refusing to queue request");
                return Err(TradeError::RateLimitError {
                    rule: rule.name.clone(),
                    retry_after: Some(state.time_until_reset(now)),
                });
            }
        }
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
struct ReportedWindow {
    policy: String,
    capacity: u32,
    window: Duration,
    used: u32,
    restricted: Duration,
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name)?.to_str().ok()
}

/// `a:b:c,a:b:c` triples; malformed entries are skipped.
fn parse_triples(value: &str) -> Vec<(u32, u64, u64)> {
    value
        .split(',')
        .filter_map(|triple| {
            let mut parts = triple.trim().split(':').map(|p| p.trim().parse::<u64>().ok());
            let a = parts.next()??;
            let b = parts.next()??;
            let c = parts.next()??;
            Some((u32::try_from(a).unwrap_or(u32::MAX), b, c))
        })
        .collect()
}

fn parse_headers(headers: &HeaderMap) -> Vec<ReportedWindow> {
    let Some(policies) = header_str(headers, "x-rate-limit-rules") else {
        return Vec::new();
    };

    let mut reported = Vec::new();
    for policy in policies.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let key = policy.to_ascii_lowercase();
        let limits = header_str(headers, &format!("x-rate-limit-{}", key));
        let states = header_str(headers, &format!("x-rate-limit-{}-state", key));

        let (Some(limits), Some(states)) = (limits, states) else {
            warn!(policy, "Rate limit policy listed without limits or state");
            continue;
        };

        let states = parse_triples(states);
        for (capacity, period, _penalty) in parse_triples(limits) {
            let (used, restricted) = states
                .iter()
                .find(|(_, state_period, _)| *state_period == period)
                .map(|(hits, _, restricted)| (*hits, *restricted))
                .unwrap_or((0, 0));

            reported.push(ReportedWindow {
                policy: policy.to_string(),
                capacity,
                window: Duration::from_secs(period),
                used,
                restricted: Duration::from_secs(restricted),
            });
        }
    }
    reported
}

/// Re-synchronizes a group with the limits reported in a response.
pub fn adjust_rate_limits(group: &RateLimitGroup, headers: &HeaderMap) {
    let reported = parse_headers(headers);
    if reported.is_empty() {
        return;
    }

    debug!(group = %group.name, windows = reported.len(), "Adjusting rate limits");
    group.replace(reported);
}
