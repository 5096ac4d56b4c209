use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::api::aggregator::{AggregatorClient, FetchError};
use crate::services::chart_service::{update_chart, Chart, ChartRenderer, RenderError};
use crate::services::series_service;

/// What to do when a tick fires while an earlier poll is still running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Start another poll anyway. Responses are applied in the order they
    /// arrive, so a slow stale response can overwrite a fresher one.
    #[default]
    Overlap,
    /// Skip the tick until the running poll finishes
    SingleFlight,
}

impl FromStr for OverlapPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overlap" => Ok(OverlapPolicy::Overlap),
            "single-flight" | "single_flight" | "singleflight" => Ok(OverlapPolicy::SingleFlight),
            _ => Err(format!(
                "Unknown overlap policy: '{}'. Supported: overlap, single-flight",
                s
            )),
        }
    }
}

/// Failure of one poll cycle
#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// The chart and the surface it is drawn on. Built once at startup.
pub struct DashboardState {
    chart: Chart,
    renderer: Box<dyn ChartRenderer>,
}

impl DashboardState {
    pub fn new(chart: Chart, renderer: Box<dyn ChartRenderer>) -> Self {
        Self { chart, renderer }
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }
}

/// One fetch, validate, partition and render pass.
///
/// The lock is only taken once data has arrived, so a hung request never
/// blocks other polls. On a fetch error the chart is left untouched.
pub async fn poll_cycle(
    client: &AggregatorClient,
    state: &Mutex<DashboardState>,
) -> Result<(), PollError> {
    let (low, high) = series_service::fetch_series(client).await?;
    let now_ms = Utc::now().timestamp_millis();

    let mut guard = state.lock().await;
    let DashboardState { chart, renderer } = &mut *guard;
    update_chart(chart, low, high, now_ms, renderer.as_mut())?;
    Ok(())
}

async fn poll_logged(client: &AggregatorClient, state: &Mutex<DashboardState>) {
    if let Err(e) = poll_cycle(client, state).await {
        warn!("Dashboard update failed: {}", e);
    }
}

/// Marks a poll as running; cleared on drop
struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag: flag.clone() })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Drives poll cycles on a fixed period
pub struct PollDriver {
    client: Arc<AggregatorClient>,
    state: Arc<Mutex<DashboardState>>,
    interval: Duration,
    policy: OverlapPolicy,
    in_flight: Arc<AtomicBool>,
}

impl PollDriver {
    pub fn new(
        client: AggregatorClient,
        state: Arc<Mutex<DashboardState>>,
        interval: Duration,
        policy: OverlapPolicy,
    ) -> Self {
        Self {
            client: Arc::new(client),
            state,
            interval,
            policy,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start a poll for the current tick without waiting for it
    fn spawn_poll(&self) {
        let client = self.client.clone();
        let state = self.state.clone();

        match self.policy {
            OverlapPolicy::Overlap => {
                tokio::spawn(async move {
                    poll_logged(&client, &state).await;
                });
            }
            OverlapPolicy::SingleFlight => {
                let Some(guard) = InFlightGuard::acquire(&self.in_flight) else {
                    debug!("Previous poll still in flight, skipping tick");
                    return;
                };
                tokio::spawn(async move {
                    poll_logged(&client, &state).await;
                    drop(guard);
                });
            }
        }
    }

    /// Poll once right away, then every interval until `shutdown` resolves.
    ///
    /// Every poll, the first included, runs as its own task, so a request
    /// that never answers does not hold up later ticks. Poll errors are
    /// logged and never end the loop.
    pub async fn run<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            "📡 Polling {} every {} ms ({:?})",
            self.client.url(),
            self.interval.as_millis(),
            self.policy
        );
        tokio::pin!(shutdown);

        // The first tick completes immediately.
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.spawn_poll(),
                _ = &mut shutdown => break,
            }
        }

        let state = self.state.lock().await;
        info!(
            "Polling stopped ({} low, {} high points on chart)",
            state.chart().state().low.len(),
            state.chart().state().high.len()
        );
    }
}
