use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{output::Renderer, random::RandomSource, registry::Registry};

/// Stops a [`Scheduler`] before its next tick. A stop requested before
/// `run` starts makes `run` return without ticking.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickStats {
    pub rendered: usize,
    pub skipped: usize,
    pub dropped: usize,
}

/// Drives every registered glitcher once per refresh tick.
pub struct Scheduler {
    period: Duration,
    max_ticks: Option<u64>,
    stop_when_empty: bool,
    running: AtomicBool,
    stop_requested: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new(fps: u32) -> Self {
        Self {
            period: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
            max_ticks: None,
            stop_when_empty: false,
            running: AtomicBool::new(false),
            stop_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stops on its own after `ticks` ticks.
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    /// Stops once the registry has no glitchers left.
    pub fn stop_when_empty(mut self) -> Self {
        self.stop_when_empty = true;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.stop_requested.clone())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Relaxed)
    }

    /// One pass over a snapshot of the registry.
    ///
    /// Glitchers without a source are skipped. A renderer failure drops that
    /// glitcher from the registry.
    pub fn tick(
        &self,
        registry: &mut Registry,
        rng: &mut impl RandomSource,
        renderer: &mut impl Renderer,
    ) -> TickStats {
        let mut stats = TickStats::default();

        for handle in registry.handles() {
            let Some(glitcher) = registry.get_mut(handle) else {
                continue;
            };

            if !glitcher.render(rng) {
                stats.skipped += 1;
                continue;
            }

            if let Err(e) = renderer.present(handle, glitcher.rendered()) {
                warn!(%handle, "dropping glitcher: {e}");
                registry.remove(handle);
                stats.dropped += 1;
                continue;
            }
            stats.rendered += 1;
        }

        stats
    }

    /// Ticks until stopped through a [`StopHandle`] or the tick limit.
    /// Returns the number of ticks run.
    pub async fn run(
        &self,
        registry: &mut Registry,
        rng: &mut impl RandomSource,
        renderer: &mut impl Renderer,
    ) -> u64 {
        let mut ticks = 0;
        if self.stop_requested() {
            info!("stop requested before start");
            return ticks;
        }

        self.running.store(true, Ordering::Relaxed);
        info!(period = ?self.period, instances = registry.len(), "scheduler started");

        let mut interval = interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            if self.stop_requested() {
                break;
            }

            let stats = self.tick(registry, rng, renderer);
            ticks += 1;
            debug!(tick = ticks, ?stats, "tick");

            if self.max_ticks.is_some_and(|max| ticks >= max)
                || (self.stop_when_empty && registry.is_empty())
                || self.stop_requested()
            {
                break;
            }
        }

        self.running.store(false, Ordering::Relaxed);
        info!(ticks, "scheduler stopped");
        ticks
    }
}
