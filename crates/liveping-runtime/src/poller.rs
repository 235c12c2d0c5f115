//! The poll loop: poll, decide, dispatch, sleep.
//!
//! Everything that mutates tracker state runs on this loop. The sleep phase
//! watches the shutdown signal and the manual trigger; a manual post
//! interrupts the sleep but does not move the next poll earlier.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, trace, warn};

use liveping_core::StatusSource;
use liveping_models::LiveState;

use crate::config::RuntimeConfig;
use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::event::RuntimeEvent;
use crate::tracker::{Decision, SessionTracker, StateSnapshot};
use crate::trigger::ManualTrigger;

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopPhase {
    #[default]
    Idle,
    Polling,
    Deciding,
    Dispatching,
    Sleeping,
    Stopped,
}

impl fmt::Display for LoopPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopPhase::Idle => "idle",
            LoopPhase::Polling => "polling",
            LoopPhase::Deciding => "deciding",
            LoopPhase::Dispatching => "dispatching",
            LoopPhase::Sleeping => "sleeping",
            LoopPhase::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// What happened during one cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// 1-based cycle number.
    pub cycle: u64,
    /// State observed, or `None` if the poll failed.
    pub observed: Option<LiveState>,
    /// Poll error, if any.
    pub error: Option<String>,
    /// Automatic dispatch made this cycle.
    pub dispatch: Option<DispatchOutcome>,
}

/// Single-consumer poll loop owning the tracker.
pub struct PollLoop {
    config: RuntimeConfig,
    source: Arc<dyn StatusSource>,
    dispatcher: Dispatcher,
    tracker: SessionTracker,
    trigger: ManualTrigger,
    trigger_open: bool,
    event_tx: broadcast::Sender<RuntimeEvent>,
    phase: LoopPhase,
    cycles: u64,
    started_at: DateTime<Utc>,
}

impl PollLoop {
    /// Creates a new poll loop.
    pub fn new(
        config: RuntimeConfig,
        source: Arc<dyn StatusSource>,
        dispatcher: Dispatcher,
        trigger: ManualTrigger,
        event_tx: broadcast::Sender<RuntimeEvent>,
    ) -> Self {
        Self {
            config,
            source,
            dispatcher,
            tracker: SessionTracker::new(),
            trigger,
            trigger_open: true,
            event_tx,
            phase: LoopPhase::Idle,
            cycles: 0,
            started_at: Utc::now(),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    /// Cycles run so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// The session tracker.
    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    /// Snapshot used by manual posts.
    pub fn snapshot(&self) -> StateSnapshot {
        self.tracker.snapshot()
    }

    fn set_phase(&mut self, phase: LoopPhase) {
        trace!(from = %self.phase, to = %phase, "phase change");
        self.phase = phase;
    }

    fn emit(&self, event: RuntimeEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }

    /// Run one poll → decide → dispatch cycle.
    ///
    /// A failed poll is logged and reported; the tracker is not touched.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.cycles += 1;
        debug!(cycle = self.cycles, "monitoring cycle");

        let mut report = CycleReport {
            cycle: self.cycles,
            observed: None,
            error: None,
            dispatch: None,
        };

        self.set_phase(LoopPhase::Polling);
        match self.source.poll(&self.config.username).await {
            Err(e) => {
                warn!(username = %self.config.username, error = %e, "status poll failed, skipping cycle");
                self.emit(RuntimeEvent::PollFailed {
                    error: e.to_string(),
                });
                report.error = Some(e.to_string());
            }
            Ok(status) => {
                self.set_phase(LoopPhase::Deciding);
                let decision = self.tracker.observe(status);
                let state = self.tracker.state();
                report.observed = Some(state);
                self.emit(RuntimeEvent::StateObserved {
                    state,
                    session_id: self.tracker.current_session().map(|s| s.id.clone()),
                });

                if let Decision::PostAutomatic(session) = decision {
                    self.set_phase(LoopPhase::Dispatching);
                    let outcome = self
                        .dispatcher
                        .dispatch_automatic(&mut self.tracker, &session)
                        .await;
                    self.emit(RuntimeEvent::Dispatched(outcome.clone()));
                    report.dispatch = Some(outcome);
                }
            }
        }

        if self.config.summary_every > 0 && self.cycles % self.config.summary_every == 0 {
            self.emit_summary();
        }

        self.set_phase(LoopPhase::Idle);
        report
    }

    fn emit_summary(&self) {
        let uptime = Utc::now() - self.started_at;
        let state = self.tracker.state();
        info!(
            uptime_secs = uptime.num_seconds(),
            stream = %state,
            cycles = self.cycles,
            "bot healthy"
        );
        self.emit(RuntimeEvent::Summary {
            cycles: self.cycles,
            state,
            uptime_secs: uptime.num_seconds(),
        });
    }

    /// Post right now from the current snapshot, bypassing dedup.
    pub async fn trigger_manual_post(&mut self) -> DispatchOutcome {
        let previous = self.phase;
        let snapshot = self.tracker.snapshot();
        info!(state = %snapshot.state, "manual post triggered");

        self.set_phase(LoopPhase::Dispatching);
        let outcome = self.dispatcher.dispatch_manual(&snapshot).await;
        self.emit(RuntimeEvent::Dispatched(outcome.clone()));
        self.set_phase(previous);

        outcome
    }

    /// Serve manual posts already queued when shutdown arrives.
    async fn drain_triggers(&mut self) {
        let mut served = 0;
        while self.trigger.try_recv() {
            self.trigger_manual_post().await;
            served += 1;
        }
        if served > 0 {
            debug!(served, "served queued manual posts before stopping");
        }
    }

    /// Run until the shutdown signal is set.
    ///
    /// Shutdown is honoured between cycles and during sleeps, never in the
    /// middle of a dispatch. Manual posts queued before shutdown still go out.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            username = %self.config.username,
            poll_interval_secs = self.config.poll_interval.as_secs(),
            "starting poll loop"
        );

        loop {
            if *shutdown.borrow() {
                self.drain_triggers().await;
                break;
            }

            self.run_cycle().await;

            if !self.sleep(&mut shutdown).await {
                break;
            }
        }

        self.set_phase(LoopPhase::Stopped);
        self.emit(RuntimeEvent::Stopped {
            cycles: self.cycles,
        });
        info!(cycles = self.cycles, "poll loop stopped");
    }

    /// Sleep for one poll interval, serving manual triggers meanwhile.
    ///
    /// Returns false when shutdown was requested.
    async fn sleep(&mut self, shutdown: &mut watch::Receiver<bool>) -> bool {
        self.set_phase(LoopPhase::Sleeping);
        let deadline = Instant::now() + self.config.poll_interval;

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    match changed {
                        Ok(()) if *shutdown.borrow() => {
                            debug!("poll loop received shutdown signal");
                            self.drain_triggers().await;
                            return false;
                        }
                        Ok(()) => {}
                        Err(_) => {
                            debug!("shutdown sender dropped");
                            self.drain_triggers().await;
                            return false;
                        }
                    }
                }
                signal = self.trigger.recv(), if self.trigger_open => {
                    match signal {
                        Some(()) => {
                            self.trigger_manual_post().await;
                        }
                        None => {
                            debug!("manual trigger closed");
                            self.trigger_open = false;
                        }
                    }
                }
                _ = sleep_until(deadline) => return true,
            }
        }
    }
}
