//! The ritual stage motor.
//!
//! A cyclic state machine over the fixed stage table, driven entirely by
//! the injected [`Scheduler`]. Exactly one scheduled activation is pending
//! at any time:
//!
//! - `Idle --start--> Running`: reset to stage 0, activate it immediately,
//!   schedule stage 1 after stage 0's duration.
//! - while `Running`, each activation sets the current stage, advances the
//!   cycle index modulo the table length, and reschedules itself after the
//!   activated stage's duration.
//! - `Running --stop--> Idle`: cancel the pending activation, clear the
//!   current stage.
//! - start while running and stop while idle are no-ops; dropping the motor
//!   cancels any pending activation.
//!
//! Invariant: `current_stage()` is `Some` exactly while the motor runs.

use philovoid_core::ritual::{RitualStage, RITUAL_STAGES};
use philovoid_core::scheduler::{CancelToken, Scheduler};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tracing::debug;

/// Called on every stage activation, outside the state lock. The
/// presentation layer hangs its banner off this.
pub type StageObserver = Arc<dyn Fn(&RitualStage) + Send + Sync>;

#[derive(Default)]
struct MotorState {
    running: bool,
    cycle_index: usize,
    current: Option<RitualStage>,
    pending: Option<CancelToken>,
}

struct Shared {
    stages: &'static [RitualStage],
    scheduler: Arc<dyn Scheduler>,
    observer: Option<StageObserver>,
    state: Mutex<MotorState>,
}

impl Shared {
    /// Activate the stage at the cycle index and schedule the next tick.
    fn activate(shared: &Arc<Shared>) {
        let stage = {
            let mut state = shared.state.lock().expect("motor lock poisoned");
            if !state.running {
                return; // stopped between scheduling and firing
            }
            let stage = shared.stages[state.cycle_index].clone();
            state.current = Some(stage.clone());
            state.cycle_index = (state.cycle_index + 1) % shared.stages.len();

            let weak: Weak<Shared> = Arc::downgrade(shared);
            let token = shared.scheduler.after(
                Duration::from_secs(stage.duration_secs),
                Box::new(move || {
                    if let Some(shared) = weak.upgrade() {
                        Shared::activate(&shared);
                    }
                }),
            );
            state.pending = Some(token);
            stage
        };

        debug!(stage = stage.name, "Ritual stage activated");
        if let Some(observer) = &shared.observer {
            observer(&stage);
        }
    }
}

pub struct StageMotor {
    shared: Arc<Shared>,
}

impl StageMotor {
    /// Motor over the standard stage table.
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self::with_stages(scheduler, &RITUAL_STAGES)
    }

    /// Motor over a custom stage table. The table must be non-empty.
    pub fn with_stages(scheduler: Arc<dyn Scheduler>, stages: &'static [RitualStage]) -> Self {
        assert!(!stages.is_empty(), "stage table must not be empty");
        Self {
            shared: Arc::new(Shared {
                stages,
                scheduler,
                observer: None,
                state: Mutex::new(MotorState::default()),
            }),
        }
    }

    /// Attach an activation observer. Must be called before `start`.
    pub fn with_observer(mut self, observer: StageObserver) -> Self {
        let shared = Arc::get_mut(&mut self.shared)
            .expect("observer must be attached before the motor starts");
        shared.observer = Some(observer);
        self
    }

    /// Start the cycle. A no-op while already running.
    pub fn start(&self) {
        {
            let mut state = self.shared.state.lock().expect("motor lock poisoned");
            if state.running {
                return;
            }
            state.running = true;
            state.cycle_index = 0;
        }
        Shared::activate(&self.shared);
    }

    /// Stop the cycle and cancel the pending activation. A no-op while
    /// idle.
    pub fn stop(&self) {
        let token = {
            let mut state = self.shared.state.lock().expect("motor lock poisoned");
            if !state.running {
                return;
            }
            state.running = false;
            state.current = None;
            state.pending.take()
        };
        if let Some(token) = token {
            token.cancel();
        }
        debug!("Ritual stopped");
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.lock().expect("motor lock poisoned").running
    }

    /// The active stage; `Some` exactly while running.
    pub fn current_stage(&self) -> Option<RitualStage> {
        self.shared
            .state
            .lock()
            .expect("motor lock poisoned")
            .current
            .clone()
    }
}

impl Drop for StageMotor {
    fn drop(&mut self) {
        // No orphaned timers: cancel whatever is still pending.
        let token = self
            .shared
            .state
            .lock()
            .expect("motor lock poisoned")
            .pending
            .take();
        if let Some(token) = token {
            token.cancel();
        }
    }
}
