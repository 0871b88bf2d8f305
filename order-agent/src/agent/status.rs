use parking_lot::Mutex;

/// Status message while the cycle runs without incident
pub const HEALTHY_MESSAGE: &str = "A correr sem problemas aparentes.";

/// Point-in-time view of the agent state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub running: bool,
    pub alarm: bool,
    pub message: String,
}

impl StatusSnapshot {
    /// Short state label for the console
    pub fn state_label(&self) -> &'static str {
        match (self.running, self.alarm) {
            (true, false) => "RUNNING",
            (true, true) => "RUNNING+ALARM",
            (false, false) => "STOPPED",
            (false, true) => "STOPPED+ALARM",
        }
    }
}

/// State read by the shell and written by the worker
///
/// Every update is a single locked transition; the guard never leaves
/// this type. Each start opens a new generation, and writes tagged with
/// an older one are ignored.
#[derive(Debug)]
pub struct SharedStatus {
    inner: Mutex<State>,
}

#[derive(Debug)]
struct State {
    snapshot: StatusSnapshot,
    generation: u64,
}

impl SharedStatus {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(State {
                snapshot: StatusSnapshot {
                    running: false,
                    alarm: false,
                    message: HEALTHY_MESSAGE.to_string(),
                },
                generation: 0,
            }),
        }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.inner.lock().snapshot.clone()
    }

    /// Running, alarm cleared, healthy message; returns the new generation
    pub fn mark_started(&self) -> u64 {
        let mut state = self.inner.lock();
        state.generation += 1;
        state.snapshot.running = true;
        state.snapshot.alarm = false;
        state.snapshot.message = HEALTHY_MESSAGE.to_string();
        state.generation
    }

    /// Operator stop, whatever generation is running
    pub fn mark_stopped(&self) {
        self.inner.lock().snapshot.running = false;
    }

    /// Worker exit; ignored once a newer generation has started
    pub fn finish(&self, generation: u64) -> bool {
        let mut state = self.inner.lock();
        if state.generation != generation {
            return false;
        }
        state.snapshot.running = false;
        true
    }

    pub fn set_alarm(&self, alarm: bool) {
        self.inner.lock().snapshot.alarm = alarm;
    }

    /// Record an escalated failure and raise the alarm flag
    ///
    /// Returns `false` without touching the state when `generation` is stale.
    pub fn record_error(&self, generation: u64, message: String) -> bool {
        let mut state = self.inner.lock();
        if state.generation != generation {
            return false;
        }
        state.snapshot.message = message;
        state.snapshot.alarm = true;
        true
    }
}

impl Default for SharedStatus {
    fn default() -> Self {
        Self::new()
    }
}
