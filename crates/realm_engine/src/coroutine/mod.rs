//! Cooperative coroutine scheduler
//!
//! A coroutine is a step function over a context `C`. Every step yields one
//! [`Instruction`] or completes. The scheduler keeps the pending instruction of
//! each registered coroutine and resumes it from [`Scheduler::tick`] once its
//! wait has elapsed in simulated time. Steps run inline on the ticking thread
//! and must never block.
//!
//! There is no cancellation; a body that may need to stop early checks the
//! context itself when resumed.

use log::{trace, warn};

/// What a suspended coroutine is waiting for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    /// Resume after this many simulated seconds
    Wait(f32),
}

/// Result of one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Suspend until the instruction is satisfied
    Yield(Instruction),
    /// Body finished
    Complete,
}

/// A failed coroutine step
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CoroutineError {
    /// The body reached a state it cannot continue from
    #[error("{0}")]
    Failed(String),
}

/// A resumable computation over a context `C`
pub trait Coroutine<C> {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    /// Run until the next yield or completion
    fn resume(&mut self, ctx: &mut C) -> Result<Step, CoroutineError>;
}

/// Coroutine built from a closure receiving its step index
pub struct FnCoroutine<F> {
    name: String,
    step: usize,
    body: F,
}

impl<F> FnCoroutine<F> {
    /// Wrap a step closure
    pub fn new<C>(name: impl Into<String>, body: F) -> Self
    where
        F: FnMut(usize, &mut C) -> Result<Step, CoroutineError>,
    {
        Self { name: name.into(), step: 0, body }
    }
}

impl<C, F> Coroutine<C> for FnCoroutine<F>
where
    F: FnMut(usize, &mut C) -> Result<Step, CoroutineError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn resume(&mut self, ctx: &mut C) -> Result<Step, CoroutineError> {
        let step = self.step;
        self.step += 1;
        (self.body)(step, ctx)
    }
}

/// Handle of a registered coroutine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoroutineId(u64);

struct Entry<C> {
    id: CoroutineId,
    remaining: f32,
    body: Box<dyn Coroutine<C>>,
}

/// Registry of suspended coroutines
pub struct Scheduler<C> {
    entries: Vec<Entry<C>>,
    next_id: u64,
}

impl<C> Scheduler<C> {
    /// Empty scheduler
    pub fn new() -> Self {
        Self { entries: Vec::new(), next_id: 0 }
    }

    /// Run `body` to its first yield and register it if it has not finished
    ///
    /// Returns `None` when the body completed or failed on its first step.
    pub fn start(&mut self, mut body: Box<dyn Coroutine<C>>, ctx: &mut C) -> Option<CoroutineId> {
        let remaining = match body.resume(ctx) {
            Ok(Step::Yield(Instruction::Wait(seconds))) => seconds,
            Ok(Step::Complete) => return None,
            Err(err) => {
                warn!("Coroutine '{}' failed on start: {}", body.name(), err);
                return None;
            }
        };

        let id = CoroutineId(self.next_id);
        self.next_id += 1;
        trace!("Coroutine '{}' registered as {:?}", body.name(), id);
        self.entries.push(Entry { id, remaining, body });
        Some(id)
    }

    /// Advance every wait by `dt`, resuming the ones that have elapsed
    ///
    /// A coroutine resumes at most once per tick, however far `dt` overshoots
    /// its wait. Completed and failed coroutines are deregistered; a failure
    /// only affects the coroutine that raised it.
    pub fn tick(&mut self, dt: f32, ctx: &mut C) {
        for i in (0..self.entries.len()).rev() {
            let entry = &mut self.entries[i];
            entry.remaining -= dt;
            if entry.remaining > 0.0 {
                continue;
            }

            match entry.body.resume(ctx) {
                Ok(Step::Yield(Instruction::Wait(seconds))) => entry.remaining = seconds,
                Ok(Step::Complete) => {
                    trace!("Coroutine '{}' completed", entry.body.name());
                    self.entries.remove(i);
                }
                Err(err) => {
                    warn!("Coroutine '{}' failed: {}", entry.body.name(), err);
                    self.entries.remove(i);
                }
            }
        }
    }

    /// Whether the coroutine is still registered
    pub fn is_running(&self, id: CoroutineId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Number of registered coroutines
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}
