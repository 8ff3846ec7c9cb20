//! Event system for monitoring fitting progress.
//!
//! Listeners registered on a [`Fitter`](crate::Fitter) are called
//! synchronously, in registration order, from the fitting thread.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use probfit_fitter::event::{CountingListener, FittingEventSupport};
//!
//! let mut support = FittingEventSupport::new();
//! support.add_listener(Arc::new(CountingListener::new()));
//! assert_eq!(support.listener_count(), 1);
//! ```

use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::driver::FittingResult;
use crate::record::IterationRecord;

/// Listener for fitting lifecycle events.
pub trait FittingListener: Send + Sync + Debug {
    /// Called once before the first step.
    fn on_fit_started(&self, _requirement_count: usize, _threshold: f64) {}

    /// Called after each step's record has been appended to the trace.
    fn on_step_ended(&self, record: &IterationRecord);

    /// Called when a stall relaxes the active threshold.
    fn on_threshold_relaxed(&self, _step: u64, _from: f64, _to: f64) {}

    /// Called once with the final result.
    fn on_fit_ended(&self, _result: &FittingResult) {}
}

/// Central broadcaster for fitting events.
#[derive(Default)]
pub struct FittingEventSupport {
    listeners: Vec<Arc<dyn FittingListener>>,
}

impl FittingEventSupport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, listener: Arc<dyn FittingListener>) {
        self.listeners.push(listener);
    }

    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn fire_fit_started(&self, requirement_count: usize, threshold: f64) {
        for listener in &self.listeners {
            listener.on_fit_started(requirement_count, threshold);
        }
    }

    pub fn fire_step_ended(&self, record: &IterationRecord) {
        for listener in &self.listeners {
            listener.on_step_ended(record);
        }
    }

    pub fn fire_threshold_relaxed(&self, step: u64, from: f64, to: f64) {
        for listener in &self.listeners {
            listener.on_threshold_relaxed(step, from, to);
        }
    }

    pub fn fire_fit_ended(&self, result: &FittingResult) {
        for listener in &self.listeners {
            listener.on_fit_ended(result);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn has_listeners(&self) -> bool {
        !self.listeners.is_empty()
    }
}

impl Clone for FittingEventSupport {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
        }
    }
}

impl Debug for FittingEventSupport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FittingEventSupport")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// A counting listener that tracks event occurrences.
///
/// Useful for testing.
#[derive(Debug, Default)]
pub struct CountingListener {
    started: AtomicUsize,
    steps: AtomicUsize,
    relaxations: AtomicUsize,
    ended: AtomicUsize,
}

impl CountingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started_count(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn step_count(&self) -> usize {
        self.steps.load(Ordering::SeqCst)
    }

    pub fn relaxation_count(&self) -> usize {
        self.relaxations.load(Ordering::SeqCst)
    }

    pub fn ended_count(&self) -> usize {
        self.ended.load(Ordering::SeqCst)
    }
}

impl FittingListener for CountingListener {
    fn on_fit_started(&self, _requirement_count: usize, _threshold: f64) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn on_step_ended(&self, _record: &IterationRecord) {
        self.steps.fetch_add(1, Ordering::SeqCst);
    }

    fn on_threshold_relaxed(&self, _step: u64, _from: f64, _to: f64) {
        self.relaxations.fetch_add(1, Ordering::SeqCst);
    }

    fn on_fit_ended(&self, _result: &FittingResult) {
        self.ended.fetch_add(1, Ordering::SeqCst);
    }
}

/// Streams every iteration record over an unbounded channel.
///
/// Sends are fire-and-forget: a dropped receiver does not interrupt fitting.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    sender: mpsc::UnboundedSender<IterationRecord>,
}

impl ChannelListener {
    pub fn new(sender: mpsc::UnboundedSender<IterationRecord>) -> Self {
        Self { sender }
    }

    /// Creates a listener together with the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<IterationRecord>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl FittingListener for ChannelListener {
    fn on_step_ended(&self, record: &IterationRecord) {
        let _ = self.sender.send(record.clone());
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
