//! The out-of-process mirror surface and its fire-and-forget publisher.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::types::{RemoteEvent, SyncSnapshot};
use crate::error::SyncError;

/// An external surface (lock screen, home-screen widget) mirroring the
/// session. The controller is its only writer.
pub trait SyncBoundary: Send {
    /// Called once before the first publish.
    fn init(&mut self) -> Result<(), SyncError> {
        Ok(())
    }

    fn publish(&mut self, snapshot: &SyncSnapshot) -> Result<(), SyncError>;

    /// Remove the surface after the session finishes.
    fn clear(&mut self) -> Result<(), SyncError>;

    /// Release the surface for good.
    fn teardown(&mut self) -> Result<(), SyncError> {
        Ok(())
    }

    /// Drain remote events queued since the last poll, oldest first.
    fn poll_remote(&mut self) -> Result<Vec<RemoteEvent>, SyncError> {
        Ok(Vec::new())
    }
}

/// Wraps a boundary so that no failure ever reaches the caller.
pub struct SyncPublisher {
    boundary: Box<dyn SyncBoundary>,
    initialized: bool,
    failures: u64,
}

impl SyncPublisher {
    pub fn new(boundary: impl SyncBoundary + 'static) -> Self {
        Self {
            boundary: Box::new(boundary),
            initialized: false,
            failures: 0,
        }
    }

    pub fn disabled() -> Self {
        Self::new(NullBoundary)
    }

    /// Number of swallowed failures so far.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        let result = self.boundary.init();
        self.initialized = self.swallow("init", result).is_some();
    }

    pub fn publish(&mut self, snapshot: &SyncSnapshot) {
        self.init();
        let result = self.boundary.publish(snapshot);
        self.swallow("publish", result);
    }

    pub fn clear(&mut self) {
        let result = self.boundary.clear();
        self.swallow("clear", result);
    }

    pub fn teardown(&mut self) {
        if !self.initialized {
            return;
        }
        let result = self.boundary.teardown();
        self.swallow("teardown", result);
        self.initialized = false;
    }

    pub fn poll_remote(&mut self) -> Vec<RemoteEvent> {
        let result = self.boundary.poll_remote();
        self.swallow("poll", result).unwrap_or_default()
    }

    fn swallow<T>(&mut self, op: &str, result: Result<T, SyncError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.failures += 1;
                tracing::warn!(operation = op, error = %e, "sync boundary unavailable, continuing locally");
                None
            }
        }
    }
}

impl std::fmt::Debug for SyncPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncPublisher")
            .field("initialized", &self.initialized)
            .field("failures", &self.failures)
            .finish()
    }
}

/// Boundary used when syncing is switched off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBoundary;

impl SyncBoundary for NullBoundary {
    fn publish(&mut self, _snapshot: &SyncSnapshot) -> Result<(), SyncError> {
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SyncError> {
        Ok(())
    }
}

/// What an in-process surface has seen.
#[derive(Debug, Default)]
pub struct MemorySurface {
    pub published: Vec<SyncSnapshot>,
    pub clears: usize,
    pub initialized: bool,
    pub torn_down: bool,
    pub inbox: VecDeque<RemoteEvent>,
    /// Make every call fail with [`SyncError::Unavailable`].
    pub unavailable: bool,
}

/// In-process surface, shared between the controller and an observer
/// (a GUI thread, or a test).
#[derive(Debug, Default, Clone)]
pub struct MemoryBoundary {
    surface: Arc<Mutex<MemorySurface>>,
}

impl MemoryBoundary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a remote event as if the surface had sent it.
    pub fn push_remote(&self, event: RemoteEvent) {
        self.with(|s| s.inbox.push_back(event));
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.with(|s| s.unavailable = unavailable);
    }

    pub fn last_published(&self) -> Option<SyncSnapshot> {
        self.with(|s| s.published.last().cloned())
    }

    pub fn publish_count(&self) -> usize {
        self.with(|s| s.published.len())
    }

    pub fn clear_count(&self) -> usize {
        self.with(|s| s.clears)
    }

    pub fn is_torn_down(&self) -> bool {
        self.with(|s| s.torn_down)
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut MemorySurface) -> R) -> R {
        let mut surface = self.surface.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut surface)
    }

    fn check(&self) -> Result<(), SyncError> {
        if self.with(|s| s.unavailable) {
            return Err(SyncError::Unavailable("memory surface offline".into()));
        }
        Ok(())
    }
}

impl SyncBoundary for MemoryBoundary {
    fn init(&mut self) -> Result<(), SyncError> {
        self.check()?;
        self.with(|s| s.initialized = true);
        Ok(())
    }

    fn publish(&mut self, snapshot: &SyncSnapshot) -> Result<(), SyncError> {
        self.check()?;
        self.with(|s| s.published.push(snapshot.clone()));
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SyncError> {
        self.check()?;
        self.with(|s| s.clears += 1);
        Ok(())
    }

    fn teardown(&mut self) -> Result<(), SyncError> {
        self.with(|s| s.torn_down = true);
        Ok(())
    }

    fn poll_remote(&mut self) -> Result<Vec<RemoteEvent>, SyncError> {
        self.check()?;
        Ok(self.with(|s| s.inbox.drain(..).collect()))
    }
}
