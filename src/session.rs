//! Per-stop state and the resume notifications that end it.

use crate::cache::RangeCache;

/// How the target was allowed to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeKind {
    Continue,
    Step,
    /// Registers or memory were written by the debugger.
    RegisterWrite,
    /// An inferior function call was made.
    Call,
}

/// Notifications from the debugger's event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetEvent {
    Resumed(ResumeKind),
    Stopped,
}

/// State that is valid while the target stays stopped.
///
/// Everything cached is thrown away on every [`TargetEvent::Resumed`]: the
/// stack slots used as keys get reused and JIT code may move while the target
/// runs.
#[derive(Debug, Default)]
pub struct Session {
    cache: RangeCache,
    epoch: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &RangeCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut RangeCache {
        &mut self.cache
    }

    /// Number of resumes seen so far.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn notify(&mut self, event: TargetEvent) {
        match event {
            TargetEvent::Resumed(kind) => {
                debug!(?kind, cached = self.cache.len(), epoch = self.epoch, "target resumed, dropping cache");
                self.cache.clear();
                self.epoch += 1;
            }
            TargetEvent::Stopped => trace!(epoch = self.epoch, "target stopped"),
        }
    }

    /// Handles queued notifications in order.
    pub fn drain(&mut self, events: impl IntoIterator<Item = TargetEvent>) {
        for event in events {
            self.notify(event);
        }
    }
}
