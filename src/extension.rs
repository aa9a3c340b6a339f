//! Named, prioritized slots for frame processing extensions.

use alloc::vec::Vec;

use crate::config::Config;
use crate::present::JitFrameFilter;
use crate::unwind::JitUnwinder;

#[derive(Debug, Clone)]
struct Entry<T> {
    name: &'static str,
    priority: i32,
    extension: T,
}

/// Extensions ordered by priority, highest first. Names are unique.
#[derive(Debug, Clone)]
pub struct Extensions<T> {
    entries: Vec<Entry<T>>,
}

impl<T> Extensions<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registers `extension` under `name`, returning the extension that was
    /// registered under that name before.
    pub fn register(&mut self, name: &'static str, priority: i32, extension: T) -> Option<T> {
        let old = self
            .entries
            .iter()
            .position(|entry| entry.name == name)
            .map(|idx| self.entries.remove(idx).extension);
        if old.is_some() {
            debug!(name, "replacing registered extension");
        }

        // Equal priorities keep registration order.
        let idx = self
            .entries
            .iter()
            .position(|entry| entry.priority < priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(
            idx,
            Entry {
                name,
                priority,
                extension,
            },
        );
        old
    }

    pub fn unregister(&mut self, name: &str) -> Option<T> {
        let idx = self.entries.iter().position(|entry| entry.name == name)?;
        Some(self.entries.remove(idx).extension)
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.extension)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find(|entry| entry.name == name)
            .map(|entry| &mut entry.extension)
    }

    /// Highest priority first.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &T)> {
        self.entries.iter().map(|entry| (entry.name, &entry.extension))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for Extensions<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs the JIT unwinder and frame filter, replacing earlier
/// installations under the same name.
pub fn install(
    config: &Config,
    unwinders: &mut Extensions<JitUnwinder>,
    filters: &mut Extensions<JitFrameFilter>,
) {
    info!(name = config.name, priority = config.priority, "installing JIT unwinder");
    unwinders.register(config.name, config.priority, JitUnwinder::new(*config));
    filters.register(config.name, config.priority, JitFrameFilter::new(config));
}
