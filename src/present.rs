//! Names JIT frames in backtraces.
//!
//! This only reads the cache filled in while unwinding; a frame that was not
//! classified during this stop is shown as is.

use alloc::string::{String, ToString};

use crate::arch::ArchConfig;
use crate::cache::{FunctionRange, RangeCache};
use crate::config::Config;
use crate::target::FrameView;
use crate::{Addr, Result};

/// A frame on its way to the display, possibly renamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoratedFrame<F> {
    Plain(F),
    Jit { base: F, range: FunctionRange },
}

impl<F> DecoratedFrame<F> {
    pub fn base(&self) -> &F {
        match self {
            DecoratedFrame::Plain(base) | DecoratedFrame::Jit { base, .. } => base,
        }
    }

    pub fn into_base(self) -> F {
        match self {
            DecoratedFrame::Plain(base) | DecoratedFrame::Jit { base, .. } => base,
        }
    }

    pub fn jit_range(&self) -> Option<FunctionRange> {
        match self {
            DecoratedFrame::Plain(_) => None,
            DecoratedFrame::Jit { range, .. } => Some(*range),
        }
    }
}

impl<F: FrameView> FrameView for DecoratedFrame<F> {
    fn read_register(&self, name: &str) -> Result<u64> {
        self.base().read_register(name)
    }

    fn read_memory(&self, addr: Addr, width: usize) -> Result<u64> {
        self.base().read_memory(addr, width)
    }

    fn function(&self) -> Option<String> {
        match self {
            DecoratedFrame::Plain(base) => base.function(),
            DecoratedFrame::Jit { range, .. } => Some(range.to_string()),
        }
    }
}

/// Frame filter that gives JIT frames a `JIT[start, end]` name.
#[derive(Debug, Clone)]
pub struct JitFrameFilter {
    pub name: &'static str,
    pub priority: i32,
    pub enabled: bool,
    arch: ArchConfig,
}

impl JitFrameFilter {
    pub fn new(config: &Config) -> Self {
        Self {
            name: config.name,
            priority: config.priority,
            enabled: true,
            arch: config.arch,
        }
    }

    /// Keys the cache by the frame pointer, as the unwinder does.
    pub fn decorate<F: FrameView>(&self, cache: &RangeCache, frame: F) -> Result<DecoratedFrame<F>> {
        if !self.enabled {
            return Ok(DecoratedFrame::Plain(frame));
        }
        let key = Addr(frame.read_register(self.arch.fp_register)?);
        Ok(match cache.lookup(key) {
            Some(range) => DecoratedFrame::Jit { base: frame, range },
            None => DecoratedFrame::Plain(frame),
        })
    }

    /// Lazily decorates every frame of a backtrace.
    pub fn filter<'a, F, I>(&'a self, cache: &'a RangeCache, frames: I) -> impl Iterator<Item = Result<DecoratedFrame<F>>> + 'a
    where
        F: FrameView + 'a,
        I: IntoIterator<Item = F>,
        I::IntoIter: 'a,
    {
        frames.into_iter().map(move |frame| self.decorate(cache, frame))
    }
}

impl Default for JitFrameFilter {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
