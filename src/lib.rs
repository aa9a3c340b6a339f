//! Unwinding through frames of JIT-compiled code for an external debugger.
//!
//! JIT code has no symbols and no `.eh_frame`, so the debugger's own
//! unwinder gets lost as soon as the stack walks into it. This crate
//! recognizes such frames by looking the program counter up in the host's
//! list of compiled functions and then follows the frame pointer chain to
//! recover the caller.
//!
//! The pieces:
//! - [`cache::RangeCache`] remembers which function owns which frame, keyed by
//!   frame pointer, for the duration of one stop.
//! - [`registry::Resolver`] walks the host's function list.
//! - [`unwind::JitUnwinder`] performs one unwind step.
//! - [`present::JitFrameFilter`] renames frames it knows about for display.
//! - [`session::Session`] owns the cache and drops it whenever the target
//!   resumes.
#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[macro_use]
extern crate tracing;

use core::fmt;

mod stdext;

pub mod arch;
pub mod cache;
pub mod config;
pub mod error;
pub mod extension;
pub mod present;
pub mod process;
pub mod registry;
pub mod session;
pub mod target;
pub mod unwind;
pub mod walk;

#[cfg(test)]
mod testutil;

pub use arch::{ArchConfig, X86_64};
pub use cache::{FunctionRange, RangeCache};
pub use config::{Config, RegistryLayout};
pub use error::{Error, Result};
pub use present::{DecoratedFrame, JitFrameFilter};
pub use registry::{Classification, Resolver};
pub use session::{ResumeKind, Session, TargetEvent};
pub use unwind::{FrameIdentity, JitUnwinder, UnwindInfo};

/// An address in the target's address space.
///
/// Target addresses are plain numbers: the target is usually another
/// process, so they are never dereferenced directly.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Addr(pub u64);

impl Addr {
    pub const NULL: Addr = Addr(0);

    pub fn addr(self) -> u64 {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Wraps around like the hardware would.
    pub fn offset(self, by: u64) -> Addr {
        Addr(self.0.wrapping_add(by))
    }
}

impl fmt::Debug for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::LowerHex for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl From<u64> for Addr {
    fn from(value: u64) -> Self {
        Addr(value)
    }
}
