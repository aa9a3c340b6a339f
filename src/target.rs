//! What the debugger has to provide.
//!
//! Reads go through these traits so the unwinder works the same against a
//! remote inferior, a core file, or the current process.

use alloc::string::String;

use crate::{Addr, Result};

/// Typed memory access into the target.
pub trait Memory {
    /// Reads a `width` byte unsigned word at `addr`, in target byte order.
    fn read_word(&self, addr: Addr, width: usize) -> Result<u64>;

    fn read_pointer(&self, addr: Addr, width: usize) -> Result<Addr> {
        self.read_word(addr, width).map(Addr)
    }
}

/// Global symbol lookup.
pub trait Symbols {
    /// Address of the global variable `name`, if the target has one.
    fn lookup_global(&self, name: &str) -> Option<Addr>;
}

/// A frame the debugger has not unwound yet; only its registers are known.
pub trait PendingFrame {
    fn read_register(&self, name: &str) -> Result<u64>;
}

/// A frame as the display pipeline sees it.
pub trait FrameView {
    fn read_register(&self, name: &str) -> Result<u64>;

    fn read_memory(&self, addr: Addr, width: usize) -> Result<u64>;

    /// The function name to print, if known.
    fn function(&self) -> Option<String>;
}

impl<T: Memory + ?Sized> Memory for &T {
    fn read_word(&self, addr: Addr, width: usize) -> Result<u64> {
        (**self).read_word(addr, width)
    }
}

impl<T: Symbols + ?Sized> Symbols for &T {
    fn lookup_global(&self, name: &str) -> Option<Addr> {
        (**self).lookup_global(name)
    }
}

impl<T: PendingFrame + ?Sized> PendingFrame for &T {
    fn read_register(&self, name: &str) -> Result<u64> {
        (**self).read_register(name)
    }
}
