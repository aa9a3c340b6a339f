//! The process we are running in, as a target.
//!
//! Used when the unwinder runs inside the host itself (crash handlers, self
//! inspection) instead of inside a debugger. Memory is read through
//! `process_vm_readv` on our own pid, so a bad frame pointer comes back as an
//! error instead of a segfault.

use alloc::ffi::CString;
use alloc::string::String;
use core::ffi::{self, CStr};

use crate::stdext::with_last_os_error_str;
use crate::target::{Memory, Symbols};
use crate::{Addr, Error, Result};

#[derive(Debug, Clone, Copy)]
pub struct CurrentProcess {
    pid: libc::pid_t,
}

impl CurrentProcess {
    pub fn new() -> Self {
        // SAFETY: getpid cannot fail.
        let pid = unsafe { libc::getpid() };
        Self { pid }
    }

    fn read_bytes(&self, addr: Addr, buf: &mut [u8]) -> Result<()> {
        let local = libc::iovec {
            iov_base: buf.as_mut_ptr().cast(),
            iov_len: buf.len(),
        };
        let remote = libc::iovec {
            iov_base: core::ptr::with_exposed_provenance_mut(addr.addr() as usize),
            iov_len: buf.len(),
        };

        // SAFETY: `local` covers exactly `buf`. The kernel checks `remote`.
        let read = unsafe { libc::process_vm_readv(self.pid, &local, 1, &remote, 1, 0) };
        if read < 0 {
            let reason = with_last_os_error_str(|err| String::from(err));
            trace!(?addr, %reason, "process_vm_readv failed");
            return Err(Error::Memory {
                addr,
                width: buf.len(),
                reason,
            });
        }
        if read as usize != buf.len() {
            return Err(Error::Memory {
                addr,
                width: buf.len(),
                reason: alloc::format!("short read of {read} bytes"),
            });
        }
        Ok(())
    }

    /// Name of the dynamic symbol covering `addr`, if there is one.
    pub fn symbol_at(&self, addr: Addr) -> Option<String> {
        // SAFETY: Dl_info is plain old data, all zeroes is a valid value.
        let mut info: libc::Dl_info = unsafe { core::mem::zeroed() };

        // SAFETY: dladdr only inspects the address, it does not dereference it.
        let found = unsafe {
            libc::dladdr(
                core::ptr::with_exposed_provenance(addr.addr() as usize),
                &mut info,
            )
        };
        if found == 0 || info.dli_sname.is_null() {
            return None;
        }

        // SAFETY: dli_sname points to a nul terminated string owned by the
        // dynamic linker.
        let name = unsafe { CStr::from_ptr(info.dli_sname) };
        Some(String::from_utf8_lossy(name.to_bytes()).into_owned())
    }
}

impl Default for CurrentProcess {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory for CurrentProcess {
    fn read_word(&self, addr: Addr, width: usize) -> Result<u64> {
        match width {
            4 => {
                let mut word = [0; 4];
                self.read_bytes(addr, &mut word)?;
                Ok(u32::from_ne_bytes(word).into())
            }
            8 => {
                let mut word = [0; 8];
                self.read_bytes(addr, &mut word)?;
                Ok(u64::from_ne_bytes(word))
            }
            _ => Err(Error::PointerWidth(width)),
        }
    }
}

impl Symbols for CurrentProcess {
    /// Only finds symbols in the dynamic symbol table; executables need to be
    /// linked with `-rdynamic` for their own globals to show up.
    fn lookup_global(&self, name: &str) -> Option<Addr> {
        let name = CString::new(name).ok()?;

        // SAFETY: `name` is nul terminated and outlives the call.
        let symbol: *mut ffi::c_void = unsafe { libc::dlsym(libc::RTLD_DEFAULT, name.as_ptr()) };
        if symbol.is_null() {
            trace!(?name, "dlsym found nothing");
            return None;
        }
        Some(Addr(symbol.expose_provenance() as u64))
    }
}
