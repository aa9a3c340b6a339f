//! One unwind step through a JIT frame.
//!
//! JIT code is compiled with frame pointers, so once a frame is known to be
//! ours the caller is found by following the frame pointer:
//!
//! ```text
//!   [caller's fp] [return address] [... caller's frame]
//!   ^ fp + saved_fp_offset
//!                 ^ fp + saved_pc_offset
//! ```

use alloc::vec::Vec;

use crate::arch::ArchConfig;
use crate::config::Config;
use crate::registry::{Classification, FunctionList, RemoteRegistry, Resolver};
use crate::session::Session;
use crate::target::{Memory, PendingFrame, Symbols};
use crate::{Addr, Result};

/// Identifies the caller's frame so the debugger can tell frames apart
/// between unwind steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameIdentity {
    pub stack_pointer: Addr,
    pub program_counter: Addr,
}

/// The caller's registers as far as they can be recovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnwindInfo {
    pub id: FrameIdentity,
    saved: Vec<(&'static str, u64)>,
}

impl UnwindInfo {
    pub fn new(id: FrameIdentity) -> Self {
        Self {
            id,
            saved: Vec::new(),
        }
    }

    /// Replaces an earlier value for the same register.
    pub fn add_saved_register(&mut self, register: &'static str, value: u64) {
        match self.saved.iter_mut().find(|(name, _)| *name == register) {
            Some(slot) => slot.1 = value,
            None => self.saved.push((register, value)),
        }
    }

    pub fn saved_register(&self, register: &str) -> Option<u64> {
        self.saved
            .iter()
            .find(|(name, _)| *name == register)
            .map(|&(_, value)| value)
    }

    pub fn saved_registers(&self) -> &[(&'static str, u64)] {
        &self.saved
    }
}

/// Unwinds frames that belong to JIT-compiled functions and declines all
/// others.
#[derive(Debug, Clone)]
pub struct JitUnwinder {
    config: Config,
    pub enabled: bool,
}

impl JitUnwinder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            enabled: true,
        }
    }

    pub fn name(&self) -> &'static str {
        self.config.name
    }

    pub fn arch(&self) -> &ArchConfig {
        &self.config.arch
    }

    /// Unwinds `frame` using the function list in `target`'s memory.
    ///
    /// `Ok(None)` means the frame is not a JIT frame and the next unwinder
    /// should have a go.
    pub fn unwind<T, F>(&self, session: &mut Session, target: &T, frame: &F) -> Result<Option<UnwindInfo>>
    where
        T: Memory + Symbols,
        F: PendingFrame,
    {
        let registry = RemoteRegistry::new(target, self.config.layout, self.config.arch.pointer_width);
        self.unwind_with(session, &Resolver::new(registry), target, frame)
    }

    /// Like [`JitUnwinder::unwind`], with the function list supplied
    /// separately from the memory the frames live in.
    #[instrument(level = "debug", name = "jit_unwind", skip_all, fields(unwinder = self.config.name))]
    pub fn unwind_with<L, M, F>(
        &self,
        session: &mut Session,
        resolver: &Resolver<L>,
        memory: &M,
        frame: &F,
    ) -> Result<Option<UnwindInfo>>
    where
        L: FunctionList,
        M: Memory,
        F: PendingFrame,
    {
        if !self.enabled {
            return Ok(None);
        }

        let arch = &self.config.arch;
        let pc = Addr(frame.read_register(arch.pc_register)?);
        let fp = Addr(frame.read_register(arch.fp_register)?);
        trace!(?pc, ?fp);

        let range = match resolver.resolve(session.cache_mut(), pc, fp)? {
            Classification::Classified(range) => range,
            Classification::Unclassified => {
                trace!("not a JIT frame");
                return Ok(None);
            }
        };

        let caller_fp = memory.read_pointer(fp.offset(arch.saved_fp_offset), arch.pointer_width)?;
        let caller_pc = memory.read_pointer(fp.offset(arch.saved_pc_offset), arch.pointer_width)?;
        debug!(%range, ?caller_pc, ?caller_fp, "unwound JIT frame");

        let mut info = UnwindInfo::new(FrameIdentity {
            stack_pointer: caller_fp,
            program_counter: caller_pc,
        });
        info.add_saved_register(arch.pc_register, caller_pc.addr());
        info.add_saved_register(arch.fp_register, caller_fp.addr());
        Ok(Some(info))
    }
}

impl Default for JitUnwinder {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FunctionRange;
    use crate::testutil::{FakeFrame, FakeTarget};
    use crate::Error;

    const FP: u64 = 0x7ffee0002000;

    fn target() -> FakeTarget {
        let mut target = FakeTarget::new();
        target
            .registry("emacs_jit_context", 0x10000, &[(0x500000, 0x500200)])
            .write(FP, 0x7ffee0002100)
            .write(FP + 8, 0x500120);
        target
    }

    #[test]
    fn unwinds_jit_frame() {
        let target = target();
        let mut session = Session::new();
        let unwinder = JitUnwinder::default();

        let info = unwinder
            .unwind(&mut session, &target, &FakeFrame::new(0x500050, FP))
            .unwrap()
            .unwrap();

        assert_eq!(
            info.id,
            FrameIdentity {
                stack_pointer: Addr(0x7ffee0002100),
                program_counter: Addr(0x500120),
            }
        );
        assert_eq!(info.saved_register("rip"), Some(0x500120));
        assert_eq!(info.saved_register("rbp"), Some(0x7ffee0002100));
        assert_eq!(info.saved_registers().len(), 2);
        assert_eq!(
            session.cache().lookup(Addr(FP)),
            Some(FunctionRange::new(0x500000, 0x500200))
        );
    }

    #[test]
    fn declines_native_frame() {
        let target = target();
        let mut session = Session::new();

        let info = JitUnwinder::default()
            .unwind(&mut session, &target, &FakeFrame::new(0x401000, FP))
            .unwrap();

        assert_eq!(info, None);
        assert!(session.cache().is_empty());
    }

    #[test]
    fn deterministic() {
        let target = target();
        let mut session = Session::new();
        let unwinder = JitUnwinder::default();
        let frame = FakeFrame::new(0x500050, FP);

        let first = unwinder.unwind(&mut session, &target, &frame).unwrap();
        let second = unwinder.unwind(&mut session, &target, &frame).unwrap();
        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(session.cache().len(), 1);
    }

    #[test]
    fn memory_failure_is_surfaced() {
        let mut target = FakeTarget::new();
        target.registry("emacs_jit_context", 0x10000, &[(0x500000, 0x500200)]);
        let mut session = Session::new();

        let result =
            JitUnwinder::default().unwind(&mut session, &target, &FakeFrame::new(0x500050, FP));
        assert!(matches!(result, Err(Error::Memory { addr: Addr(FP), .. })));
    }

    #[test]
    fn register_failure_is_surfaced() {
        let target = target();
        let mut session = Session::new();
        let mut frame = FakeFrame::new(0x500050, FP);
        frame.registers.remove("rbp");

        let result = JitUnwinder::default().unwind(&mut session, &target, &frame);
        assert!(matches!(result, Err(Error::Register { register, .. }) if register == "rbp"));
    }

    #[test]
    fn disabled() {
        let target = target();
        let mut session = Session::new();
        let mut unwinder = JitUnwinder::default();
        unwinder.enabled = false;

        let info = unwinder
            .unwind(&mut session, &target, &FakeFrame::new(0x500050, FP))
            .unwrap();
        assert_eq!(info, None);
        assert_eq!(target.reads(), 0);
    }

    #[test]
    fn custom_arch() {
        let arch = ArchConfig {
            name: "test",
            pc_register: "pc",
            fp_register: "fp",
            saved_fp_offset: 8,
            saved_pc_offset: 0,
            pointer_width: 8,
        };
        let mut target = FakeTarget::new();
        target
            .registry("emacs_jit_context", 0x10000, &[(0x500000, 0x500200)])
            .write(0x3000, 0x500180)
            .write(0x3008, 0x3100);
        let mut frame = FakeFrame::default();
        frame.registers.insert("pc".to_owned(), 0x500000);
        frame.registers.insert("fp".to_owned(), 0x3000);
        let mut session = Session::new();

        let info = JitUnwinder::new(Config::default().with_arch(arch))
            .unwind(&mut session, &target, &frame)
            .unwrap()
            .unwrap();
        assert_eq!(info.saved_register("pc"), Some(0x500180));
        assert_eq!(info.saved_register("fp"), Some(0x3100));
        assert_eq!(info.saved_register("rip"), None);
    }
}
