//! Walks a chain of consecutive JIT frames.
//!
//! A debugger interleaves this crate's unwind step with its own unwinders;
//! this is the loop for the case where nothing else is around, used to
//! inspect the JIT part of a stack on its own.

use alloc::vec::Vec;

use crate::target::{Memory, PendingFrame, Symbols};
use crate::unwind::{FrameIdentity, JitUnwinder};
use crate::session::Session;
use crate::{Addr, Error, Result};

/// Register snapshot of a frame being walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterFrame {
    pub pc_register: &'static str,
    pub fp_register: &'static str,
    pub pc: Addr,
    pub fp: Addr,
}

impl PendingFrame for RegisterFrame {
    fn read_register(&self, name: &str) -> Result<u64> {
        if name == self.pc_register {
            Ok(self.pc.addr())
        } else if name == self.fp_register {
            Ok(self.fp.addr())
        } else {
            Err(Error::Register {
                register: name.into(),
                reason: "not tracked while walking".into(),
            })
        }
    }
}

/// Follows JIT frames starting at `pc`/`fp` until the unwinder declines a
/// frame, the frame pointer chain ends, or `max_frames` callers were found.
///
/// Returns the identity of every caller recovered, innermost first.
#[instrument(level = "debug", skip(session, unwinder, target))]
pub fn walk_jit_frames<T: Memory + Symbols>(
    session: &mut Session,
    unwinder: &JitUnwinder,
    target: &T,
    pc: Addr,
    fp: Addr,
    max_frames: usize,
) -> Result<Vec<FrameIdentity>> {
    let arch = unwinder.arch();
    let mut frame = RegisterFrame {
        pc_register: arch.pc_register,
        fp_register: arch.fp_register,
        pc,
        fp,
    };

    let mut callers = Vec::new();
    while callers.len() < max_frames {
        let Some(info) = unwinder.unwind(session, target, &frame)? else {
            break;
        };
        callers.push(info.id);

        frame.pc = info.id.program_counter;
        frame.fp = info.id.stack_pointer;
        trace!(pc = ?frame.pc, fp = ?frame.fp, "walk...");
        if frame.fp.is_null() {
            break;
        }
    }

    debug!(frames = callers.len(), "done walking");
    Ok(callers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FunctionRange;
    use crate::testutil::FakeTarget;

    // native 0x401000 <- jit 0x600000 <- jit 0x500000 (innermost)
    fn target() -> FakeTarget {
        let mut target = FakeTarget::new();
        target
            .registry(
                "emacs_jit_context",
                0x10000,
                &[(0x500000, 0x500200), (0x600000, 0x600200)],
            )
            .write(0x2000, 0x2100)
            .write(0x2008, 0x600040)
            .write(0x2100, 0x2200)
            .write(0x2108, 0x401000);
        target
    }

    #[test]
    fn stops_at_native_frame() {
        let target = target();
        let mut session = Session::new();

        let callers = walk_jit_frames(
            &mut session,
            &JitUnwinder::default(),
            &target,
            Addr(0x500010),
            Addr(0x2000),
            64,
        )
        .unwrap();

        assert_eq!(
            callers,
            [
                FrameIdentity {
                    stack_pointer: Addr(0x2100),
                    program_counter: Addr(0x600040),
                },
                FrameIdentity {
                    stack_pointer: Addr(0x2200),
                    program_counter: Addr(0x401000),
                },
            ]
        );
        assert_eq!(
            session.cache().lookup(Addr(0x2000)),
            Some(FunctionRange::new(0x500000, 0x500200))
        );
        assert_eq!(
            session.cache().lookup(Addr(0x2100)),
            Some(FunctionRange::new(0x600000, 0x600200))
        );
        assert_eq!(session.cache().lookup(Addr(0x2200)), None);
    }

    #[test]
    fn frame_limit() {
        let target = target();
        let mut session = Session::new();

        let callers = walk_jit_frames(
            &mut session,
            &JitUnwinder::default(),
            &target,
            Addr(0x500010),
            Addr(0x2000),
            1,
        )
        .unwrap();
        assert_eq!(callers.len(), 1);
    }

    #[test]
    fn null_frame_pointer_ends_chain() {
        let mut target = target();
        target.write(0x2000, 0);
        let mut session = Session::new();

        let callers = walk_jit_frames(
            &mut session,
            &JitUnwinder::default(),
            &target,
            Addr(0x500010),
            Addr(0x2000),
            64,
        )
        .unwrap();
        assert_eq!(callers.len(), 1);
        assert!(callers[0].stack_pointer.is_null());
    }

    #[test]
    fn native_start() {
        let target = target();
        let mut session = Session::new();

        let callers = walk_jit_frames(
            &mut session,
            &JitUnwinder::default(),
            &target,
            Addr(0x401000),
            Addr(0x2200),
            64,
        )
        .unwrap();
        assert!(callers.is_empty());
    }
}
