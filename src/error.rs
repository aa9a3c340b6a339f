use alloc::string::String;

use crate::Addr;

/// A failure of one of the target's access primitives.
///
/// Not finding a JIT function for a frame is not an error, it is the normal
/// outcome for every native frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("failed to read register `{register}`: {reason}")]
    Register { register: String, reason: String },
    #[error("failed to read {width} bytes at {addr:?}: {reason}")]
    Memory {
        addr: Addr,
        width: usize,
        reason: String,
    },
    /// Only 4 and 8 byte words can be read.
    #[error("unsupported pointer width: {0}")]
    PointerWidth(usize),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
