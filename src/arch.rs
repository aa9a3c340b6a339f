//! Calling convention knowledge needed to step over a frame.

/// Where a frame keeps its caller's state relative to the frame pointer.
///
/// The unwind step only ever reads the two saved words, so supporting another
/// frame pointer based convention means adding another one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchConfig {
    pub name: &'static str,
    /// Register name for the program counter, as the debugger spells it.
    pub pc_register: &'static str,
    /// Register name for the frame pointer, as the debugger spells it.
    pub fp_register: &'static str,
    /// Offset from the frame pointer of the caller's saved frame pointer.
    pub saved_fp_offset: u64,
    /// Offset from the frame pointer of the return address.
    pub saved_pc_offset: u64,
    /// Size of a pointer in bytes.
    pub pointer_width: usize,
}

// pushq %rbp; movq %rsp, %rbp
//
//   [caller's rbp] [return address] [... caller's frame]
//   ^ rbp          ^ rbp + 8
pub const X86_64: ArchConfig = ArchConfig {
    name: "x86_64",
    pc_register: "rip",
    fp_register: "rbp",
    saved_fp_offset: 0,
    saved_pc_offset: 8,
    pointer_width: 8,
};
