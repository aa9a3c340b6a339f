use crate::arch::{ArchConfig, X86_64};

/// Where the host keeps its list of compiled functions and how the list's
/// structs are laid out.
///
/// The root symbol names a global holding a pointer to the JIT context. The
/// head of the function list lives inside the context; every function
/// descriptor links to the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryLayout {
    pub root_symbol: &'static str,
    /// Offset of the list head inside the context.
    pub functions_offset: u64,
    pub entry_point_offset: u64,
    pub code_end_offset: u64,
    pub next_offset: u64,
}

impl RegistryLayout {
    pub const fn new(root_symbol: &'static str) -> Self {
        Self {
            root_symbol,
            functions_offset: 0,
            entry_point_offset: 0,
            code_end_offset: 8,
            next_offset: 16,
        }
    }

    pub const fn with_functions_offset(mut self, offset: u64) -> Self {
        self.functions_offset = offset;
        self
    }

    pub const fn with_descriptor_offsets(mut self, entry_point: u64, code_end: u64, next: u64) -> Self {
        self.entry_point_offset = entry_point;
        self.code_end_offset = code_end;
        self.next_offset = next;
        self
    }
}

impl Default for RegistryLayout {
    fn default() -> Self {
        Self::new("emacs_jit_context")
    }
}

/// Everything needed to install the unwinder and its frame filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Registration name, shared by the unwinder and the frame filter.
    pub name: &'static str,
    pub priority: i32,
    pub arch: ArchConfig,
    pub layout: RegistryLayout,
}

impl Config {
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_arch(mut self, arch: ArchConfig) -> Self {
        self.arch = arch;
        self
    }

    pub fn with_layout(mut self, layout: RegistryLayout) -> Self {
        self.layout = layout;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "jitwind",
            priority: 100,
            arch: X86_64,
            layout: RegistryLayout::default(),
        }
    }
}
