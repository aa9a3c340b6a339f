//! Classifies program counters against the host's list of JIT functions.
//!
//! The list belongs to the host and changes while the target runs. It is
//! read fresh on every classification and never written.


use crate::cache::{FunctionRange, RangeCache};
use crate::config::RegistryLayout;
use crate::target::{Memory, Symbols};
use crate::{Addr, Result};

/// One node of the host's singly linked function list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionDescriptor {
    pub entry_point: Addr,
    pub code_end: Addr,
    pub next: Option<Addr>,
}

impl FunctionDescriptor {
    pub fn range(&self) -> FunctionRange {
        FunctionRange::new(self.entry_point, self.code_end)
    }
}

/// Read only view of the function list.
pub trait FunctionList {
    /// The first descriptor, or `None` when the JIT has no functions (or does
    /// not exist yet).
    fn root(&self) -> Result<Option<Addr>>;

    fn descriptor(&self, at: Addr) -> Result<FunctionDescriptor>;
}

/// A [`FunctionList`] read out of target memory.
#[derive(Debug, Clone, Copy)]
pub struct RemoteRegistry<T> {
    target: T,
    layout: RegistryLayout,
    pointer_width: usize,
}

impl<T> RemoteRegistry<T> {
    pub fn new(target: T, layout: RegistryLayout, pointer_width: usize) -> Self {
        Self {
            target,
            layout,
            pointer_width,
        }
    }
}

impl<T: Memory + Symbols> FunctionList for RemoteRegistry<T> {
    fn root(&self) -> Result<Option<Addr>> {
        let Some(symbol) = self.target.lookup_global(self.layout.root_symbol) else {
            trace!(symbol = self.layout.root_symbol, "no JIT context symbol");
            return Ok(None);
        };

        // The JIT may not be set up yet, in which case the context is null
        // or not even mapped.
        let context = match self.target.read_pointer(symbol, self.pointer_width) {
            Ok(context) => context,
            Err(err) => {
                warn!(symbol = self.layout.root_symbol, %err, "JIT context unreadable");
                return Ok(None);
            }
        };
        if context.is_null() {
            trace!("JIT context is null");
            return Ok(None);
        }

        let head = self
            .target
            .read_pointer(context.offset(self.layout.functions_offset), self.pointer_width)?;
        Ok((!head.is_null()).then_some(head))
    }

    fn descriptor(&self, at: Addr) -> Result<FunctionDescriptor> {
        let width = self.pointer_width;
        let entry_point = self
            .target
            .read_pointer(at.offset(self.layout.entry_point_offset), width)?;
        let code_end = self
            .target
            .read_pointer(at.offset(self.layout.code_end_offset), width)?;
        let next = self.target.read_pointer(at.offset(self.layout.next_offset), width)?;

        Ok(FunctionDescriptor {
            entry_point,
            code_end,
            next: (!next.is_null()).then_some(next),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The frame belongs to this JIT function.
    Classified(FunctionRange),
    /// Not ours; some other unwinder has to deal with it.
    Unclassified,
}

impl Classification {
    pub fn range(self) -> Option<FunctionRange> {
        match self {
            Classification::Classified(range) => Some(range),
            Classification::Unclassified => None,
        }
    }
}

/// Looks up which JIT function a program counter is in.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<L> {
    functions: L,
}

impl<L: FunctionList> Resolver<L> {
    pub fn new(functions: L) -> Self {
        Self { functions }
    }

    /// Linear scan over the function list; the first function containing `pc`
    /// wins. On a hit, the range is cached under `frame_key`.
    ///
    /// The list is trusted to be acyclic.
    #[instrument(level = "debug", skip(self, cache))]
    pub fn resolve(
        &self,
        cache: &mut RangeCache,
        pc: Addr,
        frame_key: Addr,
    ) -> Result<Classification> {
        let mut current = self.functions.root()?;
        while let Some(at) = current {
            let descriptor = self.functions.descriptor(at)?;
            trace!(?at, entry_point = ?descriptor.entry_point, code_end = ?descriptor.code_end);

            let range = descriptor.range();
            if range.contains(pc) {
                debug!(%range, "classified");
                cache.insert(frame_key, range);
                return Ok(Classification::Classified(range));
            }
            current = descriptor.next;
        }

        Ok(Classification::Unclassified)
    }
}
