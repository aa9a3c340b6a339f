//! A scripted target for tests: word addressed memory, a symbol table and a
//! pending frame with fixed registers.

use std::cell::Cell;
use std::collections::HashMap;

use crate::target::{FrameView, Memory, PendingFrame, Symbols};
use crate::{Addr, Error, Result};

#[derive(Debug, Default)]
pub struct FakeTarget {
    words: HashMap<u64, u64>,
    symbols: HashMap<String, Addr>,
    reads: Cell<usize>,
}

impl FakeTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, addr: u64, value: u64) -> &mut Self {
        self.words.insert(addr, value);
        self
    }

    pub fn symbol(&mut self, name: &str, addr: u64) -> &mut Self {
        self.symbols.insert(name.to_owned(), Addr(addr));
        self
    }

    /// Lays out a JIT context at `context` whose function list holds
    /// `functions` (entry point, code end) in order, using the default
    /// registry layout. Descriptors go at `context + 0x100`, 0x20 apart.
    pub fn registry(&mut self, symbol: &str, context: u64, functions: &[(u64, u64)]) -> &mut Self {
        let symbol_addr = context - 0x10;
        self.symbol(symbol, symbol_addr);
        self.write(symbol_addr, context);

        let descriptor = |i: usize| context + 0x100 + 0x20 * i as u64;
        let head = if functions.is_empty() { 0 } else { descriptor(0) };
        self.write(context, head);

        for (i, &(entry_point, code_end)) in functions.iter().enumerate() {
            let at = descriptor(i);
            let next = if i + 1 < functions.len() { descriptor(i + 1) } else { 0 };
            self.write(at, entry_point);
            self.write(at + 8, code_end);
            self.write(at + 16, next);
        }
        self
    }

    /// Number of memory reads so far.
    pub fn reads(&self) -> usize {
        self.reads.get()
    }
}

impl Memory for FakeTarget {
    fn read_word(&self, addr: Addr, width: usize) -> Result<u64> {
        self.reads.set(self.reads.get() + 1);
        assert_eq!(width, 8, "fake target only has 8 byte words");
        self.words.get(&addr.addr()).copied().ok_or_else(|| Error::Memory {
            addr,
            width,
            reason: "not mapped".to_owned(),
        })
    }
}

impl Symbols for FakeTarget {
    fn lookup_global(&self, name: &str) -> Option<Addr> {
        self.symbols.get(name).copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FakeFrame {
    pub registers: HashMap<String, u64>,
    pub function: Option<String>,
}

impl FakeFrame {
    pub fn new(pc: u64, fp: u64) -> Self {
        let mut registers = HashMap::new();
        registers.insert("rip".to_owned(), pc);
        registers.insert("rbp".to_owned(), fp);
        Self {
            registers,
            function: None,
        }
    }

    pub fn named(mut self, function: &str) -> Self {
        self.function = Some(function.to_owned());
        self
    }
}

impl PendingFrame for FakeFrame {
    fn read_register(&self, name: &str) -> Result<u64> {
        self.registers.get(name).copied().ok_or_else(|| Error::Register {
            register: name.to_owned(),
            reason: "no such register".to_owned(),
        })
    }
}

impl FrameView for FakeFrame {
    fn read_register(&self, name: &str) -> Result<u64> {
        PendingFrame::read_register(self, name)
    }

    fn read_memory(&self, addr: Addr, width: usize) -> Result<u64> {
        Err(Error::Memory {
            addr,
            width,
            reason: "fake frames have no memory".to_owned(),
        })
    }

    fn function(&self) -> Option<String> {
        self.function.clone()
    }
}
