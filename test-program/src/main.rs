use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

use jitwind::extension::{self, Extensions};
use jitwind::process::CurrentProcess;
use jitwind::target::FrameView;
use jitwind::walk::walk_jit_frames;
use jitwind::{Addr, Config, RegistryLayout, ResumeKind, Session, TargetEvent};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[repr(C)]
struct JitFunction {
    entry_point: *const u8,
    code_end: *const u8,
    next: *mut JitFunction,
}

#[repr(C)]
struct JitContext {
    functions: *mut JitFunction,
}

#[no_mangle]
pub static DEMO_JIT_CONTEXT: AtomicPtr<JitContext> = AtomicPtr::new(ptr::null_mut());

/// A frame as a debugger would hand it to the frame filter.
struct DemoFrame {
    process: CurrentProcess,
    pc: u64,
    fp: u64,
}

impl FrameView for DemoFrame {
    fn read_register(&self, name: &str) -> jitwind::Result<u64> {
        match name {
            "rip" => Ok(self.pc),
            "rbp" => Ok(self.fp),
            _ => Err(jitwind::Error::Register {
                register: name.to_owned(),
                reason: "not in demo frame".to_owned(),
            }),
        }
    }

    fn read_memory(&self, addr: Addr, width: usize) -> jitwind::Result<u64> {
        use jitwind::target::Memory;
        self.process.read_word(addr, width)
    }

    fn function(&self) -> Option<String> {
        self.process.symbol_at(Addr(self.pc))
    }
}

fn main() {
    let registry = tracing_subscriber::Registry::default().with(
        EnvFilter::builder()
            .with_default_directive(tracing::Level::TRACE.into())
            .from_env()
            .unwrap(),
    );

    let tree_layer = tracing_tree::HierarchicalLayer::new(2)
        .with_targets(true)
        .with_bracketed_fields(true);

    registry.with(tree_layer).init();

    let max_frames = std::env::var("JITWIND_MAX_FRAMES")
        .ok()
        .and_then(|max| max.parse().ok())
        .unwrap_or(64);

    // Pretend to be a JIT: two "functions" in a code buffer.
    let code = vec![0xccu8; 0x200].leak();
    let code = code.as_ptr();
    let outer = Box::leak(Box::new(JitFunction {
        entry_point: code.wrapping_add(0x100),
        code_end: code.wrapping_add(0x200),
        next: ptr::null_mut(),
    }));
    let inner = Box::leak(Box::new(JitFunction {
        entry_point: code,
        code_end: code.wrapping_add(0x100),
        next: outer,
    }));
    let context = Box::leak(Box::new(JitContext { functions: inner }));
    DEMO_JIT_CONTEXT.store(context, Ordering::SeqCst);

    // inner (fp = stack[0]) <- outer (fp = stack[8]) <- main
    let stack = vec![0u64; 32].leak();
    let frame_addr = |idx: usize| &stack[idx] as *const u64 as u64;
    let (fp0, fp1) = (frame_addr(0), frame_addr(8));
    stack[0] = fp1;
    stack[1] = code as u64 + 0x140;
    stack[8] = 0;
    stack[9] = main as usize as u64;

    let config = Config::default().with_layout(RegistryLayout::new("DEMO_JIT_CONTEXT"));
    let mut unwinders = Extensions::new();
    let mut filters = Extensions::new();
    extension::install(&config, &mut unwinders, &mut filters);

    let process = CurrentProcess::new();
    let mut session = Session::new();
    let unwinder = unwinders.get(config.name).unwrap();
    let filter = filters.get(config.name).unwrap();

    let start_pc = code as u64 + 0x10;
    let callers = walk_jit_frames(
        &mut session,
        unwinder,
        &process,
        Addr(start_pc),
        Addr(fp0),
        max_frames,
    )
    .unwrap();

    let frames = std::iter::once((start_pc, fp0))
        .chain(
            callers
                .iter()
                .map(|id| (id.program_counter.addr(), id.stack_pointer.addr())),
        )
        .map(|(pc, fp)| DemoFrame { process, pc, fp });

    for (i, frame) in filter.filter(session.cache(), frames).enumerate() {
        let frame = frame.unwrap();
        let pc = frame.read_register("rip").unwrap();
        let name = frame.function().unwrap_or_else(|| "??".to_owned());
        println!("#{i} {pc:#018x} in {name}");
    }

    session.notify(TargetEvent::Resumed(ResumeKind::Continue));
    println!("cached frames after resume: {}", session.cache().len());
}
