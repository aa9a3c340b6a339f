fn main() {
    // The JIT context symbol has to be in the dynamic symbol table for dlsym.
    println!("cargo:rustc-link-arg-bins=-rdynamic");
}
