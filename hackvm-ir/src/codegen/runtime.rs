//! The shared call/return trampoline (`save_stack`/`pop_stack`) and the
//! VM-init prologue. Both routines are emitted exactly once per
//! directory-mode program and referenced by every `call`/`call-ext`/
//! `return` site rather than inlined at each site, bounding code size.
//!
//! `save_stack` gives `R13`/`R14`/`R15` fixed, call-convention-independent
//! roles: `R13` holds the return address, `R14` the frame offset
//! (`5 + nargs`), `R15` the address to jump to once the new frame is set
//! up — the callee's entry point for a plain `call`, or a `function-ext`
//! callee's own resume label for `call-ext`. See DESIGN.md for why this
//! departs from the reference implementation's wiring.

use super::labels::Emitter;

fn push_register(address: &str) -> Vec<String> {
    vec![
        address.to_string(),
        "D=M".to_string(),
        "@SP".to_string(),
        "AM=M+1".to_string(),
        "A=A-1".to_string(),
        "M=D".to_string(),
    ]
}

fn pop_register_into_lcl(address: &str) -> Vec<String> {
    vec![
        "@LCL".to_string(),
        "AM=M-1".to_string(),
        "D=M".to_string(),
        address.to_string(),
        "M=D".to_string(),
    ]
}

pub fn save_stack() -> Vec<String> {
    let mut out = vec![
        "(save_stack)".to_string(),
        "@R13".to_string(),
        "D=M".to_string(),
        "@SP".to_string(),
        "AM=M+1".to_string(),
        "A=A-1".to_string(),
        "M=D".to_string(),
    ];
    for register in ["@LCL", "@ARG", "@THIS", "@THAT"] {
        out.extend(push_register(register));
    }
    out.extend([
        "@SP".to_string(),
        "D=M".to_string(),
        "@R14".to_string(),
        "D=D-M".to_string(),
        "@ARG".to_string(),
        "M=D".to_string(),
        "@SP".to_string(),
        "D=M".to_string(),
        "@LCL".to_string(),
        "M=D".to_string(),
        "@R15".to_string(),
        "A=M".to_string(),
        "0; JMP".to_string(),
    ]);
    out
}

pub fn pop_stack() -> Vec<String> {
    let mut out = vec![
        "(pop_stack)".to_string(),
        "@LCL".to_string(),
        "D=M".to_string(),
        "@5".to_string(),
        "A=D-A".to_string(),
        "D=M".to_string(),
        "@R13".to_string(),
        "M=D".to_string(),
        "@SP".to_string(),
        "A=M-1".to_string(),
        "D=M".to_string(),
        "@ARG".to_string(),
        "A=M".to_string(),
        "M=D".to_string(),
        "D=A+1".to_string(),
        "@SP".to_string(),
        "M=D".to_string(),
    ];
    for register in ["@THAT", "@THIS", "@ARG", "@LCL"] {
        out.extend(pop_register_into_lcl(register));
    }
    out.extend(["@R13".to_string(), "A=M".to_string(), "0; JMP".to_string()]);
    out
}

/// Sets `SP` to 256 and jumps directly to `Sys.init` (a plain, non-ext
/// function declaration entered like any other label — there is no caller
/// to return to, so no `call` protocol is needed), then appends the
/// trampoline routines it and every other call site depend on.
pub fn init_vm(emitter: &mut Emitter) -> Vec<String> {
    let _ = emitter;
    let mut out = vec![
        "@256".to_string(),
        "D=A".to_string(),
        "@SP".to_string(),
        "M=D".to_string(),
        Emitter::function_call_address("Sys.init"),
        "0; JMP".to_string(),
    ];
    out.extend(save_stack());
    out.extend(pop_stack());
    out
}
