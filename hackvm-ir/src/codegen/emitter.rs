//! Lowers one (optimized) [`Command`] to a list of raw Hack assembly
//! instructions. Every `@`/computation line and `(LABEL)` line is returned
//! as a separate string; the driver is responsible for line-number
//! annotation and the symbolic `// <command>` comment above each group.

use super::labels::Emitter;
use crate::error::CodegenError;
use crate::ir::{Cmp, Command, Segment};

const TEMP_BASE: i32 = 5;

fn temp_register(i: i32) -> String {
    format!("@{}", TEMP_BASE + i)
}

fn pointer_register(opcode: &'static str, i: i32) -> Result<&'static str, CodegenError> {
    match i {
        0 => Ok("@THIS"),
        1 => Ok("@THAT"),
        _ => Err(CodegenError::UnsupportedSegment { opcode, segment: format!("pointer {}", i) }),
    }
}

fn memory_segment_address(
    opcode: &'static str,
    segment: &Segment,
) -> Result<&'static str, CodegenError> {
    segment
        .pointer_base()
        .ok_or_else(|| CodegenError::UnsupportedSegment { opcode, segment: segment.name().to_string() })
}

/// Lower one command, dispatching on its shape. Returns the list of raw
/// instruction/label lines; callers add timing/comment metadata.
pub fn lower(emitter: &mut Emitter, command: &Command) -> Result<Vec<String>, CodegenError> {
    Ok(match command {
        Command::Add => vec![s("@SP"), s("AM=M-1"), s("D=M"), s("A=A-1"), s("M=D+M")],
        Command::Sub => vec![s("@SP"), s("AM=M-1"), s("D=M"), s("A=A-1"), s("M=M-D")],
        Command::Neg => vec![s("@SP"), s("A=M-1"), s("M=-M")],
        Command::And => vec![s("@SP"), s("AM=M-1"), s("D=M"), s("A=A-1"), s("M=M&D")],
        Command::Or => vec![s("@SP"), s("AM=M-1"), s("D=M"), s("A=A-1"), s("M=M|D")],
        Command::Not => vec![s("@SP"), s("A=M-1"), s("M=!M")],
        Command::Drop => vec![s("@SP"), s("AM=M-1")],

        Command::Cmp(cmp) => compare(emitter, *cmp),

        Command::Push(segment, i) => push(emitter, segment, *i)?,
        Command::Pop(segment, i) => pop(emitter, segment, *i)?,
        Command::Ldd(segment, i) => ldd(emitter, segment, *i)?,
        Command::Sdd(segment, i) => sdd(emitter, segment, *i)?,
        Command::Tee(segment, i) => {
            let mut out = vec![s("@SP"), s("A=M-1"), s("D=M")];
            out.extend(sdd(emitter, segment, *i)?);
            out
        }
        Command::Inc { segment, i, step } => inc_dec(emitter, "inc", segment, *i, *step, true)?,
        Command::Dec { segment, i, step } => inc_dec(emitter, "dec", segment, *i, *step, false)?,
        Command::Inv(segment, i) => inv(emitter, segment, *i)?,
        Command::Poke { to_segment, i, from_segment, j } => {
            poke(emitter, to_segment, *i, from_segment, *j)?
        }

        Command::Label(label) => vec![emitter.label_label(label)],
        Command::Goto(label) => vec![emitter.label_address(label), s("0; JMP")],
        Command::IfGoto(label) => {
            vec![s("@SP"), s("AM=M-1"), s("D=M"), emitter.label_address(label), s("D; JNE")]
        }
        Command::IfGotoNot(label) => {
            vec![s("@SP"), s("AM=M-1"), s("D=M"), emitter.label_address(label), s("D; JEQ")]
        }
        Command::IfCmpGoto { cmp, segment, i, label } => {
            if_cmp_goto(emitter, *cmp, segment, *i, label)?
        }

        Command::Function { name, nvars } => function_decl(emitter, name, *nvars),
        Command::FunctionExt { name, nvars, nargs } => function_ext(emitter, name, *nvars, *nargs),
        Command::Call { name, nargs } => call(emitter, name, *nargs),
        Command::CallExt { name } => call_ext(emitter, name),
        Command::Return => vec![s("@pop_stack"), s("0; JMP")],

        Command::InlineCall { filename, function_name } => {
            emitter.filename = filename.clone();
            emitter.function_name = function_name.clone();
            vec![]
        }
        Command::InlineReturn { filename, function_name } => {
            emitter.filename = filename.clone();
            emitter.function_name = function_name.clone();
            vec![]
        }

        Command::Unknown { opcode, raw } => {
            return Err(CodegenError::UnknownOpcode { opcode: opcode.clone(), raw: raw.clone() })
        }
    })
}

fn s(line: &str) -> String {
    line.to_string()
}

/// Load segment `i` into D without touching the stack.
fn ldd(emitter: &Emitter, segment: &Segment, i: i32) -> Result<Vec<String>, CodegenError> {
    Ok(match segment {
        Segment::Constant => match i {
            0 => vec![s("D=0")],
            1 => vec![s("D=1")],
            _ => vec![format!("@{}", i), s("D=A")],
        },
        Segment::ConstantNot => vec![format!("@{}", i), s("D=!A")],
        Segment::ConstantNeg => vec![format!("@{}", i), s("D=-A")],
        Segment::Static => vec![emitter.static_address(i), s("D=M")],
        Segment::Temp => vec![temp_register(i), s("D=M")],
        Segment::Pointer => vec![pointer_register("ldd", i)?.to_string(), s("D=M")],
        _ => {
            let base = memory_segment_address("ldd", segment)?;
            match i {
                0 => vec![base.to_string(), s("A=M"), s("D=M")],
                1 => vec![base.to_string(), s("A=M+1"), s("D=M")],
                _ => vec![base.to_string(), s("D=M"), format!("@{}", i), s("A=D+A"), s("D=M")],
            }
        }
    })
}

/// Store D into segment `i` without touching the stack.
fn sdd(emitter: &Emitter, segment: &Segment, i: i32) -> Result<Vec<String>, CodegenError> {
    Ok(match segment {
        Segment::Static => vec![emitter.static_address(i), s("M=D")],
        Segment::Temp => vec![temp_register(i), s("M=D")],
        Segment::Pointer => vec![pointer_register("sdd", i)?.to_string(), s("M=D")],
        _ => {
            let base = memory_segment_address("sdd", segment)?;
            match i {
                0 => vec![base.to_string(), s("A=M"), s("M=D")],
                1..=9 => {
                    let mut out = vec![base.to_string(), s("A=M+1")];
                    out.extend(std::iter::repeat(s("A=A+1")).take((i - 1) as usize));
                    out.push(s("M=D"));
                    out
                }
                _ => vec![
                    s("@R14"),
                    s("M=D"),
                    base.to_string(),
                    s("D=M"),
                    format!("@{}", i),
                    s("D=D+A"),
                    s("@R13"),
                    s("M=D"),
                    s("@R14"),
                    s("D=M"),
                    s("@R13"),
                    s("A=M"),
                    s("M=D"),
                ],
            }
        }
    })
}

fn push(emitter: &Emitter, segment: &Segment, i: i32) -> Result<Vec<String>, CodegenError> {
    let (mut value, op) = match segment {
        Segment::Constant if i == 0 => (vec![], "M=0".to_string()),
        Segment::Constant if i == 1 => (vec![], "M=1".to_string()),
        _ => (ldd(emitter, segment, i)?, "M=D".to_string()),
    };
    value.extend([s("@SP"), s("AM=M+1"), s("A=A-1"), op]);
    Ok(value)
}

fn pop(emitter: &Emitter, segment: &Segment, i: i32) -> Result<Vec<String>, CodegenError> {
    let mut out = vec![s("@SP"), s("AM=M-1"), s("D=M")];
    out.extend(sdd(emitter, segment, i)?);
    Ok(out)
}

fn inc_dec(
    emitter: &Emitter,
    opcode: &'static str,
    segment: &Segment,
    i: i32,
    step: i32,
    increment: bool,
) -> Result<Vec<String>, CodegenError> {
    let (mut value, op) = if step > 1 {
        (vec![format!("@{}", step), s("D=A")], if increment { "M=M+D" } else { "M=M-D" }.to_string())
    } else {
        (vec![], if increment { "M=M+1" } else { "M=M-1" }.to_string())
    };
    match segment {
        Segment::Static => value.extend([emitter.static_address(i), op]),
        Segment::Temp => value.extend([temp_register(i), op]),
        Segment::Pointer => value.extend([pointer_register(opcode, i)?.to_string(), op]),
        _ => {
            let base = memory_segment_address(opcode, segment)?;
            match i {
                0 => value.extend([base.to_string(), s("A=M"), op]),
                1 => value.extend([base.to_string(), s("A=M+1"), op]),
                _ if step == 1 => {
                    value = vec![
                        base.to_string(),
                        s("D=M"),
                        format!("@{}", i),
                        s("A=D+A"),
                        if increment { s("M=M+1") } else { s("M=M-1") },
                    ]
                }
                _ => {
                    return Err(CodegenError::UnsupportedSegment {
                        opcode,
                        segment: format!("{} {} (step {})", segment, i, step),
                    })
                }
            }
        }
    }
    Ok(value)
}

fn inv(emitter: &Emitter, segment: &Segment, i: i32) -> Result<Vec<String>, CodegenError> {
    Ok(match segment {
        Segment::Static => vec![emitter.static_address(i), s("M=!M")],
        Segment::Temp => vec![temp_register(i), s("M=!M")],
        Segment::Pointer => vec![pointer_register("inv", i)?.to_string(), s("M=!M")],
        _ => {
            let base = memory_segment_address("inv", segment)?;
            match i {
                0 => vec![base.to_string(), s("A=M"), s("M=!M")],
                1 => vec![base.to_string(), s("A=M+1"), s("M=!M")],
                _ => vec![base.to_string(), s("D=M"), format!("@{}", i), s("A=D+A"), s("M=!M")],
            }
        }
    })
}

/// Copy `from_segment[j]` directly into `to_segment[i]`, never touching the
/// stack. Pointer-based destinations are not implemented: no peephole rule
/// ever produces one and the reference implementation's handler for that
/// case referenced a variable that didn't exist in scope.
fn poke(
    emitter: &Emitter,
    to_segment: &Segment,
    i: i32,
    from_segment: &Segment,
    j: i32,
) -> Result<Vec<String>, CodegenError> {
    let value = match from_segment {
        Segment::Constant if j == 0 => vec![],
        Segment::Constant if j == 1 => vec![],
        Segment::Constant => vec![format!("@{}", j), s("D=A")],
        Segment::ConstantNot => vec![format!("@{}", j), s("D=!A")],
        Segment::ConstantNeg => vec![format!("@{}", j), s("D=-A")],
        _ => {
            return Err(CodegenError::UnsupportedSegment {
                opcode: "poke",
                segment: format!("from {}", from_segment),
            })
        }
    };
    let op = match from_segment {
        Segment::Constant if j == 0 => "M=0".to_string(),
        Segment::Constant if j == 1 => "M=1".to_string(),
        _ => "M=D".to_string(),
    };

    let mut out = value;
    match to_segment {
        Segment::Constant => out.extend([format!("@{}", i), op]),
        Segment::Static => out.extend([emitter.static_address(i), s("A=M"), op]),
        Segment::Local | Segment::Argument | Segment::This | Segment::That => {
            return Err(CodegenError::Unreachable(
                "poke to a pointer-based segment is not implemented",
            ))
        }
        _ => {
            return Err(CodegenError::UnsupportedSegment {
                opcode: "poke",
                segment: to_segment.name().to_string(),
            })
        }
    }
    Ok(out)
}

fn compare(emitter: &mut Emitter, cmp: Cmp) -> Vec<String> {
    let (address, label) = emitter.next_address_label(cmp.jump_mnemonic());
    match cmp {
        Cmp::Eq => vec![
            s("@SP"),
            s("AM=M-1"),
            s("D=M"),
            s("A=A-1"),
            s("D=M-D"),
            address,
            s("D; JEQ"),
            s("D=-1"),
            label,
            s("@SP"),
            s("A=M-1"),
            s("M=!D"),
        ],
        _ => vec![
            s("@SP"),
            s("AM=M-1"),
            s("D=M"),
            s("A=A-1"),
            s("D=M-D"),
            address,
            format!("D=D; {}", cmp.jump_mnemonic()),
            s("A=A+1"),
            s("D=0; JMP"),
            label,
            s("D=-1"),
            s("@SP"),
            s("A=M-1"),
            s("M=D"),
        ],
    }
}

fn if_cmp_goto(
    emitter: &mut Emitter,
    cmp: Cmp,
    segment: &Segment,
    i: i32,
    label: &str,
) -> Result<Vec<String>, CodegenError> {
    let (load, op) = match segment {
        Segment::Constant if i == 0 => (vec![], "D=M".to_string()),
        Segment::Constant if i == 1 => (vec![], "D=M-1".to_string()),
        _ => (ldd(emitter, segment, i)?, "D=M-D".to_string()),
    };
    let mut out = load;
    out.extend([s("@SP"), s("AM=M-1"), op, emitter.label_address(label), format!("D; {}", cmp.jump_mnemonic())]);
    Ok(out)
}

fn zero_locals(vars: u32) -> Vec<String> {
    if vars == 0 {
        return vec![];
    }
    let mut out = vec![s("@SP"), s("A=M")];
    for _ in 0..vars {
        out.extend([s("M=0"), s("AD=A+1")]);
    }
    out.extend([s("@SP"), s("M=D")]);
    out
}

fn function_decl(emitter: &mut Emitter, name: &str, nvars: u32) -> Vec<String> {
    emitter.enter_function(name);
    let mut out = vec![emitter.function_declaration_label()];
    out.extend(zero_locals(nvars));
    out
}

fn call(emitter: &mut Emitter, name: &str, nargs: u32) -> Vec<String> {
    let (address, label) = emitter.next_return_address_label();
    vec![
        Emitter::function_call_address(name),
        s("D=A"),
        s("@R15"),
        s("M=D"),
        format!("@{}", 5 + nargs),
        s("D=A"),
        s("@R14"),
        s("M=D"),
        address,
        s("D=A"),
        s("@R13"),
        s("M=D"),
        s("@save_stack"),
        s("0; JMP"),
        label,
    ]
}

fn call_ext(emitter: &mut Emitter, name: &str) -> Vec<String> {
    let (address, label) = emitter.next_return_address_label();
    vec![address, s("D=A"), Emitter::function_call_address(name), s("0; JMP"), label]
}

fn function_ext(emitter: &mut Emitter, name: &str, nvars: u32, nargs: u32) -> Vec<String> {
    emitter.enter_function(name);
    let mut out = vec![emitter.function_declaration_label()];
    if name != "Sys.init" {
        out.extend([s("@R13"), s("M=D")]);
        out.extend([format!("@{}", 5 + nargs), s("D=A"), s("@R14"), s("M=D")]);
        let (resume_address, resume_label) = emitter.next_address_label("resume");
        out.extend([resume_address, s("D=A"), s("@R15"), s("M=D")]);
        out.extend([s("@save_stack"), s("0; JMP"), resume_label]);
    }
    out.extend(zero_locals(nvars));
    out
}
