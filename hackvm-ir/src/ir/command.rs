//! The `Command` sum type: one VM operation, plus the small set of
//! opcodes this translator synthesizes internally (never present in
//! hand-written `.vm` source, only produced by the optimizer).

use std::fmt;

/// A memory segment addressable by `push`/`pop`/`ldd`/`sdd`/`tee`, plus the
/// two pseudo-segments the peephole pass folds literal `not`/`neg` into.
///
/// `Unknown` is the parser's escape hatch for a segment name it doesn't
/// recognize: the lexer doesn't validate segment names (see
/// [`crate::parser`] docs), so an unrecognized one is carried through as
/// data and rejected later by the code generator's dispatch table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Argument,
    Local,
    Static,
    Constant,
    This,
    That,
    Pointer,
    Temp,
    /// `push constant~ K` lowers to `D=!A` — folded from `push constant K; not`.
    ConstantNot,
    /// `push constant- K` lowers to `D=-A` — folded from `push constant K; neg`.
    ConstantNeg,
    Unknown(String),
}

impl Segment {
    pub fn name(&self) -> &str {
        match self {
            Segment::Argument => "argument",
            Segment::Local => "local",
            Segment::Static => "static",
            Segment::Constant => "constant",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
            Segment::ConstantNot => "constant~",
            Segment::ConstantNeg => "constant-",
            Segment::Unknown(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Option<Segment> {
        Some(match name {
            "argument" => Segment::Argument,
            "local" => Segment::Local,
            "static" => Segment::Static,
            "constant" => Segment::Constant,
            "this" => Segment::This,
            "that" => Segment::That,
            "pointer" => Segment::Pointer,
            "temp" => Segment::Temp,
            "constant~" => Segment::ConstantNot,
            "constant-" => Segment::ConstantNeg,
            _ => return None,
        })
    }

    /// The four segments whose address is a base pointer held in memory
    /// (`LCL`/`ARG`/`THIS`/`THAT`), as opposed to a fixed or static slot.
    pub fn pointer_base(&self) -> Option<&'static str> {
        match self {
            Segment::Local => Some("LCL"),
            Segment::Argument => Some("ARG"),
            Segment::This => Some("THIS"),
            Segment::That => Some("THAT"),
            _ => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The five stack comparison operators. `Eq`/`Lt`/`Gt` are VM-standard;
/// `Lte`/`Gte` only ever arise from the `lt;not`/`gt;not` peephole fold but
/// are first-class opcodes in their own right once folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cmp {
    Eq,
    Lt,
    Gt,
    Lte,
    Gte,
}

impl Cmp {
    pub fn name(self) -> &'static str {
        match self {
            Cmp::Eq => "eq",
            Cmp::Lt => "lt",
            Cmp::Gt => "gt",
            Cmp::Lte => "lte",
            Cmp::Gte => "gte",
        }
    }

    pub fn from_name(name: &str) -> Option<Cmp> {
        Some(match name {
            "eq" => Cmp::Eq,
            "lt" => Cmp::Lt,
            "gt" => Cmp::Gt,
            "lte" => Cmp::Lte,
            "gte" => Cmp::Gte,
            _ => return None,
        })
    }

    /// The Hack jump mnemonic used once `D = x - y` has been computed.
    pub fn jump_mnemonic(self) -> &'static str {
        match self {
            Cmp::Eq => "JEQ",
            Cmp::Lt => "JLT",
            Cmp::Gt => "JGT",
            Cmp::Lte => "JLE",
            Cmp::Gte => "JGE",
        }
    }
}

impl fmt::Display for Cmp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One VM command. Commands are immutable once constructed; the optimizer
/// builds new `Command` values rather than mutating existing ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add,
    Sub,
    Neg,
    And,
    Or,
    Not,
    /// A bare comparison op (`eq`/`lt`/`gt`/`lte`/`gte`): pops two operands,
    /// pushes -1 (true) or 0 (false).
    Cmp(Cmp),

    Push(Segment, i32),
    Pop(Segment, i32),

    Label(String),
    Goto(String),
    IfGoto(String),

    Function { name: String, nvars: u32 },
    Call { name: String, nargs: u32 },
    Return,

    /// `call-ext`'s callee handles its own `save_stack` handshake.
    FunctionExt { name: String, nvars: u32, nargs: u32 },
    CallExt { name: String },

    /// Marks entry into an inlined accessor's body; re-points the emitter's
    /// naming context at the callee's `(filename, function_name)` so the
    /// accessor's `static`/label references resolve correctly.
    InlineCall { filename: String, function_name: String },
    /// Marks the matching exit, restoring the caller's naming context.
    InlineReturn { filename: String, function_name: String },

    /// Load segment slot into D without touching the stack.
    Ldd(Segment, i32),
    /// Store D into segment slot without touching the stack.
    Sdd(Segment, i32),
    /// Duplicate the stack top into `segment[i]` by loading from `SP-1`.
    Tee(Segment, i32),
    /// Copy `from_segment[j]` directly into `to_segment[i]`.
    Poke {
        to_segment: Segment,
        i: i32,
        from_segment: Segment,
        j: i32,
    },
    /// Increment `segment[i]` in place by `step`.
    Inc { segment: Segment, i: i32, step: i32 },
    /// Decrement `segment[i]` in place by `step`.
    Dec { segment: Segment, i: i32, step: i32 },
    /// Flip every bit of `segment[i]` in place.
    Inv(Segment, i32),
    /// Discard the stack top without reading it.
    Drop,

    /// Fused `push segment i; CMP; if-goto label` with no stack round-trip.
    IfCmpGoto {
        cmp: Cmp,
        segment: Segment,
        i: i32,
        label: String,
    },
    /// `if-goto A; goto B; label A` inverted to fall through.
    IfGotoNot(String),

    /// An opcode the parser could tokenize but does not recognize. Carried
    /// through preassembly and optimization untouched; rejected only when
    /// the code generator tries to lower it. This is the escape hatch the
    /// parser's lexer-only contract requires (validation happens at
    /// dispatch time, not at parse time).
    Unknown { opcode: String, raw: String },
}

impl Command {
    /// `true` for the two opcodes that carry a callee name the preassembler
    /// must record as a call-graph edge.
    pub fn callee(&self) -> Option<&str> {
        match self {
            Command::Call { name, .. } => Some(name),
            Command::CallExt { name } => Some(name),
            _ => None,
        }
    }

    pub fn is_function_decl(&self) -> bool {
        matches!(self, Command::Function { .. } | Command::FunctionExt { .. })
    }

    /// The VM-source-level textual rendering of a command, used for the
    /// `// <command>` comment the code generator emits above each
    /// instruction group.
    pub fn symbolic(&self) -> String {
        match self {
            Command::Add => "add".into(),
            Command::Sub => "sub".into(),
            Command::Neg => "neg".into(),
            Command::And => "and".into(),
            Command::Or => "or".into(),
            Command::Not => "not".into(),
            Command::Cmp(c) => c.name().into(),
            Command::Push(seg, i) => format!("push {} {}", seg, i),
            Command::Pop(seg, i) => format!("pop {} {}", seg, i),
            Command::Label(l) => format!("label {}", l),
            Command::Goto(l) => format!("goto {}", l),
            Command::IfGoto(l) => format!("if-goto {}", l),
            Command::Function { name, nvars } => format!("function {} {}", name, nvars),
            Command::Call { name, nargs } => format!("call {} {}", name, nargs),
            Command::Return => "return".into(),
            Command::FunctionExt { name, nvars, nargs } => {
                format!("function-ext {} {} {}", name, nvars, nargs)
            }
            Command::CallExt { name } => format!("call-ext {}", name),
            Command::InlineCall { filename, function_name } => {
                format!("inline-call {} {}", filename, function_name)
            }
            Command::InlineReturn { filename, function_name } => {
                format!("inline-return {} {}", filename, function_name)
            }
            Command::Ldd(seg, i) => format!("ldd {} {}", seg, i),
            Command::Sdd(seg, i) => format!("sdd {} {}", seg, i),
            Command::Tee(seg, i) => format!("tee {} {}", seg, i),
            Command::Poke { to_segment, i, from_segment, j } => {
                format!("poke {} {} {} {}", to_segment, i, from_segment, j)
            }
            Command::Inc { segment, i, step } => format!("inc {} {} {}", segment, i, step),
            Command::Dec { segment, i, step } => format!("dec {} {} {}", segment, i, step),
            Command::Inv(seg, i) => format!("inv {} {}", seg, i),
            Command::Drop => "drop".into(),
            Command::IfCmpGoto { cmp, segment, i, label } => {
                format!("if-{}-goto {} {} {}", cmp, segment, i, label)
            }
            Command::IfGotoNot(l) => format!("if-goto-not {}", l),
            Command::Unknown { opcode, raw } => {
                if raw.is_empty() {
                    opcode.clone()
                } else {
                    format!("{} {}", opcode, raw)
                }
            }
        }
    }
}
