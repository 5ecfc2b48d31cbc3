use super::command::Command;
use std::collections::BTreeSet;

/// A named sequence of commands belonging to one `.vm` source file.
///
/// `filename` is fixed at preassembly time from the source file's stem and
/// never changes afterwards; the code generator's own `filename`/
/// `function_name` fields are separate, mutable *emitter* state used only
/// to resolve labels while lowering (see [`crate::codegen::Emitter`]).
#[derive(Debug, Clone)]
pub struct Function {
    pub filename: String,
    pub name: String,
    pub commands: Vec<Command>,
    /// Out-edges of the call graph: names this function calls via
    /// `call`/`call-ext`. Rebuilt by each optimizer pass that rewrites
    /// `commands`.
    pub callees: BTreeSet<String>,
    pub nvars: u32,
}

impl Function {
    pub fn new(filename: impl Into<String>, name: impl Into<String>) -> Self {
        Function {
            filename: filename.into(),
            name: name.into(),
            commands: Vec::new(),
            callees: BTreeSet::new(),
            nvars: 0,
        }
    }

    /// Append a command parsed (or synthesized) for this function, updating
    /// the call-graph edge set if it's a call.
    pub fn push(&mut self, command: Command) {
        if let Some(callee) = command.callee() {
            self.callees.insert(callee.to_string());
        }
        if let Command::Function { nvars, .. } | Command::FunctionExt { nvars, .. } = &command {
            self.nvars = *nvars;
        }
        self.commands.push(command);
    }
}
