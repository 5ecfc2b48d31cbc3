//! Groups a flat command stream into per-function [`Function`] records and
//! builds the call-graph table a [`Program`] needs for reachability.

use crate::error::PreassemblyError;
use crate::ir::{Command, Function, Program};

/// Accumulates commands from one or more source files into a [`Program`].
/// Mirrors the "current function" state a single-pass assembler keeps.
#[derive(Default)]
pub struct Preassembler {
    program: Program,
    current: Option<Function>,
}

impl Preassembler {
    pub fn new() -> Self {
        Preassembler { program: Program::new(), current: None }
    }

    /// Feed one source file's already-parsed commands, tagged with the
    /// file stem used to form `static` addresses and the default function
    /// name (unused once the file declares its own `function`s, but kept
    /// for parity with callers that construct a `Preassembler` per file).
    pub fn add_file(
        &mut self,
        filename: &str,
        commands: Vec<Command>,
    ) -> Result<(), PreassemblyError> {
        for command in commands {
            self.add(filename, command)?;
        }
        Ok(())
    }

    fn add(&mut self, filename: &str, command: Command) -> Result<(), PreassemblyError> {
        if let Command::Function { name, .. } | Command::FunctionExt { name, .. } = &command {
            self.finish_current();
            self.current = Some(Function::new(filename, name.clone()));
        }
        match self.current.as_mut() {
            Some(function) => {
                function.push(command);
                Ok(())
            }
            None => Err(PreassemblyError::CommandBeforeFunction),
        }
    }

    fn finish_current(&mut self) {
        if let Some(function) = self.current.take() {
            self.program.functions.insert(function.name.clone(), function);
        }
    }

    /// Consume the builder, yielding the finished [`Program`].
    pub fn finish(mut self) -> Program {
        self.finish_current();
        self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_lines;

    #[test]
    fn groups_commands_by_function() {
        let mut pre = Preassembler::new();
        let commands = parse_lines(
            "function Foo.a 0\npush constant 1\nreturn\nfunction Foo.b 0\npush constant 2\nreturn\n",
        )
        .unwrap();
        pre.add_file("Foo", commands).unwrap();
        let program = pre.finish();
        assert_eq!(program.functions.len(), 2);
        assert_eq!(program.functions["Foo.a"].commands.len(), 3);
        assert_eq!(program.functions["Foo.b"].filename, "Foo");
    }

    #[test]
    fn records_call_graph_edges() {
        let mut pre = Preassembler::new();
        let commands = parse_lines(
            "function Foo.a 0\ncall Foo.b 0\nreturn\nfunction Foo.b 0\nreturn\n",
        )
        .unwrap();
        pre.add_file("Foo", commands).unwrap();
        let program = pre.finish();
        assert!(program.functions["Foo.a"].callees.contains("Foo.b"));
    }

    #[test]
    fn command_before_function_is_an_error() {
        let mut pre = Preassembler::new();
        let commands = parse_lines("push constant 1\n").unwrap();
        let err = pre.add_file("Foo", commands).unwrap_err();
        assert!(matches!(err, PreassemblyError::CommandBeforeFunction));
    }

    #[test]
    fn reachability_drops_unreferenced_functions() {
        let mut pre = Preassembler::new();
        let commands = parse_lines(
            "function Sys.init 0\ncall Foo.used 0\nreturn\nfunction Foo.used 0\nreturn\nfunction Foo.unused 0\nreturn\n",
        )
        .unwrap();
        pre.add_file("Foo", commands).unwrap();
        let program = pre.finish();
        let reachable = program.reachable_from("Sys.init").unwrap();
        assert!(reachable.contains("Sys.init"));
        assert!(reachable.contains("Foo.used"));
        assert!(!reachable.contains("Foo.unused"));
    }
}
