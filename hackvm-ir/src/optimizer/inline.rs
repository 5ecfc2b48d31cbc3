//! Trivial-accessor inlining: a `call`/`call-ext` to a function whose
//! entire body matches one of three known shapes is replaced by that body,
//! bracketed by `inline-call`/`inline-return` markers that repoint the code
//! generator's naming context at the callee's `(filename, function_name)`.

use crate::ir::{Command, Function, Program, Segment};
use std::collections::HashSet;

/// One of the three accessor shapes this translator recognizes, with the
/// inlined replacement body pre-built against the callee's own naming
/// context (the caller substitutes nothing further; the marker commands
/// handle that).
enum Accessor {
    /// `function … / push constant K / return` → `push constant K`.
    Constant(i32),
    /// `function … / push static I / return` → `push static I`.
    Static(i32),
    /// `function … / push argument 0 / pop pointer 0 / push this I / return`
    /// → `pop pointer 1; push that I`.
    Member(i32),
}

impl Accessor {
    fn inlined_body(&self) -> Vec<Command> {
        match self {
            Accessor::Constant(k) => vec![Command::Push(Segment::Constant, *k)],
            Accessor::Static(i) => vec![Command::Push(Segment::Static, *i)],
            Accessor::Member(i) => vec![
                Command::Pop(Segment::Pointer, 1),
                Command::Push(Segment::That, *i),
            ],
        }
    }
}

/// Classify `function`'s body against the three accessor shapes. Only the
/// three exact command sequences below qualify; anything else (extra
/// commands, different segments, different argument indices in the wrong
/// slot) is left as a real call.
fn classify(function: &Function) -> Option<Accessor> {
    match function.commands.as_slice() {
        [Command::Function { .. }, Command::Push(Segment::Constant, k), Command::Return] => {
            Some(Accessor::Constant(*k))
        }
        [Command::Function { .. }, Command::Push(Segment::Static, i), Command::Return] => {
            Some(Accessor::Static(*i))
        }
        [Command::Function { .. }, Command::Push(Segment::Argument, 0), Command::Pop(Segment::Pointer, 0), Command::Push(Segment::This, i), Command::Return] => {
            Some(Accessor::Member(*i))
        }
        _ => None,
    }
}

/// Rewrite every function in `reachable` in place, replacing calls to
/// recognized accessors with their inlined bodies.
pub fn run(program: &mut Program, reachable: &HashSet<String>) {
    let mut accessors = std::collections::HashMap::new();
    for name in reachable {
        if let Some(function) = program.functions.get(name) {
            if let Some(accessor) = classify(function) {
                accessors.insert(name.clone(), accessor);
            }
        }
    }
    if accessors.is_empty() {
        return;
    }

    for name in reachable {
        let Some(function) = program.functions.get(name) else { continue };
        let caller_filename = function.filename.clone();
        let caller_name = function.name.clone();
        let mut rewritten = Vec::with_capacity(function.commands.len());
        let mut changed = false;

        for command in &function.commands {
            let callee = match command {
                Command::Call { name, .. } => Some(name),
                Command::CallExt { name } => Some(name),
                _ => None,
            };
            match callee.and_then(|callee| accessors.get(callee)) {
                Some(accessor) => {
                    changed = true;
                    let callee_name = callee.unwrap().clone();
                    let callee_filename = program
                        .functions
                        .get(&callee_name)
                        .map(|f| f.filename.clone())
                        .unwrap_or_else(|| caller_filename.clone());
                    log::debug!("inlining `{}` into `{}`", callee_name, caller_name);
                    rewritten.push(Command::InlineCall {
                        filename: callee_filename,
                        function_name: callee_name.clone(),
                    });
                    rewritten.extend(accessor.inlined_body());
                    rewritten.push(Command::InlineReturn {
                        filename: caller_filename.clone(),
                        function_name: caller_name.clone(),
                    });
                }
                None => rewritten.push(command.clone()),
            }
        }

        if changed {
            if let Some(function) = program.functions.get_mut(name) {
                function.commands = rewritten;
                function.callees = function
                    .commands
                    .iter()
                    .filter_map(Command::callee)
                    .map(str::to_string)
                    .collect();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_lines;
    use crate::preassembler::Preassembler;

    fn program_from(src: &str) -> Program {
        let mut pre = Preassembler::new();
        pre.add_file("Foo", parse_lines(src).unwrap()).unwrap();
        pre.finish()
    }

    #[test]
    fn inlines_constant_accessor() {
        let mut program = program_from(
            "function Foo.k 0\npush constant 42\nreturn\n\
             function Sys.init 0\ncall Foo.k 0\nreturn\n",
        );
        let reachable: HashSet<_> =
            ["Sys.init".to_string(), "Foo.k".to_string()].into_iter().collect();
        run(&mut program, &reachable);
        let body = &program.functions["Sys.init"].commands;
        assert!(matches!(body[1], Command::InlineCall { .. }));
        assert_eq!(body[2], Command::Push(Segment::Constant, 42));
        assert!(matches!(body[3], Command::InlineReturn { .. }));
    }

    #[test]
    fn inlines_member_accessor() {
        let mut program = program_from(
            "function Foo.getX 1\npush argument 0\npop pointer 0\npush this 2\nreturn\n\
             function Sys.init 0\ncall Foo.getX 1\nreturn\n",
        );
        let reachable: HashSet<_> =
            ["Sys.init".to_string(), "Foo.getX".to_string()].into_iter().collect();
        run(&mut program, &reachable);
        let body = &program.functions["Sys.init"].commands;
        assert_eq!(body[2], Command::Pop(Segment::Pointer, 1));
        assert_eq!(body[3], Command::Push(Segment::That, 2));
    }

    #[test]
    fn leaves_non_accessors_alone() {
        let mut program = program_from(
            "function Foo.work 0\npush constant 1\npush constant 2\nadd\nreturn\n\
             function Sys.init 0\ncall Foo.work 0\nreturn\n",
        );
        let reachable: HashSet<_> =
            ["Sys.init".to_string(), "Foo.work".to_string()].into_iter().collect();
        run(&mut program, &reachable);
        let body = &program.functions["Sys.init"].commands;
        assert_eq!(body[1], Command::Call { name: "Foo.work".into(), nargs: 0 });
    }
}
