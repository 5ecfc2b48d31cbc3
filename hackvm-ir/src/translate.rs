//! Top-level driver: discovers `.vm` source, runs it through the parser,
//! preassembler, optimizer, and code generator, and renders the result as
//! Hack assembly text.
//!
//! Two modes, selected by what `path` names:
//! - **Directory mode**: every `*.vm` file in the directory is translated
//!   together into one program named after the directory, reachability is
//!   filtered from `Sys.init`, and the VM-init prologue plus the shared
//!   `save_stack`/`pop_stack` routines are emitted first.
//! - **Single-file mode**: the one named file is translated alone, with no
//!   reachability filter and no VM-init prologue — every function it
//!   defines is reachable by definition. Used for unit-test fixtures that
//!   supply their own bootstrap.

use crate::codegen::{self, Emitter};
use crate::error::{CodegenError, TranslateError, TranslateResult};
use crate::ir::{Function, Program};
use crate::parser::parse_lines;
use crate::preassembler::Preassembler;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Translate `path`: a directory (directory mode) or a single `.vm` file
/// (single-file mode). Returns the complete `.asm` text.
pub fn translate(path: &Path) -> TranslateResult<String> {
    if path.is_dir() {
        translate_directory(path)
    } else {
        translate_file(path)
    }
}

pub fn translate_directory(dir: &Path) -> TranslateResult<String> {
    let mut vm_files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|source| TranslateError::Io { path: dir.to_path_buf(), source })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|ext| ext == "vm").unwrap_or(false))
        .collect();
    // Directory iteration order isn't guaranteed by the OS; sort so output
    // is byte-identical across runs and platforms (determinism).
    vm_files.sort();
    if vm_files.is_empty() {
        return Err(TranslateError::NoVmFiles(dir.to_path_buf()));
    }

    let program_name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "program".to_string());

    let mut pre = Preassembler::new();
    for vm_file in &vm_files {
        let stem = file_stem(vm_file);
        let source = fs::read_to_string(vm_file)
            .map_err(|source| TranslateError::Io { path: vm_file.clone(), source })?;
        let commands = parse_lines(&source)
            .map_err(|source| TranslateError::Parse { path: vm_file.clone(), source })?;
        pre.add_file(&stem, commands)?;
    }
    let mut program = pre.finish();
    let reachable = crate::optimizer::optimize(&mut program, "Sys.init")?;
    render(&program_name, &program, &reachable, true)
}

pub fn translate_file(path: &Path) -> TranslateResult<String> {
    let stem = file_stem(path);
    let source =
        fs::read_to_string(path).map_err(|source| TranslateError::Io { path: path.to_path_buf(), source })?;
    let commands = parse_lines(&source)
        .map_err(|source| TranslateError::Parse { path: path.to_path_buf(), source })?;

    let mut pre = Preassembler::new();
    pre.add_file(&stem, commands)?;
    let mut program = pre.finish();
    // No Sys.init root in single-file mode: every parsed function is
    // reachable by definition.
    let all = crate::optimizer::optimize_all(&mut program);
    render(&stem, &program, &all, false)
}

fn file_stem(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

fn render(
    program_name: &str,
    program: &Program,
    reachable: &HashSet<String>,
    init: bool,
) -> TranslateResult<String> {
    let mut out = String::new();
    out.push_str(&format!("// Program: {}\n", program_name));

    let mut emitter = Emitter::new();
    let mut global_line_count: u64 = 0;

    if init {
        write_lines(&mut out, &codegen::init_vm(&mut emitter), &mut global_line_count);
    }

    let mut names: Vec<&String> = reachable.iter().collect();
    names.sort();
    for name in names {
        let Some(function) = program.functions.get(name) else { continue };
        translate_function(&mut emitter, function, &mut out, &mut global_line_count)?;
    }
    Ok(out)
}

fn translate_function(
    emitter: &mut Emitter,
    function: &Function,
    out: &mut String,
    global_line_count: &mut u64,
) -> Result<(), CodegenError> {
    emitter.filename = function.filename.clone();
    emitter.function_name = function.name.clone();
    out.push_str(&format!("// Begin: {}\n", function.name));
    let mut line_count = 0u64;
    for command in &function.commands {
        out.push_str(&format!("// {}\n", command.symbolic()));
        let lines = codegen::lower(emitter, command)?;
        for line in &lines {
            out.push_str(line);
            if !line.starts_with('(') {
                out.push_str(&format!(" // {}", global_line_count));
                *global_line_count += 1;
                line_count += 1;
            }
            out.push('\n');
        }
    }
    out.push_str(&format!("// End: {} / {} lines\n", function.name, line_count));
    Ok(())
}

fn write_lines(out: &mut String, lines: &[String], global_line_count: &mut u64) {
    for line in lines {
        out.push_str(line);
        if !line.starts_with('(') {
            out.push_str(&format!(" // {}", global_line_count));
            *global_line_count += 1;
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_vm(dir: &std::path::Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn directory_mode_emits_init_and_drops_unreachable() {
        let dir = tempfile::tempdir().unwrap();
        write_vm(dir.path(), "Main.vm", "function Sys.init 0\ncall Foo.used 0\nreturn\n");
        write_vm(
            dir.path(),
            "Foo.vm",
            // Not a trivial-accessor shape (two pushes, not one), so it
            // survives the post-inline reachability recomputation and
            // stays in the output.
            "function Foo.used 0\npush constant 1\npush constant 2\nadd\nreturn\n\
             function Foo.unused 0\nreturn\n",
        );
        let asm = translate_directory(dir.path()).unwrap();
        assert!(asm.contains("@Sys.init"));
        assert!(asm.contains("(save_stack)"));
        assert!(asm.contains("(pop_stack)"));
        assert!(asm.contains("// Begin: Foo.used"));
        assert!(!asm.contains("// Begin: Foo.unused"));
    }

    #[test]
    fn single_file_mode_has_no_init_or_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Fixture.vm");
        write_vm(dir.path(), "Fixture.vm", "function Fixture.main 0\npush constant 7\nreturn\n");
        let asm = translate_file(&path).unwrap();
        assert!(!asm.contains("(save_stack)"));
        assert!(!asm.contains("@256"));
        assert!(asm.contains("// Begin: Fixture.main"));
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = translate_directory(dir.path()).unwrap_err();
        assert!(matches!(err, TranslateError::NoVmFiles(_)));
    }
}
