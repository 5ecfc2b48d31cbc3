//! Whole-program fixtures exercising the pipeline end to end: parse →
//! preassemble → optimize → lower. Each test writes one or more `.vm`
//! files to a temp directory and asserts on the emitted assembly text.

use std::fs;

fn write_vm(dir: &std::path::Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn push_constant_zero_add_is_folded_away() {
    let dir = tempfile::tempdir().unwrap();
    write_vm(
        dir.path(),
        "Fixture.vm",
        "function Fixture.main 0\npush constant 0\nadd\nreturn\n",
    );
    let asm = hackvm_ir::translate_file(&dir.path().join("Fixture.vm")).unwrap();
    assert!(!asm.contains("M=D+M"));
    assert!(!asm.contains("push constant 0"));
    assert!(!asm.contains("\nadd\n"));
}

#[test]
fn push_constant_not_folds_to_constant_not_pseudo_segment() {
    let dir = tempfile::tempdir().unwrap();
    write_vm(
        dir.path(),
        "Fixture.vm",
        "function Fixture.main 0\npush constant 5\nnot\nreturn\n",
    );
    let asm = hackvm_ir::translate_file(&dir.path().join("Fixture.vm")).unwrap();
    assert!(asm.contains("@5"));
    assert!(asm.contains("D=!A"));
    assert!(!asm.contains("// not\n"));
}

#[test]
fn compare_and_branch_fuses_without_materializing_a_boolean() {
    let dir = tempfile::tempdir().unwrap();
    write_vm(
        dir.path(),
        "Fixture.vm",
        "function Fixture.loop 0\npush constant 0\neq\nif-goto LOOP_END\nlabel LOOP_END\nreturn\n",
    );
    let asm = hackvm_ir::translate_file(&dir.path().join("Fixture.vm")).unwrap();
    assert!(asm.contains("Fixture.loop$LOOP_END"));
    assert!(!asm.contains("M=!D"));
}

#[test]
fn member_accessor_call_is_inlined() {
    let dir = tempfile::tempdir().unwrap();
    write_vm(
        dir.path(),
        "Fixture.vm",
        "function Foo.getX 1\n\
         push argument 0\n\
         pop pointer 0\n\
         push this 3\n\
         return\n\
         function Fixture.main 1\n\
         push argument 0\n\
         call Foo.getX 1\n\
         return\n",
    );
    let asm = hackvm_ir::translate_file(&dir.path().join("Fixture.vm")).unwrap();
    assert!(!asm.contains("call Foo.getX"));
    assert!(asm.contains("pop pointer 1"));
    assert!(asm.contains("push that 3"));
}

#[test]
fn unreachable_function_is_dropped_from_directory_output() {
    let dir = tempfile::tempdir().unwrap();
    write_vm(dir.path(), "Main.vm", "function Sys.init 0\ncall Foo.used 0\nreturn\n");
    write_vm(
        dir.path(),
        "Foo.vm",
        // Not a trivial-accessor shape, so `Foo.used` survives the
        // post-inline reachability recomputation and is still emitted.
        "function Foo.used 0\npush constant 1\npush constant 2\nadd\nreturn\n\
         function Foo.unused 0\npush constant 2\nreturn\n",
    );
    let asm = hackvm_ir::translate_directory(dir.path()).unwrap();
    assert!(asm.contains("// Begin: Foo.used"));
    assert!(!asm.contains("(Foo.unused)"));
    assert_eq!(asm.matches("(save_stack)").count(), 1);
    assert_eq!(asm.matches("(pop_stack)").count(), 1);
}

#[test]
fn trivial_accessor_is_dropped_once_its_only_call_site_is_inlined() {
    let dir = tempfile::tempdir().unwrap();
    write_vm(dir.path(), "Main.vm", "function Sys.init 0\ncall Foo.k 0\nreturn\n");
    write_vm(dir.path(), "Foo.vm", "function Foo.k 0\npush constant 42\nreturn\n");
    let asm = hackvm_ir::translate_directory(dir.path()).unwrap();
    // Sys.init's only call site is inlined, so Foo.k has no remaining
    // callers and must not survive the post-inline reachability pass.
    assert!(!asm.contains("call Foo.k"));
    assert!(!asm.contains("(Foo.k)"));
    assert!(!asm.contains("// Begin: Foo.k"));
    assert!(asm.contains("@42"));
}

#[test]
fn bare_comparisons_in_different_functions_get_distinct_labels() {
    let dir = tempfile::tempdir().unwrap();
    write_vm(
        dir.path(),
        "Main.vm",
        "function Sys.init 0\ncall Foo.a 0\ncall Foo.b 0\nreturn\n",
    );
    write_vm(
        dir.path(),
        "Foo.vm",
        // Two pushes before `eq` (not a single `push X; CMP; if-goto L`
        // window), so neither comparison fuses away: both lower through
        // `next_address_label`, which is namespaced by file, not function.
        "function Foo.a 1\n\
         push local 0\npush local 1\neq\npop local 0\nreturn\n\
         function Foo.b 1\n\
         push local 0\npush local 1\neq\npop local 0\nreturn\n",
    );
    let asm = hackvm_ir::translate_directory(dir.path()).unwrap();
    assert!(asm.contains("(Foo.JEQ.0)"));
    assert!(asm.contains("(Foo.JEQ.1)"));
    let all_labels: Vec<&str> = asm
        .lines()
        .filter(|l| l.starts_with('(') && l.ends_with(')'))
        .collect();
    let mut unique = all_labels.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(all_labels.len(), unique.len(), "duplicate label in: {:?}", all_labels);
}

#[test]
fn directory_mode_bootstraps_sp_and_jumps_to_sys_init() {
    let dir = tempfile::tempdir().unwrap();
    write_vm(dir.path(), "Main.vm", "function Sys.init 0\nreturn\n");
    let asm = hackvm_ir::translate_directory(dir.path()).unwrap();
    let bootstrap_idx = asm.find("@256").expect("missing SP bootstrap");
    let jump_idx = asm.find("@Sys.init").expect("missing jump to Sys.init");
    assert!(bootstrap_idx < jump_idx);
}

#[test]
fn single_file_mode_skips_bootstrap_and_reachability_filter() {
    let dir = tempfile::tempdir().unwrap();
    write_vm(
        dir.path(),
        "Fixture.vm",
        "function Fixture.unreferenced 0\npush constant 9\nreturn\n",
    );
    let asm = hackvm_ir::translate_file(&dir.path().join("Fixture.vm")).unwrap();
    assert!(!asm.contains("@256"));
    assert!(asm.contains("// Begin: Fixture.unreferenced"));
}

#[test]
fn translation_is_deterministic_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    write_vm(
        dir.path(),
        "Main.vm",
        "function Sys.init 2\npush constant 3\npush constant 4\ncall Math.add 2\nreturn\n",
    );
    write_vm(
        dir.path(),
        "Math.vm",
        "function Math.add 0\npush argument 0\npush argument 1\nadd\nreturn\n",
    );
    let first = hackvm_ir::translate_directory(dir.path()).unwrap();
    let second = hackvm_ir::translate_directory(dir.path()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn call_ext_to_function_ext_wires_r15_through_save_stack() {
    let dir = tempfile::tempdir().unwrap();
    write_vm(
        dir.path(),
        "Main.vm",
        "function Sys.init 0\ncall-ext Foo.greet\nreturn\n",
    );
    write_vm(dir.path(), "Foo.vm", "function-ext Foo.greet 0 0\npush constant 1\nreturn\n");
    let asm = hackvm_ir::translate_directory(dir.path()).unwrap();
    assert!(asm.contains("(Foo.greet)"));
    assert!(asm.contains("(Foo.resume.0)"));
    // function-ext's own prologue must set R15 before handing off to
    // save_stack, or save_stack's final jump lands wherever R15 was last
    // left pointing instead of back into this prologue.
    let prologue_start = asm.find("(Foo.greet)\n").unwrap();
    let save_stack_jump = asm[prologue_start..].find("@save_stack").unwrap() + prologue_start;
    let r15_store = asm[prologue_start..save_stack_jump].find("@R15").unwrap();
    assert!(r15_store > 0);
}

#[test]
fn unresolved_callee_is_a_fatal_error() {
    let dir = tempfile::tempdir().unwrap();
    write_vm(dir.path(), "Main.vm", "function Sys.init 0\ncall Nowhere.ghost 0\nreturn\n");
    let err = hackvm_ir::translate_directory(dir.path()).unwrap_err();
    assert!(matches!(err, hackvm_ir::TranslateError::Preassembly(_)));
}
