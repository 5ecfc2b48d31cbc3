//! Inter-procedural inlining followed by intra-procedural peephole rewriting,
//! run once per reachable function in two separate traversals.

mod inline;
mod peephole;

use crate::error::PreassemblyError;
use crate::ir::Program;
use std::collections::HashSet;

/// Run the inlining pass then the peephole pass over every function
/// transitively reachable from `root`, in place. Functions outside the
/// reachable set are left untouched (and untransformed) in the table.
///
/// Reachability is computed twice: once before inlining, to bound which
/// functions the inline pass even looks at, and once after, because
/// inlining a trivial accessor's only call sites can make that accessor
/// itself unreachable (SPEC_FULL §4.3.1: it "may drop out of the second
/// reachability computation if unreferenced"). The second computation,
/// not the first, is what gets peephole-optimized and emitted.
pub fn optimize(program: &mut Program, root: &str) -> Result<HashSet<String>, PreassemblyError> {
    let before_inline = program.reachable_from(root)?;
    inline::run(program, &before_inline);
    let reachable = program.reachable_from(root)?;
    for name in before_inline.difference(&reachable) {
        log::debug!("dropping `{}`: unreachable after inlining", name);
    }
    run_peephole(program, &reachable);
    Ok(reachable)
}

/// Single-file mode: no root, no reachability filter — every function the
/// file defines is in scope. Unlike [`optimize`], this never errors on an
/// unresolved callee (a single-file fixture may legitimately call a
/// function defined elsewhere that this translation unit never sees), and
/// there is no second reachability pass to recompute: every function parsed
/// from the file is in scope regardless of what inlining does to its
/// call sites.
pub fn optimize_all(program: &mut Program) -> HashSet<String> {
    let all: HashSet<String> = program.functions.keys().cloned().collect();
    inline::run(program, &all);
    run_peephole(program, &all);
    all
}

fn run_peephole(program: &mut Program, scope: &HashSet<String>) {
    for name in scope {
        if let Some(function) = program.functions.get_mut(name) {
            function.commands = peephole::run(std::mem::take(&mut function.commands));
        }
    }
}
