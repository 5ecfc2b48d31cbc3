//! The fixed sequence of windowed rewrites applied, in order, to one
//! function's command stream. Each rule scans left to right with a window
//! of fixed width; on a match the window is replaced and scanning resumes
//! after the replacement, on a non-match the window's head is emitted and
//! the window slides forward by one.

use crate::ir::{Cmp, Command, Segment};

/// Slide a window of `width` commands across `commands`, replacing each
/// matched window per `try_match` and otherwise advancing by one. Mirrors
/// the reference implementation's generic `window_replace`: match consumes
/// the whole window and resumes scanning past it, non-match only consumes
/// (emits) the window's first element.
fn window_replace(
    commands: Vec<Command>,
    width: usize,
    try_match: impl Fn(&[Command]) -> Option<Vec<Command>>,
) -> Vec<Command> {
    let mut out = Vec::with_capacity(commands.len());
    let mut i = 0;
    while i + width <= commands.len() {
        match try_match(&commands[i..i + width]) {
            Some(replacement) => {
                out.extend(replacement);
                i += width;
            }
            None => {
                out.push(commands[i].clone());
                i += 1;
            }
        }
    }
    out.extend(commands[i..].iter().cloned());
    out
}

/// Run the full, ordered sequence of peephole rules once.
pub fn run(commands: Vec<Command>) -> Vec<Command> {
    let commands = rule_push_constant_not(commands);
    let commands = rule_push_constant_neg(commands);
    let commands = rule_push_constant_zero_add(commands);
    let commands = rule_push_constant_zero_not(commands);
    let commands = rule_lt_not(commands);
    let commands = rule_gt_not(commands);
    let commands = rule_fused_compare_branch(commands);
    let commands = rule_push_pop_to_ldd_sdd(commands);
    let commands = rule_push_inline_pop_to_ldd_sdd(commands);
    let commands = rule_pop_push_same_to_tee(commands);
    rule_if_goto_goto_label(commands)
}

fn rule_push_constant_not(commands: Vec<Command>) -> Vec<Command> {
    window_replace(commands, 2, |w| match w {
        [Command::Push(Segment::Constant, k), Command::Not] => {
            Some(vec![Command::Push(Segment::ConstantNot, *k)])
        }
        _ => None,
    })
}

fn rule_push_constant_neg(commands: Vec<Command>) -> Vec<Command> {
    window_replace(commands, 2, |w| match w {
        [Command::Push(Segment::Constant, k), Command::Neg] => {
            Some(vec![Command::Push(Segment::ConstantNeg, *k)])
        }
        _ => None,
    })
}

fn rule_push_constant_zero_add(commands: Vec<Command>) -> Vec<Command> {
    window_replace(commands, 2, |w| match w {
        [Command::Push(Segment::Constant, 0), Command::Add] => Some(vec![]),
        _ => None,
    })
}

fn rule_push_constant_zero_not(commands: Vec<Command>) -> Vec<Command> {
    window_replace(commands, 2, |w| match w {
        [Command::Push(Segment::Constant, 0), Command::Not] => {
            Some(vec![Command::Push(Segment::ConstantNot, 0)])
        }
        _ => None,
    })
}

fn rule_lt_not(commands: Vec<Command>) -> Vec<Command> {
    window_replace(commands, 2, |w| match w {
        [Command::Cmp(Cmp::Lt), Command::Not] => Some(vec![Command::Cmp(Cmp::Gte)]),
        _ => None,
    })
}

fn rule_gt_not(commands: Vec<Command>) -> Vec<Command> {
    window_replace(commands, 2, |w| match w {
        [Command::Cmp(Cmp::Gt), Command::Not] => Some(vec![Command::Cmp(Cmp::Lte)]),
        _ => None,
    })
}

fn rule_fused_compare_branch(commands: Vec<Command>) -> Vec<Command> {
    window_replace(commands, 3, |w| match w {
        [Command::Push(segment, i), Command::Cmp(cmp), Command::IfGoto(label)] => {
            Some(vec![Command::IfCmpGoto {
                cmp: *cmp,
                segment: segment.clone(),
                i: *i,
                label: label.clone(),
            }])
        }
        _ => None,
    })
}

fn rule_push_pop_to_ldd_sdd(commands: Vec<Command>) -> Vec<Command> {
    window_replace(commands, 2, |w| match w {
        [Command::Push(seg1, i1), Command::Pop(seg2, i2)] => Some(vec![
            Command::Ldd(seg1.clone(), *i1),
            Command::Sdd(seg2.clone(), *i2),
        ]),
        _ => None,
    })
}

fn rule_push_inline_pop_to_ldd_sdd(commands: Vec<Command>) -> Vec<Command> {
    window_replace(commands, 3, |w| match w {
        [Command::Push(seg1, i1), inline @ Command::InlineCall { .. }, Command::Pop(seg2, i2)] => {
            Some(vec![
                Command::Ldd(seg1.clone(), *i1),
                inline.clone(),
                Command::Sdd(seg2.clone(), *i2),
            ])
        }
        _ => None,
    })
}

/// `pop X; push X` (identical segment and index) duplicates the value it
/// just removed back onto the stack — equivalent to never having popped it,
/// except that `X` now also holds the value. Folds to `tee X`. Different
/// segments/indices are left alone: the reference implementation's exclude
/// predicate only fires the rewrite when both operands are equal.
fn rule_pop_push_same_to_tee(commands: Vec<Command>) -> Vec<Command> {
    window_replace(commands, 2, |w| match w {
        [Command::Pop(seg1, i1), Command::Push(seg2, i2)] if seg1 == seg2 && i1 == i2 => {
            Some(vec![Command::Tee(seg1.clone(), *i1)])
        }
        _ => None,
    })
}

/// `if-goto A; goto B; label A` inverts to `if-goto-not B`, falling through
/// to where `A` used to be. Only applies when the `if-goto` and the
/// trailing `label` share the same name (otherwise the `label` belongs to
/// some other branch and isn't a fall-through target here).
fn rule_if_goto_goto_label(commands: Vec<Command>) -> Vec<Command> {
    window_replace(commands, 3, |w| match w {
        [Command::IfGoto(a), Command::Goto(b), Command::Label(a2)] if a == a2 => {
            Some(vec![Command::IfGotoNot(b.clone())])
        }
        _ => None,
    })
}
