//! Naming context the code generator carries across one translation run:
//! which file and function a `static`/label reference resolves against,
//! and the per-function counters that keep generated labels unique.

/// Mutable state threaded through code generation. `filename` and
/// `function_name` are swapped for the duration of an inlined accessor's
/// body (via `inline-call`/`inline-return`) so its `static` references and
/// any internal labels resolve against the callee's namespace, not the
/// caller's.
#[derive(Debug, Default)]
pub struct Emitter {
    pub filename: String,
    pub function_name: String,
    call_index: u32,
    label_index: u32,
}

impl Emitter {
    pub fn new() -> Self {
        Emitter::default()
    }

    /// Reset the per-function call-site counter. Called once per
    /// `function`/`function-ext` declaration — return-address labels are
    /// namespaced by `function_name` (`F$ret.N`), so resetting `call_index`
    /// per function cannot collide and keeps generated names shorter.
    ///
    /// `label_index` is deliberately NOT reset here: `next_address_label`
    /// namespaces by `filename`, not `function_name` (`File.Kind.M`), so two
    /// functions in the same file each lowering an un-fused comparison would
    /// mint the same `(File.JEQ.0)` label if this counter restarted per
    /// function. Kept monotonic across the whole file, matching the
    /// reference implementation's counter, which is never reset either.
    pub fn enter_function(&mut self, function_name: &str) {
        self.function_name = function_name.to_string();
        self.call_index = 0;
    }

    pub fn static_address(&self, i: i32) -> String {
        format!("@{}.{}", self.filename, i)
    }

    pub fn label_address(&self, label: &str) -> String {
        format!("@{}${}", self.function_name, label)
    }

    pub fn label_label(&self, label: &str) -> String {
        format!("({}${})", self.function_name, label)
    }

    pub fn function_call_address(name: &str) -> String {
        format!("@{}", name)
    }

    pub fn function_declaration_label(&self) -> String {
        format!("({})", self.function_name)
    }

    /// Allocate the next per-call-site return label, returning the
    /// `@label`/`(label)` pair ready to splice into the instruction stream.
    pub fn next_return_address_label(&mut self) -> (String, String) {
        let label = format!("{}$ret.{}", self.function_name, self.call_index);
        self.call_index += 1;
        (format!("@{}", label), format!("({})", label))
    }

    /// Allocate a scratch label of the given kind (`JEQ`, `JLT`, ...),
    /// namespaced by the current file so it can't collide across files.
    pub fn next_address_label(&mut self, kind: &str) -> (String, String) {
        let label = format!("{}.{}.{}", self.filename, kind, self.label_index);
        self.label_index += 1;
        (format!("@{}", label), format!("({})", label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_label_index_stays_monotonic_across_functions() {
        let mut e = Emitter::new();
        e.filename = "Foo".into();
        e.enter_function("Foo.a");
        let (_, first) = e.next_address_label("JEQ");
        e.enter_function("Foo.b");
        let (_, second) = e.next_address_label("JEQ");
        assert_eq!(first, "(Foo.JEQ.0)");
        assert_eq!(second, "(Foo.JEQ.1)");
    }
}
