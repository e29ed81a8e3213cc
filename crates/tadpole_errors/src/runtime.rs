use crate::{ReportableError, line_range, write_report};
use ariadne::{Color, Config, Label, Report as AReport, ReportKind};
use core::ops;
use std::io;
use tadpole_vm::{RuntimeError, RuntimeErrorKind};

type Report<'err> = AReport<'err, (&'err str, ops::Range<usize>)>;

impl ReportableError for RuntimeError {
    fn report(&self, buffer: &mut String, path: &str, text: &str) -> io::Result<()> {
        let range = line_range(text, self.line);
        let specific = match self.kind {
            RuntimeErrorKind::UndefinedGlobal(_) => "variable has not been defined yet",
            RuntimeErrorKind::RedefinedGlobal(_) => "variable is already defined",
            RuntimeErrorKind::NonArithmeticOperand => "operand must be a number",
            RuntimeErrorKind::NonArithmeticOperands => "operands must both be numbers",
            RuntimeErrorKind::InvalidAddOperands => "operands must both be numbers or strings",
            RuntimeErrorKind::InvalidCallee => "this is not a function",
            RuntimeErrorKind::ArgumentCountOutOfRange { max, actual, .. } => {
                if actual > max {
                    "called with too many arguments"
                } else {
                    "called with too few arguments"
                }
            }
            RuntimeErrorKind::InvalidArgumentCount {
                expected, actual, ..
            } => {
                if actual > expected {
                    "called with too many arguments"
                } else {
                    "called with too few arguments"
                }
            }
            RuntimeErrorKind::TooManyArguments { .. } => "called with too many arguments",
            RuntimeErrorKind::StackOverflow => "one call too many",
            RuntimeErrorKind::Native { .. } => "native function failed here",
            RuntimeErrorKind::Decode(_)
            | RuntimeErrorKind::Heap(_)
            | RuntimeErrorKind::InvalidConstant
            | RuntimeErrorKind::InvalidLocal
            | RuntimeErrorKind::InvalidUpvalue
            | RuntimeErrorKind::InvalidOpenUpvalue
            | RuntimeErrorKind::EmptyStack
            | RuntimeErrorKind::EmptyCallStack => "the virtual machine failed here",
        };

        let mut report = Report::build(ReportKind::Error, (path, range.clone()))
            .with_message(self.kind.to_string())
            .with_config(Config::default().with_compact(true))
            .with_label(
                Label::new((path, range))
                    .with_color(Color::Red)
                    .with_message(specific)
                    .with_order(0),
            );
        for (order, entry) in (1_i32..).zip(self.trace.iter().skip(1)) {
            report = report.with_label(
                Label::new((path, line_range(text, entry.line)))
                    .with_color(Color::Yellow)
                    .with_message(format!("called from {}()", entry.name))
                    .with_order(order),
            );
        }

        write_report(&report.finish(), buffer, path, text)
    }
}

#[cfg(test)]
mod test {
    use crate::ReportableError as _;
    use tadpole_vm::io::BufferContext;
    use tadpole_vm::{InterpretError, Vm};

    #[test]
    fn reports_point_at_every_call() {
        let text = "fn inner() {\n  return nil + 1;\n}\ninner();\n";
        let mut vm = Vm::with_output(BufferContext::new());
        let Err(InterpretError::Runtime(error)) = vm.interpret_source(text) else {
            panic!("expected a runtime error");
        };
        let mut buffer = String::new();
        error.report(&mut buffer, "main.tp", text).unwrap();
        assert!(buffer.contains("operands must be two strings or two numerics"));
        assert!(buffer.contains("called from script()"));
    }
}
