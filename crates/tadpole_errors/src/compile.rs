use crate::{ReportableError, write_report};
use ariadne::{Color, Config, Label, Report as AReport, ReportKind};
use core::ops;
use std::io;
use tadpole_compiler::{CompileError, CompileErrorKind, ErrorLocation};

type Report<'err> = AReport<'err, (&'err str, ops::Range<usize>)>;

impl ReportableError for CompileError {
    fn report(&self, buffer: &mut String, path: &str, text: &str) -> io::Result<()> {
        let range = self.span.range();
        let specific = match self.kind {
            CompileErrorKind::Expected(_) | CompileErrorKind::ExpectedExpression => {
                match self.location {
                    ErrorLocation::At(ref lexeme) => format!("found `{lexeme}` instead"),
                    ErrorLocation::AtEnd => "found the end of the file instead".to_owned(),
                    ErrorLocation::Lexical => "found an invalid token instead".to_owned(),
                }
            }
            CompileErrorKind::InvalidAssignmentTarget => "can not assign here".to_owned(),
            CompileErrorKind::InvalidNumber => "not a valid number".to_owned(),
            CompileErrorKind::UnterminatedString => "string starts here".to_owned(),
            CompileErrorKind::UnexpectedCharacter => "not part of any token".to_owned(),
            CompileErrorKind::Redeclaration(_) => "declared again here".to_owned(),
            CompileErrorKind::SelfReferentialInitializer => "read here".to_owned(),
            CompileErrorKind::TooManyConstants
            | CompileErrorKind::TooManyLocals
            | CompileErrorKind::TooManyUpvalues
            | CompileErrorKind::TooManyParameters
            | CompileErrorKind::TooManyArguments => "limit exceeded here".to_owned(),
            CompileErrorKind::TopLevelReturn => "not inside a function".to_owned(),
            CompileErrorKind::Heap(_) => "while compiling this".to_owned(),
        };
        let report = format_compile_error(path, range, &self.kind.to_string(), &specific);
        write_report(&report, buffer, path, text)
    }
}

fn format_compile_error<'err>(
    path: &'err str,
    range: ops::Range<usize>,
    overall: &str,
    specific: &str,
) -> Report<'err> {
    Report::build(ReportKind::Error, (path, range.clone()))
        .with_message(overall)
        .with_config(Config::default().with_compact(true))
        .with_label(
            Label::new((path, range))
                .with_color(Color::Red)
                .with_message(specific),
        )
        .finish()
}
