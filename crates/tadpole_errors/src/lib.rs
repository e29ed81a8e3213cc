//! Pretty diagnostics for compile and runtime errors.

mod compile;
mod runtime;

use core::ops;
use std::io;

/// Interface to display pretty errors.
pub trait ReportableError {
    /// Write pretty error to buffer.
    ///
    /// # Errors
    /// Fails if the report can not be rendered.
    fn report(&self, buffer: &mut String, path: &str, text: &str) -> io::Result<()>;
}

impl<T: ReportableError> ReportableError for [T] {
    fn report(&self, buffer: &mut String, path: &str, text: &str) -> io::Result<()> {
        for error in self {
            error.report(buffer, path, text)?;
        }
        Ok(())
    }
}

/// Render an ariadne report into the buffer.
fn write_report(
    report: &ariadne::Report<'_, (&str, ops::Range<usize>)>,
    buffer: &mut String,
    path: &str,
    text: &str,
) -> io::Result<()> {
    let mut output = io::Cursor::new(Vec::new());
    report.write((path, ariadne::Source::from(text)), &mut output)?;
    buffer.push_str(&String::from_utf8_lossy(&output.into_inner()));
    Ok(())
}

/// The byte range of a 1-based line, without its line break.
fn line_range(text: &str, line: u32) -> ops::Range<usize> {
    let Some(index) = usize::try_from(line).ok().and_then(|line| line.checked_sub(1)) else {
        return text.len()..text.len();
    };
    let mut start = 0;
    for (current, content) in text.split_inclusive('\n').enumerate() {
        if current == index {
            let trimmed = content.trim_end_matches(['\n', '\r']);
            return start..start + trimmed.len();
        }
        start += content.len();
    }
    text.len()..text.len()
}

#[cfg(test)]
mod test {
    use super::line_range;

    #[test]
    fn lines_map_to_byte_ranges() {
        let text = "let a = 1;\r\nlet b;\n\nprint(a);";
        assert_eq!(line_range(text, 1), 0..10);
        assert_eq!(line_range(text, 2), 12..18);
        assert_eq!(line_range(text, 3), 19..19);
        assert_eq!(line_range(text, 4), 20..29);
        assert_eq!(line_range(text, 5), 29..29);
        assert_eq!(line_range(text, 0), 29..29);
    }
}
