use core::fmt;

/// Where the language's output goes.
pub trait IoContext: fmt::Write {}

/// Writes to standard output.
#[derive(Debug, Default)]
pub struct StdoutContext;

impl fmt::Write for StdoutContext {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        print!("{s}");
        Ok(())
    }
}

impl IoContext for StdoutContext {}

/// Collects output in memory.
#[derive(Debug, Default)]
pub struct BufferContext {
    data: String,
}

impl fmt::Write for BufferContext {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.data.push_str(s);
        Ok(())
    }
}

impl IoContext for BufferContext {}

impl BufferContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: String::new(),
        }
    }

    /// The output so far.
    #[must_use]
    pub fn contents(&self) -> &str {
        &self.data
    }

    /// Take the output, leaving the buffer empty.
    pub fn take(&mut self) -> String {
        core::mem::take(&mut self.data)
    }

    #[must_use]
    pub fn flush(self) -> String {
        self.data
    }
}
