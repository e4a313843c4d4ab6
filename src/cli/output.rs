//! Colored terminal output for release runs
//!
//! Provides consistent, colored CLI output with proper formatting

use std::io::Write;
use termcolor::{Buffer, BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

/// Output manager for consistent colored terminal output
#[derive(Debug)]
pub struct OutputManager {
    bufwtr: BufferWriter,
    quiet: bool,
}

impl Clone for OutputManager {
    fn clone(&self) -> Self {
        Self::new(self.quiet)
    }
}

impl Default for OutputManager {
    fn default() -> Self {
        Self::new(false)
    }
}

impl OutputManager {
    /// Create a new output manager
    pub fn new(quiet: bool) -> Self {
        Self {
            bufwtr: BufferWriter::stdout(ColorChoice::Auto),
            quiet,
        }
    }

    /// Output manager that prints nothing but errors
    pub fn quiet() -> Self {
        Self::new(true)
    }

    fn emit(&self, fill: impl FnOnce(&mut Buffer) -> std::io::Result<()>) {
        if self.quiet {
            return;
        }
        let mut buffer = self.bufwtr.buffer();
        if fill(&mut buffer).is_ok() {
            let _ = self.bufwtr.print(&buffer);
        }
    }

    fn marked(&self, mark: &str, mark_spec: &ColorSpec, text_spec: Option<&ColorSpec>, message: &str) {
        self.emit(|buffer| {
            buffer.set_color(mark_spec)?;
            write!(buffer, "{mark}")?;
            buffer.reset()?;
            if let Some(spec) = text_spec {
                buffer.set_color(spec)?;
            }
            writeln!(buffer, " {message}")?;
            buffer.reset()
        });
    }

    /// Print an info message (normal output)
    pub fn info(&self, message: &str) {
        self.marked("ℹ", ColorSpec::new().set_fg(Some(Color::Cyan)), None, message);
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        self.marked(
            "✓",
            ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true),
            None,
            message,
        );
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        let mut text = ColorSpec::new();
        text.set_fg(Some(Color::Yellow));
        self.marked(
            "⚠",
            ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true),
            Some(&text),
            message,
        );
    }

    /// Print an error message (always shown)
    pub fn error(&self, message: &str) {
        let bufwtr = BufferWriter::stderr(ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();

        // Try colored output to stderr
        if buffer.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true)).is_err()
            || write!(&mut buffer, "✗").is_err()
            || buffer.reset().is_err()
            || buffer.set_color(ColorSpec::new().set_fg(Some(Color::Red))).is_err()
            || writeln!(&mut buffer, " {}", message).is_err()
            || buffer.reset().is_err()
            || bufwtr.print(&buffer).is_err()
        {
            // Stderr failed - fallback to stdout as last resort
            println!("[STDERR ERROR] ✗ {}", message);
        }
    }

    /// Print a progress message for a step in flight
    pub fn progress(&self, message: &str) {
        self.marked("⋯", ColorSpec::new().set_fg(Some(Color::Magenta)), None, message);
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        self.emit(|buffer| {
            writeln!(buffer)?;
            buffer.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
            writeln!(buffer, "═══ {} ═══", title)?;
            buffer.reset()
        });
    }

    /// Print indented text (for sub-items)
    pub fn indent(&self, message: &str) {
        self.emit(|buffer| writeln!(buffer, "    {}", message));
    }

    /// Print a plain message (respects quiet mode)
    pub fn println(&self, message: &str) {
        self.emit(|buffer| writeln!(buffer, "{}", message));
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}
