use std::io::Write;

use crate::diagnostic::Diagnostic;
use crate::formatter::{Formatter, summary_line};

/// Like `text`, but prints nothing at all for a clean run.
pub struct QuietFormatter;

impl Formatter for QuietFormatter {
    fn format_to(&self, diagnostics: &[Diagnostic], file_count: usize, out: &mut dyn Write) {
        if diagnostics.is_empty() {
            return;
        }
        for d in diagnostics {
            let _ = writeln!(out, "{d}");
        }
        let _ = writeln!(out, "\n{}", summary_line(diagnostics, file_count));
    }
}
