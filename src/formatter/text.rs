use std::io::Write;

use crate::diagnostic::Diagnostic;
use crate::formatter::{Formatter, summary_line};

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_to(&self, diagnostics: &[Diagnostic], file_count: usize, out: &mut dyn Write) {
        for d in diagnostics {
            let _ = writeln!(out, "{d}");
        }
        let _ = writeln!(out, "\n{}", summary_line(diagnostics, file_count));
    }
}
