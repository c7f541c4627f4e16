use std::collections::BTreeSet;
use std::io::Write;

use crate::diagnostic::Diagnostic;
use crate::formatter::Formatter;

pub struct FilesFormatter;

impl Formatter for FilesFormatter {
    fn format_to(&self, diagnostics: &[Diagnostic], _file_count: usize, out: &mut dyn Write) {
        // Deduplicate and sort file paths
        let paths: BTreeSet<&str> = diagnostics.iter().map(|d| d.path.as_str()).collect();
        for path in paths {
            let _ = writeln!(out, "{path}");
        }
    }
}
