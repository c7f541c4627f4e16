use std::io::Write;

use serde::Serialize;

use crate::diagnostic::Diagnostic;
use crate::formatter::Formatter;

pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonOutput<'a> {
    metadata: Metadata,
    offenses: Vec<Offense<'a>>,
}

#[derive(Serialize)]
struct Metadata {
    files_inspected: usize,
    offense_count: usize,
    corrected_count: usize,
}

#[derive(Serialize)]
struct Offense<'a> {
    path: &'a str,
    line: usize,
    column: usize,
    severity: String,
    cop_name: &'a str,
    message: &'a str,
    corrected: bool,
}

impl Formatter for JsonFormatter {
    fn format_to(&self, diagnostics: &[Diagnostic], file_count: usize, out: &mut dyn Write) {
        let corrected_count = diagnostics.iter().filter(|d| d.corrected).count();

        let output = JsonOutput {
            metadata: Metadata {
                files_inspected: file_count,
                offense_count: diagnostics.len(),
                corrected_count,
            },
            offenses: diagnostics
                .iter()
                .map(|d| Offense {
                    path: &d.path,
                    line: d.location.line,
                    column: d.location.column,
                    severity: d.severity.letter().to_string(),
                    cop_name: &d.cop_name,
                    message: &d.message,
                    corrected: d.corrected,
                })
                .collect(),
        };
        match serde_json::to_string_pretty(&output) {
            Ok(json) => {
                let _ = writeln!(out, "{json}");
            }
            Err(e) => eprintln!("error: failed to serialize JSON output: {e}"),
        }
    }
}
