use std::io::Write;

use crate::diagnostic::{Diagnostic, Severity};
use crate::formatter::Formatter;

/// GitHub Actions workflow commands, one annotation per offense.
pub struct GithubFormatter;

impl Formatter for GithubFormatter {
    fn format_to(&self, diagnostics: &[Diagnostic], _file_count: usize, out: &mut dyn Write) {
        for d in diagnostics {
            let level = match d.severity {
                Severity::Convention | Severity::Warning => "warning",
                Severity::Error | Severity::Fatal => "error",
            };
            let _ = writeln!(
                out,
                "::{level} file={},line={},col={}::{}: {}",
                d.path, d.location.line, d.location.column, d.cop_name, d.message,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Location;

    fn render(diagnostics: &[Diagnostic]) -> String {
        let mut buf = Vec::new();
        GithubFormatter.format_to(diagnostics, 0, &mut buf);
        String::from_utf8(buf).unwrap()
    }

    fn diag(path: &str, severity: Severity) -> Diagnostic {
        Diagnostic {
            path: path.to_string(),
            location: Location { line: 3, column: 5 },
            severity,
            cop_name: "CommaSpacing".to_string(),
            message: "Commas must be followed by a space.".to_string(),
            corrected: false,
        }
    }

    #[test]
    fn empty_produces_no_output() {
        assert_eq!(render(&[]), "");
    }

    #[test]
    fn warning_uses_warning_level() {
        assert_eq!(
            render(&[diag("Foo.cs", Severity::Warning)]),
            "::warning file=Foo.cs,line=3,col=5::CommaSpacing: Commas must be followed by a space.\n"
        );
    }

    #[test]
    fn error_uses_error_level() {
        assert!(render(&[diag("Foo.cs", Severity::Error)]).starts_with("::error "));
        assert!(render(&[diag("Foo.cs", Severity::Fatal)]).starts_with("::error "));
    }

    #[test]
    fn multiple_offenses() {
        let out = render(&[diag("A.cs", Severity::Convention), diag("B.cs", Severity::Error)]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("::warning file=A.cs"));
        assert!(lines[1].starts_with("::error file=B.cs"));
    }
}
