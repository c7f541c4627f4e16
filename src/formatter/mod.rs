pub mod files;
pub mod github;
pub mod json;
pub mod quiet;
pub mod text;

use std::io::Write;

use crate::diagnostic::Diagnostic;

pub trait Formatter {
    fn format_to(&self, diagnostics: &[Diagnostic], file_count: usize, out: &mut dyn Write);

    fn print(&self, diagnostics: &[Diagnostic], file_count: usize) {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        self.format_to(diagnostics, file_count, &mut lock);
    }
}

pub fn create_formatter(format: &str) -> Box<dyn Formatter> {
    match format {
        "json" => Box::new(json::JsonFormatter),
        "github" => Box::new(github::GithubFormatter),
        "quiet" => Box::new(quiet::QuietFormatter),
        "files" => Box::new(files::FilesFormatter),
        // "text" and any unknown value
        _ => Box::new(text::TextFormatter),
    }
}

/// `"N files inspected, M offenses detected"`, plus the corrected count when
/// any offense was corrected.
pub(crate) fn summary_line(diagnostics: &[Diagnostic], file_count: usize) -> String {
    let offense_word = if diagnostics.len() == 1 {
        "offense"
    } else {
        "offenses"
    };
    let file_word = if file_count == 1 { "file" } else { "files" };
    let mut line = format!(
        "{file_count} {file_word} inspected, {} {offense_word} detected",
        diagnostics.len(),
    );
    let corrected = diagnostics.iter().filter(|d| d.corrected).count();
    if corrected > 0 {
        let word = if corrected == 1 { "offense" } else { "offenses" };
        line.push_str(&format!(", {corrected} {word} corrected"));
    }
    line
}
