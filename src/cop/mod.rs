pub mod registry;
pub mod spacing;

use crate::cancel::{CancellationToken, Cancelled};
use crate::correction::Correction;
use crate::diagnostic::{Diagnostic, Location, Severity};
use crate::parse::source::SourceFile;
use crate::parse::token::TokenStream;

/// Per-cop configuration extracted from .commalint.yml.
#[derive(Debug, Clone)]
pub struct CopConfig {
    pub enabled: bool,
    pub exclude: Vec<String>,
    pub include: Vec<String>,
}

impl Default for CopConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            exclude: Vec::new(),
            include: Vec::new(),
        }
    }
}

/// A lint rule. Implementations must be Send + Sync so they can be shared
/// across rayon worker threads.
pub trait Cop: Send + Sync {
    /// The cop identifier reported with every diagnostic, e.g. "CommaSpacing".
    fn name(&self) -> &'static str;

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn supports_autocorrect(&self) -> bool {
        false
    }

    /// Build a diagnostic for this cop at a 1-indexed line and column.
    fn diagnostic(
        &self,
        source: &SourceFile,
        line: usize,
        column: usize,
        message: String,
    ) -> Diagnostic {
        Diagnostic {
            path: source.path_str().to_string(),
            location: Location { line, column },
            severity: self.default_severity(),
            cop_name: self.name().to_string(),
            message,
            corrected: false,
        }
    }

    /// Token-based check over one document.
    ///
    /// Must check `cancel` at least once per unit of work and return
    /// `Err(Cancelled)` without pushing anything once it fires. When
    /// `corrections` is `Some`, every fixable offense also pushes its edit and
    /// is marked `corrected`.
    #[allow(unused_variables)]
    fn check_tokens(
        &self,
        source: &SourceFile,
        tokens: &TokenStream,
        config: &CopConfig,
        diagnostics: &mut Vec<Diagnostic>,
        corrections: Option<&mut Vec<Correction>>,
        cancel: &CancellationToken,
    ) -> Result<(), Cancelled> {
        Ok(())
    }
}
