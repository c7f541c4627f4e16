use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use rayon::prelude::*;
use thiserror::Error;

use crate::cancel::{CancellationToken, Cancelled};
use crate::cli::Args;
use crate::config::{CopFilterSet, ResolvedConfig};
use crate::cop::registry::CopRegistry;
use crate::correction::{Correction, CorrectionSet};
use crate::diagnostic::Diagnostic;
use crate::fs::DiscoveredFiles;
use crate::parse::lexer::LexError;
use crate::parse::parse_source;
use crate::parse::source::SourceFile;

/// Thread-safe phase timing counters (nanoseconds) for profiling.
struct PhaseTimers {
    file_io_ns: AtomicU64,
    lex_ns: AtomicU64,
    cop_exec_ns: AtomicU64,
}

impl PhaseTimers {
    fn new() -> Self {
        Self {
            file_io_ns: AtomicU64::new(0),
            lex_ns: AtomicU64::new(0),
            cop_exec_ns: AtomicU64::new(0),
        }
    }

    fn add(counter: &AtomicU64, elapsed: Duration) {
        counter.fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    fn print_summary(&self, total: Duration, file_count: usize) {
        let file_io = Duration::from_nanos(self.file_io_ns.load(Ordering::Relaxed));
        let lex = Duration::from_nanos(self.lex_ns.load(Ordering::Relaxed));
        let cop_exec = Duration::from_nanos(self.cop_exec_ns.load(Ordering::Relaxed));
        let accounted = file_io + lex + cop_exec;

        eprintln!("debug: --- linter phase breakdown ({file_count} files) ---");
        eprintln!("debug:   file I/O:       {file_io:.0?} (cumulative across threads)");
        eprintln!("debug:   tokenize:       {lex:.0?}");
        eprintln!("debug:   cop execution:  {cop_exec:.0?}");
        eprintln!("debug:   accounted:      {accounted:.0?} (sum of per-thread time)");
        eprintln!("debug:   wall clock:     {total:.0?}");
    }
}

/// Why a document produced no diagnostics.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("{path}: not valid UTF-8")]
    InvalidUtf8 { path: String },
    #[error("{path}: {error}")]
    Lex { path: String, error: LexError },
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

pub struct LintResult {
    pub diagnostics: Vec<Diagnostic>,
    pub file_count: usize,
    pub corrected_count: usize,
}

/// Analyze one document with every cop that applies to its path.
///
/// Diagnostics come back in document order. A cancelled pass yields
/// `AnalyzeError::Cancelled` and nothing else, even if some cops finished.
pub fn analyze_document(
    source: &SourceFile,
    registry: &CopRegistry,
    filters: &CopFilterSet,
    corrections: Option<&mut Vec<Correction>>,
    cancel: &CancellationToken,
) -> Result<Vec<Diagnostic>, AnalyzeError> {
    analyze_timed(source, registry, filters, corrections, cancel, None)
}

fn analyze_timed(
    source: &SourceFile,
    registry: &CopRegistry,
    filters: &CopFilterSet,
    mut corrections: Option<&mut Vec<Correction>>,
    cancel: &CancellationToken,
    timers: Option<&PhaseTimers>,
) -> Result<Vec<Diagnostic>, AnalyzeError> {
    let path = source.path_str().to_string();
    cancel.check()?;

    let text = source
        .as_str()
        .map_err(|_| AnalyzeError::InvalidUtf8 { path: path.clone() })?;
    let lex_start = std::time::Instant::now();
    let tokens = parse_source(text).map_err(|error| AnalyzeError::Lex {
        path: path.clone(),
        error,
    })?;
    if let Some(t) = timers {
        PhaseTimers::add(&t.lex_ns, lex_start.elapsed());
    }

    let cop_start = std::time::Instant::now();
    let mut diagnostics = Vec::new();
    for (i, cop) in registry.cops().iter().enumerate() {
        if !filters.is_cop_match(i, &source.path) {
            continue;
        }
        let config = filters.cop_filter(i).config();
        let corr = if cop.supports_autocorrect() {
            corrections.as_deref_mut()
        } else {
            None
        };
        cop.check_tokens(source, &tokens, config, &mut diagnostics, corr, cancel)?;
    }
    if let Some(t) = timers {
        PhaseTimers::add(&t.cop_exec_ns, cop_start.elapsed());
    }

    // Stable: offenses at the same position keep their emission order.
    diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    Ok(diagnostics)
}

/// Lint a single SourceFile (already loaded into memory). Used for --stdin mode.
///
/// With autocorrect, every fixable offense is corrected in one pass and the
/// corrected text is returned alongside the diagnostics. The corrected text
/// is analyzed again so anything the fixes could not resolve is still
/// reported.
pub fn lint_source(
    source: &SourceFile,
    config: &ResolvedConfig,
    registry: &CopRegistry,
    args: &Args,
    cancel: &CancellationToken,
) -> Result<(LintResult, Option<String>)> {
    let filters = config.build_cop_filters(registry)?;

    if !args.autocorrect {
        let diagnostics = analyze_document(source, registry, &filters, None, cancel)?;
        let result = LintResult {
            diagnostics,
            file_count: 1,
            corrected_count: 0,
        };
        return Ok((result, None));
    }

    let mut corrections = Vec::new();
    let first_pass = analyze_document(source, registry, &filters, Some(&mut corrections), cancel)?;
    let set = CorrectionSet::from_vec(corrections).context("cannot autocorrect")?;
    let corrected_bytes = set.apply(source.as_bytes());
    let corrected_text =
        String::from_utf8(corrected_bytes).context("autocorrect produced invalid UTF-8")?;

    let rerun = SourceFile::from_string(source.path.clone(), corrected_text.clone());
    let remaining = analyze_document(&rerun, registry, &filters, None, cancel)?;
    if args.debug {
        eprintln!(
            "debug: autocorrect applied {} edits, {} offenses remain",
            set.len(),
            remaining.len()
        );
    }

    let mut diagnostics: Vec<Diagnostic> =
        first_pass.into_iter().filter(|d| d.corrected).collect();
    diagnostics.extend(remaining);
    diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    let corrected_count = diagnostics.iter().filter(|d| d.corrected).count();

    let result = LintResult {
        diagnostics,
        file_count: 1,
        corrected_count,
    };
    Ok((result, Some(corrected_text)))
}

/// Lint every discovered file in parallel.
///
/// Files that cannot be read, decoded or tokenized are reported on stderr
/// and skipped. With `--fail-fast` the first file with an offense cancels
/// every other pass; files still in flight at that moment report nothing.
pub fn run_linter(
    discovered: &DiscoveredFiles,
    config: &ResolvedConfig,
    registry: &CopRegistry,
    args: &Args,
) -> Result<LintResult> {
    let files = &discovered.files;
    let wall_start = std::time::Instant::now();

    // Build cop filters once before the parallel loop
    let filters = config.build_cop_filters(registry)?;
    let timers = args.debug.then(PhaseTimers::new);
    let cancel = CancellationToken::new();
    let skipped = AtomicUsize::new(0);

    let diagnostics: Vec<Diagnostic> = files
        .par_iter()
        .flat_map(|path| {
            if cancel.is_cancelled() {
                return Vec::new();
            }
            if filters.is_globally_excluded(path) && !is_explicit(discovered, path) {
                return Vec::new();
            }
            let result = lint_file(path, registry, &filters, &cancel, timers.as_ref());
            match result {
                Ok(diags) => {
                    if args.fail_fast && !diags.is_empty() {
                        cancel.cancel();
                    }
                    diags
                }
                Err(FileError::Cancelled) => Vec::new(),
                Err(FileError::Failed(e)) => {
                    eprintln!("error: {e:#}");
                    skipped.fetch_add(1, Ordering::Relaxed);
                    Vec::new()
                }
            }
        })
        .collect();

    let mut sorted = diagnostics;
    sorted.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    if let Some(ref t) = timers {
        t.print_summary(wall_start.elapsed(), files.len());
        let skipped = skipped.load(Ordering::Relaxed);
        if skipped > 0 {
            eprintln!("debug: {skipped} files skipped after errors");
        }
    }

    Ok(LintResult {
        diagnostics: sorted,
        file_count: files.len(),
        corrected_count: 0,
    })
}

enum FileError {
    Cancelled,
    Failed(anyhow::Error),
}

fn is_explicit(discovered: &DiscoveredFiles, path: &Path) -> bool {
    discovered.explicit.contains(path)
        || path
            .canonicalize()
            .ok()
            .is_some_and(|c| discovered.explicit.contains(&c))
}

fn lint_file(
    path: &Path,
    registry: &CopRegistry,
    filters: &CopFilterSet,
    cancel: &CancellationToken,
    timers: Option<&PhaseTimers>,
) -> Result<Vec<Diagnostic>, FileError> {
    let io_start = std::time::Instant::now();
    let source = SourceFile::from_path(path).map_err(FileError::Failed)?;
    if let Some(t) = timers {
        PhaseTimers::add(&t.file_io_ns, io_start.elapsed());
    }

    match analyze_timed(&source, registry, filters, None, cancel, timers) {
        Ok(diags) => Ok(diags),
        Err(AnalyzeError::Cancelled(_)) => Err(FileError::Cancelled),
        Err(e) => Err(FileError::Failed(e.into())),
    }
}
