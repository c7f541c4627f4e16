pub mod cancel;
pub mod cli;
pub mod config;
pub mod cop;
pub mod correction;
pub mod diagnostic;
pub mod fix;
pub mod formatter;
pub mod fs;
pub mod linter;
pub mod parse;

#[cfg(test)]
pub mod testutil;

use std::io::Read;

use anyhow::{Context, Result};

use cancel::CancellationToken;
use cli::Args;
use config::load_config;
use cop::registry::CopRegistry;
use diagnostic::{Diagnostic, Severity};
use formatter::create_formatter;
use fs::discover_files;
use linter::{lint_source, run_linter};
use parse::source::SourceFile;

/// Separates the report from the corrected source in `--stdin -a` output.
const STDIN_SEPARATOR: &str = "====================";

/// Run the linter. Returns the exit code: 0 = clean, 1 = offenses found.
pub fn run(args: Args) -> Result<i32> {
    let target_dir = args.paths.first().map(|p| {
        if p.is_file() {
            p.parent().unwrap_or(p)
        } else {
            p.as_path()
        }
    });
    let config_start = std::time::Instant::now();
    let config = load_config(args.config.as_deref(), target_dir)?;
    let fail_level = args.fail_level()?;

    if args.debug {
        eprintln!("debug: config loading: {:.0?}", config_start.elapsed());
        if let Some(dir) = config.config_dir() {
            eprintln!("debug: config loaded from: {}", dir.display());
        } else {
            eprintln!("debug: no config file found");
        }
        eprintln!("debug: global excludes: {:?}", config.global_excludes());
    }

    let registry = CopRegistry::default_registry();

    // --list-cops: print all registered cop names and exit
    if args.list_cops {
        let mut names = registry.names();
        names.sort();
        for name in names {
            println!("{name}");
        }
        return Ok(0);
    }

    // --stdin: read from stdin and lint a single document
    if let Some(ref display_path) = args.stdin {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("failed to read stdin")?;
        let source = SourceFile::from_string(display_path.clone(), input);
        let (result, corrected) =
            lint_source(&source, &config, &registry, &args, &CancellationToken::new())?;
        let formatter = create_formatter(&args.format);
        formatter.print(&result.diagnostics, result.file_count);
        if let Some(text) = corrected {
            println!("{STDIN_SEPARATOR}");
            print!("{text}");
        }
        return Ok(exit_code(&result.diagnostics, fail_level));
    }

    if args.autocorrect {
        eprintln!("warning: --autocorrect only applies with --stdin; reporting offenses only");
    }

    let discovered = discover_files(&args.paths, &config)?;

    if args.debug {
        eprintln!("debug: {} files to lint", discovered.files.len());
        eprintln!("debug: {} cops registered", registry.len());
    }

    let result = run_linter(&discovered, &config, &registry, &args)?;
    let formatter = create_formatter(&args.format);
    formatter.print(&result.diagnostics, result.file_count);

    Ok(exit_code(&result.diagnostics, fail_level))
}

/// 1 when any uncorrected offense is at or above `fail_level`.
fn exit_code(diagnostics: &[Diagnostic], fail_level: Severity) -> i32 {
    let failing = diagnostics
        .iter()
        .any(|d| !d.corrected && d.severity >= fail_level);
    i32::from(failing)
}
