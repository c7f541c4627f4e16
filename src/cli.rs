use std::path::PathBuf;

use clap::Parser;

use crate::diagnostic::Severity;

#[derive(Parser, Debug)]
#[command(name = "commalint", version, about = "A fast comma spacing linter for C#")]
pub struct Args {
    /// Files or directories to lint
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text", value_parser = ["text", "json", "github", "quiet", "files"])]
    pub format: String,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// List all registered cop names, one per line, then exit
    #[arg(long)]
    pub list_cops: bool,

    /// Read source from stdin, use PATH for display and config matching
    #[arg(long, value_name = "PATH")]
    pub stdin: Option<PathBuf>,

    /// Minimum severity for a non-zero exit code (convention, warning, error, fatal, or C/W/E/F)
    #[arg(long, value_name = "SEVERITY", default_value = "convention")]
    pub fail_level: String,

    /// Stop after first file with offenses
    #[arg(short = 'F', long)]
    pub fail_fast: bool,

    /// Autocorrect offenses (with --stdin: print the corrected source after the report)
    #[arg(short = 'a', long = "autocorrect")]
    pub autocorrect: bool,
}

impl Args {
    /// Resolve `--fail-level` into a severity threshold.
    pub fn fail_level(&self) -> anyhow::Result<Severity> {
        Severity::from_str(&self.fail_level)
            .ok_or_else(|| anyhow::anyhow!("invalid --fail-level: {}", self.fail_level))
    }
}
