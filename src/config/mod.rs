use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde_yml::Value;

use crate::cop::CopConfig;
use crate::cop::registry::CopRegistry;

pub const CONFIG_FILE_NAME: &str = ".commalint.yml";

/// Resolved configuration from .commalint.yml.
///
/// Reads a single YAML file and extracts per-cop Enabled/Exclude/Include and
/// AllCops.Exclude. Patterns are relative to the directory holding the file.
#[derive(Debug)]
pub struct ResolvedConfig {
    config_dir: Option<PathBuf>,
    /// Per-cop configs keyed by cop name (e.g. "CommaSpacing")
    cop_configs: HashMap<String, CopConfig>,
    global_excludes: Vec<String>,
}

impl ResolvedConfig {
    pub fn empty() -> Self {
        Self {
            config_dir: None,
            cop_configs: HashMap::new(),
            global_excludes: Vec::new(),
        }
    }
}

/// Load config from the given path, or search for `.commalint.yml` in
/// `target_dir` and its ancestors. Returns an empty config if none is found.
///
/// An explicit `path` that does not exist is an error.
pub fn load_config(path: Option<&Path>, target_dir: Option<&Path>) -> Result<ResolvedConfig> {
    let config_path = match path {
        Some(p) => {
            anyhow::ensure!(p.exists(), "config file not found: {}", p.display());
            p.to_path_buf()
        }
        None => match find_config(target_dir.unwrap_or(Path::new("."))) {
            Some(p) => p,
            None => return Ok(ResolvedConfig::empty()),
        },
    };

    let contents = std::fs::read_to_string(&config_path)
        .with_context(|| format!("failed to read config {}", config_path.display()))?;
    let mut config = parse_config(&contents)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    config.config_dir = config_path
        .parent()
        .map(|p| if p.as_os_str().is_empty() { Path::new(".") } else { p })
        .map(Path::to_path_buf);
    Ok(config)
}

fn find_config(start: &Path) -> Option<PathBuf> {
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

fn parse_config(contents: &str) -> Result<ResolvedConfig> {
    if contents.trim().is_empty() {
        return Ok(ResolvedConfig::empty());
    }
    let raw: Value = serde_yml::from_str(contents)?;

    let mut cop_configs = HashMap::new();
    let mut global_excludes = Vec::new();

    match &raw {
        Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };

                if key_str == "AllCops" {
                    if let Some(excludes) = extract_string_list(value, "Exclude") {
                        global_excludes = excludes;
                    }
                    continue;
                }

                // Cop names are capitalised identifiers (e.g. "CommaSpacing")
                if key_str.starts_with(|c: char| c.is_ascii_uppercase()) {
                    let cop_config = parse_cop_config(key_str, value);
                    cop_configs.insert(key_str.to_string(), cop_config);
                }
            }
        }
        Value::Null => {}
        _ => anyhow::bail!("top level must be a mapping"),
    }

    Ok(ResolvedConfig {
        config_dir: None,
        cop_configs,
        global_excludes,
    })
}

impl ResolvedConfig {
    /// Directory of the loaded config file, if any.
    pub fn config_dir(&self) -> Option<&Path> {
        self.config_dir.as_deref()
    }

    /// Check if a cop is enabled (before any path filtering).
    pub fn is_cop_enabled(&self, name: &str) -> bool {
        self.cop_configs.get(name).is_none_or(|c| c.enabled)
    }

    /// Get the resolved config for a specific cop.
    pub fn cop_config(&self, name: &str) -> CopConfig {
        self.cop_configs.get(name).cloned().unwrap_or_default()
    }

    /// Global exclude patterns from AllCops.Exclude.
    pub fn global_excludes(&self) -> &[String] {
        &self.global_excludes
    }

    /// Compile the glob patterns once for the whole run.
    pub fn build_cop_filters(&self, registry: &CopRegistry) -> Result<CopFilterSet> {
        let global_exclude = build_glob_set(&self.global_excludes)?;
        let filters = registry
            .cops()
            .iter()
            .map(|cop| {
                let config = self.cop_config(cop.name());
                Ok(CopFilter {
                    enabled: config.enabled,
                    include: if config.include.is_empty() {
                        None
                    } else {
                        Some(build_glob_set(&config.include)?)
                    },
                    exclude: build_glob_set(&config.exclude)?,
                    config,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(CopFilterSet {
            base_dir: self.config_dir.clone(),
            global_exclude,
            filters,
        })
    }
}

/// Compiled path filter for one registered cop.
#[derive(Debug)]
pub struct CopFilter {
    enabled: bool,
    include: Option<GlobSet>,
    exclude: GlobSet,
    config: CopConfig,
}

impl CopFilter {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn config(&self) -> &CopConfig {
        &self.config
    }
}

/// Compiled filters for every registered cop, indexed like `CopRegistry::cops()`.
#[derive(Debug)]
pub struct CopFilterSet {
    base_dir: Option<PathBuf>,
    global_exclude: GlobSet,
    filters: Vec<CopFilter>,
}

impl CopFilterSet {
    /// Path as written, plus the same path relative to the config directory.
    fn candidates<'a>(&self, path: &'a Path) -> Vec<Cow<'a, Path>> {
        let mut out = vec![Cow::Borrowed(path.strip_prefix("./").unwrap_or(path))];
        if let Some(base) = &self.base_dir {
            if let Ok(rel) = path.strip_prefix(base) {
                out.push(Cow::Borrowed(rel));
            } else if let (Ok(abs), Ok(base)) = (path.canonicalize(), base.canonicalize()) {
                if let Ok(rel) = abs.strip_prefix(&base) {
                    out.push(Cow::Owned(rel.to_path_buf()));
                }
            }
        }
        out
    }

    pub fn is_globally_excluded(&self, path: &Path) -> bool {
        !self.global_exclude.is_empty()
            && self
                .candidates(path)
                .iter()
                .any(|p| self.global_exclude.is_match(p))
    }

    pub fn cop_filter(&self, idx: usize) -> &CopFilter {
        &self.filters[idx]
    }

    /// Whether cop `idx` runs on `path`: enabled, matching Include (when
    /// given) and not matching Exclude.
    pub fn is_cop_match(&self, idx: usize, path: &Path) -> bool {
        let filter = &self.filters[idx];
        if !filter.enabled {
            return false;
        }
        let candidates = self.candidates(path);
        if let Some(include) = &filter.include {
            if !candidates.iter().any(|p| include.is_match(p)) {
                return false;
            }
        }
        !candidates.iter().any(|p| filter.exclude.is_match(p))
    }
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob =
            Glob::new(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?;
        builder.add(glob);
    }
    builder.build().context("failed to build glob set")
}

fn parse_cop_config(cop_name: &str, value: &Value) -> CopConfig {
    let mut config = CopConfig::default();

    if let Value::Mapping(map) = value {
        for (k, v) in map {
            let Some(key) = k.as_str() else {
                continue;
            };
            match key {
                "Enabled" => {
                    if let Some(b) = v.as_bool() {
                        config.enabled = b;
                    }
                }
                "Exclude" => {
                    if let Some(list) = value_to_string_list(v) {
                        config.exclude = list;
                    }
                }
                "Include" => {
                    if let Some(list) = value_to_string_list(v) {
                        config.include = list;
                    }
                }
                "Severity" => {
                    eprintln!("warning: {cop_name}: Severity is not configurable, ignoring");
                }
                other => {
                    eprintln!("warning: {cop_name}: unknown option {other}, ignoring");
                }
            }
        }
    }

    config
}

fn extract_string_list(value: &Value, key: &str) -> Option<Vec<String>> {
    value
        .as_mapping()?
        .get(Value::String(key.to_string()))
        .and_then(value_to_string_list)
}

fn value_to_string_list(value: &Value) -> Option<Vec<String>> {
    value.as_sequence().map(|seq| {
        seq.iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect()
    })
}
