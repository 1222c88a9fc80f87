use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Difficulty {
    Regular,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "Regular",
            Self::Hard => "Hard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RaceType {
    HideTheLabel,
    OpenRace,
}

impl RaceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HideTheLabel => "Hide_The_Label",
            Self::OpenRace => "Open_Race",
        }
    }
}

/// Categorical keys shared by every observation extracted from one file,
/// normalized to their canonical representation before extraction starts.
#[derive(Debug, Clone)]
pub struct FileContext {
    pub hidden_fraction: String,
    pub difficulty: Difficulty,
    pub race_type: RaceType,
    pub batch_size: u32,
    pub dataset: String,
}

#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub relative_path: String,
    pub context: FileContext,
}

#[derive(Debug, Default)]
pub struct Discovery {
    pub files: Vec<DiscoveredFile>,
    pub skipped_files: usize,
    pub warnings: Vec<String>,
}

/// Walks the result tree
/// `<results_root>/<hiddenfrac dir>/<difficulty dir>/<race dir>/*.json`
/// and classifies every result file it finds. Directory entries are
/// visited in sorted order so downstream processing is deterministic.
pub struct ResultTreeWalker {
    hiddenfrac_dir: Regex,
    batch_token: Regex,
    hidden_percentage_token: Regex,
}

impl ResultTreeWalker {
    pub fn new() -> Result<Self> {
        Ok(Self {
            hiddenfrac_dir: Regex::new(r"hiddenfrac(\d+)")
                .context("failed to compile hidden fraction directory regex")?,
            batch_token: Regex::new(r"Batch(\d+)")
                .context("failed to compile batch size regex")?,
            hidden_percentage_token: Regex::new(r"Hidden_Percentage_([\d.]+)")
                .context("failed to compile hidden percentage regex")?,
        })
    }

    pub fn discover(
        &self,
        results_root: &Path,
        dataset_aliases: &[(String, String)],
    ) -> Result<Discovery> {
        let mut discovery = Discovery::default();

        for frac_dir in sorted_subdirectories(results_root)? {
            // hiddenfrac95 -> "0.95"; trees without the directory marker
            // fall back to the Hidden_Percentage filename token per file.
            let dir_fraction = self
                .hiddenfrac_dir
                .captures(&directory_name(&frac_dir))
                .and_then(|captures| captures.get(1))
                .and_then(|digits| digits.as_str().parse::<u32>().ok())
                .map(|percent| canonical_fraction(f64::from(percent) / 100.0));

            for difficulty_dir in sorted_subdirectories(&frac_dir)? {
                let difficulty_name = directory_name(&difficulty_dir);
                let difficulty = if difficulty_name.contains("Regular_Mode") {
                    Difficulty::Regular
                } else if difficulty_name.contains("Hard_Mode") {
                    Difficulty::Hard
                } else {
                    continue;
                };

                for race_dir in sorted_subdirectories(&difficulty_dir)? {
                    let race_type = match directory_name(&race_dir).as_str() {
                        "Hide_The_Label" => RaceType::HideTheLabel,
                        "Open_Race" => RaceType::OpenRace,
                        _ => continue,
                    };

                    for path in sorted_json_files(&race_dir)? {
                        let filename = path
                            .file_name()
                            .and_then(|name| name.to_str())
                            .unwrap_or_default()
                            .to_string();
                        let relative_path = path
                            .strip_prefix(results_root)
                            .map(|relative| relative.display().to_string())
                            .unwrap_or_else(|_| path.display().to_string());

                        match self.classify_file(
                            &filename,
                            dir_fraction.as_deref(),
                            difficulty,
                            race_type,
                            dataset_aliases,
                            &mut discovery.warnings,
                        ) {
                            Some(context) => discovery.files.push(DiscoveredFile {
                                path,
                                relative_path,
                                context,
                            }),
                            None => discovery.skipped_files += 1,
                        }
                    }
                }
            }
        }

        Ok(discovery)
    }

    fn classify_file(
        &self,
        filename: &str,
        dir_fraction: Option<&str>,
        difficulty: Difficulty,
        race_type: RaceType,
        dataset_aliases: &[(String, String)],
        warnings: &mut Vec<String>,
    ) -> Option<FileContext> {
        let Some(batch_size) = self
            .batch_token
            .captures(filename)
            .and_then(|captures| captures.get(1))
            .and_then(|digits| digits.as_str().parse::<u32>().ok())
        else {
            warn!(file = %filename, "missing Batch<N> token, skipping file");
            warnings.push(format!("missing batch size: {filename}"));
            return None;
        };

        let hidden_fraction = dir_fraction.map(ToOwned::to_owned).or_else(|| {
            self.hidden_percentage_token
                .captures(filename)
                .and_then(|captures| captures.get(1))
                .and_then(|token| token.as_str().parse::<f64>().ok())
                .map(canonical_fraction)
        });
        let Some(hidden_fraction) = hidden_fraction else {
            warn!(file = %filename, "missing hidden fraction, skipping file");
            warnings.push(format!("missing hidden fraction: {filename}"));
            return None;
        };

        let dataset = match canonical_dataset(filename, dataset_aliases) {
            Some(name) => name,
            None => {
                warn!(file = %filename, "no dataset alias matched, using unknown");
                warnings.push(format!("unmapped dataset prefix: {filename}"));
                "unknown".to_string()
            }
        };

        Some(FileContext {
            hidden_fraction,
            difficulty,
            race_type,
            batch_size,
            dataset,
        })
    }
}

/// Canonical decimal rendering for hidden fractions, fixed at context
/// construction so grouping never has to reconcile representations.
pub fn canonical_fraction(value: f64) -> String {
    format!("{value}")
}

/// Dataset names reach one logical dataset through several historical
/// filename prefixes; the mapping is configuration, not inference.
pub fn canonical_dataset(filename: &str, dataset_aliases: &[(String, String)]) -> Option<String> {
    dataset_aliases
        .iter()
        .find(|(prefix, _)| filename.starts_with(prefix.as_str()))
        .map(|(_, canonical)| canonical.clone())
}

fn sorted_subdirectories(path: &Path) -> Result<Vec<PathBuf>> {
    let mut directories = Vec::new();

    let entries =
        fs::read_dir(path).with_context(|| format!("failed to read {}", path.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", path.display()))?;
        if entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", entry.path().display()))?
            .is_dir()
        {
            directories.push(entry.path());
        }
    }

    directories.sort();
    Ok(directories)
}

fn sorted_json_files(path: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let entries =
        fs::read_dir(path).with_context(|| format!("failed to read {}", path.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", path.display()))?;
        let entry_path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", entry_path.display()))?
            .is_file()
        {
            continue;
        }

        let is_json = entry_path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| extension.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            files.push(entry_path);
        }
    }

    files.sort();
    Ok(files)
}

fn directory_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string()
}
