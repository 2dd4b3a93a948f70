#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{collections::BTreeSet, fs, path::Path};

use anyhow::{Context, Result};
use glob::glob;
use tracing::{info, warn};
use typed_builder::TypedBuilder;

/// Reads a roster file, one student id per line.
///
/// Blank lines and lines starting with `#` are ignored, order is kept and
/// duplicates are not checked.
pub fn load_roster(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Could not read roster {}", path.display()))?;
    let roster = parse_roster(&text);
    info!("Loaded {} students from {}", roster.len(), path.display());
    Ok(roster)
}

/// Parses roster text, see [`load_roster`].
pub fn parse_roster(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, TypedBuilder)]
#[builder(doc)]
/// How student ids are cut out of submission file names.
///
/// The defaults match bulk downloads named
/// `<11 chars of assignment><id><32 chars of attempt and timestamp>.txt`.
pub struct ExtractOptions {
    /// File extension of submissions, without the dot.
    #[builder(default = "txt".to_string(), setter(into))]
    pub extension: String,
    /// Characters to drop from the start of the file name.
    #[builder(default = 11)]
    pub prefix:    usize,
    /// Characters to drop from the end of the file name, extension included.
    #[builder(default = 32)]
    pub suffix:    usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Cuts the student id out of a file name, `None` if nothing is left.
pub fn student_id_from_file_name(name: &str, options: &ExtractOptions) -> Option<String> {
    let chars: Vec<char> = name.chars().collect();
    let trimmed = options.prefix.checked_add(options.suffix)?;
    if chars.len() <= trimmed {
        return None;
    }
    Some(chars[options.prefix..chars.len() - options.suffix].iter().collect())
}

/// Collects the distinct student ids of all submissions in `dir`, sorted.
pub fn extract_roster(dir: &Path, options: &ExtractOptions) -> Result<Vec<String>> {
    let pattern = dir.join(format!("*.{}", options.extension));
    let pattern = pattern
        .to_str()
        .context("Could not convert submission directory to string")?
        .to_string();

    let mut ids = BTreeSet::new();
    for path in glob(&pattern).context("Could not create glob")?.filter_map(Result::ok) {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        match student_id_from_file_name(name, options) {
            Some(id) => {
                ids.insert(id);
            }
            None => warn!("Skipping `{name}`, too short to contain a student id"),
        }
    }

    info!("Found {} students in {}", ids.len(), dir.display());
    Ok(ids.into_iter().collect())
}
