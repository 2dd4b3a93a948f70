#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Durable form of a [`Ledger`].
//!
//! The document keeps the shape older grading sessions wrote:
//!
//! ```json
//! {
//!   "choices":  { "<student>": { "<question>": { "0": false, "1": true } } },
//!   "comments": { "<student>": { "<question>": "free text" } }
//! }
//! ```
//!
//! Choice indices are integers here and only become strings inside the JSON.

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use crate::{
    error::{GradingError, GradingResult},
    ledger::Ledger,
};

/// A recorded choice flag.
///
/// Older snapshots stored checkbox states as `0`/`1`, so integers are accepted
/// on the way in. It is always written back as a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Flag(pub bool);

impl<'de> Deserialize<'de> for Flag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        /// Either encoding a flag may have on disk.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            /// `true` / `false`
            Bool(bool),
            /// `0` / `1`
            Int(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Bool(b) => Flag(b),
            Raw::Int(i) => Flag(i != 0),
        })
    }
}

/// Choice flags of one student, question name to choice index to flag.
pub type ChoiceFlags = BTreeMap<String, BTreeMap<usize, Flag>>;

/// Comments of every student, student to question to text.
pub type CommentTexts = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SnapshotDocument")]
/// The serialized ledger.
pub struct Snapshot {
    /// Choice flags per student.
    pub choices:  BTreeMap<String, ChoiceFlags>,
    /// Free-text comments per student and question.
    pub comments: CommentTexts,
}

/// A snapshot as read from disk, before the comment keys are reconciled.
#[derive(Deserialize)]
struct SnapshotDocument {
    /// Choice flags per student.
    choices:        BTreeMap<String, ChoiceFlags>,
    /// Comments under the current key.
    comments:       Option<CommentTexts>,
    /// Comments under the key older sessions wrote.
    extra_comments: Option<CommentTexts>,
}

impl TryFrom<SnapshotDocument> for Snapshot {
    type Error = String;

    /// `comments` wins when a document carries both keys.
    fn try_from(doc: SnapshotDocument) -> Result<Self, Self::Error> {
        let comments = doc
            .comments
            .or(doc.extra_comments)
            .ok_or("missing field `comments`")?;
        Ok(Self {
            choices: doc.choices,
            comments,
        })
    }
}

impl Snapshot {
    /// Records the current state of `ledger`.
    ///
    /// Every choice of every question is written, unselected ones as `false`.
    pub fn capture(ledger: &Ledger) -> Self {
        let mut snapshot = Self::default();

        for student in ledger.roster() {
            let Ok(entry) = ledger.entry(student) else {
                continue;
            };

            let mut flags = ChoiceFlags::new();
            let mut comments = BTreeMap::new();
            for (question, q) in entry {
                let count = ledger.choice_count(question).unwrap_or_default();
                flags.insert(
                    question.clone(),
                    (0..count).map(|i| (i, Flag(q.is_selected(i)))).collect(),
                );
                comments.insert(question.clone(), q.comment().to_string());
            }

            snapshot.choices.insert(student.clone(), flags);
            snapshot.comments.insert(student.clone(), comments);
        }
        snapshot
    }

    /// Overwrites the selections and comments of `ledger` with this snapshot.
    ///
    /// Either every entry is replaced or, on error, the ledger is left as it
    /// was. Students and questions the ledger does not know are skipped with a
    /// warning. Choice indices outside the rubric make the snapshot malformed.
    /// Roster students missing from the snapshot start blank.
    pub fn apply(&self, ledger: &mut Ledger) -> GradingResult<()> {
        let mut entries: std::collections::HashMap<_, _> = ledger
            .roster()
            .iter()
            .map(|s| (s.clone(), ledger.fresh_entry()))
            .collect();

        for (student, questions) in &self.choices {
            let Some(entry) = entries.get_mut(student) else {
                warn!("Skipping choices of `{student}`, who is not on the roster");
                continue;
            };
            for (question, flags) in questions {
                let Some(q) = entry.get_mut(question) else {
                    warn!("Skipping choices of `{student}` for unknown question `{question}`");
                    continue;
                };
                for (&index, flag) in flags {
                    ledger.check_choice(question, index).map_err(|e| {
                        GradingError::MalformedSnapshot(format!("`{student}`: {e}"))
                    })?;
                    if flag.0 {
                        q.selected.insert(index);
                    }
                }
            }
        }

        for (student, questions) in &self.comments {
            let Some(entry) = entries.get_mut(student) else {
                warn!("Skipping comments of `{student}`, who is not on the roster");
                continue;
            };
            for (question, text) in questions {
                match entry.get_mut(question) {
                    Some(q) => q.comment = text.clone(),
                    None => {
                        warn!("Skipping comment of `{student}` for unknown question `{question}`")
                    }
                }
            }
        }

        ledger.replace_all(entries);
        Ok(())
    }

    /// Parses a snapshot document.
    ///
    /// Anything but an object with both `choices` and `comments` (or the older
    /// `extra_comments`) is a [`GradingError::MalformedSnapshot`].
    pub fn from_json(text: &str) -> GradingResult<Self> {
        let malformed = |e: serde_json::Error| GradingError::MalformedSnapshot(e.to_string());

        let value: serde_json::Value = serde_json::from_str(text).map_err(malformed)?;
        if !value.is_object() {
            return Err(GradingError::MalformedSnapshot(
                "expected an object with `choices` and `comments`".into(),
            ));
        }
        serde_json::from_str(text).map_err(malformed)
    }

    /// Serializes the snapshot as pretty printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Could not serialize snapshot")
    }
}

/// Writes the state of `ledger` to `path`, replacing any previous file.
pub fn save(ledger: &Ledger, path: &Path) -> Result<()> {
    let json = Snapshot::capture(ledger).to_json()?;
    fs::write(path, json)
        .with_context(|| format!("Could not write snapshot to {}", path.display()))?;
    info!("Saved progress to {}", path.display());
    Ok(())
}

/// Loads the snapshot at `path` into `ledger`, all or nothing.
pub fn load(ledger: &mut Ledger, path: &Path) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Could not read snapshot {}", path.display()))?;
    Snapshot::from_json(&text)
        .and_then(|snapshot| snapshot.apply(ledger))
        .with_context(|| format!("Could not load snapshot {}", path.display()))?;
    info!("Loaded progress from {}", path.display());
    Ok(())
}

/// Loads `path` into `ledger` if the file exists, returns whether it did.
pub fn load_if_present(ledger: &mut Ledger, path: &Path) -> Result<bool> {
    if !path.exists() {
        info!("No snapshot at {}, starting fresh", path.display());
        return Ok(false);
    }
    load(ledger, path)?;
    Ok(true)
}
