#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use anyhow::Result;
use typed_builder::TypedBuilder;

use crate::{export::DEFAULT_ID_HEADER, rubric::RubricCatalog};

/// Default snapshot file.
pub const DEFAULT_STATE_PATH: &str = "feedback.json";

/// Default spreadsheet file.
pub const DEFAULT_EXPORT_PATH: &str = "feedback.csv";

/// Default roster file.
pub const DEFAULT_ROSTER_PATH: &str = "roster.txt";

/// Reads a path from the environment, falling back to `default`.
fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
        .into()
}

#[derive(Debug, Clone, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
#[builder(doc)]
/// File locations and presentation settings of a grading run.
pub struct GraderConfig {
    /// Snapshot file, read at startup and written at exit.
    #[builder(default = PathBuf::from(DEFAULT_STATE_PATH))]
    state_path:  PathBuf,
    /// Spreadsheet written at exit and by `tick export`.
    #[builder(default = PathBuf::from(DEFAULT_EXPORT_PATH))]
    export_path: PathBuf,
    /// Roster file, one student id per line.
    #[builder(default = PathBuf::from(DEFAULT_ROSTER_PATH))]
    roster_path: PathBuf,
    /// Rubric document, the built-in rubric is used when unset.
    #[builder(default, setter(strip_option))]
    rubric_path: Option<PathBuf>,
    /// Header of the student id column.
    #[builder(default = DEFAULT_ID_HEADER.to_string())]
    id_header:   String,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GraderConfig {
    /// Builds the configuration from `TICK_*` environment variables.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Self {
        let rubric_path = std::env::var("TICK_RUBRIC_PATH")
            .ok()
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let id_header =
            std::env::var("TICK_ID_HEADER").unwrap_or_else(|_| DEFAULT_ID_HEADER.to_string());

        Self {
            state_path: env_path("TICK_STATE_PATH", DEFAULT_STATE_PATH),
            export_path: env_path("TICK_EXPORT_PATH", DEFAULT_EXPORT_PATH),
            roster_path: env_path("TICK_ROSTER_PATH", DEFAULT_ROSTER_PATH),
            rubric_path,
            id_header,
        }
    }

    /// Snapshot file.
    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// Spreadsheet file.
    pub fn export_path(&self) -> &Path {
        &self.export_path
    }

    /// Roster file.
    pub fn roster_path(&self) -> &Path {
        &self.roster_path
    }

    /// Rubric document, if one is configured.
    pub fn rubric_path(&self) -> Option<&Path> {
        self.rubric_path.as_deref()
    }

    /// Header of the student id column.
    pub fn id_header(&self) -> &str {
        &self.id_header
    }

    /// Returns a copy with a different snapshot file.
    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = path.into();
        self
    }

    /// Returns a copy with a different spreadsheet file.
    pub fn with_export_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_path = path.into();
        self
    }

    /// Returns a copy with a different roster file.
    pub fn with_roster_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.roster_path = path.into();
        self
    }

    /// Returns a copy with a rubric document.
    pub fn with_rubric_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.rubric_path = Some(path.into());
        self
    }

    /// Returns a copy with a different id column header.
    pub fn with_id_header(mut self, header: impl Into<String>) -> Self {
        self.id_header = header.into();
        self
    }

    /// Loads the configured rubric, or the built-in one.
    pub fn rubric(&self) -> Result<RubricCatalog> {
        match &self.rubric_path {
            Some(path) => RubricCatalog::from_file(path),
            None => Ok(RubricCatalog::homework_one()),
        }
    }
}
