//! # tick
//!
//! An interactive rubric checklist for grading written assignments. Tick the
//! choices that apply to each student, then export points and feedback to a
//! spreadsheet.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Grading run configuration
pub mod config;
/// Errors of the grading model
pub mod error;
/// Score and feedback reports, spreadsheet and terminal output
pub mod export;
/// Per-student selections and comments
pub mod ledger;
/// Roster files and roster extraction from submissions
pub mod roster;
/// Questions, points and choices
pub mod rubric;
/// Points and feedback derived from the ledger
pub mod score;
/// Cursor over the roster that flushes edits before moving
pub mod session;
/// Terminal front end
pub mod shell;
/// JSON persistence of the ledger
pub mod snapshot;

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use config::GraderConfig;
use export::Report;
use ledger::Ledger;
use rubric::RubricCatalog;
use shell::Shell;
use tracing::info;

/// Builds the rubric and a ledger for `roster`, restoring saved progress
/// when the snapshot file exists.
pub fn open(config: &GraderConfig, roster: Vec<String>) -> Result<(RubricCatalog, Ledger)> {
    let catalog = config.rubric()?;
    let mut ledger = Ledger::initialize(roster, &catalog).context("Could not start grading")?;
    snapshot::load_if_present(&mut ledger, config.state_path())?;
    Ok((catalog, ledger))
}

/// Saves the snapshot, then writes the spreadsheet.
pub fn finish(config: &GraderConfig, catalog: &RubricCatalog, ledger: &Ledger) -> Result<()> {
    snapshot::save(ledger, config.state_path())?;
    Report::build_with_header(catalog, ledger, config.id_header())?
        .write_csv(config.export_path())
}

/// Runs an interactive grading session over `input`/`output`, then saves
/// and exports.
pub fn grade<R: BufRead, W: Write>(
    config: &GraderConfig,
    roster: Vec<String>,
    input: R,
    output: W,
) -> Result<Ledger> {
    let (catalog, ledger) = open(config, roster)?;
    info!(
        "Grading {} students on {} questions",
        ledger.roster().len(),
        catalog.len()
    );

    let (ledger, outcome) = Shell::new(&catalog, ledger, input, output)?
        .with_state_path(config.state_path())
        .run();

    finish(config, &catalog, &ledger)?;
    outcome.context("Grading session ended with an error, progress was saved")?;
    Ok(ledger)
}

/// Builds the report from the saved snapshot without starting a session.
pub fn report(config: &GraderConfig, roster: Vec<String>) -> Result<Report> {
    let (catalog, ledger) = open(config, roster)?;
    Ok(Report::build_with_header(&catalog, &ledger, config.id_header())?)
}
