#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{fmt::Display, path::Path};

use anyhow::{Context, Result};
use tabled::{
    builder::Builder,
    settings::{Alignment, Modify, Panel, Style, Width, object::Rows},
};
use tracing::info;

use crate::{error::GradingResult, ledger::Ledger, rubric::RubricCatalog, score::ScoreCalculator};

/// Default header of the student id column.
pub const DEFAULT_ID_HEADER: &str = "StudentID";

#[derive(Debug, Clone, PartialEq)]
/// A single value in the report.
pub enum Cell {
    /// Student identifier.
    Id(String),
    /// Points for a question.
    Points(f64),
    /// Feedback text for a question, already prefixed with the question name.
    Feedback(String),
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Id(s) | Cell::Feedback(s) => f.write_str(s),
            Cell::Points(p) => write!(f, "{p}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// The computed grades of a roster, one row per student.
///
/// Columns are the student id, then for every question its points and its
/// feedback text.
pub struct Report {
    /// Column headers.
    header: Vec<String>,
    /// Rows in roster order.
    rows:   Vec<Vec<Cell>>,
    /// Total points per row.
    totals: Vec<f64>,
    /// Maximum points of the rubric.
    out_of: f64,
}

impl Report {
    /// Computes the report with the default id column header.
    pub fn build(catalog: &RubricCatalog, ledger: &Ledger) -> GradingResult<Self> {
        Self::build_with_header(catalog, ledger, DEFAULT_ID_HEADER)
    }

    /// Computes the report, naming the id column `id_header`.
    pub fn build_with_header(
        catalog: &RubricCatalog,
        ledger: &Ledger,
        id_header: &str,
    ) -> GradingResult<Self> {
        let calc = ScoreCalculator::new(catalog, ledger);

        let mut header = vec![id_header.to_string()];
        for q in catalog.question_names() {
            header.push(q.to_string());
            header.push(format!("{q} Feedback"));
        }

        let mut rows = Vec::with_capacity(ledger.roster().len());
        let mut totals = Vec::with_capacity(ledger.roster().len());
        for student in ledger.roster() {
            let mut row = vec![Cell::Id(student.clone())];
            let mut total = 0.0;
            for q in catalog.question_names() {
                let points = calc.points_for(student, q)?;
                total += points;
                row.push(Cell::Points(points));
                row.push(Cell::Feedback(format!("{q}:{}", calc.comment_for(student, q)?)));
            }
            rows.push(row);
            totals.push(total);
        }

        Ok(Self {
            header,
            rows,
            totals,
            out_of: catalog.max_points(),
        })
    }

    /// Column headers.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Data rows in roster order.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Writes the report as a CSV spreadsheet, replacing `path`.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Could not create spreadsheet {}", path.display()))?;

        writer
            .write_record(&self.header)
            .context("Could not write spreadsheet header")?;
        for row in &self.rows {
            writer
                .write_record(row.iter().map(ToString::to_string))
                .context("Could not write spreadsheet row")?;
        }
        writer
            .flush()
            .with_context(|| format!("Could not finish writing {}", path.display()))?;

        info!("Exported {} rows to {}", self.rows.len(), path.display());
        Ok(())
    }

    /// Renders the report as a table for the terminal.
    pub fn to_table(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(
            self.header
                .iter()
                .cloned()
                .chain(std::iter::once("Total".to_string())),
        );
        for (row, total) in self.rows.iter().zip(&self.totals) {
            builder.push_record(
                row.iter()
                    .map(ToString::to_string)
                    .chain(std::iter::once(format!("{total}/{}", self.out_of))),
            );
        }

        let class_total: f64 = self.totals.iter().sum();
        let average = if self.totals.is_empty() {
            0.0
        } else {
            class_total / self.totals.len() as f64
        };

        builder
            .build()
            .with(Panel::header("Grading Overview"))
            .with(Panel::footer(format!(
                "Students: {}, average: {average:.2}/{:.2}",
                self.rows.len(),
                self.out_of
            )))
            .with(Modify::new(Rows::new(1..)).with(Width::wrap(32).keep_words(true)))
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .with(Style::modern())
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_pairs_points_with_feedback() {
        let catalog = RubricCatalog::homework_one();
        let ledger = Ledger::initialize(["ab123"], &catalog).unwrap();

        let report = Report::build_with_header(&catalog, &ledger, "NetID").unwrap();

        assert_eq!(
            report.header(),
            ["NetID", "Q3(a)", "Q3(a) Feedback", "Q3(b)", "Q3(b) Feedback"]
        );
    }

    #[test]
    fn rows_follow_roster_order() {
        let catalog = RubricCatalog::homework_one();
        let mut ledger = Ledger::initialize(["zz9", "aa1", "mm5"], &catalog).unwrap();
        ledger.set_choice("aa1", "Q3(b)", 1, true).unwrap();
        ledger.set_comment("aa1", "Q3(b)", "check units").unwrap();

        let report = Report::build(&catalog, &ledger).unwrap();

        assert_eq!(report.rows().len(), 3);
        assert!(report.rows().iter().all(|r| r.len() == 1 + 2 * catalog.len()));
        assert_eq!(report.rows()[1][0], Cell::Id("aa1".into()));
        assert_eq!(report.rows()[1][3], Cell::Points(2.0));
        assert_eq!(
            report.rows()[1][4],
            Cell::Feedback("Q3(b):Partially correct (-1):check units".into())
        );
        assert_eq!(report.rows()[0][2], Cell::Feedback("Q3(a):".into()));
    }

    #[test]
    fn points_render_as_plain_numbers() {
        assert_eq!(Cell::Points(1.5).to_string(), "1.5");
        assert_eq!(Cell::Points(2.0).to_string(), "2");
        assert_eq!(Cell::Points(-0.5).to_string(), "-0.5");
    }
}
