#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use itertools::Itertools;

use crate::{error::GradingResult, ledger::Ledger, rubric::RubricCatalog};

/// Separator between selected choice labels in feedback text.
pub const LABEL_SEPARATOR: &str = ",";

/// Separator between the choice labels and the free-text comment.
pub const COMMENT_SEPARATOR: &str = ":";

/// Derives points and feedback text from a rubric and a ledger.
///
/// All methods are pure reads, the same ledger state always yields the same
/// results.
#[derive(Clone, Copy)]
pub struct ScoreCalculator<'a> {
    /// Rubric that defines points and labels.
    catalog: &'a RubricCatalog,
    /// Recorded selections.
    ledger:  &'a Ledger,
}

impl<'a> ScoreCalculator<'a> {
    /// Creates a calculator over `catalog` and `ledger`.
    pub fn new(catalog: &'a RubricCatalog, ledger: &'a Ledger) -> Self {
        Self { catalog, ledger }
    }

    /// Base points plus the deltas of every selected choice.
    ///
    /// The result is not clamped, rubrics that allow going below zero or
    /// above the base points get exactly what they add up to.
    pub fn points_for(&self, student: &str, question: &str) -> GradingResult<f64> {
        let q = self.catalog.require(question)?;
        let entry = self.ledger.question_entry(student, question)?;

        Ok(entry
            .selected()
            .filter_map(|i| q.choice(i))
            .fold(q.points(), |acc, c| acc + c.points()))
    }

    /// Points for every question, in catalog order.
    pub fn points_for_student(&self, student: &str) -> GradingResult<Vec<(String, f64)>> {
        self.catalog
            .question_names()
            .map(|q| Ok((q.to_string(), self.points_for(student, q)?)))
            .collect()
    }

    /// Sum of the points over all questions.
    pub fn total_for(&self, student: &str) -> GradingResult<f64> {
        Ok(self
            .points_for_student(student)?
            .into_iter()
            .map(|(_, p)| p)
            .sum())
    }

    /// Feedback text for a question.
    ///
    /// Selected labels in choice order, joined by `,`. A non-empty free-text
    /// comment follows after a `:`, or stands alone when nothing is selected.
    pub fn comment_for(&self, student: &str, question: &str) -> GradingResult<String> {
        let q = self.catalog.require(question)?;
        let entry = self.ledger.question_entry(student, question)?;

        let labels = entry
            .selected()
            .filter_map(|i| q.choice(i))
            .map(|c| c.label())
            .join(LABEL_SEPARATOR);

        Ok(match (labels.is_empty(), entry.comment().is_empty()) {
            (_, true) => labels,
            (true, false) => entry.comment().to_string(),
            (false, false) => format!("{labels}{COMMENT_SEPARATOR}{}", entry.comment()),
        })
    }

    /// Feedback text for every question, in catalog order.
    pub fn comments_for_student(&self, student: &str) -> GradingResult<Vec<(String, String)>> {
        self.catalog
            .question_names()
            .map(|q| Ok((q.to_string(), self.comment_for(student, q)?)))
            .collect()
    }
}
