#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Panel, Style, object::Rows},
};

use crate::error::{GradingError, GradingResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A selectable deduction or annotation under a question.
pub struct Choice {
    /// Text shown to the grader and copied into the feedback.
    label:  String,
    /// Points added to the question when selected, usually zero or negative.
    points: f64,
}

impl Choice {
    /// Creates a new choice.
    pub fn new(label: impl Into<String>, points: f64) -> Self {
        Self {
            label: label.into(),
            points,
        }
    }

    /// Returns the label of this choice.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the point delta of this choice.
    pub fn points(&self) -> f64 {
        self.points
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A gradable question with its base points and ordered choices.
pub struct Question {
    /// Unique name of the question, eg. `Q3(a)`.
    name:    String,
    /// Points awarded when no choice is selected.
    points:  f64,
    /// Choices in index order.
    #[serde(default)]
    choices: Vec<Choice>,
}

impl Question {
    /// Returns the name of the question.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the base points of the question.
    pub fn points(&self) -> f64 {
        self.points
    }

    /// Returns the choices, indexed by position.
    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    /// Returns the choice at `index`, if any.
    pub fn choice(&self, index: usize) -> Option<&Choice> {
        self.choices.get(index)
    }
}

/// On-disk form of a rubric.
#[derive(Debug, Deserialize)]
struct RubricFile {
    /// Questions in display order.
    questions: Vec<Question>,
}

/// Row used when printing the rubric.
#[derive(Tabled)]
struct RubricRow {
    /// Question name.
    #[tabled(rename = "Question")]
    question: String,
    /// Base points, only on the first row of a question.
    #[tabled(rename = "Points")]
    points:   String,
    /// 1-based choice number as the shell shows it.
    #[tabled(rename = "#")]
    number:   String,
    /// Choice label.
    #[tabled(rename = "Choice")]
    label:    String,
    /// Point delta.
    #[tabled(rename = "Delta")]
    delta:    String,
}

#[derive(Debug, Clone, Default, PartialEq)]
/// The fixed set of questions being graded.
///
/// Insertion order is the display and export order. Choice indices are
/// assigned once and never change, they double as persistence keys.
pub struct RubricCatalog {
    /// Questions in insertion order.
    questions: Vec<Question>,
}

impl RubricCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a question worth `points`.
    pub fn add_question(&mut self, name: impl Into<String>, points: f64) -> GradingResult<()> {
        let name = name.into();
        if self.question(&name).is_some() {
            return Err(GradingError::DuplicateName(name));
        }
        self.questions.push(Question {
            name,
            points,
            choices: Vec::new(),
        });
        Ok(())
    }

    /// Appends a choice to `question` and returns its index.
    pub fn add_choice(
        &mut self,
        question: &str,
        label: impl Into<String>,
        points: f64,
    ) -> GradingResult<usize> {
        let q = self
            .questions
            .iter_mut()
            .find(|q| q.name == question)
            .ok_or_else(|| GradingError::UnknownQuestion(question.to_string()))?;
        q.choices.push(Choice::new(label, points));
        Ok(q.choices.len() - 1)
    }

    /// Looks up a question by name.
    pub fn question(&self, name: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.name == name)
    }

    /// Looks up a question by name, failing with `UnknownQuestion`.
    pub fn require(&self, name: &str) -> GradingResult<&Question> {
        self.question(name)
            .ok_or_else(|| GradingError::UnknownQuestion(name.to_string()))
    }

    /// Returns all questions in catalog order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Returns question names in catalog order.
    pub fn question_names(&self) -> impl Iterator<Item = &str> {
        self.questions.iter().map(|q| q.name.as_str())
    }

    /// Number of questions.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// True if no question was registered.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Sum of the base points of all questions.
    pub fn max_points(&self) -> f64 {
        self.questions.iter().map(|q| q.points).sum()
    }

    /// Parses a JSON rubric document.
    ///
    /// * `text`: `{"questions": [{"name", "points", "choices": [{"label", "points"}]}]}`
    pub fn from_json(text: &str) -> Result<Self> {
        let file: RubricFile =
            serde_json::from_str(text).context("Could not parse rubric document")?;

        let mut catalog = Self::new();
        for question in file.questions {
            catalog.add_question(question.name.clone(), question.points)?;
            for choice in question.choices {
                catalog.add_choice(&question.name, choice.label, choice.points)?;
            }
        }
        Ok(catalog)
    }

    /// Reads a JSON rubric document from `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Could not read rubric file {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("Invalid rubric file {}", path.display()))
    }

    /// The built-in rubric for homework 1, used when no rubric file is given.
    pub fn homework_one() -> Self {
        let mut catalog = Self::new();
        let questions: [(&str, f64, [(&str, f64); 3]); 2] = [
            ("Q3(a)", 2.0, [
                ("Correct", 0.0),
                ("Partially correct (-0.5)", -0.5),
                ("No answer (-2)", -2.0),
            ]),
            ("Q3(b)", 3.0, [
                ("Correct", 0.0),
                ("Partially correct (-1)", -1.0),
                ("No answer (-3)", -3.0),
            ]),
        ];

        for (name, points, choices) in questions {
            catalog.questions.push(Question {
                name: name.to_string(),
                points,
                choices: choices
                    .into_iter()
                    .map(|(label, delta)| Choice::new(label, delta))
                    .collect(),
            });
        }
        catalog
    }

    /// Renders the rubric as a table for the terminal.
    pub fn to_table(&self) -> String {
        let rows: Vec<RubricRow> = self
            .questions
            .iter()
            .flat_map(|q| {
                q.choices.iter().enumerate().map(move |(i, c)| RubricRow {
                    question: if i == 0 { q.name.clone() } else { String::new() },
                    points:   if i == 0 { format!("{}", q.points) } else { String::new() },
                    number:   (i + 1).to_string(),
                    label:    c.label.clone(),
                    delta:    format!("{:+}", c.points),
                })
            })
            .collect();

        Table::new(rows)
            .with(Panel::header("Rubric"))
            .with(Panel::footer(format!("Out of: {}", self.max_points())))
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .with(Style::modern())
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choices_get_monotonic_indices() {
        let mut catalog = RubricCatalog::new();
        catalog.add_question("Q1", 4.0).unwrap();

        assert_eq!(catalog.add_choice("Q1", "Correct", 0.0).unwrap(), 0);
        assert_eq!(catalog.add_choice("Q1", "Sign error", -1.0).unwrap(), 1);
        assert_eq!(catalog.add_choice("Q1", "No answer", -4.0).unwrap(), 2);
        assert_eq!(catalog.question("Q1").unwrap().choice(1).unwrap().label(), "Sign error");
    }

    #[test]
    fn duplicate_question_is_rejected() {
        let mut catalog = RubricCatalog::new();
        catalog.add_question("Q1", 1.0).unwrap();

        assert_eq!(
            catalog.add_question("Q1", 2.0),
            Err(GradingError::DuplicateName("Q1".into()))
        );
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn choice_for_unknown_question_is_rejected() {
        let mut catalog = RubricCatalog::new();

        assert_eq!(
            catalog.add_choice("Q9", "Correct", 0.0),
            Err(GradingError::UnknownQuestion("Q9".into()))
        );
    }

    #[test]
    fn insertion_order_is_kept() {
        let mut catalog = RubricCatalog::new();
        for name in ["Q2", "Q1", "Q10"] {
            catalog.add_question(name, 1.0).unwrap();
        }

        assert_eq!(catalog.question_names().collect::<Vec<_>>(), ["Q2", "Q1", "Q10"]);
    }

    #[test]
    fn rubric_document_goes_through_validation() {
        let text = r#"{"questions": [
            {"name": "Q1", "points": 2, "choices": [{"label": "Correct", "points": 0}]},
            {"name": "Q1", "points": 3}
        ]}"#;

        let err = RubricCatalog::from_json(text).unwrap_err();
        assert_eq!(
            err.downcast_ref::<GradingError>(),
            Some(&GradingError::DuplicateName("Q1".into()))
        );
    }

    #[test]
    fn homework_one_matches_handout() {
        let catalog = RubricCatalog::homework_one();

        assert_eq!(catalog.question_names().collect::<Vec<_>>(), ["Q3(a)", "Q3(b)"]);
        assert_eq!(catalog.max_points(), 5.0);
        assert_eq!(catalog.question("Q3(b)").unwrap().choice(2).unwrap().points(), -3.0);
    }
}
