#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use thiserror::Error;

/// Errors raised by the rubric, ledger and snapshot operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradingError {
    /// A question with this name is already part of the rubric.
    #[error("Question `{0}` is already part of the rubric.")]
    DuplicateName(String),
    /// The question is not part of the rubric.
    #[error("Question `{0}` is not part of the rubric.")]
    UnknownQuestion(String),
    /// The choice index does not exist for the question.
    #[error("Question `{question}` has no choice with index {index}.")]
    InvalidChoiceIndex {
        /// Question the index was used with.
        question: String,
        /// The offending index.
        index:    usize,
    },
    /// The student is not on the roster.
    #[error("Student `{0}` is not on the roster.")]
    UnknownStudent(String),
    /// A ledger cannot be created for an empty roster.
    #[error("The roster is empty, there is nobody to grade.")]
    EmptyRoster,
    /// The snapshot document does not have the expected shape.
    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),
}

/// Shorthand for results carrying a [`GradingError`].
pub type GradingResult<T> = Result<T, GradingError>;
