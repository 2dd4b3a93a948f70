#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use tracing::debug;

use crate::{
    error::{GradingError, GradingResult},
    ledger::{Ledger, StudentEntry},
};

/// Direction of a navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Towards the start of the roster.
    Prev,
    /// Towards the end of the roster.
    Next,
}

#[derive(Debug, Clone, PartialEq)]
/// The position of the grader in the roster and the edits not yet written to
/// the ledger.
///
/// Every navigation writes the draft back before moving, so nothing typed for
/// a student is lost by switching to another one.
pub struct GradingSession {
    /// Index of the displayed student in the roster.
    cursor: usize,
    /// Working copy of the displayed student's entry.
    draft:  StudentEntry,
}

impl GradingSession {
    /// Starts at the first student of the roster.
    pub fn start(ledger: &Ledger) -> GradingResult<Self> {
        Self::at(ledger, 0)
    }

    /// Starts at roster position `cursor`.
    pub fn at(ledger: &Ledger, cursor: usize) -> GradingResult<Self> {
        let student = match ledger.roster().get(cursor) {
            Some(student) => student,
            None if ledger.roster().is_empty() => return Err(GradingError::EmptyRoster),
            None => return Err(GradingError::UnknownStudent(format!("#{}", cursor + 1))),
        };
        Ok(Self {
            cursor,
            draft: ledger.entry(student)?.clone(),
        })
    }

    /// Roster position of the displayed student.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Id of the displayed student.
    pub fn current<'l>(&self, ledger: &'l Ledger) -> &'l str {
        &ledger.roster()[self.cursor]
    }

    /// The unsaved entry of the displayed student.
    pub fn draft(&self) -> &StudentEntry {
        &self.draft
    }

    /// Flips a choice of the displayed student, returns the new state.
    pub fn toggle(&mut self, ledger: &Ledger, question: &str, index: usize) -> GradingResult<bool> {
        ledger.check_choice(question, index)?;
        let entry = self
            .draft
            .get_mut(question)
            .ok_or_else(|| GradingError::UnknownQuestion(question.to_string()))?;

        let selected = !entry.selected.remove(&index);
        if selected {
            entry.selected.insert(index);
        }
        Ok(selected)
    }

    /// Replaces the comment of the displayed student.
    pub fn set_comment(&mut self, question: &str, text: impl Into<String>) -> GradingResult<()> {
        self.draft
            .get_mut(question)
            .ok_or_else(|| GradingError::UnknownQuestion(question.to_string()))?
            .comment = text.into();
        Ok(())
    }

    /// Writes the draft of the displayed student into the ledger.
    pub fn flush(&self, ledger: &mut Ledger) -> GradingResult<()> {
        let student = self.current(ledger).to_string();
        ledger.replace_entry(&student, self.draft.clone())
    }

    /// Flushes, then moves to `cursor` and loads that student's entry.
    fn move_to(&mut self, ledger: &mut Ledger, cursor: usize) -> GradingResult<()> {
        self.flush(ledger)?;
        let moved = Self::at(ledger, cursor)?;
        debug!(from = self.cursor, to = cursor, "navigating");
        *self = moved;
        Ok(())
    }

    /// Flushes and moves one student in `step` direction, staying in place at
    /// either end of the roster.
    pub fn step(&mut self, ledger: &mut Ledger, step: Step) -> GradingResult<usize> {
        let last = ledger.roster().len().saturating_sub(1);
        let cursor = match step {
            Step::Prev => self.cursor.saturating_sub(1),
            Step::Next => (self.cursor + 1).min(last),
        };
        self.move_to(ledger, cursor)?;
        Ok(self.cursor)
    }

    /// Flushes and moves to the next student.
    pub fn next(&mut self, ledger: &mut Ledger) -> GradingResult<usize> {
        self.step(ledger, Step::Next)
    }

    /// Flushes and moves to the previous student.
    pub fn prev(&mut self, ledger: &mut Ledger) -> GradingResult<usize> {
        self.step(ledger, Step::Prev)
    }

    /// Flushes and jumps to `student`.
    pub fn goto(&mut self, ledger: &mut Ledger, student: &str) -> GradingResult<usize> {
        let cursor = ledger
            .roster()
            .iter()
            .position(|s| s == student)
            .ok_or_else(|| GradingError::UnknownStudent(student.to_string()))?;
        self.move_to(ledger, cursor)?;
        Ok(self.cursor)
    }
}
