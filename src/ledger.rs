#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::{
    error::{GradingError, GradingResult},
    rubric::RubricCatalog,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Selections and free-text comment for one student on one question.
pub struct QuestionEntry {
    /// Indices of the selected choices.
    pub(crate) selected: BTreeSet<usize>,
    /// Extra comment typed by the grader, empty when there is none.
    pub(crate) comment:  String,
}

impl QuestionEntry {
    /// Returns true if the choice at `index` is selected.
    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    /// Selected choice indices in ascending order.
    pub fn selected(&self) -> impl Iterator<Item = usize> + '_ {
        self.selected.iter().copied()
    }

    /// The free-text comment.
    pub fn comment(&self) -> &str {
        &self.comment
    }
}

/// Everything recorded for one student, keyed by question name.
pub type StudentEntry = BTreeMap<String, QuestionEntry>;

#[derive(Debug, Clone, PartialEq)]
/// Per-student, per-question selections for the whole roster.
///
/// Every roster student has an entry for every rubric question at all times.
pub struct Ledger {
    /// Students in roster order.
    roster:  Vec<String>,
    /// Number of choices per question, copied from the rubric.
    shape:   BTreeMap<String, usize>,
    /// Entries keyed by student id.
    entries: HashMap<String, StudentEntry>,
}

impl Ledger {
    /// Creates a ledger with an empty entry per student and question.
    pub fn initialize<I, S>(roster: I, catalog: &RubricCatalog) -> GradingResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roster: Vec<String> = roster.into_iter().map(Into::into).collect();
        if roster.is_empty() {
            return Err(GradingError::EmptyRoster);
        }

        let shape = catalog
            .questions()
            .iter()
            .map(|q| (q.name().to_string(), q.choices().len()))
            .collect();

        let mut ledger = Self {
            roster,
            shape,
            entries: HashMap::new(),
        };
        let blank = ledger.fresh_entry();
        ledger.entries = ledger
            .roster
            .iter()
            .map(|id| (id.clone(), blank.clone()))
            .collect();
        Ok(ledger)
    }

    /// An entry with nothing selected and no comments.
    pub(crate) fn fresh_entry(&self) -> StudentEntry {
        self.shape
            .keys()
            .map(|q| (q.clone(), QuestionEntry::default()))
            .collect()
    }

    /// Student ids in roster order.
    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    /// Number of choices the rubric defines for `question`.
    pub fn choice_count(&self, question: &str) -> Option<usize> {
        self.shape.get(question).copied()
    }

    /// Returns the full entry of `student`.
    pub fn entry(&self, student: &str) -> GradingResult<&StudentEntry> {
        self.entries
            .get(student)
            .ok_or_else(|| GradingError::UnknownStudent(student.to_string()))
    }

    /// Returns the entry of `student` for `question`.
    pub fn question_entry(&self, student: &str, question: &str) -> GradingResult<&QuestionEntry> {
        self.entry(student)?
            .get(question)
            .ok_or_else(|| GradingError::UnknownQuestion(question.to_string()))
    }

    /// Mutable access with the same lookups as [`Ledger::question_entry`].
    fn question_entry_mut(
        &mut self,
        student: &str,
        question: &str,
    ) -> GradingResult<&mut QuestionEntry> {
        self.entries
            .get_mut(student)
            .ok_or_else(|| GradingError::UnknownStudent(student.to_string()))?
            .get_mut(question)
            .ok_or_else(|| GradingError::UnknownQuestion(question.to_string()))
    }

    /// Fails unless `index` is a choice of `question`.
    pub(crate) fn check_choice(&self, question: &str, index: usize) -> GradingResult<()> {
        let count = self
            .choice_count(question)
            .ok_or_else(|| GradingError::UnknownQuestion(question.to_string()))?;
        if index >= count {
            return Err(GradingError::InvalidChoiceIndex {
                question: question.to_string(),
                index,
            });
        }
        Ok(())
    }

    /// Selects or deselects a choice. Setting the current value again is a
    /// no-op.
    pub fn set_choice(
        &mut self,
        student: &str,
        question: &str,
        index: usize,
        selected: bool,
    ) -> GradingResult<()> {
        self.check_choice(question, index)?;
        let entry = self.question_entry_mut(student, question)?;
        if selected {
            entry.selected.insert(index);
        } else {
            entry.selected.remove(&index);
        }
        Ok(())
    }

    /// Overwrites the free-text comment, an empty string clears it.
    pub fn set_comment(
        &mut self,
        student: &str,
        question: &str,
        text: impl Into<String>,
    ) -> GradingResult<()> {
        self.question_entry_mut(student, question)?.comment = text.into();
        Ok(())
    }

    /// Returns true if the choice is selected for the student.
    pub fn is_selected(&self, student: &str, question: &str, index: usize) -> GradingResult<bool> {
        Ok(self.question_entry(student, question)?.is_selected(index))
    }

    /// Selected choice indices in ascending order.
    pub fn selected(&self, student: &str, question: &str) -> GradingResult<Vec<usize>> {
        Ok(self.question_entry(student, question)?.selected().collect())
    }

    /// The free-text comment of the student for the question.
    pub fn comment(&self, student: &str, question: &str) -> GradingResult<&str> {
        Ok(self.question_entry(student, question)?.comment())
    }

    /// Replaces a student's whole entry.
    ///
    /// The entry must cover exactly the rubric questions with valid indices.
    pub(crate) fn replace_entry(&mut self, student: &str, entry: StudentEntry) -> GradingResult<()> {
        if !self.entries.contains_key(student) {
            return Err(GradingError::UnknownStudent(student.to_string()));
        }
        for question in self.shape.keys() {
            if !entry.contains_key(question) {
                return Err(GradingError::UnknownQuestion(question.clone()));
            }
        }
        for (question, q) in &entry {
            for index in q.selected() {
                self.check_choice(question, index)?;
            }
        }
        self.entries.insert(student.to_string(), entry);
        Ok(())
    }

    /// Swaps in a complete set of entries, used by snapshot loading.
    pub(crate) fn replace_all(&mut self, entries: HashMap<String, StudentEntry>) {
        self.entries = entries;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> Ledger {
        Ledger::initialize(["ab123", "cd456"], &RubricCatalog::homework_one()).unwrap()
    }

    #[test]
    fn every_student_starts_blank() {
        let ledger = ledger();

        for id in ledger.roster() {
            for q in ["Q3(a)", "Q3(b)"] {
                assert!(ledger.selected(id, q).unwrap().is_empty());
                assert_eq!(ledger.comment(id, q).unwrap(), "");
            }
        }
    }

    #[test]
    fn empty_roster_is_rejected() {
        let err = Ledger::initialize(Vec::<String>::new(), &RubricCatalog::homework_one());
        assert_eq!(err.unwrap_err(), GradingError::EmptyRoster);
    }

    #[test]
    fn set_choice_is_idempotent() {
        let mut ledger = ledger();

        ledger.set_choice("ab123", "Q3(a)", 1, true).unwrap();
        ledger.set_choice("ab123", "Q3(a)", 1, true).unwrap();
        assert_eq!(ledger.selected("ab123", "Q3(a)").unwrap(), [1]);
        assert!(ledger.is_selected("ab123", "Q3(a)", 1).unwrap());
        assert!(!ledger.is_selected("ab123", "Q3(a)", 0).unwrap());

        ledger.set_choice("ab123", "Q3(a)", 1, false).unwrap();
        ledger.set_choice("ab123", "Q3(a)", 1, false).unwrap();
        assert!(ledger.selected("ab123", "Q3(a)").unwrap().is_empty());
        assert!(!ledger.is_selected("ab123", "Q3(a)", 1).unwrap());
    }

    #[test]
    fn several_choices_can_be_selected() {
        let mut ledger = ledger();

        ledger.set_choice("cd456", "Q3(b)", 2, true).unwrap();
        ledger.set_choice("cd456", "Q3(b)", 0, true).unwrap();

        assert_eq!(ledger.selected("cd456", "Q3(b)").unwrap(), [0, 2]);
        assert!(ledger.selected("ab123", "Q3(b)").unwrap().is_empty());
    }

    #[test]
    fn mutations_are_validated() {
        let mut ledger = ledger();

        assert_eq!(
            ledger.set_choice("ab123", "Q3(a)", 3, true),
            Err(GradingError::InvalidChoiceIndex {
                question: "Q3(a)".into(),
                index:    3,
            })
        );
        assert_eq!(
            ledger.set_choice("zz999", "Q3(a)", 0, true),
            Err(GradingError::UnknownStudent("zz999".into()))
        );
        assert_eq!(
            ledger.set_comment("ab123", "Q4", "hm"),
            Err(GradingError::UnknownQuestion("Q4".into()))
        );
    }

    #[test]
    fn comment_is_overwritten() {
        let mut ledger = ledger();

        ledger.set_comment("ab123", "Q3(b)", "units missing").unwrap();
        ledger.set_comment("ab123", "Q3(b)", "see margin").unwrap();
        assert_eq!(ledger.comment("ab123", "Q3(b)").unwrap(), "see margin");

        ledger.set_comment("ab123", "Q3(b)", "").unwrap();
        assert_eq!(ledger.comment("ab123", "Q3(b)").unwrap(), "");
    }
}
