#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use anyhow::{Context, Result, bail};
use colored::Colorize;
use tracing::warn;

use crate::{
    ledger::Ledger,
    rubric::RubricCatalog,
    score::ScoreCalculator,
    session::{GradingSession, Step},
    snapshot,
};

/// Help text listing the shell commands.
const HELP: &str = "\
commands:
  t <q> <c>      toggle choice <c> of question <q> (numbers as shown)
  c <q> [text]   set the extra comment of question <q>, empty clears it
  n | p          next / previous student
  g <id>         go to student <id>
  s              show the current student again
  w              write progress to the snapshot file
  h              this help
  q              save and quit";

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq)]
enum Command {
    /// Toggle a choice, both numbers 0-based.
    Toggle(usize, usize),
    /// Set a comment, question 0-based.
    Comment(usize, String),
    /// Move one student.
    Step(Step),
    /// Jump to a student.
    Goto(String),
    /// Render the current student.
    Show,
    /// Write the snapshot.
    Write,
    /// Print help.
    Help,
    /// Leave the shell.
    Quit,
}

/// Parses a 1-based number as shown on screen into a 0-based index.
fn parse_number(word: Option<&str>, what: &str) -> Result<usize> {
    let word = word.with_context(|| format!("missing {what} number"))?;
    match word.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => bail!("`{word}` is not a valid {what} number"),
    }
}

impl Command {
    /// Parses one input line, `None` for blank lines.
    fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        let cmd = match word {
            "" => return Ok(None),
            "t" | "toggle" => {
                let mut args = rest.split_whitespace();
                let question = parse_number(args.next(), "question")?;
                let choice = parse_number(args.next(), "choice")?;
                Command::Toggle(question, choice)
            }
            "c" | "comment" => {
                let (q, text) = rest.split_once(' ').unwrap_or((rest, ""));
                let q = if q.is_empty() { None } else { Some(q) };
                Command::Comment(parse_number(q, "question")?, text.trim().to_string())
            }
            "n" | "next" => Command::Step(Step::Next),
            "p" | "prev" => Command::Step(Step::Prev),
            "g" | "goto" if !rest.is_empty() => Command::Goto(rest.to_string()),
            "g" | "goto" => bail!("missing student id"),
            "s" | "show" => Command::Show,
            "w" | "write" => Command::Write,
            "h" | "help" | "?" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            other => bail!("unknown command `{other}`, type `h` for help"),
        };
        Ok(Some(cmd))
    }
}

/// Line driven grading front end.
///
/// Shows one student at a time and turns commands into session operations.
/// It never touches the ledger other than through [`GradingSession`] and
/// reads points and feedback from [`ScoreCalculator`].
pub struct Shell<'a, R, W> {
    /// Rubric being graded.
    catalog:    &'a RubricCatalog,
    /// Ledger being edited.
    ledger:     Ledger,
    /// Cursor and pending edits.
    session:    GradingSession,
    /// Where `w` writes the snapshot, if anywhere.
    state_path: Option<PathBuf>,
    /// Command source.
    input:      R,
    /// Display sink.
    output:     W,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    /// Creates a shell positioned on the first roster student.
    pub fn new(catalog: &'a RubricCatalog, ledger: Ledger, input: R, output: W) -> Result<Self> {
        let session = GradingSession::start(&ledger)?;
        Ok(Self {
            catalog,
            ledger,
            session,
            state_path: None,
            input,
            output,
        })
    }

    /// Lets the `w` command write snapshots to `path`.
    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = Some(path.into());
        self
    }

    /// The ledger, including flushed edits.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// The session cursor.
    pub fn session(&self) -> &GradingSession {
        &self.session
    }

    /// Reads commands until `q` or end of input, then flushes the current
    /// student and hands back the ledger.
    ///
    /// The ledger comes back even when the terminal failed part way, next to
    /// the error that stopped the loop, so the caller can still save it.
    pub fn run(mut self) -> (Ledger, Result<()>) {
        let outcome = self.drive();
        if let Err(e) = &outcome {
            warn!("Grading shell stopped early: {e:#}");
        }

        let flushed = self
            .session
            .flush(&mut self.ledger)
            .context("Could not keep the last edits");
        (self.ledger, outcome.and(flushed))
    }

    /// The command loop.
    fn drive(&mut self) -> Result<()> {
        self.show()?;

        let mut buf = Vec::new();
        loop {
            write!(self.output, "{} ", ">".bold())?;
            self.output.flush()?;

            buf.clear();
            if self.input.read_until(b'\n', &mut buf)? == 0 {
                writeln!(self.output)?;
                return Ok(());
            }
            let line = String::from_utf8_lossy(&buf);

            match Command::parse(&line) {
                Ok(None) => {}
                Ok(Some(Command::Quit)) => return Ok(()),
                Ok(Some(cmd)) => {
                    if let Err(e) = self.execute(cmd) {
                        writeln!(self.output, "{} {e:#}", "error:".red().bold())?;
                    }
                }
                Err(e) => writeln!(self.output, "{} {e:#}", "error:".red().bold())?,
            }
        }
    }

    /// Name of the question at 0-based position `index`.
    fn question_name(&self, index: usize) -> Result<&'a str> {
        self.catalog
            .questions()
            .get(index)
            .map(|q| q.name())
            .with_context(|| format!("there is no question {}", index + 1))
    }

    /// Runs a single command.
    fn execute(&mut self, cmd: Command) -> Result<()> {
        match cmd {
            Command::Toggle(q, c) => {
                let name = self.question_name(q)?;
                self.session.toggle(&self.ledger, name, c)?;
                self.show()
            }
            Command::Comment(q, text) => {
                let name = self.question_name(q)?;
                self.session.set_comment(name, text)?;
                self.show()
            }
            Command::Step(step) => {
                self.session.step(&mut self.ledger, step)?;
                self.show()
            }
            Command::Goto(id) => {
                self.session.goto(&mut self.ledger, &id)?;
                self.show()
            }
            Command::Show => self.show(),
            Command::Write => {
                let path = self.state_path.clone().context("no snapshot file configured")?;
                self.session.flush(&mut self.ledger)?;
                snapshot::save(&self.ledger, &path)?;
                writeln!(self.output, "saved to {}", path.display())?;
                Ok(())
            }
            Command::Help => {
                writeln!(self.output, "{HELP}")?;
                Ok(())
            }
            Command::Quit => Ok(()),
        }
    }

    /// Prints the current student with every question, its choices, the
    /// comment and the points so far.
    fn show(&mut self) -> Result<()> {
        self.session.flush(&mut self.ledger)?;

        let student = self.session.current(&self.ledger).to_string();
        let calc = ScoreCalculator::new(self.catalog, &self.ledger);
        let position = format!("({}/{})", self.session.cursor() + 1, self.ledger.roster().len());

        writeln!(self.output)?;
        writeln!(self.output, "{} {}", student.bold().cyan(), position.dimmed())?;

        for (qi, question) in self.catalog.questions().iter().enumerate() {
            let points = calc.points_for(&student, question.name())?;
            writeln!(
                self.output,
                "{} {}  {}",
                format!("[{}]", qi + 1).bold(),
                question.name().bold(),
                format!("{points}/{}", question.points()).yellow()
            )?;

            let entry = self.ledger.question_entry(&student, question.name())?;
            for (ci, choice) in question.choices().iter().enumerate() {
                let mark = if entry.is_selected(ci) {
                    "[x]".green().to_string()
                } else {
                    "[ ]".to_string()
                };
                writeln!(self.output, "    {} {mark} {}", ci + 1, choice.label())?;
            }
            if !entry.comment().is_empty() {
                writeln!(self.output, "    comment: {}", entry.comment().italic())?;
            }
        }
        writeln!(
            self.output,
            "total: {}",
            format!("{}/{}", calc.total_for(&student)?, self.catalog.max_points()).bold()
        )?;
        Ok(())
    }
}
