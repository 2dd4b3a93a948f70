use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
};

use tick::{
    config::GraderConfig,
    error::GradingError,
    ledger::Ledger,
    rubric::RubricCatalog,
    snapshot,
};
use uuid::Uuid;

fn temp_root() -> PathBuf {
    let root = std::env::temp_dir().join(format!("tick-workflow-{}", Uuid::new_v4()));
    fs::create_dir_all(&root).expect("create temp root");
    root
}

fn config(root: &PathBuf) -> GraderConfig {
    GraderConfig::builder()
        .state_path(root.join("feedback.json"))
        .export_path(root.join("feedback.csv"))
        .roster_path(root.join("roster.txt"))
        .id_header("NetID")
        .build()
}

fn roster() -> Vec<String> {
    ["ab123", "cd456", "ef789"].map(String::from).to_vec()
}

#[test]
fn grading_session_saves_and_exports() {
    let root = temp_root();
    let config = config(&root);

    let script = "t 1 2\nc 1 check the limits\nn\nt 2 3\nn\nt 1 1\nt 2 1\nq\n";
    let ledger = tick::grade(&config, roster(), script.as_bytes(), Vec::new()).expect("grade");

    assert_eq!(ledger.selected("ab123", "Q3(a)").unwrap(), [1]);
    assert_eq!(ledger.selected("cd456", "Q3(b)").unwrap(), [2]);
    assert_eq!(ledger.selected("ef789", "Q3(a)").unwrap(), [0]);

    let mut reader = csv::Reader::from_path(config.export_path()).expect("open spreadsheet");
    let header: Vec<String> = reader
        .headers()
        .expect("header")
        .iter()
        .map(String::from)
        .collect();
    assert_eq!(header, ["NetID", "Q3(a)", "Q3(a) Feedback", "Q3(b)", "Q3(b) Feedback"]);

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.expect("row")).collect();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.len() == 1 + 2 * 2));
    assert_eq!(&rows[0][0], "ab123");
    assert_eq!(&rows[0][1], "1.5");
    assert_eq!(&rows[0][2], "Q3(a):Partially correct (-0.5):check the limits");
    assert_eq!(&rows[1][3], "0");
    assert_eq!(&rows[1][4], "Q3(b):No answer (-3)");
    assert_eq!(&rows[2][2], "Q3(a):Correct");

    let _ = fs::remove_dir_all(root);
}

#[test]
fn progress_is_resumed_from_snapshot() {
    let root = temp_root();
    let config = config(&root);

    tick::grade(&config, roster(), "g cd456\nt 2 2\nc 2 units\n".as_bytes(), Vec::new())
        .expect("first session");
    let resumed = tick::grade(&config, roster(), "q\n".as_bytes(), Vec::new())
        .expect("second session");

    assert_eq!(resumed.selected("cd456", "Q3(b)").unwrap(), [1]);
    assert_eq!(resumed.comment("cd456", "Q3(b)").unwrap(), "units");
    assert!(resumed.selected("ab123", "Q3(b)").unwrap().is_empty());

    let report = tick::report(&config, roster()).expect("report");
    assert_eq!(
        report.rows()[1][4].to_string(),
        "Q3(b):Partially correct (-1):units"
    );
    assert!(report.to_table().contains("Grading Overview"));

    let _ = fs::remove_dir_all(root);
}

#[test]
fn navigating_back_shows_earlier_edits() {
    let root = temp_root();
    let config = config(&root);

    let mut out = Vec::new();
    tick::grade(&config, roster(), "t 1 3\nn\np\ns\nq\n".as_bytes(), &mut out).expect("grade");

    let text = String::from_utf8(out).expect("utf8");
    let last = text.rsplit("ab123").next().expect("student shown");
    assert!(last.contains("[x]"));
    assert!(last.contains("No answer (-2)"));

    let _ = fs::remove_dir_all(root);
}

#[test]
fn malformed_snapshot_is_reported_and_ledger_kept() {
    let root = temp_root();
    let path = root.join("feedback.json");
    fs::write(&path, r#"{"choices": {"ab123": {}}}"#).expect("write snapshot");

    let catalog = RubricCatalog::homework_one();
    let mut ledger = Ledger::initialize(roster(), &catalog).expect("ledger");
    ledger.set_choice("ab123", "Q3(a)", 0, true).unwrap();
    let before = ledger.clone();

    let err = snapshot::load(&mut ledger, &path).expect_err("must fail");
    assert!(matches!(
        err.downcast_ref::<GradingError>(),
        Some(GradingError::MalformedSnapshot(_))
    ));
    assert_eq!(ledger, before);

    let _ = fs::remove_dir_all(root);
}

#[test]
fn missing_snapshot_file_starts_fresh() {
    let root = temp_root();
    let catalog = RubricCatalog::homework_one();
    let mut ledger = Ledger::initialize(roster(), &catalog).expect("ledger");

    let loaded = snapshot::load_if_present(&mut ledger, &root.join("absent.json")).expect("load");

    assert!(!loaded);
    assert!(snapshot::load(&mut ledger, &root.join("absent.json")).is_err());

    let _ = fs::remove_dir_all(root);
}

#[test]
fn empty_roster_fails_before_grading() {
    let root = temp_root();
    let config = config(&root);

    let err = tick::grade(&config, Vec::new(), "q\n".as_bytes(), Vec::new()).expect_err("empty");

    assert!(
        err.chain()
            .any(|e| e.downcast_ref::<GradingError>() == Some(&GradingError::EmptyRoster))
    );
    assert!(!config.state_path().exists());

    let _ = fs::remove_dir_all(root);
}

#[test]
fn rubric_file_drives_the_export() {
    let root = temp_root();
    let rubric_path = root.join("rubric.json");
    fs::write(
        &rubric_path,
        r#"{"questions": [
            {"name": "P1", "points": 10, "choices": [
                {"label": "Off by one", "points": -2},
                {"label": "No base case", "points": -5}
            ]},
            {"name": "P2", "points": 5},
            {"name": "P3", "points": 1, "choices": [{"label": "Bonus", "points": 1}]}
        ]}"#,
    )
    .expect("write rubric");
    let config = config(&root).with_rubric_path(&rubric_path);

    tick::grade(&config, roster(), "t 1 1\nt 1 2\nt 3 1\nq\n".as_bytes(), Vec::new())
        .expect("grade");

    let report = tick::report(&config, roster()).expect("report");
    assert_eq!(report.header().len(), 1 + 2 * 3);
    assert_eq!(report.rows().len(), 3);
    assert_eq!(report.rows()[0][1].to_string(), "3");
    assert_eq!(report.rows()[0][2].to_string(), "P1:Off by one,No base case");
    assert_eq!(report.rows()[0][5].to_string(), "2");

    let _ = fs::remove_dir_all(root);
}

#[test]
fn undecodable_input_does_not_lose_the_session() {
    let root = temp_root();
    let config = config(&root);

    let script: &[u8] = b"t 1 2\nn\nt 2 3\n\xe9\nc 1 caf\xe9\nq\n";
    let ledger = tick::grade(&config, roster(), script, Vec::new()).expect("grade");

    assert_eq!(ledger.selected("ab123", "Q3(a)").unwrap(), [1]);
    assert_eq!(ledger.comment("cd456", "Q3(a)").unwrap(), "caf\u{fffd}");

    let saved = fs::read_to_string(config.state_path()).expect("snapshot written");
    assert!(saved.contains("caf\u{fffd}"));
    let mut reader = csv::Reader::from_path(config.export_path()).expect("open spreadsheet");
    let first = reader.records().next().expect("first row").expect("row");
    assert_eq!(&first[2], "Q3(a):Partially correct (-0.5)");

    let _ = fs::remove_dir_all(root);
}

/// Terminal that accepts `budget` bytes, then fails every write.
struct FlakyTerminal {
    /// Bytes still accepted.
    budget: usize,
}

impl Write for FlakyTerminal {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.budget < buf.len() {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal went away"));
        }
        self.budget -= buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn failing_terminal_still_saves_progress() {
    let root = temp_root();
    let config = config(&root);

    // enough room for the first screen and the prompt, not for the redraw
    // after the toggle
    let mut first_screen = Vec::new();
    tick::grade(&config, roster(), "q\n".as_bytes(), &mut first_screen).expect("measure");
    fs::remove_file(config.state_path()).expect("reset snapshot");
    fs::remove_file(config.export_path()).expect("reset spreadsheet");
    let terminal = FlakyTerminal {
        budget: first_screen.len(),
    };

    let err = tick::grade(&config, roster(), "t 1 3\nn\nq\n".as_bytes(), terminal)
        .expect_err("terminal failure is reported");
    assert!(format!("{err:#}").contains("terminal went away"));

    let catalog = RubricCatalog::homework_one();
    let mut saved = Ledger::initialize(roster(), &catalog).expect("ledger");
    snapshot::load(&mut saved, config.state_path()).expect("snapshot written");
    assert_eq!(saved.selected("ab123", "Q3(a)").unwrap(), [2]);
    assert!(config.export_path().exists());

    let _ = fs::remove_dir_all(root);
}
