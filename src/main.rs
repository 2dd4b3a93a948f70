#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # tick
//!
//! Step through a roster, tick rubric choices for every question, and export
//! points and feedback to a spreadsheet. Progress is kept in a JSON snapshot
//! between sessions.
//!
//! Typical use:
//!
//! ```text
//! tick roster ./submissions --output roster.txt
//! tick grade
//! tick report
//! ```

use std::{fs, io, path::PathBuf};

use anyhow::{Context, Result};
use bpaf::*;
use dotenvy::dotenv;
use tick::{
    config::GraderConfig,
    roster::{self, ExtractOptions},
};
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Grade interactively, then save and export
    Grade,
    /// Write the spreadsheet from the saved snapshot
    Export,
    /// Print the score table
    Report,
    /// Print the rubric
    Rubric,
    /// Extract student ids from submission file names
    Roster {
        /// Directory holding the submissions
        dir:       PathBuf,
        /// Extension of submission files
        extension: String,
        /// Characters to drop from the front of each file name
        prefix:    usize,
        /// Characters to drop from the back of each file name
        suffix:    usize,
        /// File to write the roster to instead of stdout
        output:    Option<PathBuf>,
    },
}

/// Options shared by all commands.
#[derive(Debug, Clone)]
struct Opts {
    /// Log at debug level
    verbose:     bool,
    /// Snapshot file override
    state:       Option<PathBuf>,
    /// Spreadsheet file override
    export:      Option<PathBuf>,
    /// Roster file override
    roster:      Option<PathBuf>,
    /// Build the roster from a submissions directory instead
    submissions: Option<PathBuf>,
    /// Rubric document override
    rubric:      Option<PathBuf>,
    /// Header of the id column
    id_header:   Option<String>,
    /// The command to run
    cmd:         Cmd,
}

/// Parse the command line arguments and return the options
fn options() -> Opts {
    /// parses an optional path flag
    fn path(name: &'static str, help: &'static str) -> impl Parser<Option<PathBuf>> {
        long(name).help(help).argument::<PathBuf>("PATH").optional()
    }

    let verbose = short('v').long("verbose").help("Log debug output").switch();
    let state = path("state", "Snapshot file to resume from and save to");
    let export = path("export", "Spreadsheet file to write");
    let roster = path("roster", "Roster file, one student id per line");
    let submissions = long("submissions")
        .help("Take the roster from submission file names in this directory")
        .argument::<PathBuf>("DIR")
        .optional();
    let rubric = path("rubric", "JSON rubric document, the built-in rubric otherwise");
    let id_header = long("id-header")
        .help("Header of the student id column")
        .argument::<String>("NAME")
        .optional();

    let grade = pure(Cmd::Grade)
        .to_options()
        .command("grade")
        .help("Grade interactively, then save progress and export");

    let export_cmd = pure(Cmd::Export)
        .to_options()
        .command("export")
        .help("Write the spreadsheet from saved progress");

    let report = pure(Cmd::Report)
        .to_options()
        .command("report")
        .help("Print points and feedback as a table");

    let rubric_cmd = pure(Cmd::Rubric)
        .to_options()
        .command("rubric")
        .help("Print the rubric");

    let roster_cmd = {
        let dir = positional::<PathBuf>("DIR").help("Directory holding the submissions");
        let extension = long("ext")
            .help("Extension of submission files")
            .argument::<String>("EXT")
            .fallback("txt".to_string());
        let prefix = long("prefix")
            .help("Characters to drop from the front of each file name")
            .argument::<usize>("N")
            .fallback(11);
        let suffix = long("suffix")
            .help("Characters to drop from the back of each file name")
            .argument::<usize>("N")
            .fallback(32);
        let output = short('o')
            .long("output")
            .help("Write the roster to this file")
            .argument::<PathBuf>("PATH")
            .optional();
        construct!(Cmd::Roster {
            extension,
            prefix,
            suffix,
            output,
            dir
        })
        .to_options()
        .command("roster")
        .help("Extract student ids from submission file names")
    };

    let cmd = construct!([grade, export_cmd, report, rubric_cmd, roster_cmd]);

    construct!(Opts {
        verbose,
        state,
        export,
        roster,
        submissions,
        rubric,
        id_header,
        cmd
    })
    .to_options()
    .descr("Rubric checklist grading with spreadsheet export")
    .run()
}

/// Applies command line overrides on top of the environment configuration.
fn config(opts: &Opts) -> GraderConfig {
    let mut config = GraderConfig::from_env();
    if let Some(p) = &opts.state {
        config = config.with_state_path(p);
    }
    if let Some(p) = &opts.export {
        config = config.with_export_path(p);
    }
    if let Some(p) = &opts.roster {
        config = config.with_roster_path(p);
    }
    if let Some(p) = &opts.rubric {
        config = config.with_rubric_path(p);
    }
    if let Some(h) = &opts.id_header {
        config = config.with_id_header(h.as_str());
    }
    config
}

/// Reads the roster from the submissions directory or the roster file.
fn load_roster(opts: &Opts, config: &GraderConfig) -> Result<Vec<String>> {
    match &opts.submissions {
        Some(dir) => roster::extract_roster(dir, &ExtractOptions::default()),
        None => roster::load_roster(config.roster_path()),
    }
}

fn main() -> Result<()> {
    dotenv().ok();

    let opts = options();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false)
        .with_writer(io::stderr);
    let level = if opts.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::registry()
        .with(fmt)
        .with(LevelFilter::from_level(level))
        .init();

    let config = config(&opts);

    match &opts.cmd {
        Cmd::Grade => {
            let roster = load_roster(&opts, &config)?;
            let stdin = io::stdin();
            tick::grade(&config, roster, stdin.lock(), io::stdout())?;
        }
        Cmd::Export => {
            let roster = load_roster(&opts, &config)?;
            tick::report(&config, roster)?.write_csv(config.export_path())?;
        }
        Cmd::Report => {
            let roster = load_roster(&opts, &config)?;
            println!("{}", tick::report(&config, roster)?.to_table());
        }
        Cmd::Rubric => println!("{}", config.rubric()?.to_table()),
        Cmd::Roster {
            dir,
            extension,
            prefix,
            suffix,
            output,
        } => {
            let options = ExtractOptions::builder()
                .extension(extension.as_str())
                .prefix(*prefix)
                .suffix(*suffix)
                .build();
            let ids = roster::extract_roster(dir, &options)?;
            let text = ids.join("\n");
            match output {
                Some(path) => fs::write(path, text + "\n")
                    .with_context(|| format!("Could not write roster {}", path.display()))?,
                None => println!("{text}"),
            }
        }
    };

    Ok(())
}
