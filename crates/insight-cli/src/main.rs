//! Insight CLI
//!
//! Inspects a text file on a worker thread and prints one JSON object per insight to stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p insight-cli -- <file_path> [--notes <notes.json>] [--fix]
//! ```
//!
//! - `--notes`: load persisted notes (a JSON array of `{left, right, message}`) before inspecting
//! - `--fix`: apply the first suggestion of every automatic insight and print the fixed text
//!
//! The inspection language comes from `INSIGHT_LANGUAGE` (default `en_US`). Logging goes to
//! stderr; set `RUST_LOG=debug` for index internals.

use insight_core::{
    InsightAction, InsightKind, InspectionError, InspectionResult, Inspector, NoteRecord,
    ParagraphLayout, RangeError, SceneDocument, SceneError, SceneOptions,
};
use insight_core_typography::{RuleError, TypographyInspector, TypographyRules};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::{env, fs, process, thread};
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum CliError {
    #[error("{}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid notes file: {0}")]
    Notes(#[from] serde_json::Error),
    #[error("invalid note: {0}")]
    Note(#[from] RangeError),
    #[error("invalid typography rule: {0}")]
    Rule(#[from] RuleError),
    #[error(transparent)]
    Inspection(#[from] InspectionError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("inspection worker panicked")]
    Worker,
    #[error(transparent)]
    Io(#[from] io::Error),
}

struct Args {
    file: PathBuf,
    notes: Option<PathBuf>,
    fix: bool,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Option<Self> {
        let mut file = None;
        let mut notes = None;
        let mut fix = false;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--notes" => notes = Some(PathBuf::from(args.next()?)),
                "--fix" => fix = true,
                _ if file.is_none() && !arg.starts_with("--") => file = Some(PathBuf::from(arg)),
                _ => return None,
            }
        }
        Some(Self {
            file: file?,
            notes,
            fix,
        })
    }
}

/// One output line.
#[derive(Debug, Serialize)]
struct InsightLine<'a> {
    index: usize,
    id: u64,
    kind: InsightKind,
    left: usize,
    right: usize,
    paragraph: usize,
    message: &'a str,
    suggestions: &'a [String],
}

fn read(path: &PathBuf) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.clone(),
        source,
    })
}

fn inspect(
    scene: &mut SceneDocument,
    inspectors: Vec<Box<dyn Inspector>>,
) -> Result<usize, CliError> {
    let request = scene.inspection_request();
    debug!(
        revision = request.revision,
        paragraphs = request.paragraphs.len(),
        "starting inspection"
    );
    let worker = thread::spawn(move || -> InspectionResult { request.run(&inspectors) });
    let result = worker.join().map_err(|_| CliError::Worker)?;
    info!(findings = result.finding_count(), "inspection finished");
    Ok(scene.apply_inspection(result)?)
}

/// Apply the first suggestion of each automatic insight, last to first so earlier offsets hold.
fn fix(scene: &mut SceneDocument) -> Result<usize, CliError> {
    let mut applied = 0;
    let mut limit = usize::MAX;
    for i in (0..scene.index().len()).rev() {
        let Some(insight) = scene.index().get(i) else {
            continue;
        };
        let (_, right) = insight.range();
        if insight.is_persistent() || right > limit {
            continue;
        }
        let Some(suggestion) = insight.suggestions().first().cloned() else {
            continue;
        };
        limit = insight.range().0;
        scene.trigger(i, InsightAction::Replace(suggestion))?;
        applied += 1;
    }
    Ok(applied)
}

fn print_insights(scene: &SceneDocument, out: &mut impl Write) -> Result<(), CliError> {
    let doc = scene.document();
    for (index, (id, insight)) in scene.index().iter_with_ids().enumerate() {
        let (left, right) = insight.range();
        let line = InsightLine {
            index,
            id: id.get(),
            kind: insight.kind(),
            left,
            right,
            paragraph: doc.paragraph_at(left),
            message: insight.message(),
            suggestions: insight.suggestions(),
        };
        serde_json::to_writer(&mut *out, &line)?;
        writeln!(out)?;
    }
    Ok(())
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read(&args.file)?;
    let language =
        env::var("INSIGHT_LANGUAGE").unwrap_or_else(|_| SceneOptions::default().language);
    let options = SceneOptions { language };
    info!(path = %args.file.display(), language = %options.language, "opening document");
    let mut scene = SceneDocument::new(&text, options);

    if let Some(path) = &args.notes {
        let records: Vec<NoteRecord> = serde_json::from_str(&read(path)?)?;
        let loaded = scene.load_notes(&records)?;
        info!(loaded, "notes loaded");
    }

    let typography = TypographyInspector::with_rules(TypographyRules::default())?;
    let added = inspect(&mut scene, vec![Box::new(typography)])?;
    debug!(added, total = scene.index().len(), "insights applied");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.fix {
        let applied = fix(&mut scene)?;
        info!(applied, "suggestions applied");
        out.write_all(scene.document().text().as_bytes())?;
    } else {
        print_insights(&scene, &mut out)?;
    }
    out.flush()?;
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let Some(args) = Args::parse(env::args().skip(1)) else {
        let program = env::args().next().unwrap_or_else(|| "insight-cli".to_string());
        eprintln!("usage: {program} <file_path> [--notes <notes.json>] [--fix]");
        process::exit(2);
    };

    if let Err(err) = run(args) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}
