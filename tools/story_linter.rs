/// Story Linter — parses every script under a path and reports failures.
///
/// Usage: story_linter <file_or_dir> [--extension <ext>] [--nickname <name>]

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

use story_script::core::reader::{read_scene, ReaderOptions};
use story_script::schema::command::Command;

#[derive(Debug, Parser)]
#[command(name = "story_linter", about = "Check that story scripts parse")]
struct Args {
    /// Script file, or a directory searched recursively.
    path: PathBuf,
    /// File extension of scripts when walking a directory.
    #[arg(long, default_value = "txt")]
    extension: String,
    #[arg(long, default_value = "Doctor")]
    nickname: String,
}

struct Report {
    checked: usize,
    decisions: usize,
    failures: Vec<String>,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let options = ReaderOptions {
        nickname: args.nickname.clone(),
        convert_popup_dialog: false,
    };

    let mut report = Report {
        checked: 0,
        decisions: 0,
        failures: Vec::new(),
    };

    if args.path.is_file() {
        lint_file(&args.path, &options, &mut report);
    } else if args.path.is_dir() {
        lint_dir(&args.path, &args.extension, &options, &mut report);
    } else {
        eprintln!("ERROR: Path '{}' does not exist", args.path.display());
        process::exit(1);
    }

    println!("\n=== Story Lint Report ===\n");
    if report.failures.is_empty() {
        println!("All scripts parsed!");
    }
    for failure in &report.failures {
        println!("ERROR: {}", failure);
    }
    println!(
        "\nSummary: {} scripts, {} decisions, {} failures",
        report.checked,
        report.decisions,
        report.failures.len()
    );

    if !report.failures.is_empty() {
        process::exit(1);
    }
}

fn lint_dir(dir: &Path, extension: &str, options: &ReaderOptions, report: &mut Report) {
    let mut paths: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(entries) => entries.flatten().map(|entry| entry.path()).collect(),
        Err(e) => {
            report
                .failures
                .push(format!("{}: cannot read directory: {}", dir.display(), e));
            return;
        }
    };
    paths.sort();

    for path in paths {
        if path.is_dir() {
            lint_dir(&path, extension, options, report);
        } else if path.extension().and_then(|s| s.to_str()) == Some(extension) {
            lint_file(&path, options, report);
        }
    }
}

fn lint_file(path: &Path, options: &ReaderOptions, report: &mut Report) {
    report.checked += 1;
    let script = match std::fs::read_to_string(path) {
        Ok(script) => script,
        Err(e) => {
            report
                .failures
                .push(format!("{}: cannot read: {}", path.display(), e));
            return;
        }
    };

    match read_scene(&script, options.clone()) {
        Ok(scene) => {
            let decisions = scene
                .iter()
                .filter(|command| matches!(command, Command::Decision(_)))
                .count();
            report.decisions += decisions;
            println!("  OK: {} ({} commands)", path.display(), scene.len());
        }
        Err(e) => {
            let location = match e.line() {
                Some(line) => format!("{}:{}", path.display(), line),
                None => path.display().to_string(),
            };
            report.failures.push(format!("{}: {}", location, e));
        }
    }
}
