//! Interactive CSV picker.
//!
//! This is intentionally kept separate from clap parsing:
//! - clap handles structured flags/subcommands
//! - the picker provides the "run `sales` and choose an export" UX
//!
//! The picker searches for `*.csv` files under the current working directory
//! and lists files whose header looks like a sales/restock export first.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::domain::MeasurementFamily;
use crate::error::AppError;
use crate::io::ingest::normalize_header_name;

/// Default directory recursion depth for finding CSV files.
const DEFAULT_SEARCH_DEPTH: usize = 4;

/// A discovered CSV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    /// Header has both `*_sales` and `*_restocks` columns.
    pub looks_like_export: bool,
}

/// Prompt the user to select a CSV export from the current directory tree.
///
/// Accepts either a number from the list or an explicit path; `q` cancels.
pub fn prompt_for_csv_path() -> Result<PathBuf, AppError> {
    let candidates = discover_csv_files(Path::new("."));
    if candidates.is_empty() {
        return Err(AppError::new(
            2,
            "No .csv files found. Provide one with `sales -f <export.csv>` or set SALES_CSV.",
        ));
    }

    println!("Found {} CSV file(s):", candidates.len());
    for (idx, c) in candidates.iter().enumerate() {
        let tag = if c.looks_like_export { "" } else { "  (no sales/restock columns)" };
        println!("{:>3}) {}{tag}", idx + 1, pretty_path(&c.path));
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("Select a file (1-{}) or type a path (q to quit): ", candidates.len());
        io::stdout()
            .flush()
            .map_err(|e| AppError::new(2, format!("Failed to write prompt: {e}")))?;

        let Some(line) = lines.next() else {
            return Err(AppError::new(
                2,
                "No input received. Provide a CSV path with `sales -f <export.csv>`.",
            ));
        };
        let line = line.map_err(|e| AppError::new(2, format!("Failed to read input: {e}")))?;

        match resolve_choice(line.trim(), &candidates) {
            Ok(Some(path)) => return Ok(path),
            Ok(None) => return Err(AppError::new(2, "Canceled.")),
            Err(err) => println!("{err}"),
        }
    }
}

/// Interpret one line of picker input. `Ok(None)` means the user canceled.
fn resolve_choice(input: &str, candidates: &[Candidate]) -> Result<Option<PathBuf>, AppError> {
    if input.eq_ignore_ascii_case("q") {
        return Ok(None);
    }
    if let Ok(choice) = input.parse::<usize>() {
        return match candidates.get(choice.wrapping_sub(1)) {
            Some(c) => validate_csv_path(&c.path).map(Some),
            None => Err(AppError::new(
                2,
                format!("Invalid choice: {choice}. Enter a number between 1 and {}.", candidates.len()),
            )),
        };
    }
    validate_csv_path(Path::new(input)).map(Some)
}

/// Validate the provided path points to a `.csv` file.
pub fn validate_csv_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::new(2, format!("CSV file not found: {}", path.display())));
    }
    if path.is_dir() {
        return Err(AppError::new(
            2,
            format!("Expected a file, got a directory: {}", path.display()),
        ));
    }
    if !has_csv_extension(path) {
        return Err(AppError::new(
            2,
            format!("Expected a .csv file (got: {}). Use -f to pass a CSV path.", path.display()),
        ));
    }
    Ok(path.to_path_buf())
}

/// Discover `*.csv` files under `root`: likely exports first, then by path.
pub fn discover_csv_files(root: &Path) -> Vec<Candidate> {
    let mut paths = Vec::new();
    find_csv_files(root, 0, DEFAULT_SEARCH_DEPTH, &mut paths);

    let mut out: Vec<Candidate> = paths
        .into_iter()
        .map(|path| Candidate {
            looks_like_export: header_looks_like_export(&path),
            path,
        })
        .collect();
    out.sort_by(|a, b| {
        b.looks_like_export
            .cmp(&a.looks_like_export)
            .then_with(|| pretty_path(&a.path).cmp(&pretty_path(&b.path)))
    });
    out
}

fn find_csv_files(root: &Path, depth: usize, max_depth: usize, out: &mut Vec<PathBuf>) {
    if depth > max_depth {
        return;
    }
    let Ok(entries) = fs::read_dir(root) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            if !should_skip_dir(&path) {
                find_csv_files(&path, depth + 1, max_depth, out);
            }
        } else if file_type.is_file() && has_csv_extension(&path) {
            out.push(path);
        }
    }
}

/// Peek at the first line only; unreadable files simply don't qualify.
fn header_looks_like_export(path: &Path) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    let mut first = String::new();
    if BufReader::new(file).read_line(&mut first).is_err() {
        return false;
    }
    let names: Vec<String> = first.split(',').map(normalize_header_name).collect();
    MeasurementFamily::ALL
        .iter()
        .all(|family| names.iter().any(|n| n.ends_with(family.suffix())))
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn should_skip_dir(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    matches!(name, ".git" | "target" | "node_modules")
}

fn pretty_path(path: &Path) -> String {
    let stripped = path.strip_prefix("./").unwrap_or(path);
    stripped.display().to_string()
}
