//! Loading vectors from plain-text files.
//!
//! One vector per line, components separated by commas and/or whitespace.
//! Blank lines and lines starting with `#` are skipped.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use tracing::{Span, field, instrument};

use super::commands::CliError;

/// Parses one line of a vector file.
///
/// Returns `Ok(None)` for blank and comment lines.
///
/// # Errors
/// Returns a description of the first component that is not a valid `f32`.
///
/// # Examples
/// ```
/// use vecnav_cli::cli::parse_vector_line;
///
/// assert_eq!(parse_vector_line("1.5, 2 3").unwrap(), Some(vec![1.5, 2.0, 3.0]));
/// assert_eq!(parse_vector_line("  # comment").unwrap(), None);
/// ```
pub fn parse_vector_line(line: &str) -> Result<Option<Vec<f32>>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    trimmed
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<f32>()
                .map_err(|err| format!("invalid component `{token}`: {err}"))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Reads every vector from `path`, checking that all rows share a dimension.
#[instrument(name = "cli.load_vectors", err, fields(path = field::Empty, rows = field::Empty))]
pub(super) fn load_vectors(path: &Path) -> Result<Vec<Vec<f32>>, CliError> {
    let span = Span::current();
    span.record("path", field::display(path.display()));
    let file = File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut vectors: Vec<Vec<f32>> = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parse_error = |message: String| CliError::Parse {
            path: path.to_path_buf(),
            line: index + 1,
            message,
        };
        let Some(vector) = parse_vector_line(&line).map_err(parse_error)? else {
            continue;
        };
        if let Some(first) = vectors.first() {
            if first.len() != vector.len() {
                return Err(parse_error(format!(
                    "expected {} component(s) but found {}",
                    first.len(),
                    vector.len()
                )));
            }
        }
        vectors.push(vector);
    }

    if vectors.is_empty() {
        return Err(CliError::EmptyInput {
            path: path.to_path_buf(),
        });
    }
    span.record("rows", vectors.len());
    Ok(vectors)
}
