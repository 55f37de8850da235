//! Project file lookup for "open file" commands.
//!
//! A spoken file name rarely matches a path exactly, so the query is matched loosely against
//! file base names: case is ignored and every space in the query matches any run of characters
//! ("main rs" finds `main.rs`). Walks honor `.gitignore` files plus the configured ignore globs.

use ignore::WalkBuilder;
use ignore::overrides::OverrideBuilder;
use regex::{Regex, RegexBuilder};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File lookup errors.
#[derive(Debug, Error)]
pub enum FileSearchError {
    #[error("invalid file query: {0}")]
    /// The query could not be turned into a matcher.
    Query(#[from] regex::Error),

    #[error("invalid ignore pattern: {0}")]
    /// A configured ignore glob is malformed.
    Ignore(#[from] ignore::Error),
}

/// Build the base-name matcher for a spoken query.
pub fn query_matcher(query: &str) -> Result<Regex, FileSearchError> {
    let pattern = query
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");

    Ok(RegexBuilder::new(&pattern).case_insensitive(true).build()?)
}

/// Find files under `roots` whose base name matches `query`.
///
/// `ignore` holds gitignore-style globs (`*.pyc`, `build/`) excluded in addition to the
/// repository's own ignore files. Results are absolute when `roots` are, and sorted.
pub fn search_files(
    roots: &[PathBuf],
    query: &str,
    ignore: &[String],
) -> Result<Vec<PathBuf>, FileSearchError> {
    let matcher = query_matcher(query)?;
    let mut found = Vec::new();

    for root in roots {
        let mut overrides = OverrideBuilder::new(root);
        for pattern in ignore {
            overrides.add(&format!("!{pattern}"))?;
        }

        let walker = WalkBuilder::new(root)
            .require_git(false)
            .overrides(overrides.build()?)
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(root = %root.display(), error = %err, "skipping unreadable entry");
                    continue;
                }
            };

            if entry.file_type().is_some_and(|kind| kind.is_file())
                && base_name_matches(&matcher, entry.path())
            {
                found.push(entry.into_path());
            }
        }
    }

    found.sort();
    found.dedup();
    Ok(found)
}

fn base_name_matches(matcher: &Regex, path: &Path) -> bool {
    path.file_name()
        .map(|name| matcher.is_match(&name.to_string_lossy()))
        .unwrap_or(false)
}
