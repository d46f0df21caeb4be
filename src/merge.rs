// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::{debug, error};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Cannot read merge target '{path}': {source}")]
    LoadTarget {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Cannot open merge target '{path}' for appending: {source}")]
    OpenTarget {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Outcome of offering a matched line to the merger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Line was novel: remembered, appended (unless dry-run) and/or printed
    Recorded,
    /// Line was blank after trimming or already present in the seen set
    Suppressed,
}

/// Deduplicating sink that appends novel matched lines to a target file
///
/// The seen set is seeded from the target once at construction and mutated
/// in-place as new unique lines are discovered; the file itself is the
/// durable state. Appends go straight to the handle, one complete line per
/// write, so an interrupted run never leaves a partial record.
///
/// Generic over the target writer so tests can drive it with `Vec<u8>`
/// instead of a real file.
pub struct Merger<T: Write> {
    seen: HashSet<String>,
    target: Option<T>,
    quiet: bool,
    dry_run: bool,
}

impl Merger<File> {
    /// Opens a merger against the given target path
    ///
    /// Seeds the seen set from the file (a missing file means an empty set,
    /// not an error) and opens the append handle. In dry-run mode the handle
    /// is never opened and the file is never created.
    pub fn open(path: &Path, quiet: bool, dry_run: bool) -> Result<Self, MergeError> {
        let seen = load_seen(path).map_err(|source| MergeError::LoadTarget {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            "loaded {} previously recorded lines from {}",
            seen.len(),
            path.display()
        );

        let target = if dry_run {
            None
        } else {
            let file = OpenOptions::new()
                .append(true)
                .create(true)
                .open(path)
                .map_err(|source| MergeError::OpenTarget {
                    path: path.to_path_buf(),
                    source,
                })?;
            Some(file)
        };

        Ok(Self::new(seen, target, quiet, dry_run))
    }
}

impl<T: Write> Merger<T> {
    pub fn new(seen: HashSet<String>, target: Option<T>, quiet: bool, dry_run: bool) -> Self {
        Self {
            seen,
            target,
            quiet,
            dry_run,
        }
    }

    /// Offers a matched line, deciding whether it is novel
    ///
    /// `raw` is the unmodified input line; its trimmed form is the dedup key
    /// and what gets appended to the target. `printable` is what goes to
    /// `out` for a novel line when quiet mode is off - the caller passes the
    /// prefixed display form when filename/line-number options are active,
    /// otherwise the raw line.
    ///
    /// A target write failure is reported and the run continues; the
    /// returned `io::Result` covers only the `out` stream.
    pub fn offer<O: Write>(
        &mut self,
        raw: &str,
        printable: &str,
        out: &mut O,
    ) -> io::Result<Decision> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Decision::Suppressed);
        }
        if self.seen.contains(trimmed) {
            return Ok(Decision::Suppressed);
        }
        self.seen.insert(trimmed.to_string());

        if let Some(target) = &mut self.target {
            if let Err(e) = writeln!(target, "{}", trimmed) {
                error!("Error writing to merge target: {}", e);
            }
        }

        if !self.quiet {
            writeln!(out, "{}", printable)?;
        }

        if self.dry_run {
            eprintln!("[DRY RUN] Would add: {}", trimmed);
        }

        Ok(Decision::Recorded)
    }
}

/// Reads the seed set from a merge target: one record per line, trimmed,
/// blanks skipped. A missing file is not an error - it means first write.
pub fn load_seen(path: &Path) -> io::Result<HashSet<String>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashSet::new()),
        Err(e) => return Err(e),
    };

    let mut seen = HashSet::new();
    for line in BufReader::new(file).lines() {
        let trimmed = line?.trim().to_string();
        if !trimmed.is_empty() {
            seen.insert(trimmed);
        }
    }

    Ok(seen)
}
