//! Upgrade of legacy 5-field product groups to the 6-field layout.
//!
//! Migration reads the whole file, rewrites it in memory, then replaces the
//! file in one go. Only one process may own the file while this runs.

use crate::codec::{self, GroupError, LineFormat, HEADER_WIDTH, LEGACY_GROUP_WIDTH};
use crate::file;
use crate::CatalogResult;
use marketstack_types::Category;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Result of migrating a set of lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MigrationOutcome {
    /// Every input line, upgraded where possible, in input order.
    pub lines: Vec<String>,
    /// Lines whose text changed.
    pub migrated: usize,
    /// Legacy lines kept verbatim because a product group was malformed.
    pub failed: usize,
    /// Lines that also read as multi-group legacy data and were left alone.
    pub flagged: usize,
}

impl MigrationOutcome {
    /// Counts without the lines.
    #[must_use]
    pub fn report(&self, rewritten: bool) -> MigrationReport {
        MigrationReport {
            migrated: self.migrated,
            failed: self.failed,
            flagged: self.flagged,
            rewritten,
        }
    }
}

/// What a file migration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MigrationReport {
    pub migrated: usize,
    pub failed: usize,
    pub flagged: usize,
    /// Whether the file on disk was replaced.
    pub rewritten: bool,
}

/// True iff any non-blank line is in the legacy layout.
#[must_use]
pub fn needs_migration<S: AsRef<str>>(lines: &[S]) -> bool {
    lines.iter().any(|l| codec::is_legacy_format(l.as_ref()))
}

/// Appends the legacy default tag to the product group of a legacy line.
///
/// The group's text is carried over as-is; only the numeric fields are
/// checked so that an unreadable group is not stamped as migrated.
fn upgrade_line(line: &str) -> Result<String, GroupError> {
    let fields = codec::split_fields(line);
    let mut upgraded = fields[..HEADER_WIDTH].join(",");
    for group in fields[HEADER_WIDTH..].chunks(LEGACY_GROUP_WIDTH) {
        codec::decode_group(group)?;
        upgraded.push(',');
        upgraded.push_str(&group.join(","));
        upgraded.push(',');
        upgraded.push_str(Category::LEGACY_DEFAULT.as_tag());
    }
    if line.ends_with('\r') {
        upgraded.push('\r');
    }
    Ok(upgraded)
}

/// Upgrades every legacy line that carries products.
///
/// Blank, seller-only and store-only lines pass through. A line whose group
/// cannot be read is kept verbatim and counted in `failed`.
#[must_use]
pub fn migrate<S: AsRef<str>>(lines: &[S]) -> MigrationOutcome {
    let mut outcome = MigrationOutcome {
        lines: Vec::with_capacity(lines.len()),
        ..MigrationOutcome::default()
    };

    for (idx, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        match codec::detect_format(line) {
            LineFormat::Legacy => match upgrade_line(line) {
                Ok(upgraded) => {
                    if upgraded != line {
                        outcome.migrated += 1;
                    }
                    outcome.lines.push(upgraded);
                }
                Err(e) => {
                    warn!("Keeping legacy line {} unchanged: {}", idx + 1, e);
                    outcome.failed += 1;
                    outcome.lines.push(line.to_string());
                }
            },
            LineFormat::Current => {
                if let Some(amb) = codec::ambiguity(line) {
                    warn!(
                        "Line {} has {} fields and may hold {} legacy products; leaving it unchanged",
                        idx + 1,
                        amb.field_count,
                        amb.legacy_groups
                    );
                    outcome.flagged += 1;
                }
                outcome.lines.push(line.to_string());
            }
            LineFormat::Blank | LineFormat::Incomplete => outcome.lines.push(line.to_string()),
        }
    }
    outcome
}

/// Reads `path`, migrates it if needed, and rewrites it when anything changed.
///
/// Returns the (possibly upgraded) lines alongside the report, so a caller
/// that wants the contents does not have to read the file twice.
pub(crate) fn migrate_file(path: &Path) -> CatalogResult<(Vec<String>, MigrationReport)> {
    let lines = file::read_lines(path)?;
    if !needs_migration(&lines) {
        return Ok((lines, MigrationReport::default()));
    }

    let outcome = migrate(&lines);
    let rewritten = outcome.migrated > 0;
    if rewritten {
        file::write_lines(path, &outcome.lines)?;
        info!(
            "Migrated {} catalog lines in {} ({} failed)",
            outcome.migrated,
            path.display(),
            outcome.failed
        );
    }
    let report = outcome.report(rewritten);
    Ok((outcome.lines, report))
}

/// Runs migration against one catalog file.
#[derive(Debug, Clone)]
pub struct MigrationEngine {
    path: PathBuf,
}

impl MigrationEngine {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file currently holds legacy lines. A missing file does not.
    pub fn needs_migration(&self) -> CatalogResult<bool> {
        Ok(needs_migration(&file::read_lines(&self.path)?))
    }

    /// Migrates the file in place. Does nothing when no line needs it.
    pub fn run(&self) -> CatalogResult<MigrationReport> {
        migrate_file(&self.path).map(|(_, report)| report)
    }
}
