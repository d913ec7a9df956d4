use crate::services::audit;
use crate::services::registry::{StorageRegistry, classification_key};
use crate::services::trace::TraceToken;
use crate::services::writer::FileWriter;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use zip::ZipArchive;
use zip::read::ZipFile;

/// Reason recorded for directory entries.
pub const DIRECTORY: &str = "directory";
/// Reason recorded for traversal, absolute or otherwise unusable member names.
pub const UNSAFE_PATH: &str = "unsafe-path";

/// Container-level failures. Nothing has been written when one of these is
/// returned.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("archive is corrupt: {0}")]
    ArchiveCorrupt(String),

    #[error("archive is empty")]
    EmptyArchive,

    #[error("failed to read archive: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Written,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryOutcome {
    /// Member path as stored in the archive.
    pub entry: String,
    pub destination: Option<PathBuf>,
    pub outcome: Outcome,
}

impl EntryOutcome {
    fn written(entry: String, destination: PathBuf) -> Self {
        Self {
            entry,
            destination: Some(destination),
            outcome: Outcome::Written,
        }
    }

    fn skipped(entry: String, reason: &str) -> Self {
        Self {
            entry,
            destination: None,
            outcome: Outcome::Skipped(reason.to_string()),
        }
    }

    fn failed(entry: String, destination: Option<PathBuf>, reason: String) -> Self {
        Self {
            entry,
            destination,
            outcome: Outcome::Failed(reason),
        }
    }
}

/// Per-entry outcomes of one extraction, in archive order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionReport {
    pub archive: String,
    pub outcomes: Vec<EntryOutcome>,
}

impl ExtractionReport {
    fn new(archive: &str) -> Self {
        Self {
            archive: archive.to_string(),
            outcomes: Vec::new(),
        }
    }

    pub fn written(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Written))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = &EntryOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.outcome)).count()
    }
}

/// Reduces a member path to the bare filename it will be stored under.
///
/// Returns `None` for names that must never reach the filesystem: NUL bytes,
/// absolute or drive-prefixed paths, any `..` segment, or nothing left after
/// stripping separators.
pub fn sanitize_member_name(raw: &str) -> Option<&str> {
    if raw.contains('\0') || raw.starts_with('/') || raw.starts_with('\\') {
        return None;
    }

    let segments: Vec<&str> = raw
        .split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    if segments.iter().any(|s| *s == "..") {
        return None;
    }
    if segments.first().is_some_and(|s| is_drive_prefix(s)) {
        return None;
    }

    segments.last().copied()
}

/// `C:` or `C:foo`. Colons elsewhere are ordinary filename characters.
fn is_drive_prefix(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Unpacks archives and routes every member to the subtree its extension
/// maps to. Entry-level problems are recorded in the report; only
/// container-level problems are returned as errors.
pub struct ExtractionEngine {
    registry: Arc<StorageRegistry>,
    writer: Arc<dyn FileWriter>,
}

impl ExtractionEngine {
    pub fn new(registry: Arc<StorageRegistry>, writer: Arc<dyn FileWriter>) -> Self {
        Self { registry, writer }
    }

    pub fn registry(&self) -> &StorageRegistry {
        &self.registry
    }

    /// Extracts a seekable archive.
    pub fn extract<R: Read + Seek>(
        &self,
        mut archive: R,
        archive_name: &str,
        trace: &TraceToken,
    ) -> Result<ExtractionReport, ExtractError> {
        let len = archive.seek(SeekFrom::End(0))?;
        if len == 0 {
            return Err(ExtractError::EmptyArchive);
        }
        archive.rewind()?;

        let mut zip = ZipArchive::new(archive)
            .map_err(|e| ExtractError::ArchiveCorrupt(e.to_string()))?;

        audit::batch_started(trace, archive_name);

        let mut report = ExtractionReport::new(archive_name);
        for index in 0..zip.len() {
            let outcome = match zip.by_index(index) {
                Ok(mut entry) => self.process_entry(&mut entry, archive_name, trace),
                Err(e) => {
                    let name = format!("#{}", index);
                    let reason = format!("unreadable-entry: {}", e);
                    audit::entry_failed(trace, archive_name, &name, &reason);
                    EntryOutcome::failed(name, None, reason)
                }
            };
            report.outcomes.push(outcome);
        }

        audit::batch_finished(trace, &report);
        Ok(report)
    }

    /// Extracts from a forward-only stream by buffering it in memory first.
    pub fn extract_stream<R: Read>(
        &self,
        mut stream: R,
        archive_name: &str,
        trace: &TraceToken,
    ) -> Result<ExtractionReport, ExtractError> {
        let mut data = Vec::new();
        stream.read_to_end(&mut data)?;
        self.extract(Cursor::new(data), archive_name, trace)
    }

    fn process_entry(
        &self,
        entry: &mut ZipFile<'_>,
        archive_name: &str,
        trace: &TraceToken,
    ) -> EntryOutcome {
        let name = entry.name().to_string();

        if entry.is_dir() {
            audit::entry_skipped(trace, archive_name, &name, DIRECTORY);
            return EntryOutcome::skipped(name, DIRECTORY);
        }

        let filename = match sanitize_member_name(&name) {
            Some(filename) => filename.to_string(),
            None => {
                audit::entry_failed(trace, archive_name, &name, UNSAFE_PATH);
                return EntryOutcome::failed(name, None, UNSAFE_PATH.to_string());
            }
        };

        let key = classification_key(&filename);
        let strategy = self.registry.resolve(&key);
        let destination = strategy.destination(&filename);
        audit::entry_classified(trace, archive_name, &filename, &key, strategy.class());

        match self.writer.write(&destination, entry) {
            Ok(bytes) => {
                audit::entry_written(trace, archive_name, &filename, &destination, bytes);
                EntryOutcome::written(name, destination)
            }
            Err(e) => {
                let reason = e.to_string();
                audit::entry_failed(trace, archive_name, &name, &reason);
                EntryOutcome::failed(name, Some(destination), reason)
            }
        }
    }
}
