// Filesystem archiver: writes timestamped raw HTML/JSON/media to the
// archive directory. The archive is append-only durable ground truth —
// these files are never renamed or deleted by the core.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use qbank_common::error::ArchiveError;
use qbank_common::naming::extension_for_mime;
use qbank_common::types::MediaBlob;
use tokio::sync::Mutex;

/// Paths written by a single `archive` call, all sharing a timestamped
/// prefix. `media_paths` is empty when the payload carried no media.
#[derive(Debug, Clone)]
pub struct ArchivedFiles {
    pub html_path: PathBuf,
    pub json_path: PathBuf,
    pub media_paths: Vec<PathBuf>,
}

/// Per-process monotonic counter, reset when the calendar day rolls over.
/// Archive names also carry a short random suffix so multiple receiver
/// processes sharing an archive root don't collide.
struct DailyCounter {
    day: NaiveDate,
    next: u64,
}

pub struct ArchiveWriter {
    root: PathBuf,
    counter: Arc<Mutex<DailyCounter>>,
}

impl ArchiveWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            counter: Arc::new(Mutex::new(DailyCounter {
                day: Utc::now().date_naive(),
                next: 0,
            })),
        }
    }

    /// The archive root directory. Used by callers that need to store a
    /// path relative to it (e.g. `Question.extraction_path`).
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn next_prefix(&self, source_name: &str) -> String {
        let now = Utc::now();
        let today = now.date_naive();

        let index = {
            let mut counter = self.counter.lock().await;
            if counter.day != today {
                counter.day = today;
                counter.next = 0;
            }
            let index = counter.next;
            counter.next += 1;
            index
        };

        let rand_suffix = random_hex_suffix();
        format!(
            "{}_{source_name}_{index}_{rand_suffix}",
            now.format("%Y%m%d_%H%M%S")
        )
    }

    /// Write one HTML file, one JSON sidecar, then one file per media blob,
    /// all sharing a timestamped prefix. Write order matters: HTML first,
    /// then JSON, then media, so a partial archive left by a crash is
    /// detectable during backfill as "JSON missing".
    pub async fn archive(
        &self,
        source_name: &str,
        raw_html: &str,
        metadata_json: &serde_json::Value,
        media: &[MediaBlob],
    ) -> Result<ArchivedFiles, ArchiveError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| io_err(&self.root, e))?;

        let prefix = self.next_prefix(source_name).await;

        let html_path = self.root.join(format!("{prefix}.html"));
        write_file(&html_path, raw_html.as_bytes()).await?;

        let json_path = self.root.join(format!("{prefix}.json"));
        let json_bytes = serde_json::to_vec_pretty(metadata_json).unwrap_or_default();
        write_file(&json_path, &json_bytes).await?;

        let mut media_paths = Vec::with_capacity(media.len());
        for (i, blob) in media.iter().enumerate() {
            let ext = extension_for_mime(&blob.mime_type);
            let media_path = self.root.join(format!("{prefix}_img{i}.{ext}"));
            write_file(&media_path, &blob.bytes).await?;
            media_paths.push(media_path);
        }

        Ok(ArchivedFiles {
            html_path,
            json_path,
            media_paths,
        })
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ArchiveError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| io_err(path, e))
}

fn io_err(path: &Path, source: std::io::Error) -> ArchiveError {
    ArchiveError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn random_hex_suffix() -> String {
    use rand::Rng;
    let value: u32 = rand::rng().random_range(0..0x0100_0000);
    format!("{value:06x}")
}
