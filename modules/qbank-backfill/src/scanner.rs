// One-shot backfill scanner: walks an archive directory written by
// `qbank-archive`'s `ArchiveWriter` and re-ingests any triples that never
// made it into the catalog (e.g. the receiver was down when `persist_to_catalog`
// would have run, or this is the first import of an archive carried over from
// elsewhere). Grounded on the archive's own filename convention, not a
// separate manifest — the directory is the source of truth.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use qbank_common::types::MediaBlob;
use qbank_ingest::Orchestrator;

use crate::report::BackfillReport;

#[derive(Debug, Default)]
struct Triple {
    html: Option<PathBuf>,
    json: Option<PathBuf>,
    media: Vec<(usize, PathBuf)>,
}

/// Walk `archive_root` (non-recursive, matching `ArchiveWriter` which never
/// creates subdirectories) and ingest every complete triple found.
pub async fn run_backfill(archive_root: &Path, orchestrator: &Orchestrator) -> BackfillReport {
    let mut report = BackfillReport::default();

    let mut entries = match tokio::fs::read_dir(archive_root).await {
        Ok(entries) => entries,
        Err(e) => {
            report.errors.push(format!("cannot read archive root {}: {e}", archive_root.display()));
            return report;
        }
    };

    let mut triples: BTreeMap<String, Triple> = BTreeMap::new();

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                report.errors.push(format!("error reading archive directory entry: {e}"));
                break;
            }
        };

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        match classify(&path) {
            Some(FileKind::Html(prefix)) => triples.entry(prefix).or_default().html = Some(path),
            Some(FileKind::Json(prefix)) => triples.entry(prefix).or_default().json = Some(path),
            Some(FileKind::Media(prefix, index)) => {
                triples.entry(prefix).or_default().media.push((index, path))
            }
            None => {}
        }
    }

    for (prefix, mut triple) in triples {
        report.scanned += 1;
        triple.media.sort_by_key(|(index, _)| *index);

        if let Err(reason) = ingest_triple(&prefix, &triple, orchestrator).await {
            report.skipped += 1;
            report.errors.push(format!("{prefix}: {reason}"));
        } else {
            report.ingested += 1;
        }
    }

    report
}

async fn ingest_triple(prefix: &str, triple: &Triple, orchestrator: &Orchestrator) -> Result<(), String> {
    let html_path = triple.html.clone().ok_or("missing HTML file")?;
    let json_path = triple.json.clone().ok_or("missing JSON sidecar (partial archive)")?;
    let source_name = parse_source_from_prefix(prefix).ok_or("malformed archive filename prefix")?;

    let raw_html = tokio::fs::read_to_string(&html_path)
        .await
        .map_err(|e| format!("unreadable HTML: {e}"))?;

    let json_bytes = tokio::fs::read(&json_path)
        .await
        .map_err(|e| format!("unreadable JSON sidecar: {e}"))?;
    let metadata_json: serde_json::Value =
        serde_json::from_slice(&json_bytes).map_err(|e| format!("invalid JSON sidecar: {e}"))?;

    let mut media = Vec::with_capacity(triple.media.len());
    let mut media_paths = Vec::with_capacity(triple.media.len());
    for (_, media_path) in &triple.media {
        let bytes = tokio::fs::read(media_path)
            .await
            .map_err(|e| format!("unreadable media file {}: {e}", media_path.display()))?;
        let mime_type = mime_for_extension(media_path).to_string();
        media.push(MediaBlob {
            bytes,
            suggested_filename: media_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            mime_type,
        });
        media_paths.push(media_path.clone());
    }

    let source_question_key = qbank_common::naming::derive_source_question_key("", &raw_html);

    orchestrator
        .ingest_archived(
            &source_name,
            &source_question_key,
            raw_html,
            metadata_json,
            html_path,
            json_path,
            media_paths,
            &media,
        )
        .await
        .map_err(|e| format!("catalog persistence failed: {e}"))?;

    Ok(())
}

enum FileKind {
    Html(String),
    Json(String),
    Media(String, usize),
}

/// Classify a file by the `ArchiveWriter` naming convention:
/// `{prefix}.html`, `{prefix}.json`, `{prefix}_img{N}.{ext}`.
fn classify(path: &Path) -> Option<FileKind> {
    let stem = path.file_stem()?.to_str()?;
    let ext = path.extension()?.to_str()?;

    match ext {
        "html" => Some(FileKind::Html(stem.to_string())),
        "json" => Some(FileKind::Json(stem.to_string())),
        _ => {
            let idx = stem.rfind("_img")?;
            let (prefix, rest) = stem.split_at(idx);
            let index: usize = rest["_img".len()..].parse().ok()?;
            Some(FileKind::Media(prefix.to_string(), index))
        }
    }
}

/// The archive prefix is `{date}_{time}_{source}_{index}_{rand}`. `source`
/// is always a single token because `normalize_source_name` slugifies with
/// hyphens, never underscores.
fn parse_source_from_prefix(prefix: &str) -> Option<String> {
    let parts: Vec<&str> = prefix.split('_').collect();
    if parts.len() != 5 {
        return None;
    }
    Some(parts[2].to_string())
}

fn mime_for_extension(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_html_json_and_media_filenames() {
        let prefix = "20260101_120000_questionbankpro_0_ab12cd";

        match classify(Path::new(&format!("{prefix}.html"))).unwrap() {
            FileKind::Html(p) => assert_eq!(p, prefix),
            _ => panic!("expected Html"),
        }
        match classify(Path::new(&format!("{prefix}.json"))).unwrap() {
            FileKind::Json(p) => assert_eq!(p, prefix),
            _ => panic!("expected Json"),
        }
        match classify(Path::new(&format!("{prefix}_img0.jpg"))).unwrap() {
            FileKind::Media(p, idx) => {
                assert_eq!(p, prefix);
                assert_eq!(idx, 0);
            }
            _ => panic!("expected Media"),
        }
    }

    #[test]
    fn classify_ignores_unrelated_files() {
        assert!(classify(Path::new("README.md")).is_none());
        assert!(classify(Path::new("notes.txt")).is_none());
    }

    #[test]
    fn parses_source_token_from_well_formed_prefix() {
        assert_eq!(
            parse_source_from_prefix("20260101_120000_sourcea_3_ab12cd"),
            Some("sourcea".to_string())
        );
    }

    #[test]
    fn rejects_prefix_with_wrong_token_count() {
        assert_eq!(parse_source_from_prefix("not-an-archive-name"), None);
    }
}
