// Media relocator: copies media from the archive into a canonical
// per-source media root with deterministic, content-addressed-enough names.

use std::path::{Path, PathBuf};

use qbank_common::error::ArchiveError;
use qbank_common::naming::{content_hash, extension_for_mime};

pub struct MediaRelocator {
    root: PathBuf,
}

impl MediaRelocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Destination path relative to the media root, before any write: a pure
    /// function of `(source_name, source_question_key, index, mime_type)`.
    pub fn relative_path(
        &self,
        source_name: &str,
        source_question_key: &str,
        index: usize,
        mime_type: &str,
    ) -> PathBuf {
        let ext = extension_for_mime(mime_type);
        PathBuf::from(source_name).join(format!("{source_question_key}_img{index}.{ext}"))
    }

    /// Copy `bytes` into the canonical destination for this media item. If
    /// the destination already holds identical bytes, the write is skipped;
    /// otherwise it's overwritten — media content for a question key is
    /// treated as the authoritative latest version.
    ///
    /// Returns the path relative to the media root.
    pub async fn relocate(
        &self,
        source_name: &str,
        source_question_key: &str,
        index: usize,
        bytes: &[u8],
        mime_type: &str,
    ) -> Result<PathBuf, ArchiveError> {
        let relative = self.relative_path(source_name, source_question_key, index, mime_type);
        let destination = self.root.join(&relative);

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_err(parent, e))?;
        }

        if let Some(existing) = read_if_exists(&destination).await? {
            if content_hash(&existing) == content_hash(bytes) {
                return Ok(relative);
            }
        }

        tokio::fs::write(&destination, bytes)
            .await
            .map_err(|e| io_err(&destination, e))?;

        Ok(relative)
    }
}

async fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>, ArchiveError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_err(path, e)),
    }
}

fn io_err(path: &Path, source: std::io::Error) -> ArchiveError {
    ArchiveError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn relative_path_is_deterministic() {
        let relocator = MediaRelocator::new("/tmp/ignored");
        let a = relocator.relative_path("sourcea", "q008", 0, "image/jpeg");
        let b = relocator.relative_path("sourcea", "q008", 0, "image/jpeg");
        assert_eq!(a, b);
        assert_eq!(a, PathBuf::from("sourcea").join("q008_img0.jpg"));
    }

    #[tokio::test]
    async fn relocate_skips_identical_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let relocator = MediaRelocator::new(dir.path());

        let first = relocator
            .relocate("sourcea", "q008", 0, b"same-bytes", "image/jpeg")
            .await
            .unwrap();
        let destination = dir.path().join(&first);
        let mtime_before = tokio::fs::metadata(&destination).await.unwrap().modified().unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let second = relocator
            .relocate("sourcea", "q008", 0, b"same-bytes", "image/jpeg")
            .await
            .unwrap();
        let mtime_after = tokio::fs::metadata(&destination).await.unwrap().modified().unwrap();

        assert_eq!(first, second);
        assert_eq!(mtime_before, mtime_after, "identical bytes should not trigger a rewrite");
    }

    #[tokio::test]
    async fn relocate_overwrites_changed_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let relocator = MediaRelocator::new(dir.path());

        let path = relocator
            .relocate("sourcea", "q008", 0, b"version-one", "image/jpeg")
            .await
            .unwrap();
        relocator
            .relocate("sourcea", "q008", 0, b"version-two", "image/jpeg")
            .await
            .unwrap();

        let contents = tokio::fs::read(dir.path().join(&path)).await.unwrap();
        assert_eq!(contents, b"version-two");
    }
}
