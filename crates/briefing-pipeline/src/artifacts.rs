//! Timestamped, write-once artifact files shared between pipeline stages.
//!
//! Files are named `<prefix>_<YYYYMMDD_HHMMSS>.<ext>`. Downstream stages pick
//! the most recently modified file for a prefix.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::PipelineResult;

pub const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

/// One artifact file found on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactEntry {
    pub path: PathBuf,
    pub slug: String,
    pub modified: SystemTime,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory from `OUTPUT_DIR`, default `output`.
    pub fn from_env() -> Self {
        let dir = std::env::var("OUTPUT_DIR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string());
        Self::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> PipelineResult<()> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    pub fn timestamp_slug(now: DateTime<Utc>) -> String {
        now.format("%Y%m%d_%H%M%S").to_string()
    }

    pub fn path_for(&self, prefix: &str, slug: &str, ext: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.{}", prefix, slug, ext))
    }

    pub fn write_json<T: Serialize>(
        &self,
        prefix: &str,
        slug: &str,
        value: &T,
    ) -> PipelineResult<PathBuf> {
        let body = serde_json::to_vec_pretty(value)?;
        self.write_new(self.path_for(prefix, slug, "json"), &body)
    }

    pub fn write_text(
        &self,
        prefix: &str,
        slug: &str,
        ext: &str,
        body: &str,
    ) -> PipelineResult<PathBuf> {
        self.write_new(self.path_for(prefix, slug, ext), body.as_bytes())
    }

    fn write_new(&self, path: PathBuf, body: &[u8]) -> PipelineResult<PathBuf> {
        self.ensure_dir()?;
        // create_new: an existing artifact is never overwritten
        let mut file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        file.write_all(body)?;
        tracing::info!("Wrote artifact {}", path.display());
        Ok(path)
    }

    /// All `<prefix>_*.<ext>` files, newest modification first. A missing
    /// directory yields an empty list.
    pub fn list(&self, prefix: &str, ext: &str) -> PipelineResult<Vec<ArtifactEntry>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let head = format!("{}_", prefix);
        let tail = format!(".{}", ext);
        let mut found = Vec::new();

        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(slug) = name
                .strip_prefix(&head)
                .and_then(|rest| rest.strip_suffix(&tail))
            else {
                continue;
            };

            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }

            found.push(ArtifactEntry {
                path: entry.path(),
                slug: slug.to_string(),
                modified: metadata.modified()?,
            });
        }

        found.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.slug.cmp(&a.slug)));
        Ok(found)
    }

    /// Most recently modified `<prefix>_*.<ext>` file.
    pub fn latest(&self, prefix: &str, ext: &str) -> PipelineResult<Option<PathBuf>> {
        Ok(self.list(prefix, ext)?.into_iter().next().map(|e| e.path))
    }

    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> PipelineResult<T> {
        let body = fs::read(path)?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use std::fs::File;
    use std::time::Duration;

    fn touch(path: &Path, secs_ago: u64) {
        let when = SystemTime::now() - Duration::from_secs(secs_ago);
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(when)
            .unwrap();
    }

    #[test]
    fn test_timestamp_slug_format() {
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 7, 5, 9).unwrap();
        assert_eq!(ArtifactStore::timestamp_slug(now), "20250115_070509");
    }

    #[test]
    fn test_write_json_creates_directory_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path().join("nested/output"));

        let path = store
            .write_json("screening", "20250115_070509", &json!({"success": true}))
            .unwrap();

        assert!(path.ends_with("screening_20250115_070509.json"));
        let value: serde_json::Value = store.read_json(&path).unwrap();
        assert_eq!(value["success"], json!(true));
    }

    #[test]
    fn test_existing_artifact_is_not_overwritten() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());

        let path = store.write_text("briefing", "20250115_070509", "html", "first").unwrap();
        let second = store.write_text("briefing", "20250115_070509", "html", "second");

        assert!(second.is_err());
        assert_eq!(fs::read_to_string(path).unwrap(), "first");
    }

    #[test]
    fn test_latest_uses_modification_time_not_name() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());

        let newer_name = store.write_text("briefing", "20991231_235959", "html", "a").unwrap();
        let older_name = store.write_text("briefing", "20000101_000000", "html", "b").unwrap();
        touch(&newer_name, 3600);
        touch(&older_name, 10);

        assert_eq!(store.latest("briefing", "html").unwrap(), Some(older_name));
    }

    #[test]
    fn test_list_filters_prefix_and_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());

        store.write_text("briefing", "20250101_000000", "html", "x").unwrap();
        store.write_text("briefing", "20250101_000000", "json", "{}").unwrap();
        store.write_text("screening", "20250101_000000", "json", "{}").unwrap();
        fs::write(tmp.path().join("notes.txt"), "ignore").unwrap();

        let entries = store.list("briefing", "json").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].slug, "20250101_000000");
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path().join("absent"));
        assert!(store.list("screening", "json").unwrap().is_empty());
        assert_eq!(store.latest("screening", "json").unwrap(), None);
    }
}
