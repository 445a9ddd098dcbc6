/*
 * One-off backfill that attaches thumbnail paths to ready video records.
 * For each pending record the expected thumbnail lives at
 * `{media_root}/hls/videos/{id}/thumbnail.jpg`; when that file exists its path
 * relative to the media root is stored on the record, otherwise a warning is
 * logged and the record is left alone.
 *
 * Persistence is reached through `VideoRepository`, so the decision logic does
 * not depend on a particular store. `JsonFileVideoRepository` keeps records in
 * a JSON array on disk; `InMemoryVideoRepository` serves tests and embedding.
 * Every save is independent and immediate; there is no retry and no
 * transaction spanning several records. A failed save is counted and logged,
 * and the remaining records are still processed.
 */
use super::path_utils::relative_forward_slash;
use super::settings::AppSettings;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const THUMBNAIL_FILENAME: &str = "thumbnail.jpg";

#[derive(Debug)]
pub enum BackfillError {
    Io(PathBuf, io::Error),
    Serde(PathBuf, serde_json::Error),
    RecordNotFound(u64),
}

impl std::fmt::Display for BackfillError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackfillError::Io(path, e) => write!(f, "I/O error for {path:?}: {e}"),
            BackfillError::Serde(path, e) => write!(f, "Invalid video records in {path:?}: {e}"),
            BackfillError::RecordNotFound(id) => write!(f, "Video record {id} not found"),
        }
    }
}

impl std::error::Error for BackfillError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BackfillError::Io(_, e) => Some(e),
            BackfillError::Serde(_, e) => Some(e),
            BackfillError::RecordNotFound(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BackfillError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VideoStatus {
    Pending,
    Uploaded,
    Processing,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: u64,
    pub status: VideoStatus,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl VideoRecord {
    // Ready and without a thumbnail (missing or empty).
    pub fn needs_thumbnail(&self) -> bool {
        self.status == VideoStatus::Ready && self.thumbnail.as_deref().is_none_or(str::is_empty)
    }
}

// Fields a `save` call may write back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoField {
    Thumbnail,
}

pub trait VideoRepository {
    fn find_pending(&self) -> Result<Vec<VideoRecord>>;
    fn save(&mut self, record: &VideoRecord, fields: &[VideoField]) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub updated: usize,
    pub missing: usize,
    pub failed: usize,
}

pub fn expected_thumbnail_path(media_root: &Path, video_id: u64) -> PathBuf {
    media_root
        .join("hls")
        .join("videos")
        .join(video_id.to_string())
        .join(THUMBNAIL_FILENAME)
}

pub fn backfill_thumbnails(
    repo: &mut dyn VideoRepository,
    settings: &AppSettings,
) -> Result<BackfillReport> {
    let media_root = &settings.media_root;
    let pending = repo.find_pending()?;
    log::info!(
        "ThumbnailBackfill: {} ready videos without thumbnail.",
        pending.len()
    );

    let mut report = BackfillReport::default();
    for mut record in pending {
        let path = expected_thumbnail_path(media_root, record.id);
        if !path.is_file() {
            log::warn!(
                "ThumbnailBackfill: Thumbnail missing for video {} at {path:?}, skipping.",
                record.id
            );
            report.missing += 1;
            continue;
        }

        let relative = relative_forward_slash(&path, media_root)
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        record.thumbnail = Some(relative);
        if let Err(e) = repo.save(&record, &[VideoField::Thumbnail]) {
            log::warn!(
                "ThumbnailBackfill: Failed to save video {}, continuing: {e}",
                record.id
            );
            report.failed += 1;
            continue;
        }
        log::info!(
            "ThumbnailBackfill: Video {} thumbnail set to '{}'.",
            record.id,
            record.thumbnail.as_deref().unwrap_or_default()
        );
        report.updated += 1;
    }

    Ok(report)
}

fn apply_fields(target: &mut VideoRecord, source: &VideoRecord, fields: &[VideoField]) {
    for field in fields {
        match field {
            VideoField::Thumbnail => target.thumbnail = source.thumbnail.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryVideoRepository {
    records: Vec<VideoRecord>,
}

impl InMemoryVideoRepository {
    pub fn new(records: Vec<VideoRecord>) -> Self {
        InMemoryVideoRepository { records }
    }

    pub fn records(&self) -> &[VideoRecord] {
        &self.records
    }
}

impl VideoRepository for InMemoryVideoRepository {
    fn find_pending(&self) -> Result<Vec<VideoRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.needs_thumbnail())
            .cloned()
            .collect())
    }

    fn save(&mut self, record: &VideoRecord, fields: &[VideoField]) -> Result<()> {
        let target = self
            .records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or(BackfillError::RecordNotFound(record.id))?;
        apply_fields(target, record, fields);
        Ok(())
    }
}

/*
 * Records stored as a JSON array in one file. The whole file is rewritten on
 * every `save` so each update is persisted as soon as it is made.
 */
pub struct JsonFileVideoRepository {
    path: PathBuf,
    inner: InMemoryVideoRepository,
}

impl JsonFileVideoRepository {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| BackfillError::Io(path.to_path_buf(), e))?;
        let records: Vec<VideoRecord> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| BackfillError::Serde(path.to_path_buf(), e))?;
        log::debug!(
            "JsonFileVideoRepository: Loaded {} records from {path:?}.",
            records.len()
        );
        Ok(JsonFileVideoRepository {
            path: path.to_path_buf(),
            inner: InMemoryVideoRepository::new(records),
        })
    }

    fn persist(&self) -> Result<()> {
        let file = File::create(&self.path).map_err(|e| BackfillError::Io(self.path.clone(), e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self.inner.records())
            .map_err(|e| BackfillError::Serde(self.path.clone(), e))?;
        writer
            .flush()
            .map_err(|e| BackfillError::Io(self.path.clone(), e))
    }
}

impl VideoRepository for JsonFileVideoRepository {
    fn find_pending(&self) -> Result<Vec<VideoRecord>> {
        self.inner.find_pending()
    }

    fn save(&mut self, record: &VideoRecord, fields: &[VideoField]) -> Result<()> {
        self.inner.save(record, fields)?;
        self.persist()
    }
}
