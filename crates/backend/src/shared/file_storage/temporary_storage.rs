use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use super::{FileHosting, FileStorageError, FileUpload, UploadResult};

/// Временное хранилище файлов на локальном диске
///
/// Файлы раздаются HTTP-сервером по `base_url` и удаляются фоновой задачей
/// по истечении TTL.
pub struct TemporaryFileStorage {
    upload_dir: PathBuf,
    base_url: String,
    file_ttl: Duration,
}

impl TemporaryFileStorage {
    pub fn new(
        upload_dir: impl Into<PathBuf>,
        base_url: &str,
        file_ttl: Duration,
    ) -> Result<Self, FileStorageError> {
        let upload_dir = upload_dir.into();
        std::fs::create_dir_all(&upload_dir).map_err(|source| FileStorageError::Directory {
            path: upload_dir.display().to_string(),
            source,
        })?;

        let storage = Self {
            upload_dir,
            base_url: base_url.trim_end_matches('/').to_string(),
            file_ttl,
        };
        tracing::info!(
            "Temporary file storage: dir={}, base_url={}, ttl={:?}",
            storage.upload_dir.display(),
            storage.base_url,
            storage.file_ttl
        );
        Ok(storage)
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Запускает периодическую очистку устаревших файлов
    pub fn spawn_cleanup(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(
                "File cleanup task started: every {:?}, ttl {:?}",
                every,
                self.file_ttl
            );
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // Первый тик срабатывает сразу
            ticker.tick().await;

            loop {
                ticker.tick().await;
                self.cleanup_expired().await;
            }
        })
    }

    /// Удаляет файлы старше TTL, возвращает число удаленных
    pub async fn cleanup_expired(&self) -> usize {
        let cutoff = SystemTime::now()
            .checked_sub(self.file_ttl)
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let mut entries = match tokio::fs::read_dir(&self.upload_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("Cleanup failed to read {}: {}", self.upload_dir.display(), e);
                return 0;
            }
        };

        let mut deleted = 0;
        let mut errors = 0;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            if meta.is_dir() {
                continue;
            }
            let expired = meta.modified().map(|m| m <= cutoff).unwrap_or(false);
            if !expired {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => deleted += 1,
                Err(e) => {
                    errors += 1;
                    tracing::warn!("Failed to delete {}: {}", entry.path().display(), e);
                }
            }
        }

        tracing::info!("Cleanup completed: deleted {} files, {} errors", deleted, errors);
        deleted
    }
}

#[async_trait]
impl FileHosting for TemporaryFileStorage {
    async fn upload(&self, files: &[FileUpload<'_>]) -> Result<Vec<UploadResult>, FileStorageError> {
        tracing::info!(
            "Uploading {} files to {}",
            files.len(),
            self.upload_dir.display()
        );

        let mut results = Vec::with_capacity(files.len());
        for file in files {
            let unique = unique_filename(file.filename);
            let path = self.upload_dir.join(&unique);

            let outcome = match tokio::fs::write(&path, file.content).await {
                Ok(()) => {
                    let url = format!("{}/{}", self.base_url, unique);
                    tracing::info!(
                        "Stored {} ({}, {} bytes) -> {}",
                        file.filename,
                        file.content_type,
                        file.content.len(),
                        url
                    );
                    Ok(url)
                }
                Err(source) => {
                    tracing::error!("Failed to write {}: {}", path.display(), source);
                    Err(FileStorageError::Write {
                        filename: file.filename.to_string(),
                        source,
                    })
                }
            };

            results.push(UploadResult {
                filename: file.filename.to_string(),
                outcome,
            });
        }
        Ok(results)
    }
}

/// `<unix_ts>_<16 hex>_<base><ext>`
pub fn unique_filename(original: &str) -> String {
    let ext = Path::new(original)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let base = original.strip_suffix(ext.as_str()).unwrap_or(original);
    let base = base.replace([' ', '/', '\\'], "_");

    let timestamp = chrono::Utc::now().timestamp();
    let random: [u8; 8] = rand::random();
    let random_hex: String = random.iter().map(|b| format!("{:02x}", b)).collect();

    format!("{}_{}_{}{}", timestamp, random_hex, base, ext)
}
