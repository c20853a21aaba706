pub mod temporary_storage;

use async_trait::async_trait;
use contracts::usecases::u508_publish_product_card::request::MediaFile;
use std::path::Path;
use thiserror::Error;

use crate::shared::cancel::{CancelToken, Interrupted};

pub use temporary_storage::TemporaryFileStorage;

/// Ошибки файлового хранилища
#[derive(Debug, Error)]
pub enum FileStorageError {
    #[error("failed to prepare upload directory {path}: {source}")]
    Directory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write file {filename}: {source}")]
    Write {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

/// Файл для размещения
#[derive(Debug, Clone, Copy)]
pub struct FileUpload<'a> {
    pub filename: &'a str,
    pub content: &'a [u8],
    pub content_type: &'static str,
}

/// Результат размещения одного файла: публичный URL или ошибка
#[derive(Debug)]
pub struct UploadResult {
    pub filename: String,
    pub outcome: Result<String, FileStorageError>,
}

/// Хостинг файлов: превращает байты в публичные URL
#[async_trait]
pub trait FileHosting: Send + Sync {
    async fn upload(&self, files: &[FileUpload<'_>]) -> Result<Vec<UploadResult>, FileStorageError>;
}

/// Тип содержимого по расширению файла
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        _ => "application/octet-stream",
    }
}

/// Размещает медиафайлы и возвращает URL успешно загруженных
///
/// Частичный успех допустим: ошибки отдельных файлов только логируются.
pub async fn upload_media_files(
    hosting: &dyn FileHosting,
    files: &[MediaFile],
    cancel: &CancelToken,
) -> Result<Vec<String>, FileStorageError> {
    if files.is_empty() {
        return Ok(Vec::new());
    }

    let uploads: Vec<FileUpload<'_>> = files
        .iter()
        .map(|f| FileUpload {
            filename: &f.filename,
            content: &f.content,
            content_type: content_type_for(&f.filename),
        })
        .collect();

    let results = cancel.run(hosting.upload(&uploads)).await??;

    let mut urls = Vec::with_capacity(results.len());
    let mut failed = 0;
    for (i, result) in results.into_iter().enumerate() {
        match result.outcome {
            Ok(url) => urls.push(url),
            Err(e) => {
                failed += 1;
                tracing::warn!("File {} ({}) was not stored: {}", i + 1, result.filename, e);
            }
        }
    }

    if failed > 0 {
        tracing::warn!(
            "File upload completed with {} errors out of {} files, {} URLs available",
            failed,
            files.len(),
            urls.len()
        );
    }
    Ok(urls)
}
