//! Фейковые коллабораторы для тестов публикации

use async_trait::async_trait;
use contracts::usecases::u508_publish_product_card::request::{
    Dimensions, MediaFile, PublishRequest, SizeVariant,
};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::ozon_api_client::{OzonApi, ProductImportRequest, ProductImportResponse, ProductImportResult};
use super::wildberries_api_client::{
    CardDefinition, CardListRequest, CardListResponse, CardUploadPayload, SaveMediaPayload,
    WbReply, WildberriesApi,
};
use crate::domain::a001_api_key_balance::{BillingError, BillingLedger};
use crate::shared::cancel::CancelToken;
use crate::shared::content_generator::{
    ContentGenerator, ContentGeneratorError, ContentRequest, GeneratedContent,
};
use crate::shared::file_storage::{FileHosting, FileStorageError, FileUpload, UploadResult};
use crate::shared::marketplaces::MarketplaceApiError;

pub fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

pub fn generated_content() -> GeneratedContent {
    GeneratedContent {
        title: "Кружка керамическая".into(),
        description: "Белая кружка 300 мл".into(),
        attributes: BTreeMap::from([("Цвет".to_string(), "белый".to_string())]),
        parent_id: Some(1),
        parent_name: Some("Посуда".into()),
        subject_id: Some(105),
        subject_name: Some("Кружки".into()),
        type_id: Some(94765),
        type_name: Some("Кружка".into()),
        root_id: Some(7),
        root_name: Some("Дом".into()),
        sub_id: Some(17028922),
        sub_name: Some("Кружки и чашки".into()),
        session_id: "session-1".into(),
    }
}

pub fn media_file(photo_number: i32) -> MediaFile {
    MediaFile {
        filename: format!("photo{}.jpg", photo_number),
        content: vec![0xFF, 0xD8, photo_number as u8],
        photo_number,
    }
}

/// Запрос, валидный для обоих маркетплейсов
pub fn full_request() -> PublishRequest {
    PublishRequest {
        product_title: "Кружка".into(),
        product_description: "Керамика".into(),
        wb: true,
        ozon: true,
        wb_api_key: "wb-key".into(),
        ozon_client_id: "42".into(),
        ozon_api_key: "ozon-key".into(),
        vendor_code: "V100".into(),
        brand: "Acme".into(),
        dimensions: Some(Dimensions {
            length: Some(10),
            width: Some(8),
            height: Some(12),
            weight_brutto: Some(0.35),
            depth: Some(100),
            weight: Some(350),
            dimension_unit: "mm".into(),
            weight_unit: "g".into(),
        }),
        sizes: vec![SizeVariant {
            tech_size: "0".into(),
            wb_size: String::new(),
            price: 990,
            wb_price: Some(1090),
            ozon_price: Some(1190),
            skus: vec!["4600000000017".into()],
        }],
        ..Default::default()
    }
}

pub fn card(nm_id: i64, vendor_code: &str) -> CardDefinition {
    CardDefinition {
        nm_id,
        vendor_code: vendor_code.to_string(),
    }
}

pub fn page(cards: Vec<CardDefinition>) -> Result<CardListResponse, MarketplaceApiError> {
    Ok(CardListResponse { cards })
}

pub const TEST_RETRY_DELAY: Duration = Duration::from_millis(1);

// ============================================================================
// Wildberries
// ============================================================================

#[derive(Default)]
pub struct FakeWb {
    pub submit_calls: AtomicUsize,
    pub query_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    pub save_calls: AtomicUsize,
    pub submit_fails: bool,
    pub submit_rejects: bool,
    /// Ответы поиска по очереди; когда кончились, отдается пустая страница
    pub pages: Mutex<VecDeque<Result<CardListResponse, MarketplaceApiError>>>,
    pub failing_photos: Vec<i32>,
    pub uploaded: Mutex<Vec<(i64, i32)>>,
    pub saved: Mutex<Vec<SaveMediaPayload>>,
    pub submitted: Mutex<Vec<CardUploadPayload>>,
}

impl FakeWb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(
        self,
        pages: Vec<Result<CardListResponse, MarketplaceApiError>>,
    ) -> Self {
        *self.pages.lock().unwrap() = pages.into();
        self
    }

    /// Карточка находится с первой попытки
    pub fn finding(nm_id: i64, vendor_code: &str) -> Self {
        Self::new().with_pages(vec![page(vec![card(nm_id, vendor_code)])])
    }

    pub fn total_calls(&self) -> usize {
        count(&self.submit_calls)
            + count(&self.query_calls)
            + count(&self.upload_calls)
            + count(&self.save_calls)
    }
}

#[async_trait]
impl WildberriesApi for FakeWb {
    async fn submit_listing(
        &self,
        _api_key: &str,
        payload: &CardUploadPayload,
    ) -> Result<WbReply, MarketplaceApiError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().push(payload.clone());
        if self.submit_fails {
            return Err(MarketplaceApiError::Transport("Connection error: refused".into()));
        }
        if self.submit_rejects {
            return Ok(WbReply::Rejected {
                error_text: "Duplicate vendor code".into(),
                additional_errors: None,
            });
        }
        Ok(WbReply::Accepted { data: None })
    }

    async fn query_listing_page(
        &self,
        _api_key: &str,
        _request: &CardListRequest,
    ) -> Result<CardListResponse, MarketplaceApiError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| page(vec![]))
    }

    async fn upload_media_file(
        &self,
        _api_key: &str,
        nm_id: i64,
        photo_number: i32,
        _filename: &str,
        _content: &[u8],
    ) -> Result<WbReply, MarketplaceApiError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_photos.contains(&photo_number) {
            return Err(MarketplaceApiError::Transport("Request timeout".into()));
        }
        self.uploaded.lock().unwrap().push((nm_id, photo_number));
        Ok(WbReply::Accepted { data: None })
    }

    async fn save_media_links(
        &self,
        _api_key: &str,
        payload: &SaveMediaPayload,
    ) -> Result<WbReply, MarketplaceApiError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.saved.lock().unwrap().push(payload.clone());
        Ok(WbReply::Accepted { data: None })
    }
}

// ============================================================================
// Ozon
// ============================================================================

#[derive(Default)]
pub struct FakeOzon {
    pub import_calls: AtomicUsize,
    pub import_fails: bool,
    pub imported: Mutex<Vec<ProductImportRequest>>,
}

#[async_trait]
impl OzonApi for FakeOzon {
    async fn import_listing(
        &self,
        _client_id: &str,
        _api_key: &str,
        request: &ProductImportRequest,
    ) -> Result<ProductImportResponse, MarketplaceApiError> {
        self.import_calls.fetch_add(1, Ordering::SeqCst);
        self.imported.lock().unwrap().push(request.clone());
        if self.import_fails {
            return Err(MarketplaceApiError::Status {
                status: 400,
                body: "invalid category".into(),
            });
        }
        Ok(ProductImportResponse {
            result: ProductImportResult { task_id: 555 },
        })
    }
}

// ============================================================================
// File hosting
// ============================================================================

#[derive(Default)]
pub struct FakeHosting {
    pub upload_calls: AtomicUsize,
    pub fail_all: bool,
}

#[async_trait]
impl FileHosting for FakeHosting {
    async fn upload(&self, files: &[FileUpload<'_>]) -> Result<Vec<UploadResult>, FileStorageError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        Ok(files
            .iter()
            .map(|f| UploadResult {
                filename: f.filename.to_string(),
                outcome: if self.fail_all {
                    Err(FileStorageError::Write {
                        filename: f.filename.to_string(),
                        source: std::io::Error::new(std::io::ErrorKind::Other, "read-only"),
                    })
                } else {
                    Ok(format!("http://files.local/uploads/{}", f.filename))
                },
            })
            .collect())
    }
}

// ============================================================================
// Content generator / billing
// ============================================================================

#[derive(Default)]
pub struct FakeGenerator {
    pub calls: AtomicUsize,
    pub fails: bool,
    pub content: Option<GeneratedContent>,
}

impl FakeGenerator {
    pub fn returning(content: GeneratedContent) -> Self {
        Self {
            content: Some(content),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ContentGenerator for FakeGenerator {
    async fn get_content(
        &self,
        _request: &ContentRequest,
        _cancel: &CancelToken,
    ) -> Result<GeneratedContent, ContentGeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fails {
            return Err(ContentGeneratorError::Status {
                status: 500,
                body: "model crashed".into(),
            });
        }
        Ok(self.content.clone().unwrap_or_else(generated_content))
    }
}

#[derive(Default)]
pub struct FakeLedger {
    pub debit_calls: AtomicUsize,
    pub fails: bool,
    pub debited: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl BillingLedger for FakeLedger {
    async fn debit_for_session(&self, api_key: &str, session_id: &str) -> Result<(), BillingError> {
        self.debit_calls.fetch_add(1, Ordering::SeqCst);
        self.debited
            .lock()
            .unwrap()
            .push((api_key.to_string(), session_id.to_string()));
        if self.fails {
            return Err(BillingError::Storage("database is locked".into()));
        }
        Ok(())
    }

    async fn balance(&self, _api_key: &str) -> Result<Option<i64>, BillingError> {
        Ok(Some(100))
    }
}
