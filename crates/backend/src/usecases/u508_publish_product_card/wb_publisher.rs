use contracts::enums::marketplace_type::MarketplaceType;
use contracts::usecases::u508_publish_product_card::request::{MediaFile, PublishRequest};
use contracts::usecases::u508_publish_product_card::response::{MediaLinkOutcome, MediaOutcome};
use std::sync::Arc;
use std::time::Duration;

use super::errors::{error_payload, BranchReport, ChannelError};
use super::wildberries_api_client::{
    CardDimensions, CardListRequest, CardListResponse, CardRequestItem, CardSize,
    CardUploadPayload, CardVariant, SaveMediaPayload, WbReply, WildberriesApi,
};
use crate::shared::cancel::{CancelToken, Interrupted};
use crate::shared::content_generator::GeneratedContent;
use crate::shared::marketplaces::{preview, MarketplaceApiError};

/// Публикация карточки в Wildberries
///
/// Карточка отправляется одним запросом, после чего WB присваивает ей nmID.
/// Узнать его можно только поиском по артикулу, поэтому загрузка медиа
/// идет после отдельного шага [`WbPublisher::resolve_catalog_id`].
pub struct WbPublisher {
    api: Arc<dyn WildberriesApi>,
    max_attempts: u32,
    retry_delay: Duration,
}

/// Состояние поиска nmID
enum ResolveState {
    Searching { attempt: u32 },
    Found(i64),
    Exhausted(ChannelError),
}

impl WbPublisher {
    pub fn new(api: Arc<dyn WildberriesApi>, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            api,
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    /// Тело запроса на создание карточки; без побочных эффектов
    pub fn prepare_payload(
        request: &PublishRequest,
        content: &GeneratedContent,
    ) -> CardUploadPayload {
        let dims = request.dimensions.clone().unwrap_or_default();

        let sizes = request
            .sizes
            .iter()
            .map(|s| CardSize {
                tech_size: s.tech_size.clone(),
                wb_size: s.wb_size.clone(),
                price: s.wb_price.unwrap_or(s.price),
                skus: s.skus.clone(),
            })
            .collect();

        vec![CardRequestItem {
            subject_id: content.subject_id.unwrap_or(0),
            variants: vec![CardVariant {
                vendor_code: request.vendor_code.clone(),
                brand: request.brand.clone(),
                title: content.title.clone(),
                description: content.description.clone(),
                dimensions: CardDimensions {
                    length: dims.length,
                    width: dims.width,
                    height: dims.height,
                    weight_brutto: dims.weight_brutto,
                },
                sizes,
            }],
        }]
    }

    pub fn prepared_json(request: &PublishRequest, content: &GeneratedContent) -> String {
        let payload = Self::prepare_payload(request, content);
        serde_json::to_string(&payload).unwrap_or_else(|e| error_payload(&e.to_string()))
    }

    /// WB включен и передан ключ
    pub fn is_attempted(request: &PublishRequest) -> bool {
        request.wb && !request.wb_api_key.trim().is_empty()
    }

    /// Создание карточки. Ошибки не пробрасываются, а попадают в отчет ветки
    pub async fn submit(
        &self,
        request: &PublishRequest,
        content: &GeneratedContent,
        cancel: &CancelToken,
    ) -> BranchReport {
        if !Self::is_attempted(request) {
            tracing::info!("Wildberries publication skipped, payload prepared only");
            return BranchReport::skipped(Self::prepared_json(request, content));
        }

        if content.subject_id.is_none() {
            tracing::warn!(
                "Subject is not classified for '{}', Wildberries card will use subjectID 0",
                request.vendor_code
            );
        }

        let payload = Self::prepare_payload(request, content);
        tracing::info!(
            "Submitting card '{}' to Wildberries (subjectID {})",
            request.vendor_code,
            payload.first().map(|item| item.subject_id).unwrap_or_default()
        );

        let reply = match cancel
            .run(self.api.submit_listing(&request.wb_api_key, &payload))
            .await
        {
            Ok(result) => result,
            Err(reason) => return BranchReport::failed_with_payload(reason.into()),
        };

        match reply {
            Ok(reply @ WbReply::Accepted { .. }) => {
                tracing::info!("Wildberries accepted card '{}'", request.vendor_code);
                BranchReport::succeeded(reply.to_json())
            }
            Ok(WbReply::Rejected {
                error_text,
                additional_errors,
            }) => {
                let raw = WbReply::Rejected {
                    error_text: error_text.clone(),
                    additional_errors,
                }
                .to_json();
                tracing::error!("Wildberries rejected card: {}", error_text);
                BranchReport::failed(
                    raw,
                    ChannelError::Rejected {
                        marketplace: MarketplaceType::Wildberries,
                        error_text,
                    },
                )
            }
            Err(e) => {
                tracing::error!("Wildberries card upload failed: {}", e);
                BranchReport::failed_with_payload(ChannelError::api(MarketplaceType::Wildberries, e))
            }
        }
    }

    /// Поиск nmID по артикулу с ограниченным числом попыток
    ///
    /// Каждая попытка читает первую страницу карточек без фото. Между
    /// попытками выдерживается пауза, которую прерывает отмена.
    pub async fn resolve_catalog_id(
        &self,
        api_key: &str,
        vendor_code: &str,
        cancel: &CancelToken,
    ) -> Result<i64, ChannelError> {
        let request = CardListRequest::cards_without_photo();
        let mut state = ResolveState::Searching { attempt: 1 };

        loop {
            state = match state {
                ResolveState::Found(nm_id) => return Ok(nm_id),
                ResolveState::Exhausted(e) => return Err(e),
                ResolveState::Searching { attempt } => {
                    let lookup = cancel
                        .run(self.api.query_listing_page(api_key, &request))
                        .await?;

                    match lookup {
                        Ok(page) => match find_nm_id(&page, vendor_code) {
                            Some(nm_id) => {
                                tracing::info!(
                                    "Found nmID {} for vendor code '{}' on attempt {}",
                                    nm_id,
                                    vendor_code,
                                    attempt
                                );
                                ResolveState::Found(nm_id)
                            }
                            None => {
                                tracing::info!(
                                    "Card '{}' not found yet (attempt {}/{}, {} cards on page)",
                                    vendor_code,
                                    attempt,
                                    self.max_attempts,
                                    page.cards.len()
                                );
                                self.after_miss(attempt, vendor_code, None, cancel).await?
                            }
                        },
                        Err(MarketplaceApiError::Interrupted(reason)) => return Err(reason.into()),
                        Err(e) => {
                            tracing::warn!(
                                "Card list request failed (attempt {}/{}): {}",
                                attempt,
                                self.max_attempts,
                                e
                            );
                            self.after_miss(attempt, vendor_code, Some(e), cancel).await?
                        }
                    }
                }
            };
        }
    }

    /// Следующее состояние после неудачной попытки
    async fn after_miss(
        &self,
        attempt: u32,
        vendor_code: &str,
        last_error: Option<MarketplaceApiError>,
        cancel: &CancelToken,
    ) -> Result<ResolveState, Interrupted> {
        if attempt >= self.max_attempts {
            return Ok(ResolveState::Exhausted(ChannelError::ResolutionExhausted {
                vendor_code: vendor_code.to_string(),
                attempts: attempt,
                last_error,
            }));
        }
        cancel.sleep(self.retry_delay).await?;
        Ok(ResolveState::Searching {
            attempt: attempt + 1,
        })
    }

    /// Загрузка файлов по одному и сохранение ссылок одним пакетом
    ///
    /// Ошибка файла не останавливает остальные. Отмена останавливает пакет,
    /// уже записанные результаты остаются.
    pub async fn attach_media(
        &self,
        api_key: &str,
        nm_id: i64,
        files: &[MediaFile],
        links: &[String],
        cancel: &CancelToken,
    ) -> (Vec<MediaOutcome>, MediaLinkOutcome) {
        let mut uploads = Vec::with_capacity(files.len());

        for file in files {
            let result = cancel
                .run(self.api.upload_media_file(
                    api_key,
                    nm_id,
                    file.photo_number,
                    &file.filename,
                    &file.content,
                ))
                .await;

            let stop = result.is_err();
            let outcome = match result {
                Ok(reply) => reply_outcome(reply),
                Err(reason) => Err(ChannelError::from(reason)),
            };
            uploads.push(media_outcome(file.photo_number, outcome));
            if stop {
                tracing::warn!("Media upload for nmID {} interrupted", nm_id);
                break;
            }
        }

        let link_outcome = if links.is_empty() {
            MediaLinkOutcome::default()
        } else {
            let payload = SaveMediaPayload {
                nm_id,
                data: links.to_vec(),
            };
            let outcome = match cancel.run(self.api.save_media_links(api_key, &payload)).await {
                Ok(reply) => reply_outcome(reply),
                Err(reason) => Err(ChannelError::from(reason)),
            };
            match outcome {
                Ok(raw) => MediaLinkOutcome {
                    response: Some(raw),
                    error: None,
                },
                Err(e) => {
                    tracing::error!("Saving {} media links for nmID {} failed: {}", links.len(), nm_id, e);
                    MediaLinkOutcome {
                        response: None,
                        error: Some(e.to_string()),
                    }
                }
            }
        };

        (uploads, link_outcome)
    }

    /// Медиа карточки: поиск nmID, затем загрузка файлов и ссылок
    pub async fn publish_media(
        &self,
        request: &PublishRequest,
        cancel: &CancelToken,
    ) -> (Vec<MediaOutcome>, MediaLinkOutcome) {
        if request.media_files.is_empty() && request.media_links.is_empty() {
            return (Vec::new(), MediaLinkOutcome::default());
        }

        match self
            .resolve_catalog_id(&request.wb_api_key, &request.vendor_code, cancel)
            .await
        {
            Ok(nm_id) => {
                self.attach_media(
                    &request.wb_api_key,
                    nm_id,
                    &request.media_files,
                    &request.media_links,
                    cancel,
                )
                .await
            }
            Err(e) => {
                tracing::error!("Media for '{}' not uploaded: {}", request.vendor_code, e);
                let message = e.to_string();
                let uploads = request
                    .media_files
                    .iter()
                    .map(|f| MediaOutcome {
                        photo_number: f.photo_number,
                        response: None,
                        error: Some(message.clone()),
                    })
                    .collect();
                let links = if request.media_links.is_empty() {
                    MediaLinkOutcome::default()
                } else {
                    MediaLinkOutcome {
                        response: None,
                        error: Some(message),
                    }
                };
                (uploads, links)
            }
        }
    }
}

/// Первое точное совпадение артикула на странице
fn find_nm_id(page: &CardListResponse, vendor_code: &str) -> Option<i64> {
    page.cards
        .iter()
        .find(|card| card.vendor_code == vendor_code)
        .map(|card| card.nm_id)
}

/// Ответ WB на медиа-запрос: сырой конверт или ошибка
fn reply_outcome(reply: Result<WbReply, MarketplaceApiError>) -> Result<String, ChannelError> {
    match reply {
        Ok(WbReply::Rejected { error_text, .. }) => Err(ChannelError::Rejected {
            marketplace: MarketplaceType::Wildberries,
            error_text,
        }),
        Ok(reply) => Ok(reply.to_json()),
        Err(e) => Err(ChannelError::api(MarketplaceType::Wildberries, e)),
    }
}

fn media_outcome(photo_number: i32, outcome: Result<String, ChannelError>) -> MediaOutcome {
    match outcome {
        Ok(raw) => {
            tracing::debug!("Photo {} uploaded: {}", photo_number, preview(&raw));
            MediaOutcome {
                photo_number,
                response: Some(raw),
                error: None,
            }
        }
        Err(e) => {
            tracing::error!("Photo {} upload failed: {}", photo_number, e);
            MediaOutcome {
                photo_number,
                response: None,
                error: Some(e.to_string()),
            }
        }
    }
}
