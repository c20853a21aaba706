use contracts::enums::marketplace_type::MarketplaceType;
use contracts::usecases::u508_publish_product_card::request::PublishRequest;
use contracts::usecases::u508_publish_product_card::response::PublishResponse;
use std::sync::Arc;
use tokio::task::JoinError;
use tracing::Instrument;

use super::errors::{BranchReport, ChannelError, PublishError};
use super::ozon_publisher::OzonPublisher;
use super::result_builder::build_response;
use super::validation::validate_request;
use super::wb_publisher::WbPublisher;
use crate::domain::a001_api_key_balance::BillingLedger;
use crate::shared::cancel::CancelToken;
use crate::shared::content_generator::{ContentGenerator, ContentRequest};

/// Executor для UseCase публикации карточки товара
///
/// Порядок: валидация, генерация контента, списание за токены,
/// параллельная публикация в WB и Ozon, затем медиа WB.
/// Ошибкой завершаются только валидация и генерация контента,
/// остальные сбои попадают в ответ.
pub struct PublishExecutor {
    generator: Arc<dyn ContentGenerator>,
    billing: Arc<dyn BillingLedger>,
    wb: Arc<WbPublisher>,
    ozon: Arc<OzonPublisher>,
}

impl PublishExecutor {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        billing: Arc<dyn BillingLedger>,
        wb: Arc<WbPublisher>,
        ozon: Arc<OzonPublisher>,
    ) -> Self {
        Self {
            generator,
            billing,
            wb,
            ozon,
        }
    }

    pub async fn publish(
        &self,
        caller_key: &str,
        request: PublishRequest,
        cancel: &CancelToken,
    ) -> Result<PublishResponse, PublishError> {
        validate_request(&request)?;

        tracing::info!(
            "Publishing '{}' (vendor code '{}', wb={}, ozon={})",
            request.product_title,
            request.vendor_code,
            request.wb,
            request.ozon
        );

        let content = self
            .generator
            .get_content(&content_request(&request), cancel)
            .await
            .map_err(|e| {
                tracing::error!("Content generation failed: {}", e);
                PublishError::from(e)
            })?;

        self.debit(caller_key, &content.session_id, cancel).await;

        let request = Arc::new(request);
        let content = Arc::new(content);

        let wb_task = {
            let (wb, request, content, cancel) =
                (self.wb.clone(), request.clone(), content.clone(), cancel.clone());
            tokio::spawn(
                async move { wb.submit(&request, &content, &cancel).await }
                    .instrument(tracing::Span::current()),
            )
        };
        let ozon_task = {
            let (ozon, request, content, cancel) =
                (self.ozon.clone(), request.clone(), content.clone(), cancel.clone());
            tokio::spawn(
                async move { ozon.submit(&request, &content, &cancel).await }
                    .instrument(tracing::Span::current()),
            )
        };

        let (wb_joined, ozon_joined) = tokio::join!(wb_task, ozon_task);
        let wb_report = joined_report(
            MarketplaceType::Wildberries,
            WbPublisher::is_attempted(&request),
            wb_joined,
        );
        let ozon_report = joined_report(
            MarketplaceType::Ozon,
            OzonPublisher::is_attempted(&request),
            ozon_joined,
        );

        log_branch(MarketplaceType::Wildberries, &wb_report);
        log_branch(MarketplaceType::Ozon, &ozon_report);

        let media = if wb_report.is_clean() {
            Some(self.wb.publish_media(&request, cancel).await)
        } else {
            None
        };

        Ok(build_response(
            &content,
            wb_report.outcome,
            ozon_report.outcome,
            media,
        ))
    }

    /// Списание за генерацию; сбой не мешает публикации
    async fn debit(&self, caller_key: &str, session_id: &str, cancel: &CancelToken) {
        match cancel
            .run(self.billing.debit_for_session(caller_key, session_id))
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Billing for session {} failed: {}", session_id, e),
            Err(reason) => tracing::warn!("Billing for session {} skipped: {}", session_id, reason),
        }
    }
}

fn content_request(request: &PublishRequest) -> ContentRequest {
    ContentRequest {
        product_title: request.product_title.clone(),
        product_description: request.product_description.clone(),
        parent_id: request.parent_id,
        subject_id: request.subject_id,
        translate: request.translate,
        ozon: request.ozon,
        generate_content: request.generate_content,
    }
}

fn joined_report(
    marketplace: MarketplaceType,
    attempted: bool,
    joined: Result<BranchReport, JoinError>,
) -> BranchReport {
    joined.unwrap_or_else(|e| {
        tracing::error!("{} publication task failed: {}", marketplace, e);
        BranchReport::task_failed(attempted, ChannelError::TaskFailed(e.to_string()))
    })
}

fn log_branch(marketplace: MarketplaceType, report: &BranchReport) {
    match (&report.error, report.outcome.attempted) {
        (Some(e), _) => tracing::error!("{} publication failed: {}", marketplace, e),
        (None, true) => tracing::info!("{} publication succeeded", marketplace),
        (None, false) => tracing::info!("{} publication not attempted", marketplace),
    }
}
