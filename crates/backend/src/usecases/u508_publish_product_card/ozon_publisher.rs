use contracts::enums::marketplace_type::MarketplaceType;
use contracts::usecases::u508_publish_product_card::request::{Dimensions, PublishRequest};
use std::sync::Arc;

use super::errors::{error_payload, BranchReport, ChannelError};
use super::ozon_api_client::{
    OzonApi, ProductAttribute, ProductImportItem, ProductImportRequest, ATTRIBUTE_BRAND,
    ATTRIBUTE_MODEL_NAME,
};
use crate::shared::cancel::CancelToken;
use crate::shared::content_generator::GeneratedContent;
use crate::shared::file_storage::{upload_media_files, FileHosting, FileStorageError};

/// Цена-заглушка, если в запросе нет положительной цены
const PLACEHOLDER_PRICE: &str = "100";

/// Публикация товара в Ozon через импорт
pub struct OzonPublisher {
    api: Arc<dyn OzonApi>,
    hosting: Arc<dyn FileHosting>,
}

/// Категория и габариты, без которых Ozon не примет товар
struct OzonPlacement<'a> {
    description_category_id: i64,
    type_id: i64,
    dimensions: &'a Dimensions,
}

impl OzonPublisher {
    pub fn new(api: Arc<dyn OzonApi>, hosting: Arc<dyn FileHosting>) -> Self {
        Self { api, hosting }
    }

    /// Ozon включен, переданы ключ и Client-Id
    pub fn is_attempted(request: &PublishRequest) -> bool {
        request.ozon
            && !request.ozon_api_key.trim().is_empty()
            && !request.ozon_client_id.trim().is_empty()
    }

    /// Импорт товара. Ошибки не пробрасываются, а попадают в отчет ветки
    pub async fn submit(
        &self,
        request: &PublishRequest,
        content: &GeneratedContent,
        cancel: &CancelToken,
    ) -> BranchReport {
        if !Self::is_attempted(request) {
            tracing::info!("Ozon publication skipped, payload prepared only");
            return BranchReport::skipped(prepared_json(request, content));
        }

        let placement = match validate(request, content) {
            Ok(placement) => placement,
            Err(e) => {
                tracing::error!("Ozon validation failed for '{}': {}", request.vendor_code, e);
                return BranchReport::failed_with_payload(e);
            }
        };

        let images = match self.collect_images(request, cancel).await {
            Ok(images) => images,
            Err(e) => {
                tracing::error!("Ozon images for '{}' are not ready: {}", request.vendor_code, e);
                return BranchReport::failed_with_payload(e);
            }
        };

        let import = ProductImportRequest {
            items: vec![build_item(request, content, &placement, images)],
        };
        tracing::info!(
            "Importing '{}' to Ozon (category {}, type {}, {} images)",
            request.vendor_code,
            placement.description_category_id,
            placement.type_id,
            import.items[0].images.len()
        );

        let result = match cancel
            .run(self.api.import_listing(
                &request.ozon_client_id,
                &request.ozon_api_key,
                &import,
            ))
            .await
        {
            Ok(result) => result,
            Err(reason) => return BranchReport::failed_with_payload(reason.into()),
        };

        match result {
            Ok(response) => {
                tracing::info!("Ozon import task {} created", response.result.task_id);
                match serde_json::to_string(&response) {
                    Ok(raw) => BranchReport::succeeded(raw),
                    Err(e) => BranchReport::failed_with_payload(ChannelError::Validation(format!(
                        "failed to serialize Ozon response: {}",
                        e
                    ))),
                }
            }
            Err(e) => {
                tracing::error!("Ozon import failed: {}", e);
                BranchReport::failed_with_payload(ChannelError::api(MarketplaceType::Ozon, e))
            }
        }
    }

    /// Готовые ссылки, затем URL загруженных файлов
    async fn collect_images(
        &self,
        request: &PublishRequest,
        cancel: &CancelToken,
    ) -> Result<Vec<String>, ChannelError> {
        let mut images = request.media_links.clone();
        if request.media_files.is_empty() {
            return Ok(images);
        }

        let urls = match upload_media_files(self.hosting.as_ref(), &request.media_files, cancel).await
        {
            Ok(urls) => urls,
            Err(FileStorageError::Interrupted(reason)) => return Err(reason.into()),
            Err(e) => return Err(ChannelError::ImageUpload(e.to_string())),
        };

        if urls.is_empty() {
            return Err(ChannelError::ImageUpload(format!(
                "none of {} files produced a URL",
                request.media_files.len()
            )));
        }

        images.extend(urls);
        Ok(images)
    }
}

/// Payload, который ушел бы в Ozon
///
/// Без классификации или габаритов собирается как есть: нули вместо id,
/// пустые габариты, картинки только из готовых ссылок.
fn prepared_json(request: &PublishRequest, content: &GeneratedContent) -> String {
    let fallback = Dimensions::default();
    let placement = validate(request, content).unwrap_or_else(|_| OzonPlacement {
        description_category_id: content.sub_id.unwrap_or_default().into(),
        type_id: content.type_id.unwrap_or_default().into(),
        dimensions: request.dimensions.as_ref().unwrap_or(&fallback),
    });
    let import = ProductImportRequest {
        items: vec![build_item(request, content, &placement, request.media_links.clone())],
    };
    serde_json::to_string(&import).unwrap_or_else(|e| error_payload(&e.to_string()))
}

/// Проверки в порядке: артикул, название, категория, тип, габариты
fn validate<'a>(
    request: &'a PublishRequest,
    content: &GeneratedContent,
) -> Result<OzonPlacement<'a>, ChannelError> {
    if request.vendor_code.trim().is_empty() {
        return Err(ChannelError::Validation(
            "vendor code is required for Ozon".into(),
        ));
    }
    if content.title.trim().is_empty() {
        return Err(ChannelError::Validation(
            "generated title is empty, Ozon requires a product name".into(),
        ));
    }
    let description_category_id = content.sub_id.ok_or_else(|| {
        ChannelError::Validation("Ozon category is not classified (sub_id missing)".into())
    })?;
    let type_id = content.type_id.ok_or_else(|| {
        ChannelError::Validation("Ozon product type is not classified (type_id missing)".into())
    })?;
    let dimensions = request
        .dimensions
        .as_ref()
        .filter(|d| d.has_positive_ozon_measures())
        .ok_or_else(|| {
            ChannelError::Validation(
                "dimensions for Ozon must include positive depth, width, height and weight".into(),
            )
        })?;

    Ok(OzonPlacement {
        description_category_id: description_category_id.into(),
        type_id: type_id.into(),
        dimensions,
    })
}

fn build_item(
    request: &PublishRequest,
    content: &GeneratedContent,
    placement: &OzonPlacement<'_>,
    images: Vec<String>,
) -> ProductImportItem {
    let dims = placement.dimensions;

    let mut attributes = vec![ProductAttribute::text(ATTRIBUTE_MODEL_NAME, content.title.clone())];
    if !request.brand.trim().is_empty() {
        attributes.push(ProductAttribute::text(ATTRIBUTE_BRAND, request.brand.clone()));
    }

    let barcode = request
        .sizes
        .first()
        .and_then(|s| s.skus.first())
        .cloned()
        .unwrap_or_default();

    ProductImportItem {
        attributes,
        barcode,
        description_category_id: placement.description_category_id,
        type_id: placement.type_id,
        complex_attributes: Vec::new(),
        currency_code: "RUB".into(),
        depth: dims.depth.unwrap_or_default().into(),
        dimension_unit: dims.dimension_unit.clone(),
        height: dims.height.unwrap_or_default().into(),
        images,
        name: content.title.clone(),
        offer_id: request.vendor_code.clone(),
        price: resolve_price(request),
        vat: "0".into(),
        weight: dims.weight.unwrap_or_default().into(),
        weight_unit: dims.weight_unit.clone(),
        width: dims.width.unwrap_or_default().into(),
    }
}

/// Цена Ozon первого размера, иначе общая цена, иначе заглушка
fn resolve_price(request: &PublishRequest) -> String {
    let Some(size) = request.sizes.first() else {
        return PLACEHOLDER_PRICE.to_string();
    };
    match size.ozon_price {
        Some(price) if price > 0 => price.to_string(),
        _ if size.price > 0 => size.price.to_string(),
        _ => PLACEHOLDER_PRICE.to_string(),
    }
}
