use contracts::usecases::u508_publish_product_card::request::PublishRequest;

use super::errors::PublishError;

/// Проверка входных данных до любого внешнего вызова
pub fn validate_request(request: &PublishRequest) -> Result<(), PublishError> {
    if request.wb && request.vendor_code.trim().is_empty() {
        return Err(PublishError::Validation(
            "vendor_code is required for Wildberries".into(),
        ));
    }

    if request.ozon {
        validate_ozon(request)?;
    }

    Ok(())
}

fn validate_ozon(request: &PublishRequest) -> Result<(), PublishError> {
    let missing = |field: &str| {
        PublishError::Validation(format!("{} is required for Ozon", field))
    };

    if request.ozon_api_key.trim().is_empty() {
        return Err(missing("ozon_api_key"));
    }
    if request.ozon_client_id.trim().is_empty() {
        return Err(missing("ozon_client_id"));
    }
    if request.vendor_code.trim().is_empty() {
        return Err(missing("vendor_code"));
    }

    let dims = request.dimensions.as_ref().ok_or_else(|| missing("dimensions"))?;
    if !dims.has_positive_ozon_measures() {
        return Err(PublishError::Validation(
            "dimensions for Ozon must include positive depth, width, height and weight".into(),
        ));
    }
    if dims.dimension_unit.trim().is_empty() {
        return Err(missing("dimensions.dimension_unit"));
    }
    if dims.weight_unit.trim().is_empty() {
        return Err(missing("dimensions.weight_unit"));
    }

    Ok(())
}
