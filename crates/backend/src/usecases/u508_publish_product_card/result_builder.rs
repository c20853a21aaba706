use contracts::usecases::u508_publish_product_card::response::{
    ChannelOutcome, GeneratedContentDto, MediaLinkOutcome, MediaOutcome, PublishResponse,
};

use crate::shared::content_generator::GeneratedContent;

/// Проекция сгенерированного контента; пропущенные поля остаются нулевыми
pub fn content_dto(content: &GeneratedContent) -> GeneratedContentDto {
    GeneratedContentDto {
        title: content.title.clone(),
        description: content.description.clone(),
        attributes: content.attributes.clone(),
        parent_id: content.parent_id.unwrap_or_default(),
        parent_name: content.parent_name.clone().unwrap_or_default(),
        subject_id: content.subject_id.unwrap_or_default(),
        subject_name: content.subject_name.clone().unwrap_or_default(),
        type_id: content.type_id.unwrap_or_default(),
        type_name: content.type_name.clone().unwrap_or_default(),
        root_id: content.root_id.unwrap_or_default(),
        root_name: content.root_name.clone().unwrap_or_default(),
        sub_id: content.sub_id.unwrap_or_default(),
        sub_name: content.sub_name.clone().unwrap_or_default(),
    }
}

/// Итоговый ответ. `media == None`, если медиа не загружались
pub fn build_response(
    content: &GeneratedContent,
    wb: ChannelOutcome,
    ozon: ChannelOutcome,
    media: Option<(Vec<MediaOutcome>, MediaLinkOutcome)>,
) -> PublishResponse {
    let (wb_media_uploads, wb_media_links) = media.unwrap_or_default();

    PublishResponse {
        content: content_dto(content),
        wb,
        ozon,
        wb_media_uploads,
        wb_media_links,
    }
}
