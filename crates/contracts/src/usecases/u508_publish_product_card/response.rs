use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Итог публикации карточки
///
/// Возвращается всегда, если прошли валидация и генерация контента.
/// Ошибки отдельных маркетплейсов лежат внутри соответствующих блоков.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishResponse {
    pub content: GeneratedContentDto,
    pub wb: ChannelOutcome,
    pub ozon: ChannelOutcome,
    /// Результаты загрузки файлов в WB (по одному на файл)
    pub wb_media_uploads: Vec<MediaOutcome>,
    /// Результат сохранения ссылок на медиа в WB
    pub wb_media_links: MediaLinkOutcome,
}

/// Сгенерированный контент; не заполненные генератором поля остаются нулевыми
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContentDto {
    pub title: String,
    pub description: String,
    pub attributes: BTreeMap<String, String>,
    pub parent_id: i32,
    pub parent_name: String,
    pub subject_id: i32,
    pub subject_name: String,
    pub type_id: i32,
    pub type_name: String,
    pub root_id: i32,
    pub root_name: String,
    pub sub_id: i32,
    pub sub_name: String,
}

/// Результат по одному маркетплейсу
///
/// При `attempted == false` заполняется `prepared_payload` (что было бы
/// отправлено), при `attempted == true` -> `raw_response`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelOutcome {
    pub attempted: bool,
    pub prepared_payload: Option<String>,
    pub raw_response: Option<String>,
    pub error: Option<String>,
}

impl ChannelOutcome {
    pub fn is_success(&self) -> bool {
        self.attempted && self.error.is_none()
    }
}

/// Результат загрузки одного файла
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaOutcome {
    pub photo_number: i32,
    pub response: Option<String>,
    pub error: Option<String>,
}

/// Результат пакетного сохранения медиа по ссылкам
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaLinkOutcome {
    pub response: Option<String>,
    pub error: Option<String>,
}

impl MediaLinkOutcome {
    pub fn is_empty(&self) -> bool {
        self.response.is_none() && self.error.is_none()
    }
}
