use serde::{Deserialize, Serialize};

/// Запрос на публикацию карточки товара в маркетплейсах
///
/// Одна логическая карточка: по ней генерируется контент, затем она
/// публикуется в Wildberries и/или Ozon в зависимости от флагов `wb` и `ozon`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishRequest {
    /// Название товара от продавца (исходные данные для генерации)
    pub product_title: String,

    /// Описание товара от продавца
    #[serde(default)]
    pub product_description: String,

    /// Подсказка категории: родительская категория
    #[serde(default)]
    pub parent_id: i32,

    /// Подсказка категории: предмет
    #[serde(default)]
    pub subject_id: i32,

    /// Перевести сгенерированный контент
    #[serde(default)]
    pub translate: bool,

    /// Генерировать текстовый контент (иначе только классификация)
    #[serde(default)]
    pub generate_content: bool,

    /// Публиковать в Wildberries
    #[serde(default)]
    pub wb: bool,

    /// Публиковать в Ozon
    #[serde(default)]
    pub ozon: bool,

    #[serde(default)]
    pub wb_api_key: String,

    #[serde(default)]
    pub ozon_client_id: String,

    #[serde(default)]
    pub ozon_api_key: String,

    /// Артикул продавца (общий для всех маркетплейсов)
    #[serde(default)]
    pub vendor_code: String,

    #[serde(default)]
    pub brand: String,

    #[serde(default)]
    pub dimensions: Option<Dimensions>,

    /// Размеры / SKU
    #[serde(default)]
    pub sizes: Vec<SizeVariant>,

    /// Файлы изображений для загрузки
    #[serde(default)]
    pub media_files: Vec<MediaFile>,

    /// Ссылки на уже размещенные изображения
    #[serde(default)]
    pub media_links: Vec<String>,
}

/// Габариты товара
///
/// `length/width/height/weight_brutto` используются Wildberries,
/// `depth/width/height/weight` + единицы измерения используются Ozon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    #[serde(default)]
    pub length: Option<i32>,
    #[serde(default)]
    pub width: Option<i32>,
    #[serde(default)]
    pub height: Option<i32>,
    #[serde(default)]
    pub weight_brutto: Option<f64>,

    #[serde(default)]
    pub depth: Option<i32>,
    #[serde(default)]
    pub weight: Option<i32>,
    /// Например "mm"
    #[serde(default)]
    pub dimension_unit: String,
    /// Например "g"
    #[serde(default)]
    pub weight_unit: String,
}

impl Dimensions {
    /// Все габариты для Ozon заданы и больше нуля
    pub fn has_positive_ozon_measures(&self) -> bool {
        [self.depth, self.width, self.height, self.weight]
            .iter()
            .all(|v| matches!(v, Some(n) if *n > 0))
    }
}

/// Вариант размера товара
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeVariant {
    /// Технический размер (XL, 45 ...)
    #[serde(default)]
    pub tech_size: String,

    /// Российский размер (для WB)
    #[serde(default)]
    pub wb_size: String,

    /// Общая цена
    #[serde(default)]
    pub price: i32,

    /// Цена для Wildberries (приоритетнее общей)
    #[serde(default)]
    pub wb_price: Option<i32>,

    /// Цена для Ozon (приоритетнее общей)
    #[serde(default)]
    pub ozon_price: Option<i32>,

    /// Штрихкоды
    #[serde(default)]
    pub skus: Vec<String>,
}

/// Файл изображения; содержимое передается в base64
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaFile {
    pub filename: String,

    #[serde(with = "base64_bytes")]
    pub content: Vec<u8>,

    /// Порядковый номер фото в карточке
    pub photo_number: i32,
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
