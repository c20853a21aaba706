use serde::{Deserialize, Serialize};

/// Маркетплейсы, в которые публикуется карточка
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketplaceType {
    Wildberries,
    Ozon,
}

impl MarketplaceType {
    /// Получить код маркетплейса
    pub fn code(&self) -> &'static str {
        match self {
            MarketplaceType::Wildberries => "mp-wb",
            MarketplaceType::Ozon => "mp-ozon",
        }
    }

    /// Получить человекочитаемое название
    pub fn display_name(&self) -> &'static str {
        match self {
            MarketplaceType::Wildberries => "Wildberries",
            MarketplaceType::Ozon => "Ozon",
        }
    }

    /// Получить все типы маркетплейсов
    pub fn all() -> Vec<MarketplaceType> {
        vec![MarketplaceType::Wildberries, MarketplaceType::Ozon]
    }

    /// Парсинг из строки
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "mp-wb" => Some(MarketplaceType::Wildberries),
            "mp-ozon" => Some(MarketplaceType::Ozon),
            _ => None,
        }
    }
}

impl std::fmt::Display for MarketplaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
