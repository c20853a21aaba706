use serde::{Deserialize, Deserializer};

/// Десериализует `null` как значение по умолчанию
///
/// Внешние сервисы присылают `null` вместо пустой строки или пустого объекта.
/// Вместе с `#[serde(default)]` покрывает и отсутствующее поле.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
