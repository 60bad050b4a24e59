use mapline_types::GeometryError;
use thiserror::Error;

/// Результат для операций карты.
pub type MapResult<T> = std::result::Result<T, MapError>;

/// Ошибки карты и подложки.
///
/// `Clone`, потому что ошибка хранится в состоянии `Failed` и передаётся
/// слушателям.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    /// Сетевая ошибка при обращении к сервису (соединение, HTTP-статус)
    #[error("Network error: {0}")]
    Network(String),

    /// Сервис вернул объект `error` вместо метаданных
    #[error("Service error {code}: {message}")]
    Service { code: i64, message: String },

    /// Метаданные не содержат нужных полей или не разбираются
    #[error("Invalid service metadata: {0}")]
    InvalidMetadata(String),

    /// Подложка не ответила за отведённое время
    #[error("Basemap did not become ready within {0:?}")]
    Timeout(std::time::Duration),

    /// Операция над освобождённой картой
    #[error("Lifecycle error: {0}")]
    Lifecycle(String),

    /// Карта ещё не готова (пространственная привязка неизвестна)
    #[error("Map view is not ready")]
    NotReady,

    /// Нет слоя с таким идентификатором или он другого типа
    #[error("Unknown layer: {0}")]
    UnknownLayer(String),

    /// Не удалось запустить фоновый поток
    #[error("Worker error: {0}")]
    Worker(String),

    /// Ошибка построения геометрии
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),
}

impl MapError {
    pub fn network<S: Into<String>>(s: S) -> Self {
        Self::Network(s.into())
    }

    pub fn invalid_metadata<S: Into<String>>(s: S) -> Self {
        Self::InvalidMetadata(s.into())
    }

    pub fn lifecycle<S: Into<String>>(s: S) -> Self {
        Self::Lifecycle(s.into())
    }

    /// Ошибки загрузки подложки: сеть, сервис, таймаут.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Service { .. } | Self::Timeout(_)
        )
    }

    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::Lifecycle(_) | Self::NotReady)
    }
}

impl From<reqwest::Error> for MapError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Self::Network(format!("request timed out: {e}"));
        }
        Self::Network(e.to_string())
    }
}

impl From<serde_json::Error> for MapError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidMetadata(e.to_string())
    }
}

impl From<image::ImageError> for MapError {
    fn from(e: image::ImageError) -> Self {
        Self::InvalidMetadata(format!("tile image: {e}"))
    }
}
