use mapline_core::MapError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Ошибка карты или подложки
    #[error("Map error: {0}")]
    Map(#[from] MapError),

    /// Некорректная конфигурация (файл или флаги)
    #[error("Config error: {0}")]
    Config(String),

    /// Ошибка чтения конфигурационного файла
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Конфигурационный файл не разбирается
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Ошибка оконной системы / eframe
    #[error("UI error: {0}")]
    Ui(String),

    /// Прервано пользователем (Ctrl+C) до готовности карты
    #[error("Interrupted")]
    Interrupted,
}

impl AppError {
    pub fn config<S: Into<String>>(s: S) -> Self {
        Self::Config(s.into())
    }
}

impl From<mapline_types::GeometryError> for AppError {
    fn from(e: mapline_types::GeometryError) -> Self {
        Self::Map(MapError::from(e))
    }
}
