use thiserror::Error;

/// Результат для операций построения геометрии и символов.
pub type GeomResult<T> = std::result::Result<T, GeometryError>;

/// Ошибки построения геометрии/символов.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Путь без единой точки
    #[error("Polyline path must contain at least one coordinate")]
    EmptyPath,

    /// NaN или бесконечность в координатах
    #[error("Non-finite coordinate at index {index}: ({x}, {y})")]
    NonFinite { index: usize, x: f64, y: f64 },

    /// Некорректный охватывающий прямоугольник
    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// Толщина линии должна быть > 0
    #[error("Invalid line width: {0}")]
    InvalidWidth(f32),

    /// Неизвестный стиль линии
    #[error("Unknown line style: '{0}'")]
    UnknownStyle(String),
}

impl GeometryError {
    pub fn invalid_envelope<S: Into<String>>(s: S) -> Self {
        Self::InvalidEnvelope(s.into())
    }
}
