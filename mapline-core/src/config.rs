use std::time::Duration;

/// Настройки карты.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewConfig {
    /// Сколько ждать метаданные подложки до перехода в `Failed`
    pub ready_timeout: Duration,
    /// Таймаут одного HTTP-запроса к сервису подложки; задаётся клиенту
    /// при создании сетевого сервиса
    pub request_timeout: Duration,
    /// Загружать тайлы обзорной подложки после готовности
    pub fetch_overview: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            ready_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(15),
            fetch_overview: true,
        }
    }
}
