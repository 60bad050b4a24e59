use std::{path::Path, time::Duration};

use log::debug;
use mapline_core::ViewConfig;
use mapline_types::Envelope;
use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult};

/// Сервис подложки по умолчанию (ArcGIS Online, NGS Topo).
pub const DEFAULT_BASEMAP_URL: &str =
    "http://services.arcgisonline.com/ArcGIS/rest/services/NGS_Topo_US_2D/MapServer";

/// Верхняя граница таймаутов (секунды).
pub const MAX_TIMEOUT_SECS: u64 = 3600;

/// Конфигурация приложения.
///
/// Все поля необязательны в JSON-файле: отсутствующие берутся из
/// [`AppConfig::default`]. Флаги командной строки применяются поверх файла.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Заголовок окна
    pub title: String,
    /// Положение окна (x, y), логические пиксели
    pub window_pos: [f32; 2],
    /// Размер окна (ширина, высота)
    pub window_size: [f32; 2],
    /// URL тайлового MapServer
    pub basemap_url: String,
    /// Начальный охват карты
    pub initial_extent: Envelope,
    /// Имя слоя графики
    pub overlay_name: String,
    /// Встроенная подложка вместо сетевой
    pub offline: bool,
    /// Ожидание готовности подложки (секунды)
    pub ready_timeout_secs: u64,
    /// Таймаут HTTP-запроса (секунды)
    pub request_timeout_secs: u64,
    /// Загружать обзорные тайлы подложки
    pub fetch_overview: bool,
}

impl AppConfig {
    /// Загружает конфигурацию из JSON-файла и проверяет её.
    pub fn load<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();
        debug!("Loading config from {}", path.display());

        let text = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&text)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        let e = &self.initial_extent;
        Envelope::new(e.xmin, e.ymin, e.xmax, e.ymax)
            .map_err(|err| AppError::config(format!("initial_extent: {err}")))?;

        if self.window_size.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(AppError::config(format!(
                "window_size must be positive, got {:?}",
                self.window_size
            )));
        }

        if self.ready_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(AppError::config("timeouts must be at least 1 second"));
        }

        if self.ready_timeout_secs > MAX_TIMEOUT_SECS
            || self.request_timeout_secs > MAX_TIMEOUT_SECS
        {
            return Err(AppError::config(format!(
                "timeouts must not exceed {MAX_TIMEOUT_SECS} seconds (ready {}, request {})",
                self.ready_timeout_secs, self.request_timeout_secs
            )));
        }

        if !self.offline && self.basemap_url.trim().is_empty() {
            return Err(AppError::config("basemap_url is empty"));
        }

        if self.overlay_name.trim().is_empty() {
            return Err(AppError::config("overlay_name is empty"));
        }

        Ok(())
    }

    pub fn view_config(&self) -> ViewConfig {
        ViewConfig {
            ready_timeout: Duration::from_secs(self.ready_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            fetch_overview: self.fetch_overview,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Add Graphics Application".to_string(),
            window_pos: [100.0, 100.0],
            window_size: [1000.0, 700.0],
            basemap_url: DEFAULT_BASEMAP_URL.to_string(),
            initial_extent: Envelope {
                xmin: -15.8,
                ymin: -37.8,
                xmax: 156.8,
                ymax: 77.3,
            },
            overlay_name: "graphics".to_string(),
            offline: false,
            ready_timeout_secs: 30,
            request_timeout_secs: 15,
            fetch_overview: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn write_config(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_matches_sample_window() {
        let c = AppConfig::default();
        assert_eq!(c.title, "Add Graphics Application");
        assert_eq!(c.window_pos, [100.0, 100.0]);
        assert_eq!(c.window_size, [1000.0, 700.0]);
        assert!(c.validate().is_ok());
        assert_eq!(c.view_config().ready_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let file = write_config(r#"{"offline": true, "ready_timeout_secs": 5}"#);
        let c = AppConfig::load(file.path()).unwrap();

        assert!(c.offline);
        assert_eq!(c.ready_timeout_secs, 5);
        assert_eq!(c.basemap_url, DEFAULT_BASEMAP_URL);
        assert_eq!(c.overlay_name, "graphics");
    }

    #[test]
    fn test_load_rejects_inverted_extent() {
        let file = write_config(
            r#"{"initial_extent": {"xmin": 10, "ymin": 0, "xmax": -10, "ymax": 5}}"#,
        );
        assert!(matches!(
            AppConfig::load(file.path()),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_load_errors() {
        let broken = write_config("{ not json");
        assert!(matches!(
            AppConfig::load(broken.path()),
            Err(AppError::Json(_))
        ));

        assert!(matches!(
            AppConfig::load("/definitely/not/here.json"),
            Err(AppError::Io(_))
        ));
    }

    #[test]
    fn test_validate_timeouts_and_url() {
        let mut c = AppConfig {
            ready_timeout_secs: 0,
            ..Default::default()
        };
        assert!(c.validate().is_err());

        c.ready_timeout_secs = 10;
        c.basemap_url = "  ".to_string();
        assert!(c.validate().is_err(), "пустой URL допустим только офлайн");

        c.offline = true;
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_huge_timeouts() {
        let c = AppConfig {
            offline: true,
            ready_timeout_secs: u64::MAX,
            ..Default::default()
        };
        assert!(matches!(c.validate(), Err(AppError::Config(_))));

        let c = AppConfig {
            offline: true,
            request_timeout_secs: MAX_TIMEOUT_SECS + 1,
            ..Default::default()
        };
        assert!(matches!(c.validate(), Err(AppError::Config(_))));

        let c = AppConfig {
            offline: true,
            ready_timeout_secs: MAX_TIMEOUT_SECS,
            request_timeout_secs: MAX_TIMEOUT_SECS,
            ..Default::default()
        };
        assert!(c.validate().is_ok());

        let file = write_config(r#"{"offline": true, "ready_timeout_secs": 18446744073709551615}"#);
        assert!(matches!(
            AppConfig::load(file.path()),
            Err(AppError::Config(_))
        ));
    }
}
