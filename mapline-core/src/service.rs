// Сервис подложки как внешняя возможность: метаданные (привязка, полный
// охват, схема тайлов) и тайлы по (level, row, col). Протокол здесь не
// определяется, только то, что нужно карте для готовности.

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    thread,
    time::Duration,
};

use mapline_types::{Coordinate, Envelope, SpatialReference};
use serde::Deserialize;

use crate::{MapError, MapResult};

/// Абстракция сервиса тайловой подложки.
// Реализации: [`crate::ArcGisTiledService`] (HTTP) и [`StaticService`]
// (в памяти, для офлайн-режима и тестов).
pub trait BasemapService: Send + Sync {
    /// Адрес сервиса (для логов и UI)
    fn url(&self) -> &str;

    /// Таймаут одного сетевого запроса. `None` для сервисов без сети.
    fn request_timeout(&self) -> Option<Duration> {
        None
    }

    /// Загружает метаданные. Блокируется; вызывается из фонового потока.
    fn fetch_metadata(&self) -> MapResult<ServiceMetadata>;

    /// Загружает закодированный тайл (PNG/JPEG). Блокируется.
    fn fetch_tile(
        &self,
        key: TileKey,
    ) -> MapResult<Vec<u8>>;
}

/// Метаданные сервиса подложки.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceMetadata {
    /// Общая привязка для всей карты
    pub spatial_reference: SpatialReference,
    /// Полный охват данных сервиса
    pub full_extent: Envelope,
    /// Схема тайлов (None для динамических сервисов)
    pub tile_info: Option<TileInfo>,
    /// Описание сервиса
    pub description: String,
}

/// Адрес тайла.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub level: u32,
    pub row: u32,
    pub col: u32,
}

/// Уровень детализации.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Lod {
    pub level: u32,
    /// Единиц карты на пиксель
    pub resolution: f64,
    pub scale: f64,
}

/// Схема тайлов: размер тайла, начало сетки (левый верхний угол), уровни.
#[derive(Debug, Clone, PartialEq)]
pub struct TileInfo {
    pub rows: u32,
    pub cols: u32,
    pub origin: Coordinate,
    pub lods: Vec<Lod>,
}

/// Сервис в памяти: фиксированный результат, необязательная задержка.
pub struct StaticService {
    url: String,
    outcome: MapResult<ServiceMetadata>,
    delay: Duration,
    tile: Option<Vec<u8>>,
    metadata_calls: AtomicUsize,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl TileKey {
    pub const fn new(
        level: u32,
        row: u32,
        col: u32,
    ) -> Self {
        Self { level, row, col }
    }
}

impl TileInfo {
    pub fn lod(
        &self,
        level: u32,
    ) -> Option<&Lod> {
        self.lods.iter().find(|l| l.level == level)
    }

    /// Самый грубый уровень (минимальная детализация).
    pub fn coarsest(&self) -> Option<&Lod> {
        self.lods
            .iter()
            .max_by(|a, b| a.resolution.total_cmp(&b.resolution))
    }

    /// Охват тайла в координатах карты. Строки растут вниз от `origin`.
    pub fn tile_envelope(
        &self,
        key: TileKey,
    ) -> Option<Envelope> {
        let lod = self.lod(key.level)?;
        let span_x = self.cols as f64 * lod.resolution;
        let span_y = self.rows as f64 * lod.resolution;

        let xmin = self.origin.x + key.col as f64 * span_x;
        let ymax = self.origin.y - key.row as f64 * span_y;

        Envelope::new(xmin, ymax - span_y, xmin + span_x, ymax).ok()
    }

    /// Тайлы грубейшего уровня, покрывающие `extent`, не больше `limit`.
    pub fn overview_tiles(
        &self,
        extent: &Envelope,
        limit: usize,
    ) -> Vec<(TileKey, Envelope)> {
        let Some(lod) = self.coarsest() else {
            return Vec::new();
        };

        let span_x = self.cols as f64 * lod.resolution;
        let span_y = self.rows as f64 * lod.resolution;
        if span_x <= 0.0 || span_y <= 0.0 {
            return Vec::new();
        }

        let first_col = ((extent.xmin - self.origin.x) / span_x).floor().max(0.0) as u32;
        let last_col = ((extent.xmax - self.origin.x) / span_x).ceil() as i64 - 1;
        let first_row = ((self.origin.y - extent.ymax) / span_y).floor().max(0.0) as u32;
        let last_row = ((self.origin.y - extent.ymin) / span_y).ceil() as i64 - 1;

        // Охват целиком вне сетки
        if limit == 0 || first_col as i64 > last_col || first_row as i64 > last_row {
            return Vec::new();
        }

        let mut tiles = Vec::new();
        for row in first_row as i64..=last_row {
            for col in first_col as i64..=last_col {
                if tiles.len() >= limit {
                    return tiles;
                }
                let key = TileKey::new(lod.level, row as u32, col as u32);
                if let Some(env) = self.tile_envelope(key) {
                    tiles.push((key, env));
                }
            }
        }
        tiles
    }
}

impl StaticService {
    pub fn new(
        url: impl Into<String>,
        metadata: ServiceMetadata,
    ) -> Self {
        Self {
            url: url.into(),
            outcome: Ok(metadata),
            delay: Duration::ZERO,
            tile: None,
            metadata_calls: AtomicUsize::new(0),
        }
    }

    /// Сервис, всегда отвечающий ошибкой `err`.
    pub fn failing(
        url: impl Into<String>,
        err: MapError,
    ) -> Self {
        Self {
            url: url.into(),
            outcome: Err(err),
            delay: Duration::ZERO,
            tile: None,
            metadata_calls: AtomicUsize::new(0),
        }
    }

    /// Весь мир в WGS 84, тайлы 256×256 с началом в (-180, 90).
    pub fn world() -> Self {
        Self::new("memory://world", world_metadata())
    }

    /// Имитация сетевой задержки метаданных.
    pub fn with_delay(
        mut self,
        delay: Duration,
    ) -> Self {
        self.delay = delay;
        self
    }

    /// Закодированный тайл, отдаваемый на любой запрос.
    pub fn with_tile(
        mut self,
        bytes: Vec<u8>,
    ) -> Self {
        self.tile = Some(bytes);
        self
    }

    /// Сколько раз запрашивались метаданные.
    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }
}

/// Метаданные «весь мир, WGS 84».
pub fn world_metadata() -> ServiceMetadata {
    ServiceMetadata {
        spatial_reference: SpatialReference::wgs84(),
        full_extent: Envelope {
            xmin: -180.0,
            ymin: -90.0,
            xmax: 180.0,
            ymax: 90.0,
        },
        tile_info: Some(TileInfo {
            rows: 256,
            cols: 256,
            origin: Coordinate::new(-180.0, 90.0),
            lods: vec![
                Lod {
                    level: 0,
                    resolution: 0.703125,
                    scale: 295_497_593.05875,
                },
                Lod {
                    level: 1,
                    resolution: 0.3515625,
                    scale: 147_748_796.529375,
                },
            ],
        }),
        description: "In-memory world basemap".to_string(),
    }
}

impl BasemapService for StaticService {
    fn url(&self) -> &str {
        &self.url
    }

    fn fetch_metadata(&self) -> MapResult<ServiceMetadata> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        self.outcome.clone()
    }

    fn fetch_tile(
        &self,
        key: TileKey,
    ) -> MapResult<Vec<u8>> {
        self.tile.clone().ok_or_else(|| {
            MapError::network(format!(
                "{}: no tile {}/{}/{}",
                self.url, key.level, key.row, key.col
            ))
        })
    }
}

impl std::fmt::Display for TileKey {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.level, self.row, self.col)
    }
}
