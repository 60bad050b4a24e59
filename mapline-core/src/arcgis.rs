//! Тайловый сервис ArcGIS REST (`.../MapServer`).
//!
//! Метаданные: `GET {url}?f=json`, тайлы: `GET {url}/tile/{level}/{row}/{col}`.

use std::time::Duration;

use log::{debug, trace};
use mapline_types::{Coordinate, Envelope, SpatialReference};
use serde::Deserialize;

use crate::{BasemapService, Lod, MapError, MapResult, ServiceMetadata, TileInfo, TileKey};

/// User-Agent для запросов: некоторые серверы отклоняют запросы без него.
const USER_AGENT: &str = concat!("mapline/", env!("CARGO_PKG_VERSION"));

/// Тайловый сервис ArcGIS поверх `reqwest::blocking`.
pub struct ArcGisTiledService {
    url: String,
    timeout: Duration,
    client: reqwest::blocking::Client,
}

////////////////////////////////////////////////////////////////////////////////
// Сырые структуры ответа
////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawService {
    spatial_reference: Option<SpatialReference>,
    full_extent: Option<RawExtent>,
    initial_extent: Option<RawExtent>,
    tile_info: Option<RawTileInfo>,
    #[serde(default)]
    service_description: String,
    #[serde(default)]
    description: String,
    error: Option<RawError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExtent {
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
    spatial_reference: Option<SpatialReference>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTileInfo {
    rows: u32,
    cols: u32,
    origin: RawPoint,
    #[serde(default)]
    lods: Vec<Lod>,
    spatial_reference: Option<SpatialReference>,
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct RawError {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<String>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl ArcGisTiledService {
    /// Создаёт клиента с таймаутом на каждый запрос.
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
    ) -> MapResult<Self> {
        let url = url.into().trim_end_matches('/').to_string();

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(MapError::network(format!(
                "Invalid service URL '{url}': expected http:// or https://"
            )));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MapError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            url,
            timeout,
            client,
        })
    }

    /// Таймаут одного запроса.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn metadata_url(&self) -> String {
        format!("{}?f=json", self.url)
    }

    pub fn tile_url(
        &self,
        key: TileKey,
    ) -> String {
        format!("{}/tile/{}/{}/{}", self.url, key.level, key.row, key.col)
    }

    fn get(
        &self,
        url: &str,
    ) -> MapResult<Vec<u8>> {
        trace!("GET {url}");

        let response = self.client.get(url).send()?;
        let status = response.status();

        if !status.is_success() {
            return Err(MapError::network(format!("HTTP {status} for {url}")));
        }

        let bytes = response.bytes()?;
        debug!("GET {url}: {} bytes", bytes.len());

        Ok(bytes.to_vec())
    }
}

/// Разбирает JSON метаданных MapServer.
///
/// Привязка берётся из `spatialReference`, затем из `fullExtent`, затем из
/// `tileInfo`. Охват берётся из `fullExtent`, иначе из `initialExtent`.
pub fn parse_metadata(body: &[u8]) -> MapResult<ServiceMetadata> {
    let raw: RawService = serde_json::from_slice(body)?;

    if let Some(err) = raw.error {
        let message = if err.details.is_empty() {
            err.message
        } else {
            format!("{} ({})", err.message, err.details.join("; "))
        };
        return Err(MapError::Service {
            code: err.code,
            message,
        });
    }

    let extent = raw
        .full_extent
        .or(raw.initial_extent)
        .ok_or_else(|| MapError::invalid_metadata("missing fullExtent"))?;

    let spatial_reference = raw
        .spatial_reference
        .or(extent.spatial_reference)
        .or_else(|| raw.tile_info.as_ref().and_then(|t| t.spatial_reference))
        .ok_or_else(|| MapError::invalid_metadata("missing spatialReference"))?;

    let full_extent = Envelope::new(extent.xmin, extent.ymin, extent.xmax, extent.ymax)
        .map_err(|e| MapError::invalid_metadata(format!("fullExtent: {e}")))?;

    let tile_info = raw.tile_info.map(|t| TileInfo {
        rows: t.rows,
        cols: t.cols,
        origin: Coordinate::new(t.origin.x, t.origin.y),
        lods: t.lods,
    });

    let description = if raw.service_description.is_empty() {
        raw.description
    } else {
        raw.service_description
    };

    Ok(ServiceMetadata {
        spatial_reference,
        full_extent,
        tile_info,
        description,
    })
}

impl BasemapService for ArcGisTiledService {
    fn url(&self) -> &str {
        &self.url
    }

    fn request_timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }

    fn fetch_metadata(&self) -> MapResult<ServiceMetadata> {
        let body = self.get(&self.metadata_url())?;
        parse_metadata(&body)
    }

    fn fetch_tile(
        &self,
        key: TileKey,
    ) -> MapResult<Vec<u8>> {
        self.get(&self.tile_url(key))
    }
}
