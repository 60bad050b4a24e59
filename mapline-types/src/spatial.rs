use serde::{Deserialize, Serialize};

/// WKID географической системы WGS 84.
pub const WGS84_WKID: u32 = 4326;

/// WKID Web Mercator (актуальный и устаревший коды).
pub const WEB_MERCATOR_WKID: u32 = 3857;
pub const WEB_MERCATOR_LEGACY_WKID: u32 = 102100;

/// Пространственная привязка по коду WKID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialReference {
    pub wkid: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_wkid: Option<u32>,
}

impl SpatialReference {
    pub const fn new(wkid: u32) -> Self {
        Self {
            wkid,
            latest_wkid: None,
        }
    }

    pub const fn wgs84() -> Self {
        Self::new(WGS84_WKID)
    }

    /// Действующий код: `latest_wkid`, если он указан.
    pub fn effective_wkid(&self) -> u32 {
        self.latest_wkid.unwrap_or(self.wkid)
    }

    pub fn is_geographic(&self) -> bool {
        self.effective_wkid() == WGS84_WKID
    }

    pub fn is_web_mercator(&self) -> bool {
        matches!(
            self.effective_wkid(),
            WEB_MERCATOR_WKID | WEB_MERCATOR_LEGACY_WKID
        )
    }
}

impl std::fmt::Display for SpatialReference {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self.latest_wkid {
            Some(latest) if latest != self.wkid => write!(f, "WKID {} ({latest})", self.wkid),
            _ => write!(f, "WKID {}", self.wkid),
        }
    }
}
