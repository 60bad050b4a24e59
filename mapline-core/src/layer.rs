use std::sync::Arc;

use mapline_types::Envelope;

use crate::{BasemapService, OverlayLayer, RedrawFlag, ServiceMetadata};

/// Идентификатор слоя в стеке карты.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub(crate) u64);

/// Слой карты.
#[derive(Debug)]
pub enum Layer {
    /// Тайловая подложка (рисуется снизу)
    Basemap(BasemapLayer),
    /// Пользовательская графика
    Overlay(OverlayLayer),
}

/// Подложка: сервис, его метаданные и обзорное изображение.
pub struct BasemapLayer {
    name: String,
    service: Arc<dyn BasemapService>,
    metadata: Option<ServiceMetadata>,
    overview: Vec<OverviewImage>,
    visible: bool,
}

/// Декодированный тайл обзорной подложки, привязанный к охвату карты.
#[derive(Clone, PartialEq)]
pub struct OverviewImage {
    pub width: u32,
    pub height: u32,
    /// RGBA8, построчно сверху вниз
    pub rgba: Vec<u8>,
    pub envelope: Envelope,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl LayerId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Layer {
    pub fn name(&self) -> &str {
        match self {
            Layer::Basemap(b) => b.name(),
            Layer::Overlay(o) => o.name(),
        }
    }

    pub fn is_visible(&self) -> bool {
        match self {
            Layer::Basemap(b) => b.is_visible(),
            Layer::Overlay(o) => o.is_visible(),
        }
    }

    pub fn as_overlay(&self) -> Option<&OverlayLayer> {
        match self {
            Layer::Overlay(o) => Some(o),
            Layer::Basemap(_) => None,
        }
    }

    pub fn as_overlay_mut(&mut self) -> Option<&mut OverlayLayer> {
        match self {
            Layer::Overlay(o) => Some(o),
            Layer::Basemap(_) => None,
        }
    }

    pub fn as_basemap(&self) -> Option<&BasemapLayer> {
        match self {
            Layer::Basemap(b) => Some(b),
            Layer::Overlay(_) => None,
        }
    }

    pub(crate) fn as_basemap_mut(&mut self) -> Option<&mut BasemapLayer> {
        match self {
            Layer::Basemap(b) => Some(b),
            Layer::Overlay(_) => None,
        }
    }

    pub(crate) fn attach(
        &mut self,
        redraw: RedrawFlag,
    ) {
        if let Layer::Overlay(o) = self {
            o.attach(redraw);
        }
    }

    /// Освобождает ресурсы слоя (графику, изображение подложки).
    pub(crate) fn release(&mut self) {
        match self {
            Layer::Basemap(b) => b.overview.clear(),
            Layer::Overlay(o) => o.release(),
        }
    }
}

impl BasemapLayer {
    pub fn new(service: Arc<dyn BasemapService>) -> Self {
        Self {
            name: "basemap".to_string(),
            service,
            metadata: None,
            overview: Vec::new(),
            visible: true,
        }
    }

    pub fn with_name(
        mut self,
        name: impl Into<String>,
    ) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        self.service.url()
    }

    pub fn service(&self) -> Arc<dyn BasemapService> {
        Arc::clone(&self.service)
    }

    /// Метаданные, если уже загружены.
    pub fn metadata(&self) -> Option<&ServiceMetadata> {
        self.metadata.as_ref()
    }

    /// Загруженные тайлы обзорной подложки в порядке поступления.
    pub fn overview(&self) -> &[OverviewImage] {
        &self.overview
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(
        &mut self,
        visible: bool,
    ) {
        self.visible = visible;
    }

    pub(crate) fn set_metadata(
        &mut self,
        metadata: ServiceMetadata,
    ) {
        self.metadata = Some(metadata);
    }

    pub(crate) fn add_overview(
        &mut self,
        image: OverviewImage,
    ) {
        self.overview.push(image);
    }
}

impl OverviewImage {
    /// Декодирует PNG/JPEG тайла в RGBA8.
    pub fn decode(
        bytes: &[u8],
        envelope: Envelope,
    ) -> crate::MapResult<Self> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();

        Ok(Self {
            width,
            height,
            rgba: rgba.into_raw(),
            envelope,
        })
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl From<OverlayLayer> for Layer {
    fn from(o: OverlayLayer) -> Self {
        Layer::Overlay(o)
    }
}

impl From<BasemapLayer> for Layer {
    fn from(b: BasemapLayer) -> Self {
        Layer::Basemap(b)
    }
}

impl std::fmt::Debug for BasemapLayer {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("BasemapLayer")
            .field("name", &self.name)
            .field("url", &self.service.url())
            .field("metadata", &self.metadata.is_some())
            .field("overview_tiles", &self.overview.len())
            .finish()
    }
}

// Пиксели в Debug не выводим
impl std::fmt::Debug for OverviewImage {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "OverviewImage({}x{} @ {})",
            self.width, self.height, self.envelope
        )
    }
}
