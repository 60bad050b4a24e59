//! Ядро mapline: карта, слои и подложка.
//!
//! [`MapView`] владеет стеком слоёв (подложка снизу, оверлеи сверху) и
//! машиной состояний готовности. Метаданные подложки загружаются в фоновом
//! потоке, результат передаётся обратно через [`UiQueue`] и применяется только
//! в UI-потоке при вызове [`MapView::pump`].
//!
//! # Быстрый старт
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use mapline_core::{BasemapLayer, MapView, OverlayLayer, StaticService, ViewConfig};
//! use mapline_types::Envelope;
//!
//! let mut view = MapView::new(ViewConfig::default());
//! view.set_extent(Envelope::new(-15.8, -37.8, 156.8, 77.3)?)?;
//! view.add_layer(BasemapLayer::new(Arc::new(StaticService::world())))?;
//! let overlay = view.add_layer(OverlayLayer::new("graphics"))?;
//!
//! view.on_ready(move |view| {
//!     log::info!("ready: {:?}", view.spatial_reference());
//! });
//!
//! // В цикле UI
//! view.pump();
//! # let _ = overlay;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod arcgis;
pub mod config;
pub mod error;
pub mod layer;
pub mod lifecycle;
pub mod overlay;
pub mod queue;
pub mod service;
pub mod view;
pub mod viewport;

pub use arcgis::*;
pub use config::*;
pub use error::*;
pub use layer::*;
pub use lifecycle::*;
pub use overlay::*;
pub use queue::*;
pub use service::*;
pub use view::*;
pub use viewport::*;

/// Версия библиотеки.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
