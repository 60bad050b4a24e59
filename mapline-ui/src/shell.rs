//! Сборка приложения: окно, карта, подложка и предустановленная графика.
//!
//! Графика добавляется только после готовности карты: слушатель `ready`
//! не трогает слой сам, а ставит отдельную задачу в UI-очередь.

use std::sync::Arc;

use log::{error, info, warn};
use mapline_core::{
    ArcGisTiledService, BasemapLayer, BasemapService, LayerId, MapResult, MapView, OverlayLayer,
    StaticService, ViewConfig, Waker,
};
use mapline_types::{Graphic, LineSymbol, PolylineBuilder, Rgb};

use crate::{AppConfig, AppResult, SharedEventLog};

/// Толщина предустановленных линий, px.
const PRESET_WIDTH: f32 = 4.0;

/// Карта, собранная [`create_ui`], и её слой графики.
#[derive(Debug)]
pub struct MapUi {
    pub view: MapView,
    pub overlay: LayerId,
}

/// Параметры окна: положение и размер из конфигурации, заголовок.
pub fn create_window(config: &AppConfig) -> eframe::NativeOptions {
    eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_position(config.window_pos)
            .with_inner_size(config.window_size)
            .with_min_inner_size([400.0, 300.0])
            .with_title(config.title.clone()),
        ..Default::default()
    }
}

/// Создаёт подложку: сетевую по URL или встроенную в офлайн-режиме.
///
/// Таймаут запросов берётся из `view_config`.
pub fn build_basemap(
    config: &AppConfig,
    view_config: &ViewConfig,
) -> AppResult<BasemapLayer> {
    let service: Arc<dyn BasemapService> = if config.offline {
        info!("Offline mode: using built-in world basemap");
        Arc::new(StaticService::world())
    } else {
        Arc::new(ArcGisTiledService::new(
            config.basemap_url.clone(),
            view_config.request_timeout,
        )?)
    };

    Ok(BasemapLayer::new(service))
}

/// Собирает карту: охват, подложка, слой графики и подписки.
///
/// `waker` будит UI-цикл, когда фоновый поток присылает результат.
pub fn create_ui(
    config: &AppConfig,
    waker: Option<Waker>,
    events: SharedEventLog,
) -> AppResult<MapUi> {
    let mut view = match waker {
        Some(waker) => MapView::with_waker(config.view_config(), waker),
        None => MapView::new(config.view_config()),
    };

    view.set_extent(config.initial_extent)?;

    let basemap = build_basemap(config, view.config())?;
    events
        .write()
        .info(format!("Loading basemap {}", basemap.url()));
    view.add_layer(basemap)?;

    let overlay = view.add_layer(OverlayLayer::new(config.overlay_name.clone()))?;

    let ready_events = Arc::clone(&events);
    view.on_ready(move |view| {
        let sr = view
            .spatial_reference()
            .map(|sr| sr.to_string())
            .unwrap_or_default();
        ready_events.write().info(format!("Map view ready ({sr})"));

        let task_events = Arc::clone(&ready_events);
        view.poster().post(move |view: &mut MapView| {
            match add_simple_line_graphics(view, overlay) {
                Ok(n) => task_events.write().info(format!("Added {n} graphics")),
                Err(e) => {
                    error!("Failed to add graphics: {e}");
                    task_events.write().error(format!("Failed to add graphics: {e}"));
                }
            }
        });
    });

    let failed_events = Arc::clone(&events);
    view.on_failed(move |_, e| {
        warn!("Basemap failed to load: {e}");
        failed_events
            .write()
            .error(format!("Basemap failed to load: {e}"));
    });

    Ok(MapUi { view, overlay })
}

/// Две предустановленные линии: пурпурная ломаная и чёрный отрезок.
pub fn preset_graphics() -> MapResult<Vec<Graphic>> {
    let magenta = PolylineBuilder::start_path(118.169, 34.016)
        .line_to(104.941, 39.7072)
        .line_to(96.724, 32.732)
        .build()?;

    let black = PolylineBuilder::start_path(150.169, 34.016)
        .line_to(90.941, 39.7072)
        .build()?;

    Ok(vec![
        Graphic::new(magenta, LineSymbol::new(Rgb::MAGENTA, PRESET_WIDTH)?),
        Graphic::new(black, LineSymbol::new(Rgb::BLACK, PRESET_WIDTH)?),
    ])
}

/// Добавляет предустановленные линии в слой `overlay` по порядку.
///
/// Вызывается в UI-потоке на готовой карте; возвращает число добавленных.
pub fn add_simple_line_graphics(
    view: &mut MapView,
    overlay: LayerId,
) -> MapResult<usize> {
    let graphics = preset_graphics()?;
    let layer = view.overlay_mut(overlay)?;

    let n = graphics.len();
    for graphic in graphics {
        layer.add_graphic(graphic);
    }

    info!("Added {n} line graphics to '{}'", layer.name());
    Ok(n)
}
