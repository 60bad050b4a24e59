use std::{sync::Arc, time::Duration};

use log::{info, warn};
use mapline_core::{DisposeHandle, LayerId, MapView, ViewState, Waker};

use crate::{
    create_ui,
    panels::EventsPanel,
    render::{MapCanvas, OverviewTexture},
    theme, AppConfig, AppResult, EventLog, SharedEventLog, ViewStatus,
};

/// Как часто перепроверять карту, пока она ждёт подложку (таймаут).
const LOADING_POLL: Duration = Duration::from_millis(100);

pub struct MapApp {
    view: MapView,
    overlay: LayerId,
    events: SharedEventLog,
    overview: Vec<OverviewTexture>,
    last_status: ViewStatus,
    basemap_url: String,
    show_events: bool,
}

impl MapApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: AppConfig,
    ) -> AppResult<Self> {
        theme::configure_style(&cc.egui_ctx);

        let events = EventLog::shared();

        let repaint_ctx = cc.egui_ctx.clone();
        let waker: Waker = Arc::new(move || repaint_ctx.request_repaint());
        let ui = create_ui(&config, Some(waker), Arc::clone(&events))?;

        install_ctrlc(ui.view.dispose_handle(), cc.egui_ctx.clone());

        let last_status = ViewStatus::from(ui.view.state());

        Ok(Self {
            view: ui.view,
            overlay: ui.overlay,
            events,
            overview: Vec::new(),
            last_status,
            basemap_url: config.basemap_url,
            show_events: true,
        })
    }

    /// Фиксирует смену состояния карты в журнале.
    fn track_status(&mut self) {
        let status = ViewStatus::from(self.view.state());
        if status == self.last_status {
            return;
        }

        match self.view.state() {
            ViewState::Failed(e) => self.events.write().error(format!("Map view failed: {e}")),
            other => self.events.write().info(format!("Map view {other}")),
        }
        self.last_status = status;
    }

    /// Загружает в GPU новые тайлы обзорной подложки.
    fn sync_overview(
        &mut self,
        ctx: &egui::Context,
    ) {
        let Some(basemap) = self.view.basemap() else {
            return;
        };

        for (i, image) in basemap.overview().iter().enumerate().skip(self.overview.len()) {
            let color = egui::ColorImage::from_rgba_unmultiplied(
                [image.width as usize, image.height as usize],
                &image.rgba,
            );
            let texture = ctx.load_texture(
                format!("basemap-overview-{i}"),
                color,
                egui::TextureOptions::LINEAR,
            );
            self.overview.push(OverviewTexture {
                texture,
                envelope: image.envelope,
            });
        }
    }

    fn render_top_bar(
        &mut self,
        ctx: &egui::Context,
    ) {
        // Всё нужное копируется до отрисовки
        let status = ViewStatus::from(self.view.state());
        let sr = self
            .view
            .spatial_reference()
            .map(|sr| sr.to_string())
            .unwrap_or_else(|| "-".to_string());
        let graphics = self.view.overlay(self.overlay).map_or(0, |o| o.len());
        let extent = self
            .view
            .extent()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "-".to_string());

        egui::TopBottomPanel::top("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.colored_label(status.color(), format!("● {}", status.as_str()));
                ui.separator();
                ui.label(format!("SR: {sr}"));
                ui.separator();
                ui.label(format!("Graphics: {graphics}"));
                ui.separator();
                ui.label(format!("Extent: {extent}"));

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.toggle_value(&mut self.show_events, "Events");
                    ui.weak(&self.basemap_url);
                });
            });
        });
    }

    fn render_error_banner(
        &self,
        ui: &mut egui::Ui,
    ) {
        let ViewState::Failed(e) = self.view.state() else {
            return;
        };

        egui::Frame::new()
            .fill(theme::ERROR_BANNER)
            .inner_margin(egui::Margin::same(8))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.colored_label(
                    egui::Color32::WHITE,
                    format!("Basemap failed to load: {e}. Graphics will not be shown."),
                );
            });
    }
}

fn install_ctrlc(
    handle: DisposeHandle,
    ctx: egui::Context,
) {
    let result = ctrlc::set_handler(move || {
        warn!("Ctrl+C received, closing window");
        handle.dispose();
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    });

    if let Err(e) = result {
        warn!("Failed to set Ctrl+C handler: {e}");
    }
}

impl eframe::App for MapApp {
    fn update(
        &mut self,
        ctx: &egui::Context,
        _frame: &mut eframe::Frame,
    ) {
        // Карта освобождается до закрытия окна
        if ctx.input(|i| i.viewport().close_requested()) && !self.view.is_disposed() {
            info!("Window close requested");
            self.view.dispose();
        }

        self.view.pump();
        self.track_status();
        self.sync_overview(ctx);

        if self.view.take_redraw() {
            ctx.request_repaint();
        }
        if self.view.state() == &ViewState::Constructed {
            ctx.request_repaint_after(LOADING_POLL);
        }

        self.render_top_bar(ctx);

        if self.show_events {
            egui::TopBottomPanel::bottom("events")
                .resizable(true)
                .default_height(140.0)
                .show(ctx, |ui| EventsPanel::render(ui, &self.events));
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.render_error_banner(ui);
                MapCanvas::show(ui, &mut self.view, &self.overview);
            });
    }
}
