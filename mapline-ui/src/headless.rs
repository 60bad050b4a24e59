//! Режим без окна: та же сборка карты, UI-очередь прокачивается циклом.
//!
//! Используется для проверки сервиса подложки из терминала и в тестах.

use std::time::Duration;

use log::{info, warn};
use mapline_core::{pump_until_settled, DisposeHandle, MapError, ViewState};
use mapline_types::{Graphic, SpatialReference};

use crate::{create_ui, AppConfig, AppError, AppResult, EventLog, MapUi, SharedEventLog};

/// Период прокачки очереди.
const TICK: Duration = Duration::from_millis(20);

/// Запас сверх `ready_timeout`: таймаут должен сработать внутри карты.
const SETTLE_MARGIN: Duration = Duration::from_secs(1);

/// Итог headless-запуска.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessReport {
    pub spatial_reference: SpatialReference,
    /// Графика оверлея в порядке отрисовки
    pub graphics: Vec<Graphic>,
}

pub struct HeadlessSession {
    ui: MapUi,
    events: SharedEventLog,
    settle_timeout: Duration,
}

impl HeadlessSession {
    pub fn start(config: &AppConfig) -> AppResult<Self> {
        let events = EventLog::shared();
        let ui = create_ui(config, None, std::sync::Arc::clone(&events))?;

        Ok(Self {
            ui,
            events,
            settle_timeout: config
                .view_config()
                .ready_timeout
                .saturating_add(SETTLE_MARGIN),
        })
    }

    pub fn dispose_handle(&self) -> DisposeHandle {
        self.ui.view.dispose_handle()
    }

    pub fn events(&self) -> &SharedEventLog {
        &self.events
    }

    /// Ждёт готовности, выполняет отложенное добавление графики и
    /// освобождает карту.
    pub fn run(mut self) -> AppResult<HeadlessReport> {
        let view = &mut self.ui.view;

        if !pump_until_settled(view, self.settle_timeout, TICK) {
            view.dispose();
            return Err(MapError::Timeout(self.settle_timeout).into());
        }

        // Задача со слушателя `ready` могла прийти последней
        view.pump();

        let result = match view.state() {
            ViewState::Ready => {
                let graphics: Vec<Graphic> = view
                    .overlay(self.ui.overlay)
                    .map(|o| o.graphics().cloned().collect())
                    .unwrap_or_default();

                let spatial_reference = view
                    .spatial_reference()
                    .ok_or(MapError::NotReady)?;

                info!("Map view ready: {spatial_reference}");
                for (i, g) in graphics.iter().enumerate() {
                    let s = g.symbol;
                    info!(
                        "  #{i}: {} points, rgb({}, {}, {}), width {}, {}",
                        g.geometry.len(),
                        s.color.r,
                        s.color.g,
                        s.color.b,
                        s.width,
                        s.style
                    );
                }

                Ok(HeadlessReport {
                    spatial_reference,
                    graphics,
                })
            }
            ViewState::Failed(e) => Err(AppError::Map(e.clone())),
            ViewState::Disposed => {
                warn!("Map view disposed before it became ready");
                Err(AppError::Interrupted)
            }
            ViewState::Constructed => Err(MapError::NotReady.into()),
        };

        view.dispose();
        result
    }
}
