//! mapline-ui: окно просмотра карты с тайловой подложкой и линиями поверх.
//!
//! Окно строится на `eframe`/`egui`. Карта ([`mapline_core::MapView`])
//! принадлежит приложению целиком; фоновые загрузки будят UI-цикл, а их
//! результаты применяются при прокачке очереди в каждом кадре.

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod headless;
pub mod panels;
pub mod render;
pub mod shell;
pub mod theme;

use log::{info, warn};

pub use app::MapApp;
pub use config::*;
pub use data::*;
pub use error::*;
pub use headless::{HeadlessReport, HeadlessSession};
pub use shell::*;

/// Запуск окна. Возвращается после закрытия.
pub fn run(config: AppConfig) -> AppResult<()> {
    let options = create_window(&config);
    let title = config.title.clone();

    info!("Opening window '{title}'");

    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| match MapApp::new(cc, config) {
            Ok(app) => Ok(Box::new(app)),
            Err(e) => Err(Box::new(e)),
        }),
    )
    .map_err(|e| AppError::Ui(e.to_string()))
}

/// Запуск без окна: ждёт готовности карты и выводит графику в лог.
pub fn run_headless(config: AppConfig) -> AppResult<HeadlessReport> {
    let session = HeadlessSession::start(&config)?;

    let handle = session.dispose_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        warn!("Ctrl+C received, disposing map view");
        handle.dispose();
    }) {
        warn!("Failed to set Ctrl+C handler: {e}");
    }

    session.run()
}
