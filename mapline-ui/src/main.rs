use std::path::PathBuf;

use clap::Parser;
use log::{error, info, LevelFilter};
use mapline_ui::{run, run_headless, AppConfig, AppResult};

#[derive(Parser, Debug)]
#[command(
    name = "mapline",
    version = env!("CARGO_PKG_VERSION"),
    about = "Map viewer: tiled basemap with line graphics overlay",
    long_about = None,
)]
struct Cli {
    /// JSON-файл конфигурации (флаги ниже имеют приоритет)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// URL тайлового MapServer
    #[arg(long)]
    basemap_url: Option<String>,
    /// Встроенная подложка без сети
    #[arg(long)]
    offline: bool,
    /// Без окна: дождаться готовности, вывести графику и выйти
    #[arg(long)]
    headless: bool,
    /// Ожидание готовности подложки (секунды)
    #[arg(long)]
    ready_timeout: Option<u64>,
    /// Не загружать обзорные тайлы подложки
    #[arg(long)]
    no_overview: bool,
    /// Уровень логирования: error, warn, info, debug, trace
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
    /// Тихий режим (только ошибки)
    #[arg(short, long)]
    quiet: bool,
}

fn load_config(cli: &Cli) -> AppResult<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    if let Some(url) = &cli.basemap_url {
        config.basemap_url = url.clone();
    }
    if cli.offline {
        config.offline = true;
    }
    if let Some(secs) = cli.ready_timeout {
        config.ready_timeout_secs = secs;
    }
    if cli.no_overview {
        config.fetch_overview = false;
    }

    config.validate()?;
    Ok(config)
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.quiet {
        LevelFilter::Error
    } else {
        cli.log_level
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .format_timestamp_secs()
        .init();

    let config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!(
        "  Basemap       : {}",
        if config.offline {
            "built-in (offline)"
        } else {
            config.basemap_url.as_str()
        }
    );
    info!("  Extent        : {}", config.initial_extent);
    info!("  Ready timeout : {} s", config.ready_timeout_secs);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if cli.headless {
        match run_headless(config) {
            Ok(report) => info!(
                "Done: {} graphic(s) in {}",
                report.graphics.len(),
                report.spatial_reference
            ),
            Err(e) => {
                error!("Headless run failed: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    if let Err(e) = run(config) {
        error!("{e}");
        std::process::exit(1);
    }
}
