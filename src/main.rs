mod ui;

use log::{info, warn};

use academic_survival::config;

fn main() -> eframe::Result<()> {
    init_logging();

    let config = config::load_game_config();
    // Writes the defaults on first run so the file can be edited by hand.
    if let Err(e) = config::save_game_config(&config) {
        warn!("could not write game config: {:#}", e);
    }
    info!(
        "model {} at {} (temperature {})",
        config.llm.model, config.llm.endpoint, config.llm.temperature
    );

    let options = eframe::NativeOptions::default();

    eframe::run_native(
        "Academic Survival",
        options,
        Box::new(|_cc| {
            let app = ui::app::MyApp::new(config)?;
            Ok(Box::new(app))
        }),
    )
}

fn init_logging() {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(log::LevelFilter::Info);
    builder.filter_module("eframe", log::LevelFilter::Warn);
    builder.filter_module("egui_glow", log::LevelFilter::Warn);
    builder.filter_module("reqwest", log::LevelFilter::Warn);
    // RUST_LOG overrides the defaults above.
    builder.parse_default_env();
    builder.init();
}
