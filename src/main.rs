mod app;

use app::FlashcardsApp;
use flashcards_app::config::AppConfig;
use flashcards_app::database::db;
use log::{error, info, warn};

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env();
    let conn = match db::init_database(&config.database_path) {
        Ok(conn) => conn,
        Err(e) => {
            error!(
                "Failed to open database '{}': {}",
                config.database_path.display(),
                e
            );
            std::process::exit(1);
        }
    };

    if config.seed_sample_data {
        match db::seed_sample_data(&conn) {
            Ok(true) => info!("Sample data created"),
            Ok(false) => {}
            Err(e) => warn!("Failed to create sample data: {}", e),
        }
    }

    match db::list_categories(&conn) {
        Ok(categories) => {
            info!("Loaded {} categories from database", categories.len());
            for category in &categories {
                info!("  - {}", category.name);
            }
        }
        Err(e) => warn!("Failed to list categories: {}", e),
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([640.0, 720.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Flashcards",
        options,
        Box::new(move |_cc| Ok(Box::new(FlashcardsApp::new(config, conn)))),
    )
}
