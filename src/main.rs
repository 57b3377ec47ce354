// GUI-subsystem binary: no console window is ever allocated by Windows.
#![windows_subsystem = "windows"]

use eframe::egui;
use stencilfe::app::StencilApp;
use stencilfe::logger;

fn main() -> Result<(), eframe::Error> {
    // Initialize session log (overwrites previous session log)
    logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([960.0, 600.0])
            .with_title("StencilFE"),
        ..Default::default()
    };

    eframe::run_native(
        "StencilFE",
        options,
        Box::new(|cc| Box::new(StencilApp::new(cc))),
    )
}
