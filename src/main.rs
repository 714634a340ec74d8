#![warn(clippy::all)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use profiler_view::{Arguments, ProfilerViewApp};
use tracing::{debug, error};

/*
cargo fmt
cargo test -- --nocapture
cargo test -- --show-output tests_workflow
cargo run -- --help
RUST_LOG=debug cargo run -- -u http://127.0.0.1:8000 sales.csv
cargo doc --open
cargo b -r && cargo install --path=.
*/

#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    // Initialize the tracing subscriber for logging.
    // Use RUST_LOG environment variable to set logging level.  eg `export RUST_LOG=info`
    tracing_subscriber::fmt::init();

    // Parse command-line arguments.
    let args = Arguments::build();
    debug!("main()\nArguments: {args:#?}");

    // Configure the native options for the eframe application.
    let native_options = eframe::NativeOptions {
        centered: true,
        persist_window: true,
        vsync: true,
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    // Run the eframe application.
    eframe::run_native(
        "Profiler View",
        native_options,
        Box::new(move |creation_context| match ProfilerViewApp::new(creation_context, &args) {
            Ok(app) => Ok(Box::new(app)),
            Err(err) => {
                error!("Failed to initialize ProfilerViewApp: {err}");
                Err(Box::new(err))
            }
        }),
    )
}
