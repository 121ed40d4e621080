//! write-tx: compose a message and submit it through a wallet provider

use eframe::egui;

mod app;
mod bridge;

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting write-tx");

    let bridge = bridge::WalletBridge::from_env()?;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Write Transaction")
            .with_inner_size([900.0, 640.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "write-tx",
        native_options,
        Box::new(move |_cc| Ok(Box::new(app::App::new(bridge)))),
    )
    .map_err(|e| eyre::eyre!("ui exited with error: {e}"))
}
