//! Main window: header with the wallet button, message box with submit.

use std::time::Duration;

use eframe::egui;

use write_tx_core::{ConnectionState, SubmissionState};

use crate::bridge::WalletBridge;

pub struct App {
    bridge: WalletBridge,
    /// Text buffer bound to the message box; mirrored into the composer on edit.
    draft: String,
}

impl App {
    pub fn new(bridge: WalletBridge) -> Self {
        Self {
            bridge,
            draft: String::new(),
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.bridge.poll();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.heading("Write Transaction");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    self.render_wallet_button(ui, ctx);
                });
            });
            ui.add_space(8.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(20.0);
            ui.label("Write your message");
            let response = ui.add(
                egui::TextEdit::multiline(&mut self.draft)
                    .desired_rows(15)
                    .desired_width(f32::INFINITY),
            );
            if response.changed() {
                self.bridge.set_text(&self.draft);
            }

            ui.add_space(12.0);
            if ui
                .add_enabled(self.bridge.can_submit(), egui::Button::new("Submit Message"))
                .clicked()
            {
                self.bridge.submit(ctx);
            }

            ui.add_space(12.0);
            render_submission(ui, self.bridge.flow().submission());
            if let Some(notice) = self.bridge.notice() {
                ui.colored_label(egui::Color32::from_rgb(220, 160, 60), notice.to_string());
            }
        });

        if self.bridge.flow().connection().is_connected() {
            ctx.request_repaint_after(Duration::from_secs(5));
        }
    }
}

impl App {
    fn render_wallet_button(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        match self.bridge.flow().connection().clone() {
            ConnectionState::Disconnected => {
                if ui.button("Connect Wallet").clicked() {
                    self.bridge.connect(ctx);
                }
            }
            ConnectionState::Connecting => {
                ui.add_enabled(false, egui::Button::new("Connecting..."));
                ui.spinner();
            }
            ConnectionState::Connected(address) => {
                if ui.button("Disconnect").clicked() {
                    self.bridge.disconnect();
                }
                ui.monospace(short_address(address.as_str()));
            }
            ConnectionState::Error(err) => {
                if ui.button("Connect Wallet").clicked() {
                    self.bridge.connect(ctx);
                }
                ui.colored_label(egui::Color32::from_rgb(220, 80, 80), err.to_string());
            }
        }
    }
}

fn render_submission(ui: &mut egui::Ui, state: &SubmissionState) {
    match state {
        SubmissionState::Idle => {}
        SubmissionState::Pending => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Waiting for the wallet...");
            });
        }
        SubmissionState::Confirmed(receipt) => {
            ui.horizontal(|ui| {
                ui.colored_label(egui::Color32::from_rgb(0, 212, 170), "Confirmed:");
                ui.monospace(receipt.as_str());
            });
        }
        SubmissionState::Failed(err) => {
            ui.colored_label(egui::Color32::from_rgb(220, 80, 80), format!("Failed: {err}"));
        }
    }
}

fn short_address(address: &str) -> String {
    if address.len() <= 12 || !address.is_ascii() {
        return address.to_owned();
    }
    format!("{}…{}", &address[..6], &address[address.len() - 4..])
}
