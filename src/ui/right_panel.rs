use eframe::egui;

use academic_survival::model::mode::{EndingKind, Mode};
use academic_survival::model::session::Session;

pub fn draw_right_panel(ctx: &egui::Context, session: &Session) {
    egui::SidePanel::right("right")
        .resizable(true)
        .default_width(260.0)
        .min_width(200.0)
        .show(ctx, |ui| {
            ui.heading("Status");
            ui.separator();

            if !session.is_started() {
                ui.label("No game in progress.");
                return;
            }

            egui::Grid::new("status_grid").num_columns(2).show(ui, |ui| {
                ui.label("Track");
                ui.label(session.role());
                ui.end_row();

                ui.label("Field");
                ui.label(session.field());
                ui.end_row();

                ui.label("Round");
                ui.label(session.round_count().to_string());
                ui.end_row();

                ui.label("Mode");
                ui.label(session.mode().to_string());
                ui.end_row();
            });

            if session.mode() != Mode::Normal {
                ui.separator();
                ui.collapsing("Awaiting your response", |ui| {
                    ui.label(session.pending_event_text());
                });
            }

            if session.is_over() && session.ending_kind() != EndingKind::None {
                ui.separator();
                ui.label(egui::RichText::new(session.ending_kind().title()).strong());
            }
        });
}
