use eframe::egui;

use academic_survival::engine::protocol::EngineCommand;
use academic_survival::model::message::Speaker;

use super::app::MyApp;
use super::settings_io::save_settings;

pub fn draw_left_panel(ctx: &egui::Context, app: &mut MyApp) {
    egui::SidePanel::left("left")
        .resizable(false)
        .default_width(200.0)
        .show(ctx, |ui| {
            ui.heading("Control center");
            ui.separator();

            let can_restart = app.ui.session.is_started() && !app.ui.waiting;
            if ui
                .add_enabled(can_restart, egui::Button::new("Restart academic life"))
                .clicked()
            {
                app.ui.notice = None;
                app.send_command(EngineCommand::Reset);
            }

            ui.separator();

            ui.label("Model server");
            if ui
                .add_enabled(!app.ui.waiting, egui::Button::new("Test connection"))
                .clicked()
            {
                app.ui.connection_status = None;
                app.send_command(EngineCommand::TestConnection);
            }
            match &app.ui.connection_status {
                Some(Ok(msg)) => {
                    ui.colored_label(egui::Color32::LIGHT_GREEN, msg);
                }
                Some(Err(err)) => {
                    ui.colored_label(egui::Color32::LIGHT_RED, err);
                }
                None => {}
            }

            ui.separator();

            let mut changed = false;
            ui.label("UI Scale");
            changed |= ui
                .add(egui::Slider::new(&mut app.settings.ui_scale, 0.75..=2.0))
                .changed();

            ui.collapsing("Colours", |ui| {
                for speaker in [Speaker::Player, Speaker::Narrator] {
                    let mut color = app.settings.color(speaker);
                    ui.horizontal(|ui| {
                        if ui.color_edit_button_srgba(&mut color).changed() {
                            app.settings.set_color(speaker, color);
                            changed = true;
                        }
                        ui.label(speaker.key());
                    });
                }
            });

            if changed {
                save_settings(&app.settings);
            }
        });
}
