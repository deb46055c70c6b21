use eframe::egui;

use academic_survival::engine::orchestrator::{ChoiceLetter, PlayerInput};
use academic_survival::engine::protocol::EngineCommand;
use academic_survival::model::mode::Mode;

use super::app::{MyApp, ROLES};

pub fn draw_center_panel(ctx: &egui::Context, app: &mut MyApp) {
    if !app.ui.session.is_started() {
        draw_setup(ctx, app);
        return;
    }

    // ---------- Input bar ----------
    egui::TopBottomPanel::bottom("turn_input").show(ctx, |ui| {
        ui.add_space(4.0);
        draw_turn_input(ui, app);
        ui.add_space(4.0);
    });

    // ---------- Transcript ----------
    egui::CentralPanel::default().show(ctx, |ui| {
        egui::ScrollArea::vertical()
            .stick_to_bottom(app.ui.should_auto_scroll)
            .show(ui, |ui| {
                for msg in app.ui.session.transcript() {
                    app.draw_message(ui, msg);
                }
            });
    });
}

fn draw_setup(ctx: &egui::Context, app: &mut MyApp) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.heading("Academic Survival");
        ui.label("There is no right path here, only paths with less hair.");
        ui.separator();

        ui.columns(2, |cols| {
            cols[0].label("Choose your research track:");
            for (i, role) in ROLES.iter().enumerate() {
                cols[0].radio_value(&mut app.ui.setup.role, i, *role);
            }

            cols[1].label("Research field:");
            cols[1].text_edit_singleline(&mut app.ui.setup.field);
        });

        ui.add_space(12.0);

        if app.ui.waiting {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Your advisor is reviewing your proposal…");
            });
            return;
        }

        let field = app.ui.setup.field.trim().to_string();
        let start = ui.add_enabled(!field.is_empty(), egui::Button::new("Enter the lab"));
        if start.clicked() {
            let role = ROLES[app.ui.setup.role].to_string();
            app.ui.notice = None;
            app.send_command(EngineCommand::StartGame { field, role });
        }

        if let Some(notice) = &app.ui.notice {
            ui.colored_label(egui::Color32::YELLOW, notice);
        }
    });
}

fn draw_turn_input(ui: &mut egui::Ui, app: &mut MyApp) {
    if let Some(notice) = &app.ui.notice {
        ui.colored_label(egui::Color32::YELLOW, notice);
    }

    if app.ui.session.is_over() {
        let ending = app.ui.session.ending_kind();
        ui.heading(format!("Game over: {}", ending.title()));
        if ui.button("Start a new academic life").clicked() {
            app.ui.notice = None;
            app.send_command(EngineCommand::Reset);
        }
        return;
    }

    if app.ui.waiting {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Your advisor is typing…");
        });
        return;
    }

    let mut submit: Option<PlayerInput> = None;

    match app.ui.session.mode() {
        Mode::Normal => {
            ui.horizontal(|ui| {
                for letter in [ChoiceLetter::A, ChoiceLetter::B, ChoiceLetter::C] {
                    if ui.button(format!("  {letter}  ")).clicked() {
                        submit = Some(PlayerInput::Choice(letter));
                    }
                }
            });
            if let Some(text) = text_box(ui, &mut app.ui.input_text, "Or describe your own move…") {
                submit = Some(PlayerInput::Action(text));
            }
        }
        Mode::Quiz => {
            event_card(ui, "📝 Pop quiz", app.ui.session.pending_event_text());
            if let Some(text) = text_box(ui, &mut app.ui.input_text, "Your answer…") {
                submit = Some(PlayerInput::QuizAnswer(text));
            }
        }
        Mode::Boss => {
            event_card(ui, "⚔ Reviewer 2 attacks", app.ui.session.pending_event_text());
            if let Some(text) = text_box(ui, &mut app.ui.input_text, "Your rebuttal…") {
                submit = Some(PlayerInput::Rebuttal(text));
            }
        }
    }

    if let Some(input) = submit {
        app.ui.notice = None;
        app.send_command(EngineCommand::Submit(input));
    }
}

fn event_card(ui: &mut egui::Ui, title: &str, text: &str) {
    egui::Frame::group(ui.style())
        .inner_margin(egui::Margin::same(8))
        .show(ui, |ui| {
            ui.label(egui::RichText::new(title).strong());
            ui.label(text);
        });
    ui.add_space(4.0);
}

/// Multiline box sending on Enter (Shift+Enter for a newline).
/// Returns the trimmed text once sent.
fn text_box(ui: &mut egui::Ui, text: &mut String, hint: &str) -> Option<String> {
    let input_id = egui::Id::new("turn_input_box");
    let mut send_now = false;

    ui.horizontal(|ui| {
        let response = ui.add_sized(
            [ui.available_width() - 60.0, 60.0],
            egui::TextEdit::multiline(text)
                .id(input_id)
                .hint_text(hint)
                .lock_focus(true),
        );

        if response.has_focus()
            && ui.input(|i| i.key_pressed(egui::Key::Enter) && !i.modifiers.shift)
        {
            send_now = true;
        }

        if ui.button("Send").clicked() {
            send_now = true;
        }
    });

    if !send_now {
        return None;
    }

    ui.memory_mut(|m| m.request_focus(input_id));
    let sent = text.trim().to_string();
    text.clear();
    (!sent.is_empty()).then_some(sent)
}
