use eframe::egui;
use egui::Layout;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::Context;
use log::warn;

use academic_survival::config::GameConfig;
use academic_survival::engine::engine::Engine;
use academic_survival::engine::llm_client::LmStudioClient;
use academic_survival::engine::orchestrator::TurnOrchestrator;
use academic_survival::engine::protocol::{EngineCommand, EngineResponse};
use academic_survival::model::message::{Message, Speaker};
use academic_survival::model::session::Session;

use super::settings::UiSettings;
use super::settings_io::load_settings;
use super::{center_panel, left_panel, right_panel};

pub const ROLES: [&str; 2] = ["Experimental", "Theory & computation"];

/* =========================
   Setup form
   ========================= */

pub struct SetupForm {
    pub role: usize,
    pub field: String,
}

impl Default for SetupForm {
    fn default() -> Self {
        Self {
            role: 0,
            field: "Condensed matter / quantum information / statistical mechanics".into(),
        }
    }
}

/* =========================
   UI State
   ========================= */

#[derive(Default)]
pub struct UiState {
    pub input_text: String,
    /// Latest copy received from the engine.
    pub session: Session,
    pub setup: SetupForm,

    /// A command is in flight; input is disabled until the engine answers.
    pub waiting: bool,
    pub notice: Option<String>,
    pub connection_status: Option<Result<String, String>>,
    pub should_auto_scroll: bool,
}

/* =========================
   App
   ========================= */

pub struct MyApp {
    pub ui: UiState,
    pub settings: UiSettings,

    cmd_tx: mpsc::Sender<EngineCommand>,
    resp_rx: mpsc::Receiver<EngineResponse>,
}

impl MyApp {
    pub fn new(config: GameConfig) -> anyhow::Result<Self> {
        let client =
            LmStudioClient::new(config.llm.clone()).context("building the model client")?;

        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();

        std::thread::spawn(move || {
            let orchestrator = TurnOrchestrator::from_config(client, &config);
            let mut engine = Engine::new(cmd_rx, resp_tx, orchestrator);
            engine.run();
        });

        Ok(Self {
            ui: UiState::default(),
            settings: load_settings(),
            cmd_tx,
            resp_rx,
        })
    }

    pub fn send_command(&mut self, cmd: EngineCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            warn!("engine thread is gone");
            self.ui.notice = Some("The game engine stopped. Please restart the app.".into());
            return;
        }
        self.ui.waiting = true;
    }

    fn poll_engine(&mut self) {
        while let Ok(resp) = self.resp_rx.try_recv() {
            self.ui.waiting = false;
            match resp {
                EngineResponse::SessionUpdated(session) => {
                    self.ui.session = session;
                    self.ui.should_auto_scroll = true;
                }
                EngineResponse::InputRejected(reason) => {
                    self.ui.notice = Some(reason);
                }
                EngineResponse::ConnectionStatus(status) => {
                    self.ui.connection_status = Some(status);
                }
            }
        }
    }

    pub fn draw_message(&self, ui: &mut egui::Ui, msg: &Message) {
        let bg = self.settings.color(msg.speaker);
        let right = msg.speaker == Speaker::Player;
        let text = match msg.speaker {
            Speaker::Player => format!("You: {}", msg.text),
            Speaker::Narrator => msg.text.clone(),
        };

        ui.add_space(6.0);

        if right {
            ui.with_layout(Layout::right_to_left(egui::Align::TOP), |ui| {
                bubble(ui, bg, &text);
            });
        } else {
            bubble(ui, bg, &text);
        }
    }
}

/* =========================
   egui App
   ========================= */

impl eframe::App for MyApp {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        ctx.set_pixels_per_point(self.settings.ui_scale);

        self.poll_engine();

        left_panel::draw_left_panel(ctx, self);
        right_panel::draw_right_panel(ctx, &self.ui.session);
        center_panel::draw_center_panel(ctx, self);

        if self.ui.waiting {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
        self.ui.should_auto_scroll = false;
    }
}

fn bubble(ui: &mut egui::Ui, color: egui::Color32, text: &str) {
    egui::Frame::new()
        .fill(color)
        .corner_radius(8.0)
        .inner_margin(egui::Margin::symmetric(10, 6))
        .show(ui, |ui| {
            ui.label(egui::RichText::new(text).color(egui::Color32::WHITE));
        });
}
