pub mod app;
mod center_panel;
mod left_panel;
mod right_panel;
pub mod settings;
pub mod settings_io;
