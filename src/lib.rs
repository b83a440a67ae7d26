// Library surface for the binary and the headless/integration tests.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod game;
pub mod geometry;
pub mod hits;
pub mod history;
pub mod keymap;
pub mod leaderboard;
pub mod name_input;
pub mod runtime;
pub mod session;
pub mod target;
pub mod ui;
pub mod vision;
