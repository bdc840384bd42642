//! Authoritative simulation engine for a top-down open-world action game

pub mod config;
pub mod game;
pub mod session;
pub mod util;
