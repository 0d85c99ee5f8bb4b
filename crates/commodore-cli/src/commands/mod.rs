//! CLI commands, one per manager

pub mod components;
pub mod helm;
pub mod images;
