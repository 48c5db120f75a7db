pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod exit;
pub mod normalize;
pub mod parsers;
pub mod ui;
