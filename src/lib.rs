pub mod agent;
pub mod analysis;
pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod global;
pub mod lifecycle;
pub mod processing;
pub mod records;
pub mod transcription;
