pub mod config;
pub mod microphone;
pub mod voice;
