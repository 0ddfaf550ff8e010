pub mod client;
pub mod config;
pub mod data_models;
pub mod debouncer;
pub mod error;
pub mod panel;
pub mod render;
pub mod surface;
pub mod widget;
