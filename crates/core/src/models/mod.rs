pub mod api;
pub mod catalog;
pub mod config;
pub mod group;
pub mod message;
pub mod state;
pub mod task;
