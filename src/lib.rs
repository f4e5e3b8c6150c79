pub mod commands;
pub mod config;
pub mod console;
pub mod consts;
pub mod error;
pub mod events;
pub mod logging;
pub mod nav;
pub mod store;
