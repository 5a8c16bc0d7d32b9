pub mod config;
pub mod core;
pub mod errors;
pub mod executor;
pub mod extensions;
pub mod logging;
pub mod prompter;
pub mod queue;
pub mod scheduler;
pub mod server;
pub mod session;
pub mod telescope;
pub mod ui;
