//! Application orchestration — backend task, event loop plumbing, the key
//! relay and input handling.

pub mod backend;
pub mod event;
pub mod handler;
pub mod relay;
pub mod state;
