//! Core model — display tree, backend contexts, renderer tree and layout.
//!
//! Nothing in this module depends on any TUI or rendering crate.

pub mod context;
pub mod diagram;
pub mod source;
pub mod tree;
pub mod view;
pub mod wire;
