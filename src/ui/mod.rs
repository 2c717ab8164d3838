//! UI / rendering layer — everything that touches Ratatui widgets.
//!
//! This layer takes a sampled diagram frame and turns it into cells on the
//! terminal.  No backend traffic happens here.

pub mod layout;
pub mod theme;
pub mod tree_widget;
