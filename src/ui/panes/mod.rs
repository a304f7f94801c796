//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`source`]: Source code display with syntax highlighting and a marked line
//! - [`terminal`]: Program output from `shoot`/`shootNxt` plus the `load` input line
//! - [`status`]: Status bar with keybindings and run state
//!
//! Each pane module exports a primary `render_*` function and the small
//! state types it draws.

pub mod source;
pub mod status;
pub mod terminal;

pub use source::{render_source_pane, LineMark};
pub use status::{render_status_bar, RunState};
pub use terminal::{render_terminal_pane, InputLine};
