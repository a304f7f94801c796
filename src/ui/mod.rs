//! Terminal user interface built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into three layers:
//!
//! - **[`app`]**: application state, the key handler and the [`TerminalHost`]
//!   that lets a running program draw and read input
//! - **[`panes`]**: stateless render functions for the source pane, the output
//!   pane and the status bar
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it with the source and
//! its checked [`Program`] and call [`App::run`] to start the event loop.
//!
//! [`Program`]: crate::parser::ast::Program
//! [`App::run`]: app::App::run
//! [`TerminalHost`]: app::TerminalHost

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
