//! # Introduction
//!
//! Respawn is a small game-themed teaching language. Values come in four
//! kinds: `hp` (whole numbers), `xp` (decimals), `comms` (text) and `flag`
//! (truth values), and any of them can be `dead`. This crate scans, checks
//! and runs `.rsp` programs, either in a terminal UI built with
//! [ratatui](https://docs.rs/ratatui) or against plain stdin/stdout.
//!
//! ## Execution pipeline
//!
//! ```text
//! Source → Lexer → Parser + scope checks → AST → dry pass → live pass
//! ```
//!
//! 1. [`parser`]: tokenises the source, builds the AST and rejects
//!    undeclared names, misplaced `recall`/`break` and similar errors.
//! 2. [`interpreter`]: walks the AST twice. The dry pass runs without
//!    output and with symbolic input so most runtime errors surface before
//!    the program prints anything; the live pass then runs for real.
//! 3. [`environment`]: the scope stack, values and their declared types.
//! 4. [`host`]: the output/input boundary and per-run cancellation tokens.
//! 5. [`pipeline`]: the stages glued together, plus error rendering.
//! 6. [`ui`]: ratatui-based TUI; not part of the stable library API.

pub mod config;
pub mod diagnostic;
pub mod environment;
pub mod host;
pub mod interpreter;
pub mod logging;
pub mod parser;
pub mod pipeline;
pub mod ui;
