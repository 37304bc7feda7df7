//! Parlance is a full-screen terminal chat front-end for hosted completion APIs.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the conversation store, its on-disk persistence, the
//!   markdown-subset formatter, configuration, and the action/command state
//!   machine driven by the chat loop.
//! - [`ui`] renders the terminal interface and runs the interactive event loop
//!   that turns key presses into actions and runs the resulting commands.
//! - [`api`] defines the Responses endpoint payloads and the completion client.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which dispatches into [`ui::chat_loop`] for
//! interactive sessions.

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
