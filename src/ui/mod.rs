//! Terminal UI layer for interactive chat sessions.
//!
//! - [`chat_loop`]: the interaction loop that maps input to
//!   [`crate::core::app::AppAction`]s and runs background tasks.
//! - [`renderer`], [`layout`], and [`markup`]: view composition and frame output.
//! - [`theme`] and [`builtin_themes`]: color/style policy for the light and
//!   dark modes.
//!
//! This layer presents and captures interaction state, while [`crate::core`]
//! owns the conversation and its persistence.

pub mod builtin_themes;
pub mod chat_loop;
pub mod layout;
pub mod markup;
pub mod renderer;
pub mod theme;
