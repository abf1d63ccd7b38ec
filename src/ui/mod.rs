//! Terminal presentation for chat sessions.
//!
//! - [`renderer`]: the surface the phase machine draws on.
//! - [`terminal`]: a line-oriented implementation of that surface.
//! - [`chat_loop`]: the interactive session on stdin/stdout.
//!
//! Ownership boundary: this layer presents and captures interaction state, while
//! [`crate::core`] owns stream handling and backend coordination.

pub mod chat_loop;
pub mod renderer;
pub mod terminal;
