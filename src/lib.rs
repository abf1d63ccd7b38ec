//! campus-chat is a terminal client for a campus assistant server that
//! answers over a phase-annotated event stream.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the streaming pipeline: byte framing ([`core::frame`]),
//!   event decoding ([`core::event`]), the per-turn phase machine
//!   ([`core::phase`]), and the turn controller that drives them
//!   ([`core::turn`]). It also holds configuration and the admin client.
//! - [`ui`] defines the rendering surface ([`ui::renderer`]), a plain
//!   terminal implementation of it, and the interactive chat loop.
//! - [`api`] defines the wire payloads exchanged with the server.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
