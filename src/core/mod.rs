pub mod admin;
pub mod chat_stream;
pub mod config;
pub mod event;
pub mod frame;
pub mod phase;
pub mod transport;
pub mod turn;
