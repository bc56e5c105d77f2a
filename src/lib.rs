//! Byfrost - single-file-per-frame TCP upload server
//!
//! Core library for the framing protocol, storage and listener.

pub mod config;
pub mod protocol;
pub mod server;
pub mod storage;
