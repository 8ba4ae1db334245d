//! RPC server module.
//!
//! This module provides the TCP listener and tonic server bootstrap for the
//! file transfer service.

mod listener;

pub use listener::FileServer;
