//! HTTP side of development mode.
//!
//! Two independent servers, both bound on 127.0.0.1:
//!
//! - [`server`] serves the output root and injects the reload client into HTML
//! - [`reload_server`] exposes the SSE stream of reload notifications and the
//!   embedded client script
//!
//! They run on different ports, so the reload endpoint allows any origin.

pub mod reload_server;
pub mod server;

use std::net::{Ipv4Addr, SocketAddr};

pub use reload_server::ReloadServer;
pub use server::DevServer;

/// Loopback address for `port`.
pub fn local_addr(port: u16) -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, port))
}

/// URL of the reload client script served on `reload_port`.
pub fn reload_script_url(reload_port: u16) -> String {
    format!("http://127.0.0.1:{}/livereload.js", reload_port)
}
