//! plugdesk: command-line front end
//!
//! Runs the host (`serve`) and talks to a running host's unlock API
//! (`unlock`, `status`, `lock`).

pub mod client;
pub mod commands;
pub mod output;
