//! PTY transport: runs the configured shell locally and exposes it as a
//! `TransportChannel`.
//!
//! Uses `portable-pty` for cross-platform PTY spawning. Each channel owns one
//! shell process; a reconnect spawns a fresh one.

mod channel;
mod spawn;

pub use channel::PtyChannel;
pub use spawn::ShellLaunch;
