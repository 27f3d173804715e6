//! WebSocket render surface: each browser client drives one session.

mod connection;
mod protocol;
mod surface;

pub use connection::handle_connection;
