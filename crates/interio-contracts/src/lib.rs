//! Wire types shared by the engine and the HTTP server.

pub mod models;
pub mod requests;
pub mod responses;
