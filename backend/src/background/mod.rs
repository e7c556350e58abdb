//! Background jobs spawned alongside the HTTP server

pub mod reset_token_purge;
