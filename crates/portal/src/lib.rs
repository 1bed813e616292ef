//! Portal authentication server library.
//!
//! This library provides token issuance and verification, the request gates,
//! the session endpoints and the router the portal's protected routes hang off.

pub mod api;
pub mod auth;
pub mod config;
pub mod credentials;
