//! HTTP access to the signing backend.

pub mod api;
pub mod types;
