//! Coordinate mapping and overlay engine for the signing client.
//!
//! This crate has no I/O. It owns the math that places signature marks over
//! a rendered PDF page: converting stored PDF-space coordinates into canvas
//! pixels, building the overlay render model, and tracking the single draft
//! mark a user drags before saving. The host (web view, GUI, or CLI) is
//! responsible for measuring the canvas and persisting the resulting
//! [`draft::Placement`]s to the server.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`geometry`] | Points, viewport geometry and PDF/canvas conversions |
//! | [`mark`] | Signature mark wire model and status |
//! | [`overlay`] | Overlay frame rendering, status badges, the overlay layer |
//! | [`draft`] | Draft mark state machine and save-time placement |
//! | [`consts`] | Page size, style defaults and input limits |

pub mod consts;
pub mod draft;
pub mod geometry;
pub mod mark;
pub mod overlay;
