//! signdesk: client for a document-signing service.
//!
//! SYSTEM CONTEXT
//! ==============
//! Owners upload PDFs, place signature marks on them and invite others to
//! sign through emailed links. The backend stores documents and marks and
//! flattens them into a final PDF; this crate is everything on the client
//! side of that API.
//!
//! ARCHITECTURE
//! ============
//! | Module | Role |
//! |--------|------|
//! | `config` | environment-driven settings |
//! | `session` | bearer token persistence |
//! | `net` | typed REST client and wire types |
//! | `documents` | listing filters, upload, finalized-file resolution |
//! | `locator` | canvas and scroll-container discovery |
//! | `view` | one open document: overlay, draft placement, actions |
//! | `public` | signing through a public link |
//!
//! Coordinate math, overlay rendering and the draft state machine live in
//! the `viewport` crate and have no I/O.

pub mod config;
pub mod documents;
pub mod error;
pub mod locator;
pub mod net;
pub mod public;
pub mod session;
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;
