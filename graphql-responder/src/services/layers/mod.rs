//! Layers wrapping the responder.
pub mod content_negotiation;
