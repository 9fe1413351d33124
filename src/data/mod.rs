//! Data layer - realized document state without terminal coupling
//!
//! The runtime writes into these structures; the frontend reads them to draw.

pub mod document;
pub mod element;
pub mod page;
