//! cardferry: character card ingestion, normalization and PNG embedding.
//!
//! Cards arrive either as standalone JSON documents or as PNG images with
//! the card JSON embedded in a text-metadata chunk, produced by a zoo of
//! tools that disagree on encoding details. This crate extracts whatever is
//! there, reconciles the three overlapping schema layers (legacy flat
//! fields, the `data` block, the `alternative` block) into one
//! [`CharacterCard`], answers greeting/context queries for a downstream
//! conversational agent, and writes cards back to either carrier.

pub mod card;
pub mod config;
pub mod error;
pub mod export;
pub mod greeting;
pub mod loader;
pub mod png;

pub use card::CharacterCard;
pub use error::{CardferryError, Result};
pub use greeting::GreetingPolicy;
