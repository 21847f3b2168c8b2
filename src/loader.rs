//! Carrier dispatch: load a card from a JSON document or a PNG with embedded
//! metadata.
//!
//! The two carriers get different strictness. A JSON file exists only to hold
//! card data, so any parse problem is fatal. A PNG is still a usable avatar
//! even when its payload is missing or corrupt, so extraction problems are
//! logged and the load continues with a defaults-only card.

use crate::card::CharacterCard;
use crate::error::{CardferryError, Result};
use crate::png;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Load a character card from `path`, dispatching on the file extension
/// (case-insensitive `.png` or `.json`).
///
/// `avatar` overrides the card's avatar reference; for a PNG carrier the
/// carrier itself is the default avatar.
pub fn load_card(path: impl AsRef<Path>, avatar: Option<&str>) -> Result<CharacterCard> {
    let path = path.as_ref();
    debug!("Loading character card from {}", path.display());

    if !path.exists() {
        return Err(CardferryError::NotFound(path.display().to_string()));
    }

    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => load_from_png(path, avatar),
        "json" => load_from_json(path, avatar),
        _ => Err(CardferryError::UnsupportedCarrier(
            path.display().to_string(),
        )),
    }
}

fn load_from_png(path: &Path, avatar: Option<&str>) -> Result<CharacterCard> {
    let bytes = fs::read(path)?;

    let document = match png::extract_embedded_json(&bytes) {
        Ok(Some(value)) => {
            debug!("Extracted embedded card data from {}", path.display());
            Some(value)
        }
        Ok(None) => {
            debug!(
                "No embedded card data in {}; loading as avatar-only card",
                path.display()
            );
            None
        }
        // Availability over strictness: a broken payload still leaves a
        // usable avatar image behind.
        Err(e) => {
            warn!(
                "Embedded card data in {} is unusable ({}); loading as avatar-only card",
                path.display(),
                e
            );
            None
        }
    };

    let mut card = match document {
        Some(value) => match CharacterCard::from_document(value) {
            Ok(card) => card,
            Err(e) => {
                warn!(
                    "Embedded card data in {} does not match the card schema ({}); \
                     loading as avatar-only card",
                    path.display(),
                    e
                );
                CharacterCard::default()
            }
        },
        None => CharacterCard::default(),
    };

    card.avatar = Some(
        avatar
            .map(str::to_string)
            .unwrap_or_else(|| path.display().to_string()),
    );
    Ok(card)
}

fn load_from_json(path: &Path, avatar: Option<&str>) -> Result<CharacterCard> {
    let text = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text)?;
    if !value.is_object() {
        return Err(CardferryError::InvalidJson(format!(
            "{}: top-level value is not an object",
            path.display()
        )));
    }

    let mut card = CharacterCard::from_document(value)?;
    card.avatar = avatar.map(str::to_string);
    Ok(card)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_is_not_found() {
        let result = load_card("/no/such/card.json", None);
        assert!(matches!(result, Err(CardferryError::NotFound(_))));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        // Path must exist before dispatch runs.
        let path = std::env::temp_dir().join(format!("cardferry-{}.webp", std::process::id()));
        fs::write(&path, b"not a card").unwrap();
        let result = load_card(&path, None);
        fs::remove_file(&path).ok();
        assert!(matches!(result, Err(CardferryError::UnsupportedCarrier(_))));
    }
}
