//! Card serialization: JSON documents and PNG embedding.
//!
//! PNG export resolves a base image from the explicit argument, the card's
//! avatar reference, or a synthesized placeholder, then injects the card JSON
//! base64-encoded into a `chara` tEXt chunk. Unreadable candidates fall
//! through to the next one; only the final encode/write surfaces an error.

use crate::card::CharacterCard;
use crate::error::Result;
use crate::png;
use image::{Rgba, RgbaImage};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::{error, info, warn};

/// Placeholder canvas dimensions, portrait orientation like most avatars.
const PLACEHOLDER_WIDTH: u32 = 512;
const PLACEHOLDER_HEIGHT: u32 = 768;

/// Label used when the card has no name to show.
const GENERIC_LABEL: &str = "Character Card";

/// Renders a placeholder avatar for a card with no usable image: given the
/// display name and canvas size, produce the pixels. The default paints a
/// solid slate-blue canvas; callers wanting the name drawn on it plug in
/// their own rasterizer via [`save_png_with_renderer`].
pub type PlaceholderRenderer = fn(name: &str, width: u32, height: u32) -> RgbaImage;

/// Default placeholder: solid background, no text.
pub fn solid_placeholder(_name: &str, width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([73, 109, 137, 255]))
}

/// Serialize the card to a human-readable UTF-8 JSON document.
///
/// Timestamps are refreshed first; any IO error propagates.
pub fn save_json(card: &mut CharacterCard, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    card.touch_timestamps();
    card.normalize();

    let text = serde_json::to_string_pretty(card)?;
    fs::write(path, text)?;
    info!("Character card saved to {}", path.display());
    Ok(())
}

/// Embed the card into a PNG at `path`, using [`solid_placeholder`] when no
/// base image can be resolved.
pub fn save_png(
    card: &mut CharacterCard,
    path: impl AsRef<Path>,
    base_image: Option<&Path>,
) -> Result<()> {
    save_png_with_renderer(card, path, base_image, solid_placeholder)
}

/// Embed the card into a PNG at `path`.
///
/// Base image resolution order: `base_image` if it exists and decodes, the
/// card's avatar reference if it is a local existing file (remote URLs are
/// skipped, never fetched), else a placeholder rendered by `renderer`. The
/// chosen image is converted to RGBA and re-encoded; the card JSON rides in a
/// base64 `chara` text chunk. Failures on the final encode or write are
/// logged and returned as errors rather than panicking.
pub fn save_png_with_renderer(
    card: &mut CharacterCard,
    path: impl AsRef<Path>,
    base_image: Option<&Path>,
    renderer: PlaceholderRenderer,
) -> Result<()> {
    let path = path.as_ref();
    card.touch_timestamps();
    card.normalize();

    let rgba = resolve_base_image(card, base_image, renderer);

    let mut base_png = Vec::new();
    if let Err(e) = rgba.write_to(&mut Cursor::new(&mut base_png), image::ImageFormat::Png) {
        error!("Failed to encode base image for {}: {}", path.display(), e);
        return Err(e.into());
    }

    let card_json = serde_json::to_string(card)?;
    let with_payload = png::inject_text_chunk(&base_png, png::CHARA_KEYWORD, &card_json)?;

    if let Err(e) = fs::write(path, with_payload) {
        error!("Failed to write card PNG {}: {}", path.display(), e);
        return Err(e.into());
    }

    info!("Character card embedded into {}", path.display());
    Ok(())
}

fn resolve_base_image(
    card: &CharacterCard,
    base_image: Option<&Path>,
    renderer: PlaceholderRenderer,
) -> RgbaImage {
    if let Some(candidate) = base_image {
        if candidate.exists() {
            match image::open(candidate) {
                Ok(img) => return img.to_rgba8(),
                Err(e) => warn!(
                    "Could not open base image {}: {}",
                    candidate.display(),
                    e
                ),
            }
        } else {
            warn!("Base image {} does not exist", candidate.display());
        }
    }

    if let Some(avatar) = card.avatar.as_deref() {
        if !card.avatar_is_remote() {
            let candidate = Path::new(avatar);
            if candidate.exists() {
                match image::open(candidate) {
                    Ok(img) => return img.to_rgba8(),
                    Err(e) => warn!("Could not open avatar {}: {}", avatar, e),
                }
            }
        }
    }

    let name = card.resolved_name();
    let label = if name.is_empty() { GENERIC_LABEL } else { name };
    renderer(label, PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_placeholder_dimensions() {
        let img = solid_placeholder("Anyone", PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT);
        assert_eq!(img.dimensions(), (512, 768));
        assert_eq!(img.get_pixel(0, 0), &Rgba([73, 109, 137, 255]));
    }

    #[test]
    fn placeholder_png_carries_extractable_card() {
        // No base image, no avatar, no name: the degenerate case must still
        // produce a valid card PNG.
        let mut card = CharacterCard::default();
        let path = std::env::temp_dir().join(format!(
            "cardferry-export-{}.png",
            std::process::id()
        ));

        save_png(&mut card, &path, None).unwrap();
        let bytes = fs::read(&path).unwrap();
        fs::remove_file(&path).ok();

        let value = png::extract_embedded_json(&bytes).unwrap().unwrap();
        assert_eq!(value["spec"], "chara_card_v2");
        assert_eq!(value["data"]["extensions"]["talkativeness"], "0.5");
    }

    #[test]
    fn renderer_receives_resolved_name() {
        fn asserting_renderer(name: &str, w: u32, h: u32) -> RgbaImage {
            assert_eq!(name, "Mira");
            solid_placeholder(name, w, h)
        }

        let mut card = CharacterCard::default();
        card.data.name = "Mira".to_string();
        let path = std::env::temp_dir().join(format!(
            "cardferry-renderer-{}.png",
            std::process::id()
        ));

        save_png_with_renderer(&mut card, &path, None, asserting_renderer).unwrap();
        fs::remove_file(&path).ok();
    }
}
