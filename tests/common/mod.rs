#![allow(dead_code)]

use cardferry::png::{build_png, PngChunk};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Unique scratch path under the system temp dir. Tests clean up after
/// themselves; leftovers from aborted runs are harmless.
pub fn temp_path(tag: &str, ext: &str) -> PathBuf {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "cardferry-{}-{}-{}.{}",
        tag,
        std::process::id(),
        n,
        ext
    ))
}

/// Minimal valid 1x1 grayscale PNG with no text chunks.
pub fn minimal_png() -> Vec<u8> {
    let ihdr: [u8; 13] = [0, 0, 0, 1, 0, 0, 0, 1, 8, 0, 0, 0, 0];
    let idat: [u8; 10] = [0x08, 0xD7, 0x63, 0x60, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01];
    build_png(&[
        PngChunk::new(b"IHDR", ihdr.to_vec()),
        PngChunk::new(b"IDAT", idat.to_vec()),
        PngChunk::new(b"IEND", vec![]),
    ])
}

/// Append a raw (non-base64) tEXt chunk to a PNG.
pub fn with_raw_text_chunk(png: &[u8], keyword: &str, value: &str) -> Vec<u8> {
    let mut chunks = cardferry::png::read_chunks(png).unwrap();
    let mut data = keyword.as_bytes().to_vec();
    data.push(0);
    data.extend_from_slice(value.as_bytes());
    let iend = chunks.len() - 1;
    chunks.insert(iend, PngChunk::new(b"tEXt", data));
    build_png(&chunks)
}

/// A realistic card document exercising all three layers, Unicode text and
/// non-default metadata.
pub fn sample_document() -> Value {
    json!({
        "name": "Legacy Name",
        "description": "Legacy description",
        "first_mes": "Hello from the legacy layer",
        "personality": "",
        "scenario": "",
        "mes_example": "",
        "spec": "chara_card_v2",
        "spec_version": "2.0",
        "data": {
            "name": "Yuki 雪",
            "description": "A snow spirit of the high passes. ❄",
            "first_mes": "こんにちは、{{user}}。",
            "alternate_greetings": ["Second greeting", "Third greeting"],
            "personality": "calm, watchful",
            "scenario": "a mountain pass at dusk",
            "mes_example": "{{user}}: hi\n{{char}}: *nods quietly*",
            "creator": "test-author",
            "extensions": {
                "talkativeness": "0.7",
                "depth_prompt": { "prompt": "stay in character", "depth": "2" }
            },
            "system_prompt": "You are {{char}}, a spirit of winter.",
            "post_history_instructions": "Keep replies short.",
            "creator_notes": "written for the test suite",
            "character_version": "1.2",
            "tags": ["winter", "spirit"]
        },
        "alternative": {
            "name_alt": "Natsuki",
            "description_alt": "The same spirit in summer.",
            "first_mes_alt": "It is warm today.",
            "alternate_greetings_alt": [],
            "personality_alt": "bright",
            "scenario_alt": "",
            "mes_example_alt": "",
            "creator_alt": "test-author",
            "extensions_alt": {
                "talkativeness_alt": "0.9",
                "depth_prompt_alt": { "prompt_alt": "", "depth_alt": "0" }
            },
            "system_prompt_alt": "",
            "post_history_instructions_alt": "",
            "creator_notes_alt": "",
            "character_version_alt": "1.0",
            "tags_alt": ["summer"]
        },
        "misc": {
            "rentry": "https://rentry.co/example",
            "rentry_alt": ""
        },
        "metadata": {
            "version": 1,
            "created": 1700000000000i64,
            "modified": 1700000001000i64,
            "source": "test-suite",
            "tool": { "name": "some-other-tool", "version": "9.9", "url": "https://example.com" }
        }
    })
}
