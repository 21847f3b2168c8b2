//! PNG text-metadata plumbing: chunk-level reader/writer plus the
//! multi-strategy search for an embedded character card payload.
//!
//! Card data travels in a `tEXt` chunk keyed `chara` holding base64 of the
//! card JSON. In the wild, encoders disagree: some skip the base64 step, some
//! write `iTXt`/`zTXt` instead of `tEXt`, and some stash the payload under an
//! arbitrary keyword. Extraction therefore tries every strategy before
//! reporting "nothing embedded".

use crate::error::{CardferryError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use flate2::read::ZlibDecoder;
use serde_json::Value;
use std::io::Read;

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Keyword under which card JSON is conventionally embedded.
pub const CHARA_KEYWORD: &str = "chara";

/// A raw PNG chunk: type and payload, CRC recomputed on write.
#[derive(Debug, Clone)]
pub struct PngChunk {
    pub chunk_type: [u8; 4],
    pub data: Vec<u8>,
}

impl PngChunk {
    pub fn new(chunk_type: &[u8; 4], data: Vec<u8>) -> Self {
        Self {
            chunk_type: *chunk_type,
            data,
        }
    }

    pub fn type_string(&self) -> String {
        String::from_utf8_lossy(&self.chunk_type).to_string()
    }
}

/// A decoded textual chunk. `international` distinguishes the `iTXt`/`zTXt`
/// section from plain `tEXt` — some encoders only write one of the two.
#[derive(Debug, Clone)]
pub struct TextChunk {
    pub keyword: String,
    pub value: String,
    pub international: bool,
}

fn chunk_crc(chunk_type: &[u8], data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    hasher.finalize()
}

/// Read all chunks from PNG bytes.
///
/// Stops at IEND, ignoring any trailing garbage. CRCs are not validated on
/// read (they are recomputed on write).
pub fn read_chunks(data: &[u8]) -> Result<Vec<PngChunk>> {
    if data.len() < 8 || data[..8] != PNG_SIGNATURE {
        return Err(CardferryError::InvalidPngSignature);
    }

    let mut chunks = Vec::new();
    let mut pos = 8;

    while pos + 8 <= data.len() {
        let length =
            u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        pos += 4;

        let chunk_type: [u8; 4] = [data[pos], data[pos + 1], data[pos + 2], data[pos + 3]];
        pos += 4;

        if pos + length + 4 > data.len() {
            return Err(CardferryError::PngChunkError("Truncated chunk".to_string()));
        }

        let chunk = PngChunk::new(&chunk_type, data[pos..pos + length].to_vec());
        pos += length + 4; // payload + CRC

        let is_end = chunk.type_string() == "IEND";
        chunks.push(chunk);
        if is_end {
            break;
        }
    }

    Ok(chunks)
}

/// Reassemble PNG bytes from chunks, recomputing every CRC.
pub fn build_png(chunks: &[PngChunk]) -> Vec<u8> {
    let mut result = Vec::new();
    result.extend_from_slice(&PNG_SIGNATURE);

    for chunk in chunks {
        result.extend_from_slice(&(chunk.data.len() as u32).to_be_bytes());
        result.extend_from_slice(&chunk.chunk_type);
        result.extend_from_slice(&chunk.data);
        result.extend_from_slice(&chunk_crc(&chunk.chunk_type, &chunk.data).to_be_bytes());
    }

    result
}

/// Decode a tEXt chunk: `keyword\0text`. The value is returned verbatim;
/// base64 handling happens during payload parsing, where a failed decode can
/// still fall back to the raw string.
fn decode_text_chunk(chunk_data: &[u8]) -> Option<(String, String)> {
    let null_pos = chunk_data.iter().position(|&b| b == 0)?;
    let keyword = String::from_utf8_lossy(&chunk_data[..null_pos]).to_string();
    let value = String::from_utf8_lossy(&chunk_data[null_pos + 1..]).to_string();
    Some((keyword, value))
}

/// Decode an iTXt chunk:
/// `keyword\0compression_flag compression_method language_tag\0translated_keyword\0text`.
fn decode_itxt_chunk(chunk_data: &[u8]) -> Option<(String, String)> {
    let null_pos = chunk_data.iter().position(|&b| b == 0)?;
    let keyword = String::from_utf8_lossy(&chunk_data[..null_pos]).to_string();
    let rest = &chunk_data[null_pos + 1..];

    if rest.len() < 2 {
        return None;
    }
    let compression_flag = rest[0];
    // rest[1] is the compression method
    let rest = &rest[2..];

    let lang_null = rest.iter().position(|&b| b == 0)?;
    let rest = &rest[lang_null + 1..];
    let trans_null = rest.iter().position(|&b| b == 0)?;
    let text_data = &rest[trans_null + 1..];

    let text_data = if compression_flag == 1 {
        let mut decoder = ZlibDecoder::new(text_data);
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed).ok()?;
        decompressed
    } else {
        text_data.to_vec()
    };

    Some((keyword, String::from_utf8_lossy(&text_data).to_string()))
}

/// Decode a zTXt chunk: `keyword\0compression_method zlib_data`.
fn decode_ztxt_chunk(chunk_data: &[u8]) -> Option<(String, String)> {
    let null_pos = chunk_data.iter().position(|&b| b == 0)?;
    let keyword = String::from_utf8_lossy(&chunk_data[..null_pos]).to_string();

    if null_pos + 2 > chunk_data.len() {
        return None;
    }
    let compressed = &chunk_data[null_pos + 2..];

    let mut decoder = ZlibDecoder::new(compressed);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed).ok()?;

    Some((keyword, String::from_utf8_lossy(&decompressed).to_string()))
}

/// Collect every textual chunk (tEXt, iTXt, zTXt) in file order.
pub fn read_text_chunks(data: &[u8]) -> Result<Vec<TextChunk>> {
    let chunks = read_chunks(data)?;
    let mut result = Vec::new();

    for chunk in chunks {
        let decoded = match chunk.type_string().as_str() {
            "tEXt" => decode_text_chunk(&chunk.data).map(|(k, v)| (k, v, false)),
            "iTXt" => decode_itxt_chunk(&chunk.data).map(|(k, v)| (k, v, true)),
            "zTXt" => decode_ztxt_chunk(&chunk.data).map(|(k, v)| (k, v, true)),
            _ => None,
        };

        if let Some((keyword, value, international)) = decoded {
            result.push(TextChunk {
                keyword,
                value,
                international,
            });
        }
    }

    Ok(result)
}

/// Try to parse one chunk value as card JSON: base64 → UTF-8 → JSON first,
/// raw JSON as the fallback. `None` means this value carries no JSON at all.
fn parse_payload(value: &str) -> Option<Value> {
    if let Ok(decoded) = BASE64.decode(value.trim().as_bytes()) {
        if let Ok(text) = std::str::from_utf8(&decoded) {
            if let Ok(parsed) = serde_json::from_str(text) {
                return Some(parsed);
            }
        }
    }
    serde_json::from_str(value).ok()
}

/// Search PNG bytes for an embedded card payload.
///
/// Strategy, first hit wins:
/// 1. `chara` in the tEXt section;
/// 2. `chara` in the iTXt/zTXt section;
/// 3. any other text keyword, in file order.
///
/// `Ok(None)` means the image carries no extractable JSON — a plain avatar
/// PNG is a valid input. A payload whose top level is not a JSON object is an
/// error, distinct from "not found", so callers can warn about corrupt cards
/// without rejecting bare images.
pub fn extract_embedded_json(data: &[u8]) -> Result<Option<Value>> {
    let chunks = read_text_chunks(data)?;

    let found = chunks
        .iter()
        .filter(|c| !c.international && c.keyword == CHARA_KEYWORD)
        .find_map(|c| parse_payload(&c.value))
        .or_else(|| {
            chunks
                .iter()
                .filter(|c| c.international && c.keyword == CHARA_KEYWORD)
                .find_map(|c| parse_payload(&c.value))
        })
        .or_else(|| {
            chunks
                .iter()
                .filter(|c| c.keyword != CHARA_KEYWORD)
                .find_map(|c| parse_payload(&c.value))
        });

    match found {
        Some(value) if value.is_object() => Ok(Some(value)),
        Some(value) => {
            let kind = match value {
                Value::Array(_) => "an array",
                Value::String(_) => "a string",
                Value::Number(_) => "a number",
                Value::Bool(_) => "a boolean",
                _ => "null",
            };
            Err(CardferryError::MalformedEmbeddedData(format!(
                "expected a JSON object, got {}",
                kind
            )))
        }
        None => Ok(None),
    }
}

/// Build tEXt chunk data, base64-encoding the text content.
fn build_text_chunk_data(keyword: &str, text: &str) -> Vec<u8> {
    let mut data = keyword.as_bytes().to_vec();
    data.push(0);
    data.extend_from_slice(BASE64.encode(text.as_bytes()).as_bytes());
    data
}

/// Inject a tEXt chunk, replacing any existing chunk with the same keyword.
///
/// Only text chunks are touched; IHDR, IDAT, IEND and everything else pass
/// through byte-identical. A new chunk is inserted just before IEND.
pub fn inject_text_chunk(data: &[u8], keyword: &str, text: &str) -> Result<Vec<u8>> {
    let chunks = read_chunks(data)?;
    let new_chunk = PngChunk::new(b"tEXt", build_text_chunk_data(keyword, text));

    let mut new_chunks: Vec<PngChunk> = Vec::new();
    let mut replaced = false;

    for chunk in &chunks {
        if chunk.type_string() == "tEXt" {
            if let Some((kw, _)) = decode_text_chunk(&chunk.data) {
                if kw == keyword {
                    new_chunks.push(new_chunk.clone());
                    replaced = true;
                    continue;
                }
            }
        }
        new_chunks.push(chunk.clone());
    }

    if !replaced {
        match new_chunks.iter().position(|c| c.type_string() == "IEND") {
            Some(idx) => new_chunks.insert(idx, new_chunk),
            None => new_chunks.push(new_chunk),
        }
    }

    Ok(build_png(&new_chunks))
}

/// All IDAT payloads, in order. Used to verify image data survives injection.
pub fn extract_idat_chunks(data: &[u8]) -> Result<Vec<Vec<u8>>> {
    let chunks = read_chunks(data)?;
    Ok(chunks
        .into_iter()
        .filter(|c| c.type_string() == "IDAT")
        .map(|c| c.data)
        .collect())
}
