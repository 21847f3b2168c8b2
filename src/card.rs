//! The normalized character card model.
//!
//! A card document carries the same semantic fields in up to three places:
//! legacy flat fields at the top level, the authoritative `data` block, and a
//! fully parallel `alternative` block holding a second persona under `*_alt`
//! keys. Resolution is always primary-then-legacy; the alternative layer is
//! an independent field set that never participates in fallback.

use crate::error::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Spec identifier baked into every card this tool writes.
pub const CARD_SPEC: &str = "chara_card_v2";
pub const CARD_SPEC_VERSION: &str = "2.0";

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Pure resolution rule shared by every semantic field: primary layer wins,
/// legacy fills in, empty string is the final default.
fn resolve<'a>(primary: &'a str, legacy: &'a str) -> &'a str {
    if !primary.is_empty() {
        primary
    } else {
        legacy
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthPrompt {
    pub prompt: String,
    pub depth: String,
}

impl Default for DepthPrompt {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            depth: "0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataExtensions {
    pub talkativeness: String,
    pub depth_prompt: DepthPrompt,
}

impl Default for DataExtensions {
    fn default() -> Self {
        Self {
            talkativeness: "0.5".to_string(),
            depth_prompt: DepthPrompt::default(),
        }
    }
}

/// The primary ("data") layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataBlock {
    pub name: String,
    pub description: String,
    pub first_mes: String,
    pub alternate_greetings: Vec<String>,
    pub personality: String,
    pub scenario: String,
    pub mes_example: String,
    pub creator: String,
    pub extensions: DataExtensions,
    pub system_prompt: String,
    pub post_history_instructions: String,
    pub creator_notes: String,
    pub character_version: String,
    pub tags: Vec<String>,
}

impl Default for DataBlock {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            first_mes: String::new(),
            alternate_greetings: Vec::new(),
            personality: String::new(),
            scenario: String::new(),
            mes_example: String::new(),
            creator: String::new(),
            extensions: DataExtensions::default(),
            system_prompt: String::new(),
            post_history_instructions: String::new(),
            creator_notes: String::new(),
            character_version: "0.1".to_string(),
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AltDepthPrompt {
    #[serde(rename = "prompt_alt")]
    pub prompt: String,
    #[serde(rename = "depth_alt")]
    pub depth: String,
}

impl Default for AltDepthPrompt {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            depth: "0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AltExtensions {
    #[serde(rename = "talkativeness_alt")]
    pub talkativeness: String,
    #[serde(rename = "depth_prompt_alt")]
    pub depth_prompt: AltDepthPrompt,
}

impl Default for AltExtensions {
    fn default() -> Self {
        Self {
            talkativeness: "0.5".to_string(),
            depth_prompt: AltDepthPrompt::default(),
        }
    }
}

/// The alternative layer: same shape as [`DataBlock`] under `*_alt` keys,
/// carrying a second persona variant in the same document. It round-trips
/// verbatim and is never consulted when resolving the main persona.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AltBlock {
    #[serde(rename = "name_alt")]
    pub name: String,
    #[serde(rename = "description_alt")]
    pub description: String,
    #[serde(rename = "first_mes_alt")]
    pub first_mes: String,
    #[serde(rename = "alternate_greetings_alt")]
    pub alternate_greetings: Vec<String>,
    #[serde(rename = "personality_alt")]
    pub personality: String,
    #[serde(rename = "scenario_alt")]
    pub scenario: String,
    #[serde(rename = "mes_example_alt")]
    pub mes_example: String,
    #[serde(rename = "creator_alt")]
    pub creator: String,
    #[serde(rename = "extensions_alt")]
    pub extensions: AltExtensions,
    #[serde(rename = "system_prompt_alt")]
    pub system_prompt: String,
    #[serde(rename = "post_history_instructions_alt")]
    pub post_history_instructions: String,
    #[serde(rename = "creator_notes_alt")]
    pub creator_notes: String,
    #[serde(rename = "character_version_alt")]
    pub character_version: String,
    #[serde(rename = "tags_alt")]
    pub tags: Vec<String>,
}

/// Free-text reference strings (typically rentry.co links) for each persona.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MiscBlock {
    pub rentry: String,
    pub rentry_alt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
    pub url: String,
}

impl Default for ToolInfo {
    fn default() -> Self {
        Self {
            name: "cardferry".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            url: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CardMetadata {
    pub version: i64,
    /// Epoch milliseconds. Set once, immutable afterwards.
    pub created: i64,
    /// Epoch milliseconds. Refreshed on every save.
    pub modified: i64,
    pub source: Option<String>,
    pub tool: ToolInfo,
}

impl Default for CardMetadata {
    fn default() -> Self {
        let now = now_ms();
        Self {
            version: 1,
            created: now,
            modified: now,
            source: None,
            tool: ToolInfo::default(),
        }
    }
}

/// A fully normalized character card.
///
/// The serde shape of this struct is exactly the on-disk / embedded document:
/// legacy flat fields, `spec`/`spec_version`, then the `data`, `alternative`,
/// `misc` and `metadata` blocks, all present even when empty. The avatar
/// reference is runtime state and never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterCard {
    pub name: String,
    pub description: String,
    pub first_mes: String,
    pub personality: String,
    pub scenario: String,
    pub mes_example: String,
    pub spec: String,
    pub spec_version: String,
    pub data: DataBlock,
    pub alternative: AltBlock,
    pub misc: MiscBlock,
    pub metadata: CardMetadata,
    /// Local path or http(s) URL of the avatar image. URLs are opaque — this
    /// crate never fetches them.
    #[serde(skip)]
    pub avatar: Option<String>,
}

impl Default for CharacterCard {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            first_mes: String::new(),
            personality: String::new(),
            scenario: String::new(),
            mes_example: String::new(),
            spec: CARD_SPEC.to_string(),
            spec_version: CARD_SPEC_VERSION.to_string(),
            data: DataBlock::default(),
            alternative: AltBlock::default(),
            misc: MiscBlock::default(),
            metadata: CardMetadata::default(),
            avatar: None,
        }
    }
}

impl CharacterCard {
    /// Build a card from a raw parsed document, applying per-field defaults
    /// for anything missing and then the one-time legacy→primary back-fill.
    pub fn from_document(value: Value) -> Result<Self> {
        let mut card: CharacterCard = serde_json::from_value(value)?;
        card.normalize();
        Ok(card)
    }

    /// Back-fill the primary layer from the legacy layer for the six shared
    /// fields. Idempotent; after this, resolution never needs to fall back
    /// for a field the legacy layer had.
    pub fn normalize(&mut self) {
        fn seed(primary: &mut String, legacy: &str) {
            if primary.is_empty() && !legacy.is_empty() {
                *primary = legacy.to_string();
            }
        }
        seed(&mut self.data.name, &self.name);
        seed(&mut self.data.description, &self.description);
        seed(&mut self.data.first_mes, &self.first_mes);
        seed(&mut self.data.personality, &self.personality);
        seed(&mut self.data.scenario, &self.scenario);
        seed(&mut self.data.mes_example, &self.mes_example);
    }

    /// Refresh `metadata.modified`; stamp `metadata.created` only if it was
    /// never set. Runs before every save.
    pub fn touch_timestamps(&mut self) {
        let now = now_ms();
        self.metadata.modified = now;
        if self.metadata.created == 0 {
            self.metadata.created = now;
        }
    }

    pub fn resolved_name(&self) -> &str {
        resolve(&self.data.name, &self.name)
    }

    pub fn resolved_description(&self) -> &str {
        resolve(&self.data.description, &self.description)
    }

    pub fn resolved_first_mes(&self) -> &str {
        resolve(&self.data.first_mes, &self.first_mes)
    }

    pub fn resolved_personality(&self) -> &str {
        resolve(&self.data.personality, &self.personality)
    }

    pub fn resolved_scenario(&self) -> &str {
        resolve(&self.data.scenario, &self.scenario)
    }

    pub fn resolved_mes_example(&self) -> &str {
        resolve(&self.data.mes_example, &self.mes_example)
    }

    /// System prompt for the downstream agent, if the card defines one.
    pub fn system_prompt(&self) -> Option<&str> {
        if self.data.system_prompt.is_empty() {
            None
        } else {
            Some(self.data.system_prompt.as_str())
        }
    }

    /// Whether the avatar reference points at a remote URL rather than a
    /// local file.
    pub fn avatar_is_remote(&self) -> bool {
        self.avatar
            .as_deref()
            .map(|a| a.starts_with("http://") || a.starts_with("https://"))
            .unwrap_or(false)
    }
}

impl fmt::Display for CharacterCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CharacterCard(name: '{}', description: '{}', avatar: {:?})",
            self.resolved_name(),
            self.resolved_description(),
            self.avatar
        )
    }
}
