//! `tag=value` lists as used by DKIM key records (RFC 6376 Section 3.2).

use std::collections::HashMap;

use thiserror::Error;

/// Tag name to value, after trimming. Later duplicates overwrite earlier ones.
pub type TagMap = HashMap<String, String>;

/// Structural error in a tag list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    #[error("invalid tag format: {0:?} (missing '=')")]
    MissingEquals(String),
    #[error("empty tag name in {0:?}")]
    EmptyName(String),
}

/// Split a semicolon-delimited tag list into a map.
///
/// Empty segments (including a trailing `;`) are skipped. Each remaining
/// segment is split on its first `=` and both halves are trimmed. A repeated
/// tag silently replaces the earlier value.
pub fn parse_tag_map(input: &str) -> Result<TagMap, TagError> {
    let mut tags = TagMap::new();
    for part in input.split(';') {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }
        let (name, value) = trimmed
            .split_once('=')
            .ok_or_else(|| TagError::MissingEquals(trimmed.to_string()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(TagError::EmptyName(trimmed.to_string()));
        }
        tags.insert(name.to_string(), value.trim().to_string());
    }
    Ok(tags)
}

/// Split a colon-separated tag value (`h=`, `s=`, `t=`), dropping empty items.
pub fn split_colon_list(value: &str) -> Vec<String> {
    value
        .split(':')
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
