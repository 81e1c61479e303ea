//! Shared whiteboards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pixel {
    pub hex: String,
    pub x: i64,
    pub y: i64,
}

/// Board content. Clients send either a pixel grid or a canvas data URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WhiteboardContent {
    Pixels(Vec<Vec<Pixel>>),
    Image(String),
}

impl Default for WhiteboardContent {
    fn default() -> Self {
        WhiteboardContent::Pixels(Vec::new())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessType {
    ReadOnly,
    #[default]
    Editable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Whiteboard {
    pub owner: String,
    pub title: String,
    pub date_created: DateTime<Utc>,
    #[serde(default)]
    pub content: WhiteboardContent,
    pub unique_link: String,
    #[serde(default)]
    pub access_type: AccessType,
}

impl Whiteboard {
    pub fn is_editable(&self) -> bool {
        self.access_type == AccessType::Editable
    }
}

/// Creation input. A blank or missing `unique_link` gets a generated one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWhiteboard {
    pub owner: String,
    pub title: String,
    #[serde(default)]
    pub content: WhiteboardContent,
    #[serde(default)]
    pub unique_link: Option<String>,
    #[serde(default)]
    pub access_type: AccessType,
    #[serde(default)]
    pub date_created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhiteboardUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<WhiteboardContent>,
    #[serde(default)]
    pub access_type: Option<AccessType>,
}
