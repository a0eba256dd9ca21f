//! Message types for LLM communication
//!
//! Chart analysis requests are a single user turn carrying one text prompt
//! and a batch of screenshot images. The types here still model full
//! conversations so providers with different wire formats share one shape.

use serde::{Deserialize, Serialize};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message
    User,
    /// Assistant message
    Assistant,
    /// System message (handled separately in some providers)
    System,
}

/// Image source for multi-modal content
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSource {
    /// Image from URL
    Url {
        /// Image URL
        url: String,
    },
    /// Base64-encoded image
    Base64 {
        /// Media type (e.g., "image/png")
        media_type: String,
        /// Base64-encoded image data
        data: String,
    },
}

impl ImageSource {
    /// Build a base64 source from a `data:` URI
    ///
    /// Returns `None` when the string is not a data URI.
    pub fn from_data_uri(uri: &str) -> Option<Self> {
        let (media_type, data) = chartwatch_utils::encode::split_data_uri(uri)?;
        Some(Self::Base64 {
            media_type: media_type.to_string(),
            data: data.to_string(),
        })
    }

    /// Render the source as a URL (data URI for base64 sources)
    pub fn to_url(&self) -> String {
        match self {
            Self::Url { url } => url.clone(),
            Self::Base64 { media_type, data } => format!("data:{media_type};base64,{data}"),
        }
    }
}

/// Content block in a message (supports multi-modal content)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text content
    Text {
        /// Text content
        text: String,
    },

    /// Image content (base64 or URL)
    Image {
        /// Image source
        source: ImageSource,
    },
}

/// Message content: either simple text or structured blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content
    Text(String),
    /// Structured content blocks
    Blocks(Vec<ContentBlock>),
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Message content
    pub content: MessageContent,
}

impl Message {
    /// Create a user message with text
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Create an assistant message with text
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Create a user message with a text prompt followed by images
    ///
    /// This is the shape every chart-analysis request takes: one prompt and
    /// the screenshots it refers to, in capture order.
    pub fn user_with_images(text: impl Into<String>, images: Vec<ImageSource>) -> Self {
        let mut blocks = vec![ContentBlock::Text { text: text.into() }];
        blocks.extend(images.into_iter().map(|source| ContentBlock::Image { source }));
        Self {
            role: Role::User,
            content: MessageContent::Blocks(blocks),
        }
    }

    /// Extract text content from the message (convenience method)
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(s) => Some(s),
            MessageContent::Blocks(blocks) => blocks.iter().find_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Image { .. } => None,
            }),
        }
    }

    /// Count the image blocks in the message
    pub fn image_count(&self) -> usize {
        match &self.content {
            MessageContent::Text(_) => 0,
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter(|b| matches!(b, ContentBlock::Image { .. }))
                .count(),
        }
    }
}
