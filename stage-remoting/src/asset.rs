//! Out-of-band asset table.
//!
//! Bulk payloads travel beside the byte stream; messages refer to them by
//! their position in the table.

use serde::{Deserialize, Serialize};
use stage_core::{ImageType, ShapeData};

/// A bulk payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Asset {
    /// Path commands, coordinates and styles of a drawable.
    Shape(ShapeData),
    /// Pixel or encoded image data.
    Pixels {
        /// Layout of `data`.
        kind: ImageType,
        /// Raw bytes.
        data: Vec<u8>,
    },
    /// Plain text of a text field.
    Text {
        /// The text.
        text: String,
    },
    /// Embedded font glyph data.
    Font {
        /// Raw font bytes.
        data: Vec<u8>,
    },
}

/// Append-only list of assets for one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetTable {
    assets: Vec<Asset>,
}

impl AssetTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an asset, returning the index to write into the stream.
    pub fn push(&mut self, asset: Asset) -> i32 {
        let index = i32::try_from(self.assets.len()).unwrap_or(i32::MAX);
        self.assets.push(asset);
        index
    }

    /// Look up an asset by its stream index.
    #[must_use]
    pub fn get(&self, index: i32) -> Option<&Asset> {
        usize::try_from(index).ok().and_then(|i| self.assets.get(i))
    }

    /// Number of assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Assets in push order.
    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter()
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON, validating every shape payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or a shape's path stream is
    /// malformed.
    pub fn from_json(json: &str) -> crate::RemotingResult<Self> {
        let table: Self = serde_json::from_str(json)?;
        for asset in &table.assets {
            if let Asset::Shape(shape) = asset {
                shape.validate()?;
            }
        }
        Ok(table)
    }
}
