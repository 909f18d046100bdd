//! Vocabulary model parsed from a serialized piece list.
//!
//! A model blob is a UTF-8 JSON document listing the pieces in id order:
//!
//! ```json
//! {"pieces": [
//!   {"piece": "<unk>", "score": 0.0, "type": "unknown"},
//!   {"piece": "\u{2581}the", "score": -1.0}
//! ]}
//! ```
//!
//! Piece ids are the 0-based positions in the list, so the id space is dense
//! by construction. `score` defaults to `0.0` and `type` to `normal`.
//! Byte-fallback pieces use the `<0xHH>` surface convention.

use std::collections::HashMap;

use serde::Deserialize;

use crate::{Error, Result};

/// Classification of a vocabulary piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceType {
    /// Ordinary subword unit; participates in segmentation.
    #[default]
    Normal,
    /// The fallback piece for text no other piece covers. Exactly one per
    /// vocabulary.
    Unknown,
    /// Control/special marker (e.g. `<s>`). Never matched against raw text
    /// and contributes nothing when decoded.
    Control,
    /// Single-byte fallback piece with a `<0xHH>` surface.
    Byte,
}

/// A vocabulary subword unit: surface form, merge score, and type tag.
#[derive(Debug, Clone, Deserialize)]
pub struct Piece {
    /// Textual surface form.
    pub piece: String,
    /// Segmentation score (log-probability convention: higher wins).
    #[serde(default)]
    pub score: f32,
    /// Piece classification.
    #[serde(default, rename = "type")]
    pub kind: PieceType,
}

impl Piece {
    /// The raw byte encoded by a `<0xHH>` byte-fallback surface, if this
    /// piece has one.
    #[must_use]
    pub fn byte_value(&self) -> Option<u8> {
        let s = &self.piece;
        if s.len() == 6 && s.starts_with("<0x") && s.ends_with('>') {
            u8::from_str_radix(&s[3..5], 16).ok()
        } else {
            None
        }
    }
}

/// Wire shape of the serialized model blob.
#[derive(Debug, Deserialize)]
struct ModelProto {
    pieces: Vec<Piece>,
}

/// Immutable, dense-indexed piece collection defining a tokenizer's id space.
///
/// Ids are the positions in the piece list. Once built, a `Vocab` is never
/// mutated; reloading a model produces a fresh instance.
#[derive(Debug)]
pub struct Vocab {
    pieces: Vec<Piece>,
    piece_to_id: HashMap<String, u32>,
    unk_id: u32,
    has_byte_fallback: bool,
    max_piece_chars: usize,
}

impl Vocab {
    /// Parse a serialized model blob into a vocabulary.
    ///
    /// `model_id` is only used to name the failing model in errors.
    ///
    /// # Errors
    /// Returns [`Error::ModelFormat`] if the blob is empty, is not valid
    /// JSON, has an empty piece list, has duplicate surfaces, has a
    /// malformed byte piece, or does not contain exactly one unknown piece.
    pub fn from_slice(model_id: &str, data: &[u8]) -> Result<Self> {
        let format_err = |reason: String| Error::ModelFormat {
            model_id: model_id.to_string(),
            reason,
        };

        if data.is_empty() {
            return Err(format_err("empty model data".to_string()));
        }

        let proto: ModelProto =
            serde_json::from_slice(data).map_err(|e| format_err(e.to_string()))?;

        if proto.pieces.is_empty() {
            return Err(format_err("empty vocabulary".to_string()));
        }

        let mut piece_to_id = HashMap::with_capacity(proto.pieces.len());
        let mut unk_id = None;
        let mut has_byte_fallback = false;
        let mut max_piece_chars = 0;

        for (id, piece) in proto.pieces.iter().enumerate() {
            let id = u32::try_from(id)
                .map_err(|_| format_err(format!("piece id {id} exceeds u32 range")))?;

            if piece.piece.is_empty() {
                return Err(format_err(format!("piece {id} has an empty surface")));
            }
            if piece_to_id.insert(piece.piece.clone(), id).is_some() {
                return Err(format_err(format!("duplicate piece {:?}", piece.piece)));
            }

            match piece.kind {
                PieceType::Unknown => {
                    if unk_id.replace(id).is_some() {
                        return Err(format_err("multiple unknown pieces".to_string()));
                    }
                }
                PieceType::Byte => {
                    if piece.byte_value().is_none() {
                        return Err(format_err(format!(
                            "byte piece {:?} is not of the form <0xHH>",
                            piece.piece
                        )));
                    }
                    has_byte_fallback = true;
                }
                PieceType::Normal => {
                    max_piece_chars = max_piece_chars.max(piece.piece.chars().count());
                }
                PieceType::Control => {}
            }
        }

        let Some(unk_id) = unk_id else {
            return Err(format_err("no unknown piece".to_string()));
        };

        Ok(Self {
            pieces: proto.pieces,
            piece_to_id,
            unk_id,
            has_byte_fallback,
            max_piece_chars,
        })
    }

    /// Number of pieces (the size of the id space).
    #[must_use]
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    /// `true` if the vocabulary holds no pieces (never observable after a
    /// successful parse).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Id of the unknown piece.
    #[must_use]
    pub fn unk_id(&self) -> u32 {
        self.unk_id
    }

    /// Whether the vocabulary declares `<0xHH>` byte-fallback pieces.
    #[must_use]
    pub fn has_byte_fallback(&self) -> bool {
        self.has_byte_fallback
    }

    /// Character length of the longest normal piece. Bounds the segmentation
    /// window.
    #[must_use]
    pub fn max_piece_chars(&self) -> usize {
        self.max_piece_chars
    }

    /// Piece for `id`, or `None` if out of range.
    #[must_use]
    pub fn piece(&self, id: u32) -> Option<&Piece> {
        self.pieces.get(id as usize)
    }

    /// Id of the piece with the given surface, regardless of type.
    #[must_use]
    pub fn piece_to_id(&self, surface: &str) -> Option<u32> {
        self.piece_to_id.get(surface).copied()
    }

    /// Id of a normal piece with the given surface. Control, byte, and
    /// unknown pieces never match raw text.
    #[must_use]
    pub fn match_surface(&self, surface: &str) -> Option<u32> {
        let id = self.piece_to_id(surface)?;
        (self.pieces[id as usize].kind == PieceType::Normal).then_some(id)
    }

    /// Id of the byte-fallback piece for `b`, if the vocabulary declares one.
    #[must_use]
    pub fn byte_piece(&self, b: u8) -> Option<u32> {
        let id = self.piece_to_id(&format!("<0x{b:02X}>"))?;
        (self.pieces[id as usize].kind == PieceType::Byte).then_some(id)
    }
}
