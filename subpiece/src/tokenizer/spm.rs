//! SentencePiece-style codec over a fixed vocabulary.
//!
//! Encoding marks whitespace with `▁` (U+2581), then picks the
//! score-maximising segmentation of the marked text over the vocabulary's
//! normal pieces (Viterbi over character positions). Characters no piece
//! covers fall back to `<0xHH>` byte pieces when the vocabulary declares
//! them, otherwise to the unknown piece — encoding is total over its
//! character model and never fails on unseen text.
//!
//! Decoding is strict: any id outside the vocabulary range aborts the whole
//! call. For text made only of vocabulary-representable content,
//! `decode(encode(t)) == t`; unknown fragments are intentionally lossy
//! through the fallback.

#![allow(clippy::missing_panics_doc)]

use crate::vocab::{PieceType, Vocab};
use crate::{Error, Result};

/// Whitespace marker used by the normalization rule.
const SPACE_MARKER: char = '\u{2581}';

/// Score assigned to a character no piece covers, per fallback step.
/// Large enough that any covered segmentation is preferred.
const FALLBACK_SCORE: f32 = -100.0;

/// One step of the backtracked segmentation.
#[derive(Debug, Clone, Copy)]
enum Step {
    /// A matched normal piece.
    Piece(u32),
    /// A character left uncovered; resolved to byte or unknown pieces.
    Fallback(char),
}

/// A loaded tokenizer instance: one immutable vocabulary plus the
/// deterministic segmentation rules derived from it.
///
/// Instances are immutable once built and shared behind `Arc` by the
/// registry, so concurrent encode/decode calls never observe a partially
/// updated model.
#[derive(Debug)]
pub struct SpmTokenizer {
    vocab: Vocab,
}

impl SpmTokenizer {
    /// Build a tokenizer from an already-parsed vocabulary.
    #[must_use]
    pub fn new(vocab: Vocab) -> Self {
        Self { vocab }
    }

    /// Parse a serialized model blob and build a tokenizer from it.
    ///
    /// # Errors
    /// Returns [`Error::ModelFormat`] if the blob is malformed (see
    /// [`Vocab::from_slice`]).
    pub fn from_slice(model_id: &str, data: &[u8]) -> Result<Self> {
        Ok(Self::new(Vocab::from_slice(model_id, data)?))
    }

    /// Encode text into token ids.
    ///
    /// The empty string encodes to the empty sequence. Unseen text falls
    /// back to byte or unknown pieces instead of failing.
    ///
    /// # Errors
    /// Returns [`Error::Encoding`] only when the vocabulary declares byte
    /// fallback but lacks a `<0xHH>` piece needed for an uncovered
    /// character.
    pub fn encode(&self, text: &str) -> Result<Vec<u32>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let marked = normalize(text);
        let chars: Vec<char> = marked.chars().collect();
        let steps = self.segment(&chars);

        let mut ids = Vec::with_capacity(steps.len());
        for step in steps {
            match step {
                Step::Piece(id) => ids.push(id),
                Step::Fallback(ch) => self.push_fallback(ch, &mut ids)?,
            }
        }
        Ok(ids)
    }

    /// Decode token ids back into text.
    ///
    /// Surfaces are joined in order (byte pieces contribute raw bytes,
    /// control pieces contribute nothing), then the whitespace marking is
    /// reversed. The empty sequence decodes to the empty string.
    ///
    /// # Errors
    /// Returns [`Error::InvalidTokenId`] if any id is outside the
    /// vocabulary range; no partial text is returned.
    pub fn decode(&self, ids: &[u32]) -> Result<String> {
        let mut bytes = Vec::new();
        for &id in ids {
            let piece = self.vocab.piece(id).ok_or(Error::InvalidTokenId {
                id,
                vocab_size: self.vocab.len(),
            })?;
            match piece.kind {
                PieceType::Byte => {
                    bytes.push(piece.byte_value().expect("byte piece validated at load"));
                }
                PieceType::Control => {}
                PieceType::Normal | PieceType::Unknown => {
                    bytes.extend_from_slice(piece.piece.as_bytes());
                }
            }
        }

        let text = String::from_utf8_lossy(&bytes).replace(SPACE_MARKER, " ");

        // Drop the space reintroduced by the marker prepended at encode time.
        Ok(text.strip_prefix(' ').unwrap_or(&text).to_string())
    }

    /// Decode a single token id to its surface text, without the
    /// leading-space strip applied by [`decode`](Self::decode).
    ///
    /// # Errors
    /// Returns [`Error::InvalidTokenId`] if the id is out of range.
    pub fn decode_token(&self, id: u32) -> Result<String> {
        let piece = self.vocab.piece(id).ok_or(Error::InvalidTokenId {
            id,
            vocab_size: self.vocab.len(),
        })?;
        Ok(match piece.kind {
            PieceType::Byte => {
                let b = piece.byte_value().expect("byte piece validated at load");
                String::from_utf8_lossy(&[b]).into_owned()
            }
            PieceType::Control => String::new(),
            PieceType::Normal | PieceType::Unknown => piece.piece.replace(SPACE_MARKER, " "),
        })
    }

    /// Size of the vocabulary (the id space).
    #[must_use]
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// Id of the unknown piece.
    #[must_use]
    pub fn unk_id(&self) -> u32 {
        self.vocab.unk_id()
    }

    /// Surface form of the piece with the given id.
    #[must_use]
    pub fn id_to_piece(&self, id: u32) -> Option<&str> {
        self.vocab.piece(id).map(|p| p.piece.as_str())
    }

    /// Id of the piece with the given surface form.
    #[must_use]
    pub fn piece_to_id(&self, surface: &str) -> Option<u32> {
        self.vocab.piece_to_id(surface)
    }

    /// The underlying vocabulary.
    #[must_use]
    pub fn vocab(&self) -> &Vocab {
        &self.vocab
    }

    /// Viterbi forward pass + backtrack over the marked character sequence.
    ///
    /// `best[end]` holds the score of the best segmentation of
    /// `chars[..end]`; each position records the step that achieved it. At
    /// equal score the earliest start (the longest piece) wins, so the
    /// segmentation is deterministic. A position nothing matches at is
    /// covered by a single-character fallback step with a heavy penalty.
    fn segment(&self, chars: &[char]) -> Vec<Step> {
        let n = chars.len();
        let window = self.vocab.max_piece_chars().max(1);

        let mut best = vec![f32::NEG_INFINITY; n + 1];
        let mut back: Vec<Option<(usize, Step)>> = vec![None; n + 1];
        best[0] = 0.0;

        for end in 1..=n {
            for start in end.saturating_sub(window)..end {
                if !best[start].is_finite() {
                    continue;
                }
                let surface: String = chars[start..end].iter().collect();
                if let Some(id) = self.vocab.match_surface(&surface) {
                    let score = best[start]
                        + self
                            .vocab
                            .piece(id)
                            .map_or(FALLBACK_SCORE, |piece| piece.score);
                    if score > best[end] {
                        best[end] = score;
                        back[end] = Some((start, Step::Piece(id)));
                    }
                }
            }
            if back[end].is_none() && best[end - 1].is_finite() {
                best[end] = best[end - 1] + FALLBACK_SCORE;
                back[end] = Some((end - 1, Step::Fallback(chars[end - 1])));
            }
        }

        let mut steps = Vec::new();
        let mut pos = n;
        while pos > 0 {
            let (start, step) = back[pos].expect("every position has a step once seeded");
            steps.push(step);
            pos = start;
        }
        steps.reverse();
        steps
    }

    /// Resolve one uncovered character: byte pieces when the vocabulary
    /// declares byte fallback, the unknown id otherwise.
    fn push_fallback(&self, ch: char, ids: &mut Vec<u32>) -> Result<()> {
        if self.vocab.has_byte_fallback() {
            let mut buf = [0u8; 4];
            for &b in ch.encode_utf8(&mut buf).as_bytes() {
                let id = self.vocab.byte_piece(b).ok_or_else(|| {
                    Error::Encoding(format!("no byte piece for 0x{b:02x}"))
                })?;
                ids.push(id);
            }
        } else {
            ids.push(self.vocab.unk_id());
        }
        Ok(())
    }
}

/// Apply the whitespace-marking normalization rule: every space becomes the
/// marker and one marker is prepended.
fn normalize(text: &str) -> String {
    let mut marked = String::with_capacity(text.len() + SPACE_MARKER.len_utf8());
    marked.push(SPACE_MARKER);
    for ch in text.chars() {
        marked.push(if ch == ' ' { SPACE_MARKER } else { ch });
    }
    marked
}
