#![forbid(unsafe_code)]

//! Packed boolean storage over fixed-width lanes.
//!
//! [`XBitSet`] stores bits in lanes of 8, 16, or 32 bits, chosen once at
//! construction through the [`Lane`] parameter and exposed as the concrete
//! aliases [`BitSet8`], [`BitSet16`], and [`BitSet32`]. Bit addressing uses
//! shifts and masks (`word = index >> log2(width)`,
//! `bit = index & (width - 1)`); whole-lane access is available for bulk
//! updates, and the set round-trips through base64 over its little-endian
//! byte buffer.
//!
//! # Failure Modes
//!
//! - Out-of-range bit or word indices panic (debug-asserted first). This is
//!   a performance-critical structure; callers own their bounds.
//! - Deserialization rejects byte buffers whose length is not a multiple of
//!   the lane width.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
}

/// A fixed-width storage lane: `u8`, `u16`, or `u32`.
///
/// Sealed; the three implementations cover every supported width.
pub trait Lane: sealed::Sealed + Copy + Eq + fmt::Debug {
    /// Bits per lane (8, 16, or 32).
    const BITS: u32;
    /// `log2(BITS)`, for shift-based index math.
    const SHIFT: u32;
    /// Lane with every bit clear.
    const EMPTY: Self;
    /// Lane with every bit set.
    const FILLED: Self;

    /// A lane with only bit `pos` set. `pos < BITS`.
    fn bit(pos: u32) -> Self;
    /// Whether any bit of `mask` is set in `self`.
    fn intersects(self, mask: Self) -> bool;
    /// `self | mask`.
    fn with(self, mask: Self) -> Self;
    /// `self & !mask`.
    fn without(self, mask: Self) -> Self;
    /// `self ^ mask`.
    fn toggled(self, mask: Self) -> Self;
    /// Append the lane to `out` in little-endian byte order.
    fn write_le(self, out: &mut Vec<u8>);
    /// Read one lane from exactly `BITS / 8` little-endian bytes.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_lane {
    ($ty:ty, $bits:expr, $shift:expr) => {
        impl Lane for $ty {
            const BITS: u32 = $bits;
            const SHIFT: u32 = $shift;
            const EMPTY: Self = 0;
            const FILLED: Self = <$ty>::MAX;

            #[inline]
            fn bit(pos: u32) -> Self {
                1 << pos
            }

            #[inline]
            fn intersects(self, mask: Self) -> bool {
                self & mask != 0
            }

            #[inline]
            fn with(self, mask: Self) -> Self {
                self | mask
            }

            #[inline]
            fn without(self, mask: Self) -> Self {
                self & !mask
            }

            #[inline]
            fn toggled(self, mask: Self) -> Self {
                self ^ mask
            }

            #[inline]
            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            #[inline]
            fn read_le(bytes: &[u8]) -> Self {
                let mut buf = [0_u8; ($bits / 8) as usize];
                buf.copy_from_slice(bytes);
                <$ty>::from_le_bytes(buf)
            }
        }
    };
}

impl_lane!(u8, 8, 3);
impl_lane!(u16, 16, 4);
impl_lane!(u32, 32, 5);

/// Errors from [`XBitSet`] deserialization.
#[derive(Debug)]
pub enum BitSetError {
    /// The input was not valid base64.
    InvalidBase64(base64::DecodeError),
    /// The decoded byte buffer does not divide evenly into lanes.
    MisalignedBuffer {
        /// Length of the decoded buffer.
        byte_len: usize,
        /// Bytes per lane for the requested width.
        lane_bytes: usize,
    },
}

impl fmt::Display for BitSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBase64(err) => write!(f, "invalid base64: {err}"),
            Self::MisalignedBuffer {
                byte_len,
                lane_bytes,
            } => write!(
                f,
                "decoded buffer of {byte_len} bytes does not divide into {lane_bytes}-byte lanes"
            ),
        }
    }
}

impl std::error::Error for BitSetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidBase64(err) => Some(err),
            Self::MisalignedBuffer { .. } => None,
        }
    }
}

/// Packed boolean storage over fixed-width lanes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XBitSet<W: Lane> {
    words: Vec<W>,
}

/// Bit set over 8-bit lanes.
pub type BitSet8 = XBitSet<u8>;
/// Bit set over 16-bit lanes.
pub type BitSet16 = XBitSet<u16>;
/// Bit set over 32-bit lanes.
pub type BitSet32 = XBitSet<u32>;

impl<W: Lane> XBitSet<W> {
    /// A set of `words` lanes, all bits clear.
    #[must_use]
    pub fn empty(words: usize) -> Self {
        Self {
            words: vec![W::EMPTY; words],
        }
    }

    /// A set of `words` lanes, all bits set.
    #[must_use]
    pub fn filled(words: usize) -> Self {
        Self {
            words: vec![W::FILLED; words],
        }
    }

    /// Number of lanes.
    #[inline]
    #[must_use]
    pub fn len_words(&self) -> usize {
        self.words.len()
    }

    /// Total bit capacity.
    #[inline]
    #[must_use]
    pub fn len_bits(&self) -> usize {
        self.words.len() << W::SHIFT
    }

    #[inline]
    fn locate(index: usize) -> (usize, W) {
        let word = index >> W::SHIFT;
        let bit = (index & (W::BITS as usize - 1)) as u32;
        (word, W::bit(bit))
    }

    /// Whether the bit at `index` is set. Panics out of range.
    #[inline]
    #[must_use]
    pub fn has(&self, index: usize) -> bool {
        debug_assert!(index < self.len_bits(), "bit index {index} out of range");
        let (word, mask) = Self::locate(index);
        self.words[word].intersects(mask)
    }

    /// Set the bit at `index`. Panics out of range.
    #[inline]
    pub fn set(&mut self, index: usize) {
        debug_assert!(index < self.len_bits(), "bit index {index} out of range");
        let (word, mask) = Self::locate(index);
        self.words[word] = self.words[word].with(mask);
    }

    /// Clear the bit at `index`. Panics out of range.
    #[inline]
    pub fn unset(&mut self, index: usize) {
        debug_assert!(index < self.len_bits(), "bit index {index} out of range");
        let (word, mask) = Self::locate(index);
        self.words[word] = self.words[word].without(mask);
    }

    /// Toggle the bit at `index`. Panics out of range.
    #[inline]
    pub fn flip(&mut self, index: usize) {
        debug_assert!(index < self.len_bits(), "bit index {index} out of range");
        let (word, mask) = Self::locate(index);
        self.words[word] = self.words[word].toggled(mask);
    }

    /// Read the whole lane at `word_index`. Panics out of range.
    #[inline]
    #[must_use]
    pub fn word_at(&self, word_index: usize) -> W {
        self.words[word_index]
    }

    /// Overwrite the whole lane at `word_index`. Panics out of range.
    #[inline]
    pub fn set_word(&mut self, word_index: usize, value: W) {
        self.words[word_index] = value;
    }

    /// Encode the set as base64 over its little-endian byte buffer.
    #[must_use]
    pub fn to_base64(&self) -> String {
        let mut bytes = Vec::with_capacity(self.words.len() * (W::BITS / 8) as usize);
        for word in &self.words {
            word.write_le(&mut bytes);
        }
        BASE64.encode(bytes)
    }

    /// Decode a set from base64 produced by [`XBitSet::to_base64`].
    pub fn from_base64(encoded: &str) -> Result<Self, BitSetError> {
        let bytes = BASE64.decode(encoded).map_err(BitSetError::InvalidBase64)?;
        let lane_bytes = (W::BITS / 8) as usize;
        if bytes.len() % lane_bytes != 0 {
            return Err(BitSetError::MisalignedBuffer {
                byte_len: bytes.len(),
                lane_bytes,
            });
        }

        let words = bytes.chunks_exact(lane_bytes).map(W::read_le).collect();
        Ok(Self { words })
    }

    /// Lazy, finite iterator over the bits of a sub-range.
    ///
    /// The page covers `offset..offset + len`, clamped to capacity. Calling
    /// this again yields a fresh, restarted iteration; no intermediate
    /// collection is materialized.
    #[must_use]
    pub fn page_iter(&self, offset: usize, len: usize) -> PageIter<'_, W> {
        let end = offset.saturating_add(len).min(self.len_bits());
        PageIter {
            set: self,
            cursor: offset.min(end),
            end,
        }
    }
}

/// Iterator yielded by [`XBitSet::page_iter`].
#[derive(Debug, Clone)]
pub struct PageIter<'a, W: Lane> {
    set: &'a XBitSet<W>,
    cursor: usize,
    end: usize,
}

impl<W: Lane> Iterator for PageIter<'_, W> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.cursor >= self.end {
            return None;
        }
        let bit = self.set.has(self.cursor);
        self.cursor += 1;
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.cursor;
        (remaining, Some(remaining))
    }
}

impl<W: Lane> ExactSizeIterator for PageIter<'_, W> {}
