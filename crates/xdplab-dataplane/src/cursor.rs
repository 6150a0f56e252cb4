//! Offset-tracking cursor over frame data
//!
//! The cursor owns the parsing contract shared by every protocol header:
//! check the fixed part fits, decode, validate the declared length, check
//! the declared length fits, and only then advance.

use xdplab_common::{Layer, ParseError};

/// A protocol header that can be parsed at the cursor
pub trait Header: Sized + Copy {
    /// Layer, for error reporting
    const LAYER: Layer;

    /// Fixed (minimum) header size
    const MIN_LEN: usize;

    /// Next-layer discriminator in host order
    type Next: Copy;

    /// Decode from exactly `MIN_LEN` bounds-checked bytes
    fn decode(bytes: &[u8]) -> Self;

    /// Real header size; differs from `MIN_LEN` for variable-length headers
    #[inline(always)]
    fn header_len(&self) -> usize {
        Self::MIN_LEN
    }

    /// Field sanity checks beyond the header length
    #[inline(always)]
    fn validate(&self) -> Result<(), ParseError> {
        Ok(())
    }

    /// Next-layer discriminator
    fn next(&self) -> Self::Next;
}

/// Byte offset into a frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    offset: usize,
}

impl Cursor {
    /// Cursor at the start of the frame
    #[inline(always)]
    pub const fn new() -> Self {
        Self { offset: 0 }
    }

    /// Cursor at a known header offset
    #[inline(always)]
    pub const fn at(offset: usize) -> Self {
        Self { offset }
    }

    /// Current offset
    #[inline(always)]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Bounds-checked view of `len` bytes at the cursor, without advancing
    #[inline]
    pub fn peek<'a>(&self, data: &'a [u8], len: usize, layer: Layer) -> Result<&'a [u8], ParseError> {
        match self.offset.checked_add(len) {
            Some(end) if end <= data.len() => Ok(&data[self.offset..end]),
            _ => Err(ParseError::Truncated {
                layer,
                offset: self.offset,
                needed: len,
                available: data.len(),
            }),
        }
    }

    /// Mutable variant of [`Cursor::peek`]
    #[inline]
    pub fn peek_mut<'a>(
        &self,
        data: &'a mut [u8],
        len: usize,
        layer: Layer,
    ) -> Result<&'a mut [u8], ParseError> {
        match self.offset.checked_add(len) {
            Some(end) if end <= data.len() => Ok(&mut data[self.offset..end]),
            _ => Err(ParseError::Truncated {
                layer,
                offset: self.offset,
                needed: len,
                available: data.len(),
            }),
        }
    }

    /// Parse one header and advance past it
    ///
    /// On error the offset is unchanged.
    #[inline]
    pub fn parse<H: Header>(&mut self, data: &[u8]) -> Result<(H, H::Next), ParseError> {
        let fixed = self.peek(data, H::MIN_LEN, H::LAYER)?;
        let header = H::decode(fixed);

        let len = header.header_len();
        if len < H::MIN_LEN {
            return Err(ParseError::InvalidLength {
                layer: H::LAYER,
                declared: len,
                minimum: H::MIN_LEN,
            });
        }

        // Variable-length headers: the declared size must fit too
        self.peek(data, len, H::LAYER)?;
        header.validate()?;

        self.offset += len;
        Ok((header, header.next()))
    }
}
