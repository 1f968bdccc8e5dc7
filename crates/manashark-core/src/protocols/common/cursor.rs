use thiserror::Error;

/// Returned when a read asks for more bytes than the cursor still holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("buffer underflow: need {needed} bytes, {remaining} remaining")]
pub struct Underflow {
    pub needed: usize,
    pub remaining: usize,
}

/// Forward-only view over a borrowed payload.
///
/// The offset never moves backwards, and a failed `take` leaves it where it
/// was.
///
/// # Examples
/// ```
/// use manashark_core::ByteCursor;
///
/// let mut cursor = ByteCursor::new(&[0x7d, 0x00, 0x01]);
/// assert_eq!(cursor.take_i16_le().unwrap(), 0x7d);
/// assert_eq!(cursor.remaining(), 1);
/// assert!(cursor.take(2).is_err());
/// assert_eq!(cursor.remaining(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    payload: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.payload.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn require(&self, needed: usize) -> Result<(), Underflow> {
        let remaining = self.remaining();
        if remaining < needed {
            return Err(Underflow { needed, remaining });
        }
        Ok(())
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], Underflow> {
        self.require(n)?;
        let start = self.offset;
        self.offset += n;
        Ok(&self.payload[start..self.offset])
    }

    pub fn take_array<const N: usize>(&mut self) -> Result<[u8; N], Underflow> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn take_i16_le(&mut self) -> Result<i16, Underflow> {
        self.take_array().map(i16::from_le_bytes)
    }
}
