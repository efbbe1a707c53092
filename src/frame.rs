//! Bit frames and MSB-first byte packing.
//!
//! A [`FrameAssembler`] fills every position of a frame in arrival order
//! from a sampling closure.  The first failed sample aborts the whole
//! frame, so a [`BitFrame`] always has all `N` positions written and a
//! partial frame is never interpretable.

use crate::classifier::Bit;

/// Sensor frame length.
pub const SENSOR_FRAME_BITS: usize = 40;
/// Remote frame length.
pub const REMOTE_FRAME_BITS: usize = 32;

pub type SensorFrame = BitFrame<SENSOR_FRAME_BITS>;
pub type RemoteFrame = BitFrame<REMOTE_FRAME_BITS>;

/// Collects exactly `N` bits into a [`BitFrame`].
#[derive(Debug, Clone)]
pub struct FrameAssembler<const N: usize> {
    bits: [Bit; N],
}

impl<const N: usize> Default for FrameAssembler<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> FrameAssembler<N> {
    pub const fn new() -> Self {
        Self {
            bits: [Bit::Zero; N],
        }
    }

    /// Ask `next` for positions `0..N` in order.
    ///
    /// The first error is returned as-is and the partially filled frame is
    /// dropped with the assembler.
    pub fn assemble<E>(
        mut self,
        mut next: impl FnMut(usize) -> Result<Bit, E>,
    ) -> Result<BitFrame<N>, E> {
        for (n, slot) in self.bits.iter_mut().enumerate() {
            *slot = next(n)?;
        }
        Ok(BitFrame { bits: self.bits })
    }
}

/// A fully populated frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitFrame<const N: usize> {
    bits: [Bit; N],
}

impl<const N: usize> BitFrame<N> {
    /// Build a frame from bytes, MSB first, zero-padding or truncating to `N`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut bits = [Bit::Zero; N];
        for (i, slot) in bits.iter_mut().enumerate() {
            if let Some(byte) = bytes.get(i / 8) {
                *slot = Bit::from(byte & (0x80 >> (i % 8)) != 0);
            }
        }
        Self { bits }
    }

    /// The 8 bits at `start..start + 8`, MSB first.
    ///
    /// # Panics
    ///
    /// If `start + 8 > N`.
    pub fn byte(&self, start: usize) -> u8 {
        self.window_byte(start, 0)
    }

    /// The 8-bit cell at `start` read from `start + skip`.
    ///
    /// Only positions inside the cell are used; the `skip` least significant
    /// bits of the result are zero.
    ///
    /// # Panics
    ///
    /// The cell must lie inside the frame: `start + 8 <= N`.
    pub fn window_byte(&self, start: usize, skip: usize) -> u8 {
        debug_assert!(
            start + 8 <= N,
            "byte window {}..{} outside {}-bit frame",
            start,
            start + 8,
            N
        );
        if skip >= 8 {
            return 0;
        }
        pack_msb_first(self.bits[start + skip..start + 8].iter().copied()) << skip
    }
}

/// Pack up to eight bits into a byte, first bit most significant.
pub fn pack_msb_first(bits: impl IntoIterator<Item = Bit>) -> u8 {
    bits.into_iter()
        .take(8)
        .fold(0u8, |acc, b| (acc << 1) | u8::from(b))
}
