use std::fmt;
use std::ops::{Deref, DerefMut};

/// Fixed-width raw byte field.
///
/// Offers the bytes directly (via `Deref<Target = [u8; N]>`) and, for `N <= 8`, an
/// unsigned-integer view over the same storage. The integer view is little-endian: byte 0 is
/// the least significant. Since the integer is computed from the bytes on every access, a write
/// through either view is always visible through the other.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedByteBuffer<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> FixedByteBuffer<N> {
    pub const LEN: usize = N;

    pub const fn new(bytes: [u8; N]) -> Self {
        Self { bytes }
    }

    pub const fn zeroed() -> Self {
        Self { bytes: [0u8; N] }
    }

    /// Buffer whose integer view equals the low `N` bytes of `value`.
    pub fn from_uint(value: u64) -> Self {
        let mut buf = Self::zeroed();
        buf.set_uint(value);
        buf
    }

    /// Interpret the bytes as a little-endian unsigned integer.
    pub fn as_uint(&self) -> u64 {
        const { assert!(N <= 8, "integer view needs N <= 8") };
        let mut wide = [0u8; 8];
        wide[..N].copy_from_slice(&self.bytes);
        u64::from_le_bytes(wide)
    }

    /// Store `value` little-endian. Bits above `8 * N` are dropped.
    pub fn set_uint(&mut self, value: u64) {
        const { assert!(N <= 8, "integer view needs N <= 8") };
        self.bytes.copy_from_slice(&value.to_le_bytes()[..N]);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn into_inner(self) -> [u8; N] {
        self.bytes
    }
}

impl<const N: usize> Default for FixedByteBuffer<N> {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl<const N: usize> Deref for FixedByteBuffer<N> {
    type Target = [u8; N];

    fn deref(&self) -> &Self::Target {
        &self.bytes
    }
}

impl<const N: usize> DerefMut for FixedByteBuffer<N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.bytes
    }
}

impl<const N: usize> AsRef<[u8]> for FixedByteBuffer<N> {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl<const N: usize> From<[u8; N]> for FixedByteBuffer<N> {
    fn from(bytes: [u8; N]) -> Self {
        Self::new(bytes)
    }
}

impl<const N: usize> fmt::Debug for FixedByteBuffer<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedByteBuffer<{N}>(")?;
        for b in &self.bytes {
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}
