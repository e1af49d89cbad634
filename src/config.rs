//! Configuration surface: the knobs a caller can set on a [`crate::Decoder`].

/// Options controlling how a [`crate::Decoder`] behaves.
///
/// `allocator` from the spec's configuration surface is not modeled here:
/// this crate performs no custom allocation, every buffer is an ordinary
/// `Vec` subject to the process's global allocator, so there is no
/// allocator handle to inject.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecoderOptions {
    /// Upper bound on `width * height`. Images that would exceed it are
    /// rejected with `OutOfMemory` before the pixel store is allocated.
    /// `None` means unbounded.
    pub max_pixels: Option<u64>,
}

impl DecoderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = Some(max_pixels);
        self
    }
}
