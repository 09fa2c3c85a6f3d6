//! Owned RGB frame buffer.
//!
//! A [`Frame`] is one captured still image from a device's display,
//! decoded into packed RGB8.  Frames are transient: they live for one
//! detection attempt and are never persisted or sent anywhere.

use thiserror::Error;

/// Error type for frame construction.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The pixel buffer length does not match `width * height * 3`.
    #[error("pixel buffer has {actual} bytes, expected {expected} for {width}x{height} RGB8")]
    BadBufferLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    /// Zero-sized frames carry no information and are rejected.
    #[error("frame dimensions must be non-zero, got {width}x{height}")]
    EmptyDimensions { width: u32, height: u32 },
}

/// One captured still image, packed RGB8, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Wraps an RGB8 pixel buffer.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] if the dimensions are zero or the buffer
    /// length does not match them.
    pub fn from_rgb8(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::EmptyDimensions { width, height });
        }
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(FrameError::BadBufferLength {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A frame filled with a single color.  Used by tests and benches to
    /// build synthetic screens.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Paints an axis-aligned rectangle.  Coordinates outside the frame
    /// are clipped.  Used by tests and benches.
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, rgb: [u8; 3]) {
        let x_end = (x + w).min(self.width);
        let y_end = (y + h).min(self.height);
        for py in y.min(self.height)..y_end {
            for px in x.min(self.width)..x_end {
                let i = (py as usize * self.width as usize + px as usize) * 3;
                self.data[i..i + 3].copy_from_slice(&rgb);
            }
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The RGB triple at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is out of bounds.  The detector only
    /// iterates within `width() × height()`, so in-tree callers never hit
    /// this.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
