//! Captured screen frames
//!
//! A frame is an owned RGBA buffer. The only analysis done locally is the
//! blank-screen heuristic: a frame whose red, green, and blue channel means
//! all exceed 240 is treated as an unloaded white page and triggers a
//! browser refresh in the capture session.

use crate::error::{CaptureError, Result};
use std::path::Path;

/// Channel mean threshold above which a frame counts as blank
const BLANK_CHANNEL_MEAN: f64 = 240.0;

/// An RGBA screen capture
#[derive(Debug, Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Create a frame from raw RGBA bytes
    ///
    /// Returns a config error when the buffer does not match the dimensions.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(CaptureError::Driver(format!(
                "frame buffer size {} does not match {}x{} RGBA ({expected})",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Mean value of the red, green, and blue channels
    pub fn channel_means(&self) -> (f64, f64, f64) {
        let pixels = (self.width as usize) * (self.height as usize);
        if pixels == 0 {
            return (0.0, 0.0, 0.0);
        }

        let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
        for px in self.data.chunks_exact(4) {
            r += u64::from(px[0]);
            g += u64::from(px[1]);
            b += u64::from(px[2]);
        }

        let n = pixels as f64;
        (r as f64 / n, g as f64 / n, b as f64 / n)
    }

    /// Whether the frame is likely a blank/white page
    pub fn is_blank(&self) -> bool {
        let (r, g, b) = self.channel_means();
        r > BLANK_CHANNEL_MEAN && g > BLANK_CHANNEL_MEAN && b > BLANK_CHANNEL_MEAN
    }

    /// Write the frame as a PNG file
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let buffer =
            image::RgbaImage::from_raw(self.width, self.height, self.data.clone()).ok_or_else(
                || CaptureError::Save {
                    path: path.display().to_string(),
                    reason: "invalid frame buffer".to_string(),
                },
            )?;

        buffer.save(path).map_err(|e| CaptureError::Save {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(width: u32, height: u32, rgba: [u8; 4]) -> Frame {
        let data = rgba
            .into_iter()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Frame::from_rgba(width, height, data).unwrap()
    }

    #[test]
    fn test_buffer_size_checked() {
        assert!(Frame::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(Frame::from_rgba(2, 2, vec![0; 15]).is_err());
    }

    #[test]
    fn test_channel_means() {
        let frame = solid_frame(4, 4, [10, 20, 30, 255]);
        let (r, g, b) = frame.channel_means();
        assert_eq!(r, 10.0);
        assert_eq!(g, 20.0);
        assert_eq!(b, 30.0);
    }

    #[test]
    fn test_white_frame_is_blank() {
        let frame = solid_frame(8, 8, [250, 250, 250, 255]);
        assert!(frame.is_blank());
    }

    #[test]
    fn test_chart_frame_is_not_blank() {
        let frame = solid_frame(8, 8, [20, 24, 33, 255]);
        assert!(!frame.is_blank());
    }

    #[test]
    fn test_one_dark_channel_is_not_blank() {
        // A mostly-white page with colored content pulls one channel down
        let frame = solid_frame(8, 8, [250, 250, 100, 255]);
        assert!(!frame.is_blank());
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let frame = solid_frame(4, 4, [1, 2, 3, 255]);
        frame.save_png(&path).unwrap();
        assert!(path.exists());
    }
}
