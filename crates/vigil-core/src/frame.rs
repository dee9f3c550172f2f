//! Video frames as they travel from the source to the decision loop.
//!
//! A frame is immutable once produced. Capture workers hand frames forward
//! by value and never see any decision state.

/// Supported pixel layouts for frame data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameFormat {
    /// RGB with 8 bits per channel (24 bits per pixel)
    #[default]
    RGB8,
    /// RGBA with 8 bits per channel (32 bits per pixel)
    RGBA8,
    /// BGR with 8 bits per channel (OpenCV default)
    BGR8,
    /// YUV420 planar (common video format)
    YUV420,
    /// Grayscale 8-bit
    Gray8,
}

impl FrameFormat {
    /// Bytes needed to hold a `width` x `height` image in this format.
    pub fn frame_size(self, width: u32, height: u32) -> usize {
        let pixels = width as usize * height as usize;
        match self {
            FrameFormat::RGB8 | FrameFormat::BGR8 => pixels * 3,
            FrameFormat::RGBA8 => pixels * 4,
            FrameFormat::YUV420 => pixels + (pixels / 2), // Y + UV
            FrameFormat::Gray8 => pixels,
        }
    }

    /// Interleaved channel count (YUV420 reports the luma plane only).
    pub fn channels(self) -> usize {
        match self {
            FrameFormat::RGB8 | FrameFormat::BGR8 => 3,
            FrameFormat::RGBA8 => 4,
            FrameFormat::YUV420 | FrameFormat::Gray8 => 1,
        }
    }
}

/// A single decoded video frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub format: FrameFormat,
    pub data: Vec<u8>,
    /// Presentation timestamp in microseconds
    pub timestamp_us: u64,
}

impl Frame {
    pub fn new(width: u32, height: u32, format: FrameFormat, data: Vec<u8>, timestamp_us: u64) -> Self {
        Self {
            width,
            height,
            format,
            data,
            timestamp_us,
        }
    }

    /// A zero-filled frame, handy for hosts that only need dimensions.
    pub fn blank(width: u32, height: u32, format: FrameFormat) -> Self {
        let data = vec![0u8; format.frame_size(width, height)];
        Self::new(width, height, format, data, 0)
    }

    pub fn expected_size(&self) -> usize {
        self.format.frame_size(self.width, self.height)
    }

    /// Whether the pixel buffer is large enough for the declared dimensions.
    pub fn is_well_formed(&self) -> bool {
        self.data.len() >= self.expected_size()
    }
}
