use std::path::Path;

use anyhow::anyhow;
use ffmpeg_sidecar::{command::FfmpegCommand, event::FfmpegEvent};
use image::RgbaImage;
use tracing::{debug, info};

use crate::error::{GlitchError, GlitchResult};

const VIDEO_EXTENSIONS: [&str; 6] = ["mp4", "webm", "mov", "mkv", "avi", "gif"];

/// Supplies the raw pixels an instance glitches.
pub trait FrameSource {
    fn dimensions(&self) -> (u32, u32);

    /// Live sources change every tick and are re-drawn before processing.
    fn is_live(&self) -> bool {
        false
    }

    /// Copies the current frame into `target`, which already has
    /// `dimensions()`. Live sources advance to their next frame.
    fn draw(&mut self, target: &mut RgbaImage);
}

pub struct StillImage {
    image: RgbaImage,
}

impl StillImage {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn open(path: impl AsRef<Path>) -> GlitchResult<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|e| GlitchError::invalid_source(format!("{}: {e}", path.display())))?
            .to_rgba8();
        Ok(Self::new(image))
    }
}

impl FrameSource for StillImage {
    fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn draw(&mut self, target: &mut RgbaImage) {
        target.copy_from_slice(&self.image);
    }
}

/// Pre-decoded video frames, played back in a loop one per tick.
pub struct VideoFrames {
    frames: Vec<RgbaImage>,
    cursor: usize,
}

impl VideoFrames {
    pub fn new(frames: Vec<RgbaImage>) -> GlitchResult<Self> {
        let Some(first) = frames.first() else {
            return Err(GlitchError::invalid_source("video has no frames"));
        };
        let dimensions = first.dimensions();
        if frames.iter().any(|f| f.dimensions() != dimensions) {
            return Err(GlitchError::invalid_source(
                "video frames differ in dimensions",
            ));
        }
        Ok(Self { frames, cursor: 0 })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn decode(path: impl AsRef<Path>) -> GlitchResult<Self> {
        let path = path.as_ref();
        let input = path
            .to_str()
            .ok_or_else(|| GlitchError::invalid_source(format!("{}: not utf-8", path.display())))?;

        let mut decoder = FfmpegCommand::new()
            .hide_banner()
            .input(input)
            .args("-f rawvideo -pix_fmt rgba -".split(' '))
            .spawn()
            .map_err(|e| anyhow!("failed to spawn ffmpeg: {e}"))?;

        let mut frames = Vec::new();
        for event in decoder.iter().map_err(|e| anyhow!("{e}"))? {
            match event {
                FfmpegEvent::OutputFrame(frame) => {
                    debug!(frame = frame.frame_num, "decoded frame");
                    let image = RgbaImage::from_raw(frame.width, frame.height, frame.data)
                        .ok_or_else(|| {
                            GlitchError::invalid_source(format!(
                                "frame {} is not {}x{} rgba",
                                frame.frame_num, frame.width, frame.height
                            ))
                        })?;
                    frames.push(image);
                }
                FfmpegEvent::Error(e) => debug!("[ffmpeg] {e}"),
                _ => (),
            }
        }

        info!(path = %path.display(), frames = frames.len(), "decoded video");
        Self::new(frames)
    }
}

impl FrameSource for VideoFrames {
    fn dimensions(&self) -> (u32, u32) {
        self.frames[self.cursor].dimensions()
    }

    fn is_live(&self) -> bool {
        true
    }

    fn draw(&mut self, target: &mut RgbaImage) {
        target.copy_from_slice(&self.frames[self.cursor]);
        self.cursor = (self.cursor + 1) % self.frames.len();
    }
}

pub fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|v| v.eq_ignore_ascii_case(ext))
        })
}

/// Resolves a file into a still or looping video source by extension.
pub fn open(path: impl AsRef<Path>) -> GlitchResult<Box<dyn FrameSource>> {
    let path = path.as_ref();
    if is_video(path) {
        Ok(Box::new(VideoFrames::decode(path)?))
    } else {
        Ok(Box::new(StillImage::open(path)?))
    }
}
