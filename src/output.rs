use std::{
    collections::HashMap,
    fs,
    io::{self, Write},
    path::PathBuf,
};

use image::RgbaImage;

use crate::{
    error::{GlitchError, GlitchResult},
    registry::Handle,
};

/// Consumes processed frames, once per glitcher per tick.
pub trait Renderer {
    fn present(&mut self, handle: Handle, frame: &RgbaImage) -> GlitchResult<()>;
}

/// Writes raw RGBA frames to stdout, e.g. for
/// `ffplay -f rawvideo -pixel_format rgba -video_size WxH -`.
pub struct RawStdout {
    out: io::Stdout,
}

impl RawStdout {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for RawStdout {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for RawStdout {
    fn present(&mut self, _handle: Handle, frame: &RgbaImage) -> GlitchResult<()> {
        let mut out = self.out.lock();
        out.write_all(frame)
            .and_then(|_| out.flush())
            .map_err(|e| GlitchError::output(format!("stdout: {e}")))
    }
}

/// Saves every frame as `<dir>/<index>-<frame>.png`.
pub struct PngSequence {
    dir: PathBuf,
    counters: HashMap<Handle, u64>,
}

impl PngSequence {
    pub fn create(dir: impl Into<PathBuf>) -> GlitchResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| GlitchError::output(format!("{}: {e}", dir.display())))?;
        Ok(Self {
            dir,
            counters: HashMap::new(),
        })
    }
}

impl Renderer for PngSequence {
    fn present(&mut self, handle: Handle, frame: &RgbaImage) -> GlitchResult<()> {
        let counter = self.counters.entry(handle).or_default();
        let path = self
            .dir
            .join(format!("{}-{counter:06}.png", handle.to_string().trim_start_matches('#')));
        *counter += 1;

        frame
            .save(&path)
            .map_err(|e| GlitchError::output(format!("{}: {e}", path.display())))
    }
}

/// Keeps the latest frame of each glitcher in memory.
#[derive(Default)]
pub struct Collect {
    pub frames: HashMap<Handle, RgbaImage>,
    pub presented: usize,
}

impl Renderer for Collect {
    fn present(&mut self, handle: Handle, frame: &RgbaImage) -> GlitchResult<()> {
        self.frames.insert(handle, frame.clone());
        self.presented += 1;
        Ok(())
    }
}
