use image::RgbaImage;
use tracing::debug;

use crate::{
    config::EffectConfig,
    error::{GlitchError, GlitchResult},
    pipeline,
    random::RandomSource,
    sampler,
    source::FrameSource,
};

/// One live glitch effect: a source, its configuration and the buffers it
/// owns.
pub struct Glitcher {
    config: EffectConfig,
    source: Option<Box<dyn FrameSource>>,
    width: u32,
    height: u32,
    /// Last pixels drawn from the source.
    original: RgbaImage,
    /// Processed pixels exposed to the renderer.
    rendered: RgbaImage,
}

impl Glitcher {
    pub fn new(config: EffectConfig) -> Self {
        Self {
            config,
            source: None,
            width: 0,
            height: 0,
            original: RgbaImage::new(0, 0),
            rendered: RgbaImage::new(0, 0),
        }
    }

    pub fn with_source(config: EffectConfig, source: Box<dyn FrameSource>) -> GlitchResult<Self> {
        let mut glitcher = Self::new(config);
        glitcher.set_source(source)?;
        Ok(glitcher)
    }

    /// Replaces the source, resizes both buffers and draws its first frame.
    pub fn set_source(&mut self, mut source: Box<dyn FrameSource>) -> GlitchResult<()> {
        let (width, height) = source.dimensions();
        if width == 0 || height == 0 {
            return Err(GlitchError::invalid_source(format!(
                "source has empty dimensions {width}x{height}"
            )));
        }

        self.resize(width, height);
        source.draw(&mut self.original);
        self.rendered.copy_from_slice(&self.original);
        self.source = Some(source);
        Ok(())
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EffectConfig {
        &mut self.config
    }

    /// Output surface, holding the processed frame after each render.
    pub fn rendered(&self) -> &RgbaImage {
        &self.rendered
    }

    /// Refreshes the source, samples parameters and processes one frame.
    ///
    /// Returns `false` without touching anything when no source is set yet,
    /// or when a live source currently reports empty dimensions.
    pub fn render(&mut self, rng: &mut impl RandomSource) -> bool {
        let Some(mut source) = self.source.take() else {
            return false;
        };

        if source.is_live() {
            let (width, height) = source.dimensions();
            if width == 0 || height == 0 {
                debug!(width, height, "live source has no frame, skipping");
                self.source = Some(source);
                return false;
            }
            self.resize(width, height);
            source.draw(&mut self.original);
        }
        self.source = Some(source);

        let params = sampler::sample(&self.config, rng);
        self.rendered.copy_from_slice(&self.original);
        pipeline::process(&mut self.rendered, &params, self.config.transparent, rng);
        true
    }

    fn resize(&mut self, width: u32, height: u32) {
        if (width, height) != (self.width, self.height) {
            debug!(width, height, "resizing buffers");
            self.width = width;
            self.height = height;
            self.original = RgbaImage::new(width, height);
            self.rendered = RgbaImage::new(width, height);
        }
    }
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;
    use crate::{
        config::{ChannelGroup, GlitchGroup},
        random::Sequence,
        source::{StillImage, VideoFrames},
    };

    fn still(w: u32, h: u32, px: [u8; 4]) -> Box<dyn FrameSource> {
        Box::new(StillImage::new(RgbaImage::from_pixel(w, h, Rgba(px))))
    }

    #[test]
    fn render_without_source_is_a_noop() {
        let mut g = Glitcher::new(EffectConfig::default());
        assert!(!g.has_source());
        assert!(!g.render(&mut Sequence::constant(0.0)));
        assert_eq!(g.rendered().dimensions(), (0, 0));
    }

    #[test]
    fn set_source_sizes_buffers_and_draws() {
        let mut g = Glitcher::new(EffectConfig::default());
        g.set_source(still(3, 2, [1, 2, 3, 255])).unwrap();
        assert_eq!(g.dimensions(), (3, 2));
        assert_eq!(g.rendered().dimensions(), (3, 2));
        assert_eq!(*g.rendered().get_pixel(2, 1), Rgba([1, 2, 3, 255]));

        g.set_source(still(1, 1, [4, 5, 6, 255])).unwrap();
        assert_eq!(g.dimensions(), (1, 1));
        assert_eq!(g.rendered().len(), 4);
    }

    #[test]
    fn empty_source_is_rejected() {
        let mut g = Glitcher::new(EffectConfig::default());
        let err = g.set_source(still(0, 4, [0; 4])).unwrap_err();
        assert!(matches!(err, GlitchError::Source(_)));
        assert!(!g.has_source());
    }

    #[test]
    fn still_source_is_processed_from_pristine_pixels_every_tick() {
        let config = EffectConfig {
            color: Some(ChannelGroup::new(2.0, 1.0, 1.0)),
            ..EffectConfig::default()
        };
        let mut g = Glitcher::with_source(config, still(2, 1, [10, 20, 30, 255])).unwrap();
        let mut rng = Sequence::constant(0.0);
        for _ in 0..3 {
            assert!(g.render(&mut rng));
            assert_eq!(*g.rendered().get_pixel(0, 0), Rgba([20, 40, 60, 255]));
        }
    }

    #[test]
    fn config_changes_apply_on_next_render() {
        let mut g = Glitcher::with_source(EffectConfig::default(), still(2, 1, [1, 2, 3, 255]))
            .unwrap();
        let mut rng = Sequence::constant(0.0);
        g.render(&mut rng);
        assert_eq!(*g.rendered().get_pixel(0, 0), Rgba([1, 2, 3, 255]));

        g.config_mut().transparent = Some(0x010203);
        assert_eq!(g.config().transparent, Some(0x010203));
        g.render(&mut rng);
        assert_eq!(*g.rendered().get_pixel(0, 0), Rgba([1, 2, 3, 0]));
    }

    /// Live source whose size follows a script, one entry per draw.
    struct Resizing {
        sizes: Vec<(u32, u32)>,
        draws: usize,
    }

    impl FrameSource for Resizing {
        fn dimensions(&self) -> (u32, u32) {
            self.sizes[self.draws.min(self.sizes.len() - 1)]
        }

        fn is_live(&self) -> bool {
            true
        }

        fn draw(&mut self, target: &mut RgbaImage) {
            assert_eq!(target.dimensions(), self.dimensions());
            let shade = self.draws as u8 * 10;
            for px in target.pixels_mut() {
                *px = Rgba([shade, shade, shade, 255]);
            }
            self.draws += 1;
        }
    }

    #[test]
    fn live_source_resize_reallocates_buffers() {
        let source = Resizing {
            sizes: vec![(2, 1), (2, 1), (3, 2)],
            draws: 0,
        };
        let mut g = Glitcher::with_source(EffectConfig::default(), Box::new(source)).unwrap();
        let mut rng = Sequence::constant(0.0);

        assert!(g.render(&mut rng));
        assert_eq!(g.dimensions(), (2, 1));
        assert_eq!(g.rendered().dimensions(), (2, 1));
        assert!(g.rendered().pixels().all(|p| *p == Rgba([10, 10, 10, 255])));

        assert!(g.render(&mut rng));
        assert_eq!(g.dimensions(), (3, 2));
        assert_eq!(g.rendered().dimensions(), (3, 2));
        assert!(g.rendered().pixels().all(|p| *p == Rgba([20, 20, 20, 255])));
    }

    #[test]
    fn live_source_without_frame_skips_render() {
        let source = Resizing {
            sizes: vec![(2, 1), (0, 0), (2, 1)],
            draws: 0,
        };
        let mut g = Glitcher::with_source(EffectConfig::default(), Box::new(source)).unwrap();
        let mut rng = Sequence::constant(0.0);

        assert!(!g.render(&mut rng));
        assert_eq!(g.dimensions(), (2, 1));
        assert!(g.rendered().pixels().all(|p| *p == Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn live_source_advances_each_tick() {
        let frames = (1..=2)
            .map(|i| RgbaImage::from_pixel(1, 2, Rgba([i * 10, 0, 0, 255])))
            .collect();
        let video = VideoFrames::new(frames).unwrap();
        let config = EffectConfig {
            glitches: Some(GlitchGroup::new(0.0, 1.0)),
            transparent: Some(0x140000),
            ..EffectConfig::default()
        };
        let mut g = Glitcher::with_source(config, Box::new(video)).unwrap();
        let mut rng = Sequence::constant(0.0);

        // set_source drew frame 0, the first render draws frame 1.
        g.render(&mut rng);
        assert_eq!(*g.rendered().get_pixel(0, 0), Rgba([20, 0, 0, 0]));
        g.render(&mut rng);
        assert_eq!(*g.rendered().get_pixel(0, 0), Rgba([10, 0, 0, 255]));
    }
}
