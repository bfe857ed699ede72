use glitcher::{
    random::Sequence, source::StillImage, ChannelGroup, Collect, EffectConfig, GlitchGroup,
    Glitcher, Jitter, Registry, Scheduler,
};
use image::{Rgba, RgbaImage};
use rand::{rngs::StdRng, SeedableRng};

fn two_pixels() -> RgbaImage {
    let mut image = RgbaImage::new(2, 1);
    image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
    image.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
    image
}

fn gradient(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| Rgba([(x * 7) as u8, (y * 11) as u8, (x + y) as u8, 255]))
}

#[test]
fn zero_shift_glitch_keeps_pixels_and_keys_alpha() {
    let config = EffectConfig {
        glitches: Some(GlitchGroup::new(1.0, 1.0)),
        transparent: Some(0x000000),
        ..EffectConfig::default()
    };
    let mut registry = Registry::new();
    let handle = registry.insert(
        Glitcher::with_source(config, Box::new(StillImage::new(two_pixels()))).unwrap(),
    );

    let mut out = Collect::default();
    let stats = Scheduler::new(60).tick(&mut registry, &mut Sequence::constant(0.0), &mut out);
    assert_eq!(stats.rendered, 1);

    let frame = &out.frames[&handle];
    assert_eq!(*frame.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
    assert_eq!(*frame.get_pixel(1, 0), Rgba([0, 255, 0, 255]));
    assert_eq!(frame, registry.get(handle).unwrap().rendered());
}

#[test]
fn same_seed_renders_same_frames() {
    let config = EffectConfig {
        color: Some(ChannelGroup::new(1.1, 1.0, 1.0).with_shared_jitter(Jitter::default())),
        offset: Some(ChannelGroup::new(1.0, 0.0, 2.0)),
        glitches: Some(GlitchGroup {
            dv: Some(Jitter { min: 1.0, max: 4.0 }),
            dh: Some(Jitter::default()),
            ..GlitchGroup::new(3.0, 2.0)
        }),
        ..EffectConfig::default()
    };

    let render = |seed: u64| {
        let mut registry = Registry::new();
        let handle = registry.insert(
            Glitcher::with_source(config.clone(), Box::new(StillImage::new(gradient(16, 9))))
                .unwrap(),
        );
        let mut rng = StdRng::seed_from_u64(seed);
        let mut out = Collect::default();
        let scheduler = Scheduler::new(60);
        for _ in 0..4 {
            scheduler.tick(&mut registry, &mut rng, &mut out);
        }
        out.frames.remove(&handle).unwrap()
    };

    assert_eq!(render(42), render(42));
}

#[tokio::test(start_paused = true)]
async fn many_glitchers_share_one_loop() {
    let mut registry = Registry::new();
    let pending = registry.insert(Glitcher::new(EffectConfig::default()));
    let handles: Vec<_> = (0..3)
        .map(|i| {
            let config = EffectConfig {
                grayscale: Some(ChannelGroup::new(1.0, 0.0, 0.0)),
                ..EffectConfig::default()
            };
            let source = StillImage::new(gradient(4 + i, 3));
            registry.insert(Glitcher::with_source(config, Box::new(source)).unwrap())
        })
        .collect();

    let mut out = Collect::default();
    let ticks = Scheduler::new(30)
        .with_max_ticks(3)
        .run(&mut registry, &mut StdRng::seed_from_u64(1), &mut out)
        .await;

    assert_eq!(ticks, 3);
    assert_eq!(out.presented, 9);
    assert!(!out.frames.contains_key(&pending));
    for handle in handles {
        let frame = &out.frames[&handle];
        let Rgba([r, g, b, a]) = *frame.get_pixel(2, 1);
        assert_eq!((r, g, b, a), (14, 14, 14, 255));
    }
}
