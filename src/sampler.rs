use crate::{
    config::{ChannelGroup, EffectConfig, Jitter},
    random::RandomSource,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlitchParams {
    /// Upper bound of the per-band horizontal shift, in pixels.
    pub value: f64,
    /// Scanlines per band.
    pub height: f64,
}

/// One frame's worth of concrete coefficients.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampledParameters {
    pub color: Option<[f64; 3]>,
    pub offset: Option<[f64; 3]>,
    pub grayscale: Option<[f64; 3]>,
    pub glitches: Option<GlitchParams>,
}

pub fn sample(config: &EffectConfig, rng: &mut impl RandomSource) -> SampledParameters {
    let color = config.color.as_ref().map(|g| sample_group(g, rng));
    let offset = config.offset.as_ref().map(|g| sample_group(g, rng));
    let grayscale = config.grayscale.as_ref().map(|g| sample_group(g, rng));
    let glitches = config.glitches.as_ref().map(|g| GlitchParams {
        value: g.value * jitter(g.dv, rng),
        height: g.height * jitter(g.dh, rng),
    });

    SampledParameters {
        color,
        offset,
        grayscale,
        glitches,
    }
}

fn sample_group(group: &ChannelGroup, rng: &mut impl RandomSource) -> [f64; 3] {
    group
        .channels()
        .map(|(base, range)| base * jitter(range, rng))
}

fn jitter(range: Option<Jitter>, rng: &mut impl RandomSource) -> f64 {
    match range {
        Some(Jitter { min, max }) => rng.draw_in_range(min, max),
        None => 1.0,
    }
}
