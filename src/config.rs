use std::{fs, path::Path};

use serde::Deserialize;

use crate::error::{GlitchError, GlitchResult};

pub const DEFAULT_JITTER: Jitter = Jitter { min: 1.0, max: 3.0 };

/// Multiplicative jitter range `[min, max)`.
///
/// Written as `[min, max]` in JSON, or `true` for the default `[1, 3)`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "JitterRepr")]
pub struct Jitter {
    pub min: f64,
    pub max: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JitterRepr {
    Range([f64; 2]),
    Default(bool),
}

impl TryFrom<JitterRepr> for Jitter {
    type Error = String;

    fn try_from(repr: JitterRepr) -> Result<Self, Self::Error> {
        match repr {
            JitterRepr::Range([min, max]) => Ok(Jitter { min, max }),
            JitterRepr::Default(true) => Ok(DEFAULT_JITTER),
            JitterRepr::Default(false) => {
                Err("jitter must be [min, max] or true, omit it to disable".to_string())
            }
        }
    }
}

impl Default for Jitter {
    fn default() -> Self {
        DEFAULT_JITTER
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelGroup {
    #[serde(default)]
    pub r: f64,
    #[serde(default)]
    pub g: f64,
    #[serde(default)]
    pub b: f64,
    pub dr: Option<Jitter>,
    pub dg: Option<Jitter>,
    pub db: Option<Jitter>,
    pub dv: Option<Jitter>,
}

impl ChannelGroup {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self {
            r,
            g,
            b,
            ..Self::default()
        }
    }

    pub fn with_shared_jitter(mut self, jitter: Jitter) -> Self {
        self.dv = Some(jitter);
        self
    }

    /// Base value and jitter range for each of r, g, b.
    pub(crate) fn channels(&self) -> [(f64, Option<Jitter>); 3] {
        [
            (self.r, self.dr.or(self.dv)),
            (self.g, self.dg.or(self.dv)),
            (self.b, self.db.or(self.dv)),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlitchGroup {
    pub value: f64,
    pub height: f64,
    pub dv: Option<Jitter>,
    pub dh: Option<Jitter>,
}

impl GlitchGroup {
    pub fn new(value: f64, height: f64) -> Self {
        Self {
            value,
            height,
            dv: None,
            dh: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EffectConfig {
    pub color: Option<ChannelGroup>,
    pub offset: Option<ChannelGroup>,
    pub grayscale: Option<ChannelGroup>,
    pub glitches: Option<GlitchGroup>,
    /// Packed `0xRRGGBB` key; matching pixels end up fully transparent.
    pub transparent: Option<u32>,
}

impl EffectConfig {
    pub fn from_json(json: &str) -> GlitchResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| GlitchError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> GlitchResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| GlitchError::config(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    fn validate(&self) -> GlitchResult<()> {
        if let Some(key) = self.transparent {
            if key > 0xff_ffff {
                return Err(GlitchError::config(format!(
                    "transparent key {key:#x} does not fit in 24 bits"
                )));
            }
        }

        let groups = [&self.color, &self.offset, &self.grayscale];
        let mut ranges: Vec<Jitter> = groups
            .into_iter()
            .flatten()
            .flat_map(|g| [g.dr, g.dg, g.db, g.dv])
            .flatten()
            .collect();
        if let Some(glitches) = &self.glitches {
            ranges.extend(glitches.dv);
            ranges.extend(glitches.dh);
        }

        for range in ranges {
            if !range.min.is_finite() || !range.max.is_finite() || range.max < range.min {
                return Err(GlitchError::config(format!(
                    "invalid jitter range [{}, {}]",
                    range.min, range.max
                )));
            }
        }

        Ok(())
    }
}

/// Parses `RRGGBB` (optionally prefixed with `#` or `0x`) into a packed key.
pub fn parse_hex_color(s: &str) -> GlitchResult<u32> {
    let hex = s
        .trim_start_matches('#')
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(GlitchError::config(format!("expected RRGGBB, got '{s}'")));
    }

    let mut key = 0u32;
    for i in 0..3 {
        let idx = i * 2;
        let channel = u8::from_str_radix(&hex[idx..(idx + 2)], 16)
            .map_err(|e| GlitchError::config(format!("'{s}': {e}")))?;
        key = (key << 8) | channel as u32;
    }

    Ok(key)
}
