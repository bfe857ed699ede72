use rand::{
    rngs::{StdRng, ThreadRng},
    Rng,
};

/// Source of uniform randomness for the sampler and the glitch stage.
///
/// Implemented for `rand`'s generators; tests plug in fixed sequences.
pub trait RandomSource {
    /// Uniform value in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// `min + floor(u * (max - min))`.
    fn draw_in_range(&mut self, min: f64, max: f64) -> f64 {
        min + (self.next_unit() * (max - min)).floor()
    }
}

impl RandomSource for StdRng {
    fn next_unit(&mut self) -> f64 {
        self.random()
    }
}

impl RandomSource for ThreadRng {
    fn next_unit(&mut self) -> f64 {
        self.random()
    }
}

/// Cycles through a fixed list of unit values.
#[derive(Debug, Clone)]
pub struct Sequence {
    values: Vec<f64>,
    index: usize,
}

impl Sequence {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: values.into(),
            index: 0,
        }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    pub fn draws(&self) -> usize {
        self.index
    }
}

impl RandomSource for Sequence {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            self.index += 1;
            return 0.0;
        }
        let v = self.values[self.index % self.values.len()];
        self.index += 1;
        v
    }
}
