// Lossy admission for the pending-hash firehose. A rate of 1.0 admits
// everything, 0.0 admits nothing; in between each hash is an independent coin flip.

use rand::Rng;

#[derive(Debug, Clone, Copy)]
pub struct Sampler {
    rate: f64,
}

impl Sampler {
    pub fn new(rate: f64) -> Self {
        Self {
            rate: rate.clamp(0.0, 1.0),
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn admit(&self) -> bool {
        self.admit_with(rand::rng().random::<f64>())
    }

    /// `roll` is a uniform sample in [0, 1)
    pub fn admit_with(&self, roll: f64) -> bool {
        if self.rate >= 1.0 {
            return true;
        }
        roll < self.rate
    }
}
