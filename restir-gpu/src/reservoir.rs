mod direct;
mod unbiased;

pub use self::direct::*;
pub use self::unbiased::*;
use crate::WhiteNoise;

/// Weighted reservoir holding a single sample.
///
/// While candidates are being streamed in, `w` holds the running sum of
/// resampling weights; after [`Self::normalize()`] it holds the unbiased
/// contribution weight `W` of the chosen sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Reservoir<T> {
    pub sample: T,
    pub m: f32,
    pub w: f32,
}

impl<T> Reservoir<T>
where
    T: Clone + Copy,
{
    /// Streams a candidate in; returns whether it replaced the current
    /// sample.
    pub fn update(
        &mut self,
        wnoise: &mut WhiteNoise,
        sample: T,
        weight: f32,
    ) -> bool {
        self.m += 1.0;
        self.w += weight;

        if weight > 0.0 && wnoise.sample() * self.w <= weight {
            self.sample = sample;
            true
        } else {
            false
        }
    }

    /// Merges an already normalized reservoir into this one; `pdf` is the
    /// target function of `rhs`'s sample evaluated at this reservoir's pixel.
    pub fn merge(
        &mut self,
        wnoise: &mut WhiteNoise,
        rhs: &Self,
        pdf: f32,
    ) -> bool {
        if rhs.m <= 0.0 {
            return false;
        }

        self.m += rhs.m - 1.0;
        self.update(wnoise, rhs.sample, rhs.w * rhs.m * pdf)
    }

    /// Turns the weight sum into the contribution weight using the biased
    /// `1 / M` normalization.
    pub fn normalize(&mut self, pdf: f32) {
        let t = self.m * pdf;

        self.w = if t == 0.0 { 0.0 } else { self.w / t };
    }

    /// Turns the weight sum into the contribution weight using the `1 / Z`
    /// normalization, where `z` counts only the candidates whose pixels could
    /// have produced the chosen sample.
    pub fn normalize_unbiased(&mut self, pdf: f32, z: f32) {
        let t = z * pdf;

        self.w = if t == 0.0 { 0.0 } else { self.w / t };
    }

    /// Caps the confidence of a reservoir carried over from history.
    pub fn clamp_m(&mut self, max: f32) {
        self.m = self.m.min(max);
    }

    pub fn is_empty(&self) -> bool {
        self.m == 0.0
    }
}
