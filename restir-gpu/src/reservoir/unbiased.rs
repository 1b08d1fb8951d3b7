use crate::Reservoir;

/// Accumulates the `Z` term of the unbiased reuse.
///
/// When a pixel combines reservoirs from its neighbours (or from history),
/// dividing by the total confidence `M` is biased whenever some of those
/// pixels could not have generated the chosen sample (different geometry,
/// occluded light). The unbiased variant divides only by the confidence of
/// the pixels whose target function is non-zero for the chosen sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UnbiasedNormalization {
    z: f32,
}

impl UnbiasedNormalization {
    /// Registers a reservoir that took part in the combination.
    ///
    /// `pdf` is the target function of the finally chosen sample evaluated at
    /// that reservoir's pixel, `is_visible` the outcome of the visibility
    /// test from that pixel.
    pub fn add(&mut self, m: f32, pdf: f32, is_visible: bool) {
        if pdf > 0.0 && is_visible {
            self.z += m;
        }
    }

    pub fn z(&self) -> f32 {
        self.z
    }

    /// Normalizes the combined reservoir; `pdf` is the target function of
    /// the chosen sample at the current pixel.
    pub fn apply<T>(&self, reservoir: &mut Reservoir<T>, pdf: f32)
    where
        T: Clone + Copy,
    {
        reservoir.normalize_unbiased(pdf, self.z);
    }
}
