use core::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::{EmissiveSample, Reservoir};

/// Reservoir of the direct-lighting resampling.
pub type LightReservoir = Reservoir<LightSample>;

/// Point on an emissive surface chosen by the resampling.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LightSample {
    /// Index into the emissive-sample buffer this sample came from
    pub sample_id: u32,
    pub light_point: Vec3,
    pub light_normal: Vec3,
    pub radiance: Vec3,

    /// Target function of this sample evaluated at the owning pixel
    pub pdf: f32,

    /// Whether the last visibility test found the light unoccluded
    pub is_visible: bool,

    /// Number of frames this sample has been carried through history
    pub age: u32,
}

impl LightSample {
    pub fn from_emissive(sample_id: u32, emissive: &EmissiveSample) -> Self {
        Self {
            sample_id,
            light_point: emissive.position,
            light_normal: emissive.normal,
            radiance: emissive.radiance,
            pdf: 0.0,
            is_visible: true,
            age: 0,
        }
    }

    /// Evaluates the unshadowed target function `p̂` of this sample at given
    /// surface: luminance of the diffuse contribution times the geometry
    /// term.
    pub fn target_pdf(&self, surface: &Surface) -> f32 {
        let to_light = self.light_point - surface.position;
        let dist_sq = to_light.length_squared();

        if dist_sq <= 0.0 {
            return 0.0;
        }

        let dir = to_light / dist_sq.sqrt();
        let cos_surface = surface.normal.dot(dir).max(0.0);
        let cos_light = (-self.light_normal).dot(dir).max(0.0);
        let brdf = surface.albedo / PI;

        luma(brdf * self.radiance) * cos_surface * cos_light / dist_sq
    }
}

/// Shading point reconstructed from the G-buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Surface {
    pub position: Vec3,
    pub normal: Vec3,
    pub albedo: Vec3,
}

/// GPU-side layout of [`LightReservoir`]; the reservoir buffers hold one of
/// these per pixel.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ReservoirData {
    pub light_point: Vec3,
    pub sample_id: u32,
    pub light_normal: Vec3,
    pub m: f32,
    pub radiance: Vec3,
    pub w: f32,
    pub pdf: f32,
    pub visibility: f32,
    pub age: u32,
    pub _padding: u32,
}

impl ReservoirData {
    /// Size of a single reservoir, in bytes.
    pub const STRIDE: usize = core::mem::size_of::<Self>();
}

impl LightReservoir {
    pub fn read(buffer: &[ReservoirData], id: usize) -> Self {
        let data = buffer[id];

        Self {
            sample: LightSample {
                sample_id: data.sample_id,
                light_point: data.light_point,
                light_normal: data.light_normal,
                radiance: data.radiance,
                pdf: data.pdf,
                is_visible: data.visibility > 0.0,
                age: data.age,
            },
            m: data.m,
            w: data.w,
        }
    }

    pub fn write(self, buffer: &mut [ReservoirData], id: usize) {
        buffer[id] = ReservoirData {
            light_point: self.sample.light_point,
            sample_id: self.sample.sample_id,
            light_normal: self.sample.light_normal,
            m: self.m,
            radiance: self.sample.radiance,
            w: self.w,
            pdf: self.sample.pdf,
            visibility: if self.sample.is_visible { 1.0 } else { 0.0 },
            age: self.sample.age,
            _padding: 0,
        };
    }
}

fn luma(color: Vec3) -> f32 {
    color.dot(Vec3::new(0.2126, 0.7152, 0.0722))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::vec3;

    use super::*;

    fn light() -> LightSample {
        LightSample {
            sample_id: 3,
            light_point: vec3(0.0, 2.0, 0.0),
            light_normal: vec3(0.0, -1.0, 0.0),
            radiance: Vec3::splat(10.0),
            pdf: 0.0,
            is_visible: true,
            age: 0,
        }
    }

    #[test]
    fn stride() {
        assert_eq!(64, ReservoirData::STRIDE);
    }

    #[test]
    fn target_pdf() {
        let surface = Surface {
            position: Vec3::ZERO,
            normal: Vec3::Y,
            albedo: Vec3::ONE,
        };

        // Head-on: cosines are 1, distance is 2
        assert_relative_eq!(
            light().target_pdf(&surface),
            (10.0 / PI) / 4.0,
            epsilon = 1e-5
        );

        // Surface facing away from the light
        let surface = Surface {
            normal: -Vec3::Y,
            ..surface
        };

        assert_eq!(0.0, light().target_pdf(&surface));
    }

    #[test]
    fn buffer_layout_preserves_reservoir() {
        let mut buffer = [ReservoirData::default(); 2];

        let reservoir = LightReservoir {
            sample: LightSample {
                pdf: 1.5,
                is_visible: false,
                age: 7,
                ..light()
            },
            m: 12.0,
            w: 0.25,
        };

        reservoir.write(&mut buffer, 1);

        assert_eq!(ReservoirData::default(), buffer[0]);
        assert_eq!(reservoir, LightReservoir::read(&buffer, 1));
    }
}
