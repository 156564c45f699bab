//! Square height field storage and resampling

/// A square grid of elevation samples in local units.
///
/// Samples are stored row-major: `samples[z * resolution + x]`. A field of
/// resolution `size + 1` lines up one sample per mesh vertex of a
/// `size`-cell chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightField {
    resolution: usize,
    samples: Vec<f32>,
}

impl HeightField {
    /// Create an all-zero (flat) field
    pub fn flat(resolution: usize) -> Self {
        Self {
            resolution,
            samples: vec![0.0; resolution * resolution],
        }
    }

    /// Build a field from row-major samples.
    ///
    /// Returns `None` when the sample count is not `resolution²`.
    pub fn from_samples(resolution: usize, samples: Vec<f32>) -> Option<Self> {
        if samples.len() != resolution * resolution {
            return None;
        }
        Some(Self { resolution, samples })
    }

    /// Samples per side
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Get the sample at grid position (x, z)
    pub fn get(&self, x: usize, z: usize) -> f32 {
        self.samples[z * self.resolution + x]
    }

    /// Set the sample at grid position (x, z)
    pub fn set(&mut self, x: usize, z: usize, height: f32) {
        self.samples[z * self.resolution + x] = height;
    }

    /// Minimum sample value (0.0 for an empty field)
    pub fn min(&self) -> f32 {
        self.samples.iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// True if every sample is exactly zero
    pub fn is_flat(&self) -> bool {
        self.samples.iter().all(|&h| h == 0.0)
    }

    /// Subtract the minimum sample so the lowest point sits at zero.
    ///
    /// Prevents large absolute elevations from pushing meshes far off the
    /// origin plane.
    pub fn normalize(&mut self) {
        let min = self.min();
        if min.is_finite() && min != 0.0 {
            for h in &mut self.samples {
                *h -= min;
            }
        }
    }

    /// Multiply every sample by `factor`
    pub fn scale(&mut self, factor: f32) {
        for h in &mut self.samples {
            *h *= factor;
        }
    }

    /// Extract a `core_resolution²` region starting at `offset` on both axes.
    ///
    /// The caller guarantees `offset + core_resolution <= resolution`.
    pub fn crop(&self, offset: usize, core_resolution: usize) -> HeightField {
        debug_assert!(offset + core_resolution <= self.resolution);
        let mut out = HeightField::flat(core_resolution);
        for z in 0..core_resolution {
            for x in 0..core_resolution {
                out.set(x, z, self.get(x + offset, z + offset));
            }
        }
        out
    }

    /// Bilinearly sample the field at a local position inside the chunk
    /// footprint, where (0, 0) is the chunk's minimum corner and
    /// `chunk_size` its opposite edge. Positions outside are clamped.
    pub fn sample_local(&self, local_x: f32, local_z: f32, chunk_size: f32) -> f32 {
        let last = (self.resolution - 1) as f32;
        let gx = (local_x / chunk_size * last).clamp(0.0, last);
        let gz = (local_z / chunk_size * last).clamp(0.0, last);

        let x0 = gx.floor() as usize;
        let z0 = gz.floor() as usize;
        let x1 = (x0 + 1).min(self.resolution - 1);
        let z1 = (z0 + 1).min(self.resolution - 1);
        let fx = gx - x0 as f32;
        let fz = gz - z0 as f32;

        let a = self.get(x0, z0) + (self.get(x1, z0) - self.get(x0, z0)) * fx;
        let b = self.get(x0, z1) + (self.get(x1, z1) - self.get(x0, z1)) * fx;
        a + (b - a) * fz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_field() {
        let field = HeightField::flat(4);
        assert_eq!(field.resolution(), 4);
        assert!(field.is_flat());
        assert_eq!(field.get(3, 3), 0.0);
    }

    #[test]
    fn test_from_samples_count_check() {
        assert!(HeightField::from_samples(3, vec![0.0; 9]).is_some());
        assert!(HeightField::from_samples(3, vec![0.0; 8]).is_none());
        assert!(HeightField::from_samples(3, vec![0.0; 10]).is_none());
    }

    #[test]
    fn test_row_major_indexing() {
        let field = HeightField::from_samples(2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(field.get(0, 0), 1.0);
        assert_eq!(field.get(1, 0), 2.0);
        assert_eq!(field.get(0, 1), 3.0);
        assert_eq!(field.get(1, 1), 4.0);
    }

    #[test]
    fn test_normalize() {
        let mut field = HeightField::from_samples(2, vec![210.0, 205.0, 230.0, 240.0]).unwrap();
        field.normalize();
        assert_eq!(field.min(), 0.0);
        assert_eq!(field.get(0, 0), 5.0);
        assert_eq!(field.get(1, 1), 35.0);
    }

    #[test]
    fn test_scale() {
        let mut field = HeightField::from_samples(2, vec![10.0, 20.0, 30.0, 40.0]).unwrap();
        field.scale(0.1);
        assert_eq!(field.get(1, 0), 2.0);
        assert_eq!(field.get(1, 1), 4.0);
    }

    #[test]
    fn test_crop_center() {
        // 4x4 field, values encode position
        let samples: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let field = HeightField::from_samples(4, samples).unwrap();
        let core = field.crop(1, 2);
        assert_eq!(core.resolution(), 2);
        assert_eq!(core.get(0, 0), field.get(1, 1));
        assert_eq!(core.get(1, 0), field.get(2, 1));
        assert_eq!(core.get(0, 1), field.get(1, 2));
        assert_eq!(core.get(1, 1), field.get(2, 2));
    }

    #[test]
    fn test_sample_local_bilinear() {
        // 2x2 field spanning a 10-unit chunk: a simple ramp along x
        let field = HeightField::from_samples(2, vec![0.0, 10.0, 0.0, 10.0]).unwrap();
        assert_eq!(field.sample_local(0.0, 0.0, 10.0), 0.0);
        assert_eq!(field.sample_local(10.0, 0.0, 10.0), 10.0);
        assert!((field.sample_local(5.0, 5.0, 10.0) - 5.0).abs() < 1e-5);
        // Outside the footprint clamps
        assert_eq!(field.sample_local(50.0, 0.0, 10.0), 10.0);
        assert_eq!(field.sample_local(-5.0, 0.0, 10.0), 0.0);
    }
}
