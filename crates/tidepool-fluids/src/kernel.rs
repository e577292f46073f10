use std::f32::consts::PI;

/// Smoothing kernels for a fixed smoothing radius `h`.
///
/// Every kernel vanishes at and beyond `h`, which is what lets a 3x3 stencil of cells of size `h`
/// find all contributing neighbors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmoothingKernels {
    /// Smoothing radius.
    pub h: f32,
    density_scale: f32,
    derivative_scale: f32,
    viscosity_scale: f32,
}

impl SmoothingKernels {
    pub fn new(h: f32) -> Self {
        let h4 = h.powi(4);

        Self {
            h,
            density_scale: 6.0 / (PI * h4),
            derivative_scale: 12.0 / (PI * h4),
            viscosity_scale: 4.0 / (PI * h4 * h4),
        }
    }

    /// 2D spiky kernel, `(h - d)² / (π h⁴ / 6)`.
    #[inline]
    pub fn density(&self, d: f32) -> f32 {
        if d >= self.h {
            return 0.0;
        }

        let v = self.h - d;
        v * v * self.density_scale
    }

    /// Radial derivative of [`Self::density`]. Never positive.
    #[inline]
    pub fn density_derivative(&self, d: f32) -> f32 {
        if d >= self.h {
            return 0.0;
        }

        (d - self.h) * self.derivative_scale
    }

    /// Poly6 falloff used for viscosity, maximal at `d = 0`.
    #[inline]
    pub fn viscosity(&self, d: f32) -> f32 {
        if d >= self.h {
            return 0.0;
        }

        let v = self.h * self.h - d * d;
        v * v * v * self.viscosity_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernels_vanish_outside_support() {
        let k = SmoothingKernels::new(0.35);

        for d in [0.35, 0.3500001, 0.5, 10.0] {
            assert_eq!(k.density(d), 0.0);
            assert_eq!(k.density_derivative(d), 0.0);
            assert_eq!(k.viscosity(d), 0.0);
        }
    }

    #[test]
    fn kernels_are_continuous_at_support_edge() {
        let k = SmoothingKernels::new(0.35);
        let d = 0.35 - 1e-5;

        assert!(k.density(d) < 1e-3);
        assert!(k.density_derivative(d).abs() < 1e-2);
        assert!(k.viscosity(d) < 1e-3);
    }

    #[test]
    fn kernels_peak_at_zero_distance() {
        let k = SmoothingKernels::new(1.0);

        assert!((k.density(0.0) - 6.0 / PI).abs() < 1e-6);
        assert!((k.density_derivative(0.0) + 12.0 / PI).abs() < 1e-6);
        assert!(k.viscosity(0.0) > k.viscosity(0.5));
        assert!(k.viscosity(0.5) > 0.0);
    }

    #[test]
    fn density_kernel_integrates_to_one() {
        // ∫ W(r) 2πr dr over [0, h] using the midpoint rule.
        let k = SmoothingKernels::new(0.5);
        let n = 10_000;
        let dr = k.h / n as f32;
        let total: f32 = (0..n)
            .map(|i| {
                let r = (i as f32 + 0.5) * dr;
                k.density(r) * 2.0 * PI * r * dr
            })
            .sum();

        assert!((total - 1.0).abs() < 1e-3, "kernel integrates to {total}");
    }
}
