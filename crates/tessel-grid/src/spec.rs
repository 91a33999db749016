//! Immutable physical and geometric description of the global grid.

use crate::error::GridError;

/// Global extent, spacing, diffusivity, and time step.
///
/// `nx` counts rows (axis 0) and `ny` counts columns (axis 1); `dx` is
/// the spacing along rows and `dy` along columns.
///
/// # Stability
///
/// The explicit scheme is only stable for small enough `dt`. For the
/// 5-point stencil the bound is `alpha * dt * (1/dx² + 1/dy²) <= 1/2`,
/// i.e. `dt <= dx·dy / (4·alpha)` on a square mesh. `GridSpec` does not
/// enforce it; each stencil reports its own bound and the engine config
/// decides what to do about a violation.
///
/// # Examples
///
/// ```
/// use tessel_grid::GridSpec;
///
/// let spec = GridSpec::new(400, 400).with_alpha(0.1).with_dt(1.0);
/// assert!(spec.validate().is_ok());
/// assert_eq!(spec.cell_count(), 160_000);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridSpec {
    /// Number of rows.
    pub nx: usize,
    /// Number of columns.
    pub ny: usize,
    /// Spacing along rows.
    pub dx: f64,
    /// Spacing along columns.
    pub dy: f64,
    /// Diffusion coefficient.
    pub alpha: f64,
    /// Time step.
    pub dt: f64,
}

impl GridSpec {
    /// A unit-spacing grid with `alpha = 0.1` and `dt = 1`.
    pub fn new(nx: usize, ny: usize) -> Self {
        Self {
            nx,
            ny,
            dx: 1.0,
            dy: 1.0,
            alpha: 0.1,
            dt: 1.0,
        }
    }

    /// Set both spacings.
    pub fn with_spacing(mut self, dx: f64, dy: f64) -> Self {
        self.dx = dx;
        self.dy = dy;
        self
    }

    /// Set the diffusion coefficient.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the time step.
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    /// `(nx, ny)`.
    pub fn extent(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.nx * self.ny
    }

    /// Check structural and parameter invariants.
    ///
    /// Extents must be non-zero; `dx`, `dy`, and `dt` finite and
    /// positive; `alpha` finite and non-negative.
    pub fn validate(&self) -> Result<(), GridError> {
        if self.nx == 0 || self.ny == 0 {
            return Err(GridError::InvalidShape {
                reason: format!("global extent {}x{} has a zero dimension", self.nx, self.ny),
            });
        }
        for (name, value) in [("dx", self.dx), ("dy", self.dy), ("dt", self.dt)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(GridError::InvalidParameter { name, value });
            }
        }
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(GridError::InvalidParameter {
                name: "alpha",
                value: self.alpha,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_spec_is_valid() {
        assert!(GridSpec::new(4, 4).validate().is_ok());
    }

    #[test]
    fn zero_extent_rejected() {
        match GridSpec::new(0, 4).validate() {
            Err(GridError::InvalidShape { .. }) => {}
            other => panic!("expected InvalidShape, got {other:?}"),
        }
    }

    #[test]
    fn nan_dt_rejected() {
        match GridSpec::new(4, 4).with_dt(f64::NAN).validate() {
            Err(GridError::InvalidParameter { name: "dt", .. }) => {}
            other => panic!("expected InvalidParameter(dt), got {other:?}"),
        }
    }

    #[test]
    fn negative_spacing_rejected() {
        match GridSpec::new(4, 4).with_spacing(1.0, -1.0).validate() {
            Err(GridError::InvalidParameter { name: "dy", .. }) => {}
            other => panic!("expected InvalidParameter(dy), got {other:?}"),
        }
    }

    #[test]
    fn zero_alpha_allowed_negative_rejected() {
        assert!(GridSpec::new(4, 4).with_alpha(0.0).validate().is_ok());
        match GridSpec::new(4, 4).with_alpha(-0.1).validate() {
            Err(GridError::InvalidParameter { name: "alpha", .. }) => {}
            other => panic!("expected InvalidParameter(alpha), got {other:?}"),
        }
    }
}
