//! Closed-form initial conditions.

use tessel_core::Field2;

use crate::error::SeedError;

/// A pure function of global `(row, col)` used to seed the field.
///
/// Feed [`sample`](Self::sample) to
/// [`DomainGrid::partition_with`](tessel_grid::DomainGrid::partition_with)
/// to build chunks without materializing the global array, or call
/// [`field`](Self::field) for the whole thing.
///
/// # Examples
///
/// ```
/// use tessel_stencil::InitialCondition;
///
/// let seed = InitialCondition::hot_spot(400, 400);
/// assert_eq!(seed.sample(200, 200), 1.0);
/// assert!((seed.sample(210, 200) - (-0.5f64).exp()).abs() < 1e-15);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InitialCondition {
    /// Every cell holds the same value.
    Uniform(f64),
    /// A single non-zero cell on a zero background.
    PointSource {
        /// Row of the source.
        row: usize,
        /// Column of the source.
        col: usize,
        /// Value at the source.
        value: f64,
    },
    /// `amplitude · exp(-((r - cr)² + (c - cc)²) / decay)`.
    GaussianHotSpot {
        /// `(cr, cc)`, which may be fractional.
        center: (f64, f64),
        /// Peak value.
        amplitude: f64,
        /// Width parameter; larger spreads the spot.
        decay: f64,
    },
}

impl InitialCondition {
    /// Unit Gaussian with `decay = 200` centred on `(nx / 2, ny / 2)`.
    pub fn hot_spot(nx: usize, ny: usize) -> Self {
        Self::GaussianHotSpot {
            center: ((nx / 2) as f64, (ny / 2) as f64),
            amplitude: 1.0,
            decay: 200.0,
        }
    }

    /// Value at global `(row, col)`.
    pub fn sample(&self, row: usize, col: usize) -> f64 {
        match *self {
            Self::Uniform(v) => v,
            Self::PointSource {
                row: sr,
                col: sc,
                value,
            } => {
                if (row, col) == (sr, sc) {
                    value
                } else {
                    0.0
                }
            }
            Self::GaussianHotSpot {
                center: (cr, cc),
                amplitude,
                decay,
            } => {
                let dr = row as f64 - cr;
                let dc = col as f64 - cc;
                amplitude * (-(dr * dr + dc * dc) / decay).exp()
            }
        }
    }

    /// Materialize the `nx × ny` field.
    pub fn field(&self, nx: usize, ny: usize) -> Field2 {
        Field2::from_fn(nx, ny, |r, c| self.sample(r, c))
    }

    /// Reject parameters that cannot produce a finite field.
    pub fn validate(&self) -> Result<(), SeedError> {
        match *self {
            Self::Uniform(value) | Self::PointSource { value, .. } => finite("value", value),
            Self::GaussianHotSpot {
                center,
                amplitude,
                decay,
            } => {
                finite("hot spot centre row", center.0)?;
                finite("hot spot centre column", center.1)?;
                finite("hot spot amplitude", amplitude)?;
                if !decay.is_finite() || decay <= 0.0 {
                    return Err(SeedError::NonPositiveDecay { decay });
                }
                Ok(())
            }
        }
    }
}

fn finite(parameter: &'static str, value: f64) -> Result<(), SeedError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SeedError::NonFinite { parameter, value })
    }
}
