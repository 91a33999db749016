//! Ghost synthesis at the global domain boundary.

use std::fmt;
use std::str::FromStr;

use tessel_core::Side;

use crate::chunk::Chunk;

/// How ghost values are derived where a chunk face has no neighbour.
///
/// Applied uniformly to every chunk face that lies on the global domain
/// boundary. Interior faces always take their ghosts from the
/// neighbouring chunk instead.
///
/// | Policy | Ghost at `a[-1]` | Physical meaning |
/// |--------|------------------|------------------|
/// | `Reflect` | `a[1]` | zero-derivative mirror about the edge cell |
/// | `Edge` | `a[0]` | replicated edge, zero flux |
/// | `Fixed(v)` | `v` | Dirichlet condition |
///
/// # Examples
///
/// ```
/// use tessel_grid::BoundaryPolicy;
///
/// let edge = [4.0, 5.0];
/// let inner = [1.0, 2.0];
/// assert_eq!(BoundaryPolicy::Reflect.ghost_line(&edge, Some(&inner)), vec![1.0, 2.0]);
/// assert_eq!(BoundaryPolicy::Edge.ghost_line(&edge, Some(&inner)), vec![4.0, 5.0]);
/// assert_eq!(BoundaryPolicy::Fixed(0.5).ghost_line(&edge, None), vec![0.5, 0.5]);
/// assert_eq!("replicate".parse::<BoundaryPolicy>(), Ok(BoundaryPolicy::Edge));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum BoundaryPolicy {
    /// Mirror the row/column one cell in from the edge.
    #[default]
    Reflect,
    /// Replicate the edge row/column outward.
    Edge,
    /// Hold the ghost at a constant.
    Fixed(f64),
}

impl BoundaryPolicy {
    /// Ghosts for `side` of `chunk` derived from the chunk alone.
    ///
    /// For `Reflect` on a chunk only one cell deep the edge row itself
    /// is used; the halo exchanger avoids that fallback whenever the
    /// global second row exists in a neighbouring chunk.
    pub fn edge_value(&self, chunk: &Chunk, side: Side) -> Vec<f64> {
        let edge = chunk.edge(side);
        let inner = chunk.inner(side);
        self.ghost_line(&edge, inner.as_deref())
    }

    /// Ghosts for a face given its edge line and (when it exists) the
    /// line one cell further in.
    pub fn ghost_line(&self, edge: &[f64], inner: Option<&[f64]>) -> Vec<f64> {
        match (self, inner) {
            (Self::Reflect, Some(inner)) => inner.to_vec(),
            (Self::Reflect, None) | (Self::Edge, _) => edge.to_vec(),
            (Self::Fixed(v), _) => vec![*v; edge.len()],
        }
    }

    /// Map an out-of-range index on an axis of length `len` back into
    /// the domain, or `None` for `Fixed` (which has no source cell).
    ///
    /// In-range indices are returned unchanged. Only one cell past
    /// either end is meaningful for a 1-cell halo.
    pub fn source_index(&self, index: isize, len: usize) -> Option<usize> {
        let n = len as isize;
        if (0..n).contains(&index) {
            return Some(index as usize);
        }
        match self {
            Self::Fixed(_) => None,
            Self::Edge => Some(index.clamp(0, n - 1) as usize),
            Self::Reflect => {
                let mirrored = if index < 0 { -index } else { 2 * (n - 1) - index };
                if (0..n).contains(&mirrored) {
                    Some(mirrored as usize)
                } else {
                    Some(index.clamp(0, n - 1) as usize)
                }
            }
        }
    }

    /// The constant ghost value, for `Fixed`.
    pub fn fixed_value(&self) -> Option<f64> {
        match self {
            Self::Fixed(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for BoundaryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reflect => f.write_str("reflect"),
            Self::Edge => f.write_str("edge"),
            Self::Fixed(v) => write!(f, "fixed:{v}"),
        }
    }
}

impl FromStr for BoundaryPolicy {
    type Err = String;

    /// Accepts `reflect`, `edge` (or `replicate`), and `fixed:<value>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "reflect" => return Ok(Self::Reflect),
            "edge" | "replicate" => return Ok(Self::Edge),
            _ => {}
        }
        let Some((kind, value)) = s.split_once(':') else {
            return Err(format!(
                "unknown boundary policy '{s}' (expected reflect, edge, or fixed:<value>)"
            ));
        };
        if !kind.eq_ignore_ascii_case("fixed") {
            return Err(format!("unknown boundary policy '{kind}'"));
        }
        let v: f64 = value
            .trim()
            .parse()
            .map_err(|e| format!("invalid fixed boundary value '{value}': {e}"))?;
        if !v.is_finite() {
            return Err(format!("fixed boundary value must be finite, got {v}"));
        }
        Ok(Self::Fixed(v))
    }
}
