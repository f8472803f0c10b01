//! The homogeneous rectangular box geometry.

/// Boundary condition applied when a particle reaches a face of the box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundaryCondition {
    /// The particle leaks out and is killed.
    Vacuum,
    /// The particle's outward velocity component is mirrored.
    Reflective,
    /// The particle re-enters from the opposite face.
    Periodic,
}

/// A rectangular box with side lengths `Lx, Ly, Lz`, consumed read-only by
/// transport and diagnostics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    /// Extent in x.
    pub lx: f64,
    /// Extent in y.
    pub ly: f64,
    /// Extent in z.
    pub lz: f64,
    /// Boundary condition shared by all six faces.
    pub bc: BoundaryCondition,
}

impl Geometry {
    /// Constructs a box of the given extents and boundary condition.
    #[must_use]
    pub fn new(lx: f64, ly: f64, lz: f64, bc: BoundaryCondition) -> Self {
        Self { lx, ly, lz, bc }
    }

    /// Clamps a position into the half-open box `[0, Lx) x [0, Ly) x [0, Lz)`,
    /// so that grid-indexing diagnostics never read past their last cell.
    /// Positions are otherwise assumed inside the box, but a particle
    /// produced exactly on the upper face must not index one cell past
    /// the grid.
    #[must_use]
    pub fn clamp_into_box(&self, p: (f64, f64, f64)) -> (f64, f64, f64) {
        let clamp = |v: f64, l: f64| v.clamp(0.0, l * (1.0 - f64::EPSILON));
        (clamp(p.0, self.lx), clamp(p.1, self.ly), clamp(p.2, self.lz))
    }
}
