//! Homogeneous single-speed material cross sections.

/// Macroscopic cross sections of the (single, homogeneous) material, plus
/// the average number of neutrons released per fission.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    /// Average number of fission neutrons produced per fission event.
    pub nu: f64,
    /// Macroscopic fission cross section.
    pub xs_f: f64,
    /// Macroscopic absorption cross section (capture, non-fission).
    pub xs_a: f64,
    /// Macroscopic scattering cross section.
    pub xs_s: f64,
}

impl Material {
    /// Total macroscopic cross section, `xs_f + xs_a + xs_s`.
    #[must_use]
    pub fn xs_total(&self) -> f64 {
        self.xs_f + self.xs_a + self.xs_s
    }
}
