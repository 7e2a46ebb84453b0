//! Three component nodal vectors returned by result providers.

use nalgebra::Vector3;

/// Translation of a single node in the units of the result set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Displacement {
    /// Displacement component along the global X axis.
    pub x: f64,
    /// Displacement component along the global Y axis.
    pub y: f64,
    /// Displacement component along the global Z axis.
    pub z: f64,
}

impl Displacement {
    /// Create a [`Displacement`] with explicit components.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Cartesian force vector, used for nodal and net reaction forces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Force {
    /// Force component acting along the global X axis.
    pub x: f64,
    /// Force component acting along the global Y axis.
    pub y: f64,
    /// Force component acting along the global Z axis.
    pub z: f64,
}

impl Force {
    /// Create a [`Force`] with explicit components.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Convert the force into an algebraic vector.
    #[must_use]
    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Euclidean norm of the force.
    #[must_use]
    pub fn norm(self) -> f64 {
        self.to_vector().norm()
    }
}

impl Default for Force {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

impl From<Vector3<f64>> for Force {
    fn from(value: Vector3<f64>) -> Self {
        Self::new(value.x, value.y, value.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_defaults_to_zero() {
        assert_eq!(Force::default(), Force::new(0.0, 0.0, 0.0));
        assert_eq!(Force::default().norm(), 0.0);
    }

    #[test]
    fn force_from_vector_keeps_components() {
        let force = Force::from(Vector3::new(3.0, 0.0, -4.0));
        assert_eq!(force, Force::new(3.0, 0.0, -4.0));
        assert!((force.norm() - 5.0).abs() < f64::EPSILON);
    }
}
