//! Interface to the external engine that serves pre-computed result sets.
//!
//! The crate never computes physics. It opens one session per artifact and asks
//! it for fields, always scoped to a single step and to nodal location.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::field::Field;

/// Physical quantities that can be requested from a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityKind {
    /// Nodal translation vectors.
    Displacement,
    /// Nodal stress, either an equivalent scalar or tensor components.
    Stress,
    /// Nodal reaction force vectors.
    ReactionForce,
}

impl QuantityKind {
    /// Every quantity, in column order.
    pub const ALL: [QuantityKind; 3] = [
        QuantityKind::Displacement,
        QuantityKind::Stress,
        QuantityKind::ReactionForce,
    ];
}

impl fmt::Display for QuantityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuantityKind::Displacement => "displacement",
            QuantityKind::Stress => "stress",
            QuantityKind::ReactionForce => "reaction force",
        };
        f.write_str(name)
    }
}

/// Where the provider evaluates a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    /// Values averaged onto mesh nodes.
    Nodal,
}

/// One time or load increment of an artifact.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    /// One-based position on the artifact's step axis.
    pub index: usize,
    /// Time (transient) or load factor (static) reported by the provider.
    pub time: f64,
}

impl Step {
    /// Create a step at `index` with the given time value.
    #[must_use]
    pub const fn new(index: usize, time: f64) -> Self {
        Self { index, time }
    }

    /// The single step assumed for static analyses without a step axis.
    #[must_use]
    pub const fn synthetic() -> Self {
        Self::new(1, 1.0)
    }
}

/// Mesh size of an opened artifact, used for diagnostics only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshInfo {
    /// Number of mesh nodes.
    pub nodes: usize,
    /// Number of mesh elements.
    pub elements: usize,
}

/// Query session against one opened artifact.
///
/// Implementations may keep engine state internally but every call must be
/// fully scoped by its arguments.
pub trait ResultSession {
    /// Mesh metadata of the artifact.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::MeshUnavailable`] when the mesh cannot be read.
    fn mesh_info(&self) -> Result<MeshInfo, ProviderError>;

    /// Time or load values of every step, in increasing order.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::EnumerationUnsupported`] when the artifact has no
    /// step axis.
    fn time_steps(&self) -> Result<Vec<f64>, ProviderError>;

    /// Field of `kind` at `step`, evaluated at `location`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::QuantityUnavailable`] or
    /// [`ProviderError::ReactionForceUnsupported`] when the quantity cannot be served.
    fn quantity(
        &self,
        kind: QuantityKind,
        step: &Step,
        location: Location,
    ) -> Result<Field, ProviderError>;
}

/// Opens sessions against artifacts.
///
/// A provider is shared between worker threads; each session stays on the
/// thread that opened it.
pub trait ResultProvider: Send + Sync {
    /// Session type produced by [`ResultProvider::open`].
    type Session: ResultSession;

    /// Open a session against the artifact at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::ArtifactUnreadable`] when the engine cannot parse
    /// the file.
    fn open(&self, path: &Path) -> Result<Self::Session, ProviderError>;
}
