//! Per-step extraction of the three scalar aggregates.
//!
//! Every quantity is requested and reduced on its own, so a failure in one of
//! them never prevents the other two from being computed for the same step.
//! No state is kept between calls; each call is scoped by its step alone.

use crate::errors::ProviderError;
use crate::field::Field;
use crate::provider::{Location, QuantityKind, ResultSession, Step};

/// Value written for a reaction force that could not be computed.
pub const REACTION_FORCE_FALLBACK: f64 = 0.0;

/// Scalar reduction of one quantity at one step.
///
/// A value is always finite. [`QuantityResult::Fallback`] is a documented
/// substitute, kept apart from a genuine zero so callers can tell them apart.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum QuantityResult {
    /// The reduced value.
    Value(f64),
    /// A substitute written because the quantity could not be computed.
    Fallback(f64),
    /// The quantity could not be computed and has no substitute.
    Unavailable,
}

impl QuantityResult {
    /// Wrap a reduction, mapping a missing or non-finite value to `Unavailable`.
    #[must_use]
    pub fn from_reduction(value: Option<f64>) -> Self {
        match value {
            Some(value) if value.is_finite() => QuantityResult::Value(value),
            _ => QuantityResult::Unavailable,
        }
    }

    /// The number to write, if any.
    #[must_use]
    pub fn value(self) -> Option<f64> {
        match self {
            QuantityResult::Value(value) | QuantityResult::Fallback(value) => Some(value),
            QuantityResult::Unavailable => None,
        }
    }

    /// Whether the value was actually computed.
    #[must_use]
    pub fn is_computed(self) -> bool {
        matches!(self, QuantityResult::Value(_))
    }
}

/// Aggregates of one step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepQuantities {
    /// Largest nodal displacement magnitude.
    pub displacement: QuantityResult,
    /// Largest nodal stress value.
    pub stress: QuantityResult,
    /// Norm of the summed nodal reaction forces.
    pub reaction_force: QuantityResult,
}

impl StepQuantities {
    /// Aggregates with every quantity unavailable.
    #[must_use]
    pub const fn unavailable() -> Self {
        Self {
            displacement: QuantityResult::Unavailable,
            stress: QuantityResult::Unavailable,
            reaction_force: QuantityResult::Unavailable,
        }
    }

    /// Replace the aggregate of `kind`.
    pub fn set(&mut self, kind: QuantityKind, value: QuantityResult) {
        match kind {
            QuantityKind::Displacement => self.displacement = value,
            QuantityKind::Stress => self.stress = value,
            QuantityKind::ReactionForce => self.reaction_force = value,
        }
    }
}

/// Aggregates of one step plus the raw displacement field, when it was read.
#[derive(Clone, Debug, PartialEq)]
pub struct StepExtraction {
    /// Scalar aggregates.
    pub quantities: StepQuantities,
    /// Displacement field the displacement aggregate was reduced from.
    pub displacement_field: Option<Field>,
}

/// Requests and reduces the configured quantities for a step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepExtractor {
    /// Quantities to request; the rest stay unavailable.
    quantities: Vec<QuantityKind>,
}

impl Default for StepExtractor {
    fn default() -> Self {
        Self::new(&QuantityKind::ALL)
    }
}

impl StepExtractor {
    /// Create an extractor requesting `quantities`.
    #[must_use]
    pub fn new(quantities: &[QuantityKind]) -> Self {
        let mut quantities = quantities.to_vec();
        quantities.sort_unstable();
        quantities.dedup();
        Self { quantities }
    }

    /// Quantities this extractor requests, in column order.
    #[must_use]
    pub fn quantities(&self) -> &[QuantityKind] {
        &self.quantities
    }

    /// Aggregates of `step`.
    pub fn extract<S: ResultSession + ?Sized>(&self, session: &S, step: &Step) -> StepQuantities {
        self.extract_detailed(session, step).quantities
    }

    /// Aggregates of `step`, keeping the displacement field for nodal export.
    pub fn extract_detailed<S: ResultSession + ?Sized>(
        &self,
        session: &S,
        step: &Step,
    ) -> StepExtraction {
        let mut quantities = StepQuantities::unavailable();
        let mut displacement_field = None;
        for &kind in &self.quantities {
            let result = match kind {
                QuantityKind::Displacement => {
                    let (result, field) = max_displacement(session, step);
                    displacement_field = field;
                    result
                }
                QuantityKind::Stress => max_stress(session, step),
                QuantityKind::ReactionForce => net_reaction_force(session, step),
            };
            quantities.set(kind, result);
        }
        tracing::debug!(
            step = step.index,
            time = step.time,
            displacement = ?quantities.displacement,
            stress = ?quantities.stress,
            reaction_force = ?quantities.reaction_force,
            "Extracted step"
        );
        StepExtraction {
            quantities,
            displacement_field,
        }
    }
}

/// Largest per-node displacement magnitude.
fn max_displacement<S: ResultSession + ?Sized>(
    session: &S,
    step: &Step,
) -> (QuantityResult, Option<Field>) {
    match session.quantity(QuantityKind::Displacement, step, Location::Nodal) {
        Ok(field) => {
            let result = QuantityResult::from_reduction(field.max_magnitude());
            if !result.is_computed() {
                warn_unreduced(QuantityKind::Displacement, step);
            }
            (result, Some(field))
        }
        Err(e) => {
            warn_unavailable(QuantityKind::Displacement, step, &e);
            (QuantityResult::Unavailable, None)
        }
    }
}

/// Largest nodal stress over the flattened field.
fn max_stress<S: ResultSession + ?Sized>(session: &S, step: &Step) -> QuantityResult {
    match session.quantity(QuantityKind::Stress, step, Location::Nodal) {
        Ok(field) => {
            if field.components() > 1 {
                tracing::warn!(
                    step = step.index,
                    components = field.components(),
                    "Stress field is not an equivalent scalar; taking the largest component"
                );
            }
            let result = QuantityResult::from_reduction(field.max_value());
            if !result.is_computed() {
                warn_unreduced(QuantityKind::Stress, step);
            }
            result
        }
        Err(e) => {
            warn_unavailable(QuantityKind::Stress, step, &e);
            QuantityResult::Unavailable
        }
    }
}

/// Norm of the component-wise sum of nodal reaction forces.
///
/// Any failure is replaced by [`REACTION_FORCE_FALLBACK`].
fn net_reaction_force<S: ResultSession + ?Sized>(session: &S, step: &Step) -> QuantityResult {
    let field = match session.quantity(QuantityKind::ReactionForce, step, Location::Nodal) {
        Ok(field) => field,
        Err(ProviderError::ReactionForceUnsupported) => {
            tracing::warn!(
                step = step.index,
                fallback = REACTION_FORCE_FALLBACK,
                "Reaction forces are not supported by this artifact"
            );
            return QuantityResult::Fallback(REACTION_FORCE_FALLBACK);
        }
        Err(e) => {
            tracing::warn!(
                step = step.index,
                error = %e,
                fallback = REACTION_FORCE_FALLBACK,
                "Reaction force extraction failed"
            );
            return QuantityResult::Fallback(REACTION_FORCE_FALLBACK);
        }
    };
    if field.is_empty() {
        tracing::warn!(step = step.index, "Reaction force field has no nodes");
        return QuantityResult::Fallback(REACTION_FORCE_FALLBACK);
    }
    match field.net_force() {
        Ok(net) if net.norm().is_finite() => QuantityResult::Value(net.norm()),
        Ok(_) => {
            warn_unreduced(QuantityKind::ReactionForce, step);
            QuantityResult::Fallback(REACTION_FORCE_FALLBACK)
        }
        Err(e) => {
            tracing::warn!(step = step.index, error = %e, "Reaction force field is malformed");
            QuantityResult::Fallback(REACTION_FORCE_FALLBACK)
        }
    }
}

/// Log a quantity the provider could not deliver.
fn warn_unavailable(kind: QuantityKind, step: &Step, error: &ProviderError) {
    tracing::warn!(step = step.index, quantity = %kind, error = %error, "Quantity unavailable");
}

/// Log a field that could not be reduced to a finite value.
fn warn_unreduced(kind: QuantityKind, step: &Step) {
    tracing::warn!(
        step = step.index,
        quantity = %kind,
        "Field is empty or holds non-finite values"
    );
}
