//! Enumeration of the time or load steps stored in an artifact.

use crate::errors::ProviderError;
use crate::provider::{ResultSession, Step};

/// Determines which steps of an artifact are extracted.
///
/// The result is never empty: when the provider has no usable step axis a
/// single synthetic step is substituted, which is the static analysis case.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepEnumerator {
    /// Fixed number of steps to use instead of asking the provider.
    forced: Option<usize>,
}

impl StepEnumerator {
    /// Create an enumerator that reads the provider's step axis.
    #[must_use]
    pub const fn new() -> Self {
        Self { forced: None }
    }

    /// Create an enumerator that always yields steps `1..=count`.
    ///
    /// A count of zero is treated as one.
    #[must_use]
    pub const fn forced(count: usize) -> Self {
        Self {
            forced: Some(if count == 0 { 1 } else { count }),
        }
    }

    /// Steps of the artifact behind `session`, in increasing index order.
    pub fn enumerate<S: ResultSession + ?Sized>(&self, session: &S) -> Vec<Step> {
        if let Some(count) = self.forced {
            tracing::info!(steps = count, "Using forced step count");
            return (1..=count).map(|index| Step::new(index, index as f64)).collect();
        }

        let times = match session.time_steps() {
            Ok(times) => times,
            Err(ProviderError::EnumerationUnsupported(reason)) => {
                tracing::warn!(%reason, "No step axis; assuming a static analysis with one step");
                return vec![Step::synthetic()];
            }
            Err(e) => {
                tracing::warn!(error = %e, "Step enumeration failed; assuming one step");
                return vec![Step::synthetic()];
            }
        };

        let steps: Vec<Step> = times
            .into_iter()
            .enumerate()
            .map(|(position, time)| {
                let index = position + 1;
                if time.is_finite() {
                    Step::new(index, time)
                } else {
                    tracing::warn!(step = index, %time, "Step time is not finite; using the index");
                    Step::new(index, index as f64)
                }
            })
            .collect();

        if steps.is_empty() {
            tracing::warn!("Step axis is empty; assuming a static analysis with one step");
            return vec![Step::synthetic()];
        }
        tracing::debug!(steps = steps.len(), "Enumerated steps");
        steps
    }
}
