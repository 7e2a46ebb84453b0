//! Per-node arrays returned by a result provider and their scalar reductions.

use nalgebra::Vector3;
use ndarray::{Array2, ArrayView1, Axis};

use crate::errors::FieldError;
use crate::vector::{Displacement, Force};

/// Values of one quantity at one step, one row per node.
///
/// Scalar quantities have a single column, vector quantities three and stress
/// tensors up to six. The node scoping is kept alongside the data so that the
/// nodal export can report ids.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    /// Node ids, one per row of `data`.
    node_ids: Vec<u64>,
    /// Row-major values, `nodes x components`.
    data: Array2<f64>,
}

impl Field {
    /// Create a field from a node scoping and a data array.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::ScopingMismatch`] when the scoping and the array
    /// disagree on the number of nodes.
    pub fn new(node_ids: Vec<u64>, data: Array2<f64>) -> Result<Self, FieldError> {
        if node_ids.len() != data.nrows() {
            return Err(FieldError::ScopingMismatch {
                ids: node_ids.len(),
                rows: data.nrows(),
            });
        }
        Ok(Self { node_ids, data })
    }

    /// Create a single component field.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::ScopingMismatch`] when the lengths differ.
    pub fn scalar(node_ids: Vec<u64>, values: Vec<f64>) -> Result<Self, FieldError> {
        let rows = values.len();
        let data = Array2::from_shape_vec((rows, 1), values).map_err(|_| {
            FieldError::ScopingMismatch {
                ids: node_ids.len(),
                rows,
            }
        })?;
        Self::new(node_ids, data)
    }

    /// Create a three component field.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::ScopingMismatch`] when the lengths differ.
    pub fn vectors(node_ids: Vec<u64>, values: &[[f64; 3]]) -> Result<Self, FieldError> {
        let flat: Vec<f64> = values.iter().flatten().copied().collect();
        let data = Array2::from_shape_vec((values.len(), 3), flat).map_err(|_| {
            FieldError::ScopingMismatch {
                ids: node_ids.len(),
                rows: values.len(),
            }
        })?;
        Self::new(node_ids, data)
    }

    /// Create a field from rows that must all share one component count.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::RaggedRows`] for uneven rows and
    /// [`FieldError::ScopingMismatch`] when the scoping length differs.
    pub fn from_rows(node_ids: Vec<u64>, rows: &[Vec<f64>]) -> Result<Self, FieldError> {
        let components = rows.first().map_or(0, Vec::len);
        let mut flat = Vec::with_capacity(rows.len() * components);
        for (row, values) in rows.iter().enumerate() {
            if values.len() != components {
                return Err(FieldError::RaggedRows {
                    row,
                    expected: components,
                    found: values.len(),
                });
            }
            flat.extend_from_slice(values);
        }
        let data = Array2::from_shape_vec((rows.len(), components), flat).map_err(|_| {
            FieldError::ScopingMismatch {
                ids: node_ids.len(),
                rows: rows.len(),
            }
        })?;
        Self::new(node_ids, data)
    }

    /// Number of nodes in the scoping.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    /// Whether the field holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    /// Number of components per node.
    #[must_use]
    pub fn components(&self) -> usize {
        self.data.ncols()
    }

    /// Node ids of the scoping.
    #[must_use]
    pub fn node_ids(&self) -> &[u64] {
        &self.node_ids
    }

    /// Largest per-node Euclidean magnitude.
    ///
    /// Returns `None` for an empty field or when any value is not finite.
    #[must_use]
    pub fn max_magnitude(&self) -> Option<f64> {
        finite_max(self.data.rows().into_iter().map(row_norm))
    }

    /// Largest value over the flattened array.
    ///
    /// For a multi-component stress tensor this is the largest component, not
    /// an equivalent stress.
    #[must_use]
    pub fn max_value(&self) -> Option<f64> {
        finite_max(self.data.iter().copied())
    }

    /// Component-wise sum of every nodal vector.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::NotAVectorField`] unless the field has three components.
    pub fn net_force(&self) -> Result<Force, FieldError> {
        self.require_vectors()?;
        let total = self.data.sum_axis(Axis(0));
        Ok(Force::from(Vector3::new(total[0], total[1], total[2])))
    }

    /// Nodal displacements paired with their node ids.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::NotAVectorField`] unless the field has three components.
    pub fn displacements(&self) -> Result<Vec<(u64, Displacement)>, FieldError> {
        self.require_vectors()?;
        Ok(self
            .node_ids
            .iter()
            .zip(self.data.rows())
            .map(|(id, row)| (*id, Displacement::new(row[0], row[1], row[2])))
            .collect())
    }

    /// Fail unless every node carries a three component vector.
    fn require_vectors(&self) -> Result<(), FieldError> {
        if self.components() == 3 {
            Ok(())
        } else {
            Err(FieldError::NotAVectorField {
                components: self.components(),
            })
        }
    }
}

/// Euclidean norm of one row.
fn row_norm(row: ArrayView1<'_, f64>) -> f64 {
    row.dot(&row).sqrt()
}

/// Maximum of the values, or `None` when empty or when a value is not finite.
fn finite_max(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut max: Option<f64> = None;
    for value in values {
        if !value.is_finite() {
            return None;
        }
        max = Some(max.map_or(value, |current| current.max(value)));
    }
    max
}
