//! # Laminate Tables
//!
//! Expands a [`Snapshot`](crate::stack::Snapshot) into the per-point
//! [`LFrame`] - the dimensional table every theory model consumes - and
//! defines the [`LmFrame`] produced by the model handshake, plus the
//! [`Laminate`] orchestrator that runs the whole single-pass pipeline.
//!
//! ## Point classification
//!
//! Each layer is sampled at exactly `p` ordered points spanning its
//! thickness. Classification depends only on the point index within the
//! layer, `p`, and the layer position:
//!
//! - `interfacial` - an unbound outer surface or the bound surface of a
//!   layer facing away from the neutral axis (stress maxima);
//! - `discontinuity` - the point at an interface shared with the adjacent
//!   layer, facing the neutral axis (stress minima; p >= 2, never on
//!   middle layers);
//! - `internal` - strictly inside a layer (p >= 3);
//! - `neutralaxis` - the single center row of an odd-ply, odd-p laminate.
//!
//! ## Height columns
//!
//! All height columns are purely geometric; no theory model is consulted.
//! Distances are in meters, measured from the tensile-most surface (`d_`)
//! or from the neutral axis (`Z_`, `z_`, `z_*`). Middle layers use half
//! thickness for `h_` because the stack mirrors across the neutral axis.
//!
//! ## Example
//!
//! ```rust
//! use lam_core::config::FeatureInput;
//! use lam_core::laminate::Laminate;
//!
//! let input = FeatureInput::builder().build().unwrap();
//! let laminate = Laminate::analyze(input).unwrap();
//!
//! // 5 layers x 5 points
//! assert_eq!(laminate.lframe.rows().len(), 25);
//! assert!(laminate.lframe.has_neutral_axis());
//! assert!(laminate.frame.is_modeled());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::FeatureInput;
use crate::errors::{LamError, LamResult, ModelError};
use crate::stack::{LayerKind, Snapshot, Stack};

/// Stress side of a sampled point relative to the neutral axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Below the neutral axis (bottom half)
    Tensile,
    /// Above the neutral axis (top half)
    Compressive,
    /// On the neutral axis itself
    None,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Side::Tensile => "tensile",
            Side::Compressive => "compressive",
            Side::None => "none",
        };
        write!(f, "{name}")
    }
}

/// Classification of a sampled point within its layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointLabel {
    /// Unbound outer surface, or bound surface facing away from the axis
    Interfacial,
    /// Strictly inside a layer
    Internal,
    /// Shared interface with the adjacent layer, facing the axis
    Discontinuity,
    /// The single center row of an odd-ply, odd-p laminate
    NeutralAxis,
}

impl fmt::Display for PointLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PointLabel::Interfacial => "interfacial",
            PointLabel::Internal => "internal",
            PointLabel::Discontinuity => "discontinuity",
            PointLabel::NeutralAxis => "neutralaxis",
        };
        write!(f, "{name}")
    }
}

/// One row of the per-point laminate table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRow {
    /// Layer number, 1-based from the tensile side
    pub layer: u32,
    /// Stress side relative to the neutral axis
    pub side: Side,
    /// Material label inherited from the snapshot
    pub matl: String,
    /// Layer position class
    pub kind: LayerKind,
    /// True layer thickness (um), constant regardless of sampling density
    pub t_um: f64,
    /// Point classification
    pub label: PointLabel,
    /// Working thickness (m): half thickness for middle layers; a
    /// discontinuity row carries the bounding layer's value
    pub h_m: f64,
    /// Absolute height above the tensile-most surface (m)
    pub d_m: f64,
    /// Proximal interface index; indeterminate on the neutral axis
    pub intf: Option<u32>,
    /// Fractional position: layer number plus point fraction within layer
    pub k: f64,
    /// Distance of the interface level from the neutral axis (m); `Z_`
    pub z_intf_m: f64,
    /// Distance of the lamina midplane from the neutral axis (m); `z_`
    pub z_mid_m: f64,
    /// Alternative "travelling midplane" distance (m); `z_*`. For
    /// discontinuity rows this bottoms out at the bounding layer's `Z_`
    /// rather than reaching zero - a documented convention kept for
    /// control-table compatibility, not a validated physical law.
    pub z_mid_adj_m: f64,
}

/// The dimensional per-point table: one row per sampled point, `p` rows
/// per layer, layers bottom-to-top and points by ascending `k`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LFrame {
    rows: Vec<PointRow>,
    nplies: usize,
    p: usize,
    total_m: f64,
}

impl LFrame {
    /// Expand a snapshot into the per-point dimensional table.
    ///
    /// # Errors
    ///
    /// `Indeterminate` when the table would have a single row
    /// (`nplies == 1 && p == 1`): its side cannot be assigned, and a table
    /// carrying an unresolvable side must never reach downstream
    /// consumers.
    pub fn build(snapshot: &Snapshot, input: &FeatureInput) -> LamResult<Self> {
        let p = input.p();
        let nplies = snapshot.rows.len();
        let n_rows = nplies * p;
        if n_rows == 1 {
            return Err(LamError::indeterminate(
                "a 1-ply laminate sampled at p=1 has no resolvable stress side",
                "use p >= 2",
            ));
        }
        if n_rows == 0 {
            return Err(LamError::validation("p", "points per layer must be at least 1"));
        }

        // Physical boundary heights D_0..D_n (m), bottom up
        let t_m: Vec<f64> = snapshot.rows.iter().map(|r| r.t_um * 1e-6).collect();
        let mut bounds = Vec::with_capacity(nplies + 1);
        bounds.push(0.0);
        for &t in &t_m {
            bounds.push(bounds.last().copied().unwrap_or(0.0) + t);
        }
        let total_m = bounds[nplies];
        let half = total_m / 2.0;

        // Middle layer index (1-based) for odd-ply laminates
        let mid_layer = if nplies % 2 != 0 {
            Some(nplies / 2 + 1)
        } else {
            None
        };

        let side_of = |r: usize| -> Side {
            if n_rows % 2 != 0 && r == n_rows / 2 {
                Side::None
            } else if r < n_rows.div_ceil(2) {
                Side::Tensile
            } else {
                Side::Compressive
            }
        };

        // The exact neutral-axis row exists iff both nplies and p are odd
        let is_neutral_axis =
            |r: usize| -> bool { nplies % 2 != 0 && p % 2 != 0 && r == n_rows / 2 };

        // The two discontinuity rows meeting at the midplane of an
        // even-ply laminate
        let is_pseudomid = |layer: usize, j: usize| -> bool {
            nplies % 2 == 0
                && ((layer == nplies / 2 && j == p - 1) || (layer == nplies / 2 + 1 && j == 0))
        };

        // Non-middle layers sit entirely on one side of the axis
        let below_axis = |layer: usize| -> bool {
            match mid_layer {
                Some(mid) => layer < mid,
                None => layer <= nplies / 2,
            }
        };

        let label_of = |layer: usize, j: usize, kind: LayerKind, r: usize| -> PointLabel {
            if is_neutral_axis(r) {
                PointLabel::NeutralAxis
            } else if p == 1 {
                PointLabel::Interfacial
            } else if kind == LayerKind::Middle {
                if j == 0 || j == p - 1 {
                    PointLabel::Interfacial
                } else {
                    PointLabel::Internal
                }
            } else if below_axis(layer) {
                match j {
                    0 => PointLabel::Interfacial,
                    _ if j == p - 1 => PointLabel::Discontinuity,
                    _ => PointLabel::Internal,
                }
            } else {
                match j {
                    0 => PointLabel::Discontinuity,
                    _ if j == p - 1 => PointLabel::Interfacial,
                    _ => PointLabel::Internal,
                }
            }
        };

        // Working thickness per layer; middle layers mirror across the
        // axis, so they carry half thickness
        let base_h = |layer: usize| -> f64 {
            let t = t_m[layer - 1];
            if snapshot.rows[layer - 1].kind == LayerKind::Middle {
                t / 2.0
            } else {
                t
            }
        };

        // Row thickness: discontinuity rows borrow the bounding
        // (axis-adjacent) layer's working thickness
        let h_of = |layer: usize, label: PointLabel| -> f64 {
            if label == PointLabel::Discontinuity {
                let adjacent = if below_axis(layer) { layer + 1 } else { layer - 1 };
                base_h(adjacent)
            } else {
                base_h(layer)
            }
        };

        let d_of = |layer: usize, j: usize, r: usize| -> f64 {
            if is_neutral_axis(r) {
                half
            } else if p == 1 {
                match side_of(r) {
                    Side::Tensile => bounds[layer - 1],
                    Side::Compressive => bounds[layer],
                    Side::None => half,
                }
            } else {
                bounds[layer - 1] + t_m[layer - 1] * j as f64 / (p - 1) as f64
            }
        };

        // Midplane distance at a layer-boundary row (j = 0, j = p-1, or
        // any row when p = 1)
        let boundary_z = |layer: usize, j: usize, r: usize, label: PointLabel| -> f64 {
            if is_neutral_axis(r) || is_pseudomid(layer, j) {
                return 0.0;
            }
            let z_intf = half - d_of(layer, j, r);
            let h = h_of(layer, label);
            match side_of(r) {
                Side::Compressive => z_intf + h / 2.0,
                _ => z_intf - h / 2.0,
            }
        };

        let mut rows = Vec::with_capacity(n_rows);
        for (idx, snap) in snapshot.rows.iter().enumerate() {
            let layer = idx + 1;
            let kind = snap.kind;

            // Bounding z values for interpolating internal points
            let z_first = boundary_z(layer, 0, (layer - 1) * p, label_of(layer, 0, kind, (layer - 1) * p));
            let z_last = boundary_z(
                layer,
                p - 1,
                (layer - 1) * p + p - 1,
                label_of(layer, p - 1, kind, (layer - 1) * p + p - 1),
            );

            for j in 0..p {
                let r = (layer - 1) * p + j;
                let side = side_of(r);
                let label = label_of(layer, j, kind, r);
                let h_m = h_of(layer, label);
                let d_m = d_of(layer, j, r);
                let z_intf_m = half - d_m;

                let intf = match side {
                    Side::Tensile => Some(layer as u32),
                    Side::Compressive => Some(layer as u32 + 1),
                    Side::None => None,
                };

                let k = if p >= 2 {
                    layer as f64 + j as f64 / (p - 1) as f64
                } else {
                    match side {
                        Side::Tensile => layer as f64,
                        Side::Compressive => layer as f64 + 1.0,
                        Side::None => (nplies as f64 + 2.0) / 2.0,
                    }
                };

                let z_mid_m = if is_neutral_axis(r) {
                    0.0
                } else if j == 0 || j == p - 1 {
                    boundary_z(layer, j, r, label)
                } else {
                    z_first + (z_last - z_first) * j as f64 / (p - 1) as f64
                };

                // Travelling midplane: middle layers halve their Z_;
                // other layers average Z_ with the Z_ of the layer's
                // last sampled row on its side of the axis
                let z_mid_adj_m = if kind == LayerKind::Middle {
                    z_intf_m / 2.0
                } else {
                    let d_face = if below_axis(layer) {
                        if p == 1 { bounds[layer - 1] } else { bounds[layer] }
                    } else if p == 1 {
                        bounds[layer]
                    } else {
                        bounds[layer - 1]
                    };
                    (z_intf_m + (half - d_face)) / 2.0
                };

                rows.push(PointRow {
                    layer: layer as u32,
                    side,
                    matl: snap.matl.clone(),
                    kind,
                    t_um: snap.t_um,
                    label,
                    h_m,
                    d_m,
                    intf,
                    k,
                    z_intf_m,
                    z_mid_m,
                    z_mid_adj_m,
                });
            }
        }

        Ok(LFrame {
            rows,
            nplies,
            p,
            total_m,
        })
    }

    /// Rows, layers bottom-to-top and points by ascending `k`.
    pub fn rows(&self) -> &[PointRow] {
        &self.rows
    }

    /// Number of plies.
    pub fn nplies(&self) -> usize {
        self.nplies
    }

    /// Points sampled per layer.
    pub fn p(&self) -> usize {
        self.p
    }

    /// Total laminate thickness (m).
    pub fn total_m(&self) -> f64 {
        self.total_m
    }

    /// True if any row is a discontinuity point.
    pub fn has_discontinuities(&self) -> bool {
        self.rows
            .iter()
            .any(|row| row.label == PointLabel::Discontinuity)
    }

    /// True if a row sits exactly on the neutral axis.
    pub fn has_neutral_axis(&self) -> bool {
        self.rows
            .iter()
            .any(|row| row.label == PointLabel::NeutralAxis)
    }
}

/// One model-computed column of per-point values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelColumn {
    /// Column name as it appears in control tables
    pub name: String,
    /// One value per table row
    pub values: Vec<f64>,
}

/// Ordered collection of model-computed columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelColumns {
    columns: Vec<ModelColumn>,
}

impl ModelColumns {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column, preserving insertion order.
    pub fn push(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.columns.push(ModelColumn {
            name: name.into(),
            values,
        });
    }

    /// Columns in insertion order.
    pub fn columns(&self) -> &[ModelColumn] {
        &self.columns
    }

    /// Look up a column by name.
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// True if no columns are present.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// The final laminate table: the [`LFrame`] plus model-computed columns,
/// or the bare LFrame when the handshake rolled back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LmFrame {
    lframe: LFrame,
    model: Option<ModelColumns>,
}

impl LmFrame {
    /// An unmodeled frame: the rollback product, value-equal to its LFrame.
    pub fn unmodeled(lframe: LFrame) -> Self {
        LmFrame {
            lframe,
            model: None,
        }
    }

    /// A modeled frame carrying the columns a theory produced.
    pub fn with_model(lframe: LFrame, columns: ModelColumns) -> Self {
        LmFrame {
            lframe,
            model: Some(columns),
        }
    }

    /// The dimensional table under the model columns.
    pub fn lframe(&self) -> &LFrame {
        &self.lframe
    }

    /// Rows, identical to the underlying LFrame's.
    pub fn rows(&self) -> &[PointRow] {
        self.lframe.rows()
    }

    /// Model columns; `None` after a rollback.
    pub fn model_columns(&self) -> Option<&ModelColumns> {
        self.model.as_ref()
    }

    /// Look up a model column by name.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.model.as_ref().and_then(|m| m.get(name))
    }

    /// True if the handshake completed and model columns are present.
    pub fn is_modeled(&self) -> bool {
        self.model.is_some()
    }
}

/// The complete product of one analysis invocation.
///
/// Runs the single-pass pipeline Geometry -> Stack -> Snapshot -> LFrame ->
/// handshake and stores every representation. A model failure is *not* a
/// failure of the analysis: `frame` then equals the unmodeled `lframe` and
/// `model_error` reports what happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Laminate {
    /// The configuration, with Globals populated on a successful handshake
    pub input: FeatureInput,
    /// Ordered layer stack
    pub stack: Stack,
    /// One-row-per-layer identification table
    pub snapshot: Snapshot,
    /// Per-point dimensional table
    pub lframe: LFrame,
    /// Final table: modeled, or rolled back to the LFrame
    pub frame: LmFrame,
    /// The model error behind a rollback, if any
    pub model_error: Option<ModelError>,
}

impl Laminate {
    /// Run the full pipeline with the standard `z_` convention.
    pub fn analyze(input: FeatureInput) -> LamResult<Self> {
        Self::analyze_with(input, false)
    }

    /// Run the full pipeline; `adjusted_z` selects the `z_*` convention
    /// for models that support it.
    pub fn analyze_with(input: FeatureInput, adjusted_z: bool) -> LamResult<Self> {
        input.validate()?;
        let stack = Stack::build(&input)?;
        let snapshot = Snapshot::build(&stack, &input.materials)?;
        let lframe = LFrame::build(&snapshot, &input)?;
        tracing::debug!(
            nplies = lframe.nplies(),
            p = lframe.p(),
            rows = lframe.rows().len(),
            "laminate table built"
        );

        let outcome = crate::theories::handshake(&lframe, &input, adjusted_z);
        let (frame, input, model_error) = outcome.into_parts();

        Ok(Laminate {
            input,
            stack,
            snapshot,
            lframe,
            frame,
            model_error,
        })
    }

    /// Rows excluding internals: the maxima (interfacial) and minima
    /// (discontinuity) of each layer.
    pub fn extrema(&self) -> Vec<&PointRow> {
        self.frame
            .rows()
            .iter()
            .filter(|row| {
                matches!(
                    row.label,
                    PointLabel::Interfacial | PointLabel::Discontinuity
                )
            })
            .collect()
    }

    /// Values of a model column at the interfacial rows (per-layer maxima).
    pub fn max_stress(&self, column: &str) -> Option<Vec<f64>> {
        self.column_at(column, PointLabel::Interfacial)
    }

    /// Values of a model column at the discontinuity rows (per-layer
    /// minima); `None` when the laminate has no discontinuities.
    pub fn min_stress(&self, column: &str) -> Option<Vec<f64>> {
        if !self.lframe.has_discontinuities() {
            return None;
        }
        self.column_at(column, PointLabel::Discontinuity)
    }

    fn column_at(&self, column: &str, label: PointLabel) -> Option<Vec<f64>> {
        let values = self.frame.column(column)?;
        Some(
            self.frame
                .rows()
                .iter()
                .zip(values)
                .filter(|(row, _)| row.label == label)
                .map(|(_, &v)| v)
                .collect(),
        )
    }
}
