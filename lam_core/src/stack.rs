//! # Stack Construction
//!
//! Turns a three-zone [`Geometry`](crate::geometry::Geometry) into an
//! ordered, labeled stack of physical layers, and the stack into a
//! [`Snapshot`] - the one-row-per-layer identification table that the
//! dimensional calculator later expands point-wise.
//!
//! Layers are numbered 1-based from the bottom (tensile) side up to the
//! top (compressive) side. Zero-thickness placeholder zones are excluded,
//! so degenerate laminates (monolith, bilayer) are valid stacks.
//!
//! ## Example
//!
//! ```rust
//! use lam_core::config::FeatureInput;
//! use lam_core::stack::{LayerKind, Stack};
//!
//! let input = FeatureInput::builder().build().unwrap();
//! let stack = Stack::build(&input).unwrap();
//! assert_eq!(stack.nplies(), 5);
//! assert_eq!(stack.name(), "5-ply");
//! assert_eq!(stack.alias(), Some("Standard"));
//! assert_eq!(stack.layers()[2].kind, LayerKind::Middle);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::FeatureInput;
use crate::errors::{LamError, LamResult};
use crate::geometry::Geometry;

/// Position class of a layer within the laminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// Outermost laminae (mirrored top and bottom)
    Outer,
    /// Inner laminae between outer and middle
    Inner,
    /// The single middle lamina spanning the neutral axis
    Middle,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayerKind::Outer => "outer",
            LayerKind::Inner => "inner",
            LayerKind::Middle => "middle",
        };
        write!(f, "{name}")
    }
}

/// One physical layer of the unfolded stack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// True layer thickness (um). Middle layers carry their full physical
    /// thickness here; the symmetric convention is resolved at unfold time.
    pub thickness_um: f64,
    /// Layer position class
    pub kind: LayerKind,
}

/// Ordered, labeled stack of layers derived from a [`Geometry`].
///
/// Built once per analysis invocation and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    layers: Vec<Layer>,
    name: String,
    alias: Option<String>,
}

/// Common names for the special laminates below 6 plies.
fn alias_for(nplies: usize) -> Option<&'static str> {
    match nplies {
        1 => Some("Monolith"),
        2 => Some("Bilayer"),
        3 => Some("Trilayer"),
        4 => Some("Quadlayer"),
        5 => Some("Standard"),
        _ => None,
    }
}

impl Stack {
    /// Build the ordered stack for one analysis invocation.
    ///
    /// Unfolds the geometry outer -> inner(s) -> middle -> inner(s) -> outer,
    /// doubling symmetric-convention middles and skipping zero-thickness
    /// placeholders.
    ///
    /// # Errors
    ///
    /// - `Indeterminate` for a single-layer, single-point laminate
    ///   (`nplies == 1 && p == 1`): with one sample on one layer the stress
    ///   side cannot be told apart from tensile, compressive, or neutral,
    ///   and silently defaulting would misreport a nonzero stress state as
    ///   zero. Guidance: use p >= 2.
    /// - `Validation` when no layer has positive thickness.
    pub fn build(input: &FeatureInput) -> LamResult<Self> {
        let nplies = input.geometry.nplies();
        if nplies == 1 && input.p() == 1 {
            return Err(LamError::indeterminate(
                "a 1-ply laminate sampled at p=1 has no resolvable stress side",
                "use p >= 2",
            ));
        }

        let layers: Vec<Layer> = unfold(&input.geometry)
            .into_iter()
            .filter(|layer| layer.thickness_um > 0.0)
            .collect();
        if layers.is_empty() {
            return Err(LamError::validation(
                "geometry",
                "no layer has positive thickness",
            ));
        }

        let name = format!("{}-ply", layers.len());
        let alias = alias_for(layers.len()).map(str::to_string);
        Ok(Stack { layers, name, alias })
    }

    /// Layers bottom (tensile) to top (compressive).
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Number of plies (zero-thickness zones excluded).
    pub fn nplies(&self) -> usize {
        self.layers.len()
    }

    /// Official stack name, e.g. `5-ply`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Common alias for special laminates, e.g. `Standard` for 5 plies.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// True for the special laminates: Monolith through Quadlayer.
    pub fn is_special(&self) -> bool {
        self.nplies() < 5
    }

    /// Total laminate thickness (um).
    pub fn total_um(&self) -> f64 {
        self.layers.iter().map(|l| l.thickness_um).sum()
    }

    /// Total laminate thickness (m).
    pub fn total_m(&self) -> f64 {
        self.total_um() * 1e-6
    }
}

/// Unfold a geometry across the neutral axis into bottom-up layer order,
/// zero-thickness placeholders included.
fn unfold(geometry: &Geometry) -> Vec<Layer> {
    let mut layers = Vec::with_capacity(2 * (1 + geometry.inner.len()) + 1);
    layers.push(Layer {
        thickness_um: geometry.outer,
        kind: LayerKind::Outer,
    });
    for &inner in &geometry.inner {
        layers.push(Layer {
            thickness_um: inner,
            kind: LayerKind::Inner,
        });
    }
    layers.push(Layer {
        thickness_um: geometry.total_middle(),
        kind: LayerKind::Middle,
    });
    for &inner in geometry.inner.iter().rev() {
        layers.push(Layer {
            thickness_um: inner,
            kind: LayerKind::Inner,
        });
    }
    layers.push(Layer {
        thickness_um: geometry.outer,
        kind: LayerKind::Outer,
    });
    layers
}

/// One row of the [`Snapshot`]: the identification columns of one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    /// Layer number, 1-based from the tensile side
    pub layer: u32,
    /// Material label, cyclically assigned
    pub matl: String,
    /// Layer position class
    pub kind: LayerKind,
    /// True layer thickness (um), constant regardless of sampling density
    pub t_um: f64,
}

/// Skeletal one-row-per-layer view of the stack with materials assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Rows in layer order, bottom up
    pub rows: Vec<SnapshotRow>,
}

impl Snapshot {
    /// Assign materials to the stack by cycling the ordering list.
    ///
    /// The list is cycled, not filtered: a 2-material ordering over a 5-ply
    /// stack yields `A, B, A, B, A`.
    pub fn build(stack: &Stack, materials: &[String]) -> LamResult<Self> {
        if materials.is_empty() {
            return Err(LamError::validation(
                "materials",
                "material ordering must name at least one material",
            ));
        }
        let rows = stack
            .layers()
            .iter()
            .enumerate()
            .map(|(idx, layer)| SnapshotRow {
                layer: idx as u32 + 1,
                matl: materials[idx % materials.len()].clone(),
                kind: layer.kind,
                t_um: layer.thickness_um,
            })
            .collect();
        Ok(Snapshot { rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureInput;

    fn input_for(geometry: &str) -> FeatureInput {
        FeatureInput::builder()
            .with_geometry(geometry)
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_standard_unfold_order() {
        let stack = Stack::build(&input_for("400-[200]-800")).unwrap();
        let kinds: Vec<LayerKind> = stack.layers().iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LayerKind::Outer,
                LayerKind::Inner,
                LayerKind::Middle,
                LayerKind::Inner,
                LayerKind::Outer,
            ]
        );
        let thicknesses: Vec<f64> = stack.layers().iter().map(|l| l.thickness_um).collect();
        assert_eq!(thicknesses, vec![400.0, 200.0, 800.0, 200.0, 400.0]);
        assert_eq!(stack.total_um(), 2000.0);
        assert!((stack.total_m() - 2e-3).abs() < 1e-12);
    }

    #[test]
    fn test_dissimilar_inners_mirror() {
        let stack = Stack::build(&input_for("400-[150,50]-800")).unwrap();
        let thicknesses: Vec<f64> = stack.layers().iter().map(|l| l.thickness_um).collect();
        assert_eq!(thicknesses, vec![400.0, 150.0, 50.0, 800.0, 50.0, 150.0, 400.0]);
    }

    #[test]
    fn test_symmetric_middle_doubles() {
        let stack = Stack::build(&input_for("400-200-400S")).unwrap();
        assert_eq!(stack.layers()[2].thickness_um, 800.0);
        assert_eq!(stack.total_um(), 2000.0);
    }

    #[test]
    fn test_zero_layers_skipped() {
        let stack = Stack::build(&input_for("600-0-800")).unwrap();
        assert_eq!(stack.nplies(), 3);
        assert_eq!(stack.name(), "3-ply");
        assert_eq!(stack.alias(), Some("Trilayer"));
        let kinds: Vec<LayerKind> = stack.layers().iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![LayerKind::Outer, LayerKind::Middle, LayerKind::Outer]
        );
    }

    #[test]
    fn test_names_and_aliases() {
        for (geometry, name, alias) in [
            ("0-0-2000", "1-ply", Some("Monolith")),
            ("1000-0-0", "2-ply", Some("Bilayer")),
            ("600-0-800", "3-ply", Some("Trilayer")),
            ("500-500-0", "4-ply", Some("Quadlayer")),
            ("400-[200]-800", "5-ply", Some("Standard")),
            ("400-[100,100]-800", "7-ply", None),
        ] {
            let stack = Stack::build(&input_for(geometry)).unwrap();
            assert_eq!(stack.name(), name);
            assert_eq!(stack.alias(), alias.map(str::to_string).as_deref());
        }
    }

    #[test]
    fn test_special_laminates() {
        assert!(Stack::build(&input_for("500-500-0")).unwrap().is_special());
        assert!(!Stack::build(&input_for("400-[200]-800")).unwrap().is_special());
    }

    #[test]
    fn test_monolith_single_point_is_indeterminate() {
        let input = FeatureInput::builder()
            .with_geometry("0-0-2000")
            .unwrap()
            .with_points_per_layer(1)
            .build()
            .unwrap();
        let err = Stack::build(&input).unwrap_err();
        assert_eq!(err.error_code(), "INDETERMINATE");
        assert!(err.to_string().contains("p >= 2"));
    }

    #[test]
    fn test_monolith_resolves_with_more_points() {
        let input = FeatureInput::builder()
            .with_geometry("0-0-2000")
            .unwrap()
            .with_points_per_layer(2)
            .build()
            .unwrap();
        assert_eq!(Stack::build(&input).unwrap().nplies(), 1);
    }

    #[test]
    fn test_all_zero_geometry_rejected() {
        let err = Stack::build(&input_for("0-0-0")).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION");
    }

    #[test]
    fn test_snapshot_material_cycling() {
        let input = input_for("400-[200]-800");
        let stack = Stack::build(&input).unwrap();
        let snapshot = Snapshot::build(&stack, &input.materials).unwrap();
        let matls: Vec<&str> = snapshot.rows.iter().map(|r| r.matl.as_str()).collect();
        // Default ordering is lexicographic: HA before PSu
        assert_eq!(matls, vec!["HA", "PSu", "HA", "PSu", "HA"]);
    }

    #[test]
    fn test_snapshot_material_override_flips_assignment() {
        let input = FeatureInput::builder()
            .with_materials(vec!["PSu".into(), "HA".into()])
            .build()
            .unwrap();
        let stack = Stack::build(&input).unwrap();
        let snapshot = Snapshot::build(&stack, &input.materials).unwrap();
        let matls: Vec<&str> = snapshot.rows.iter().map(|r| r.matl.as_str()).collect();
        assert_eq!(matls, vec!["PSu", "HA", "PSu", "HA", "PSu"]);
        // The override changes labels only
        let t: Vec<f64> = snapshot.rows.iter().map(|r| r.t_um).collect();
        assert_eq!(t, vec![400.0, 200.0, 800.0, 200.0, 400.0]);
    }

    #[test]
    fn test_snapshot_cycles_short_list_over_long_stack() {
        let input = input_for("400-[100,100]-800");
        let stack = Stack::build(&input).unwrap();
        let snapshot = Snapshot::build(&stack, &input.materials).unwrap();
        let matls: Vec<&str> = snapshot.rows.iter().map(|r| r.matl.as_str()).collect();
        assert_eq!(matls, vec!["HA", "PSu", "HA", "PSu", "HA", "PSu", "HA"]);
    }

    #[test]
    fn test_snapshot_thickness_constant_in_p() {
        for p in [1, 2, 5] {
            let input = FeatureInput::builder()
                .with_points_per_layer(p)
                .build()
                .unwrap();
            let stack = Stack::build(&input).unwrap();
            let snapshot = Snapshot::build(&stack, &input.materials).unwrap();
            assert_eq!(snapshot.rows.len(), 5);
            assert_eq!(snapshot.rows[2].t_um, 800.0);
        }
    }

    #[test]
    fn test_serialization_round_trip() {
        let input = input_for("400-[200]-800");
        let stack = Stack::build(&input).unwrap();
        let json = serde_json::to_string(&stack).unwrap();
        let roundtrip: Stack = serde_json::from_str(&json).unwrap();
        assert_eq!(stack, roundtrip);
    }
}
