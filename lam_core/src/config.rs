//! # Configuration Bundle
//!
//! The [`FeatureInput`] carries everything one analysis invocation needs:
//! geometry, loading parameters, material properties and their cyclic
//! ordering, the selected theory model, and - after a successful handshake -
//! the model-computed global constants.
//!
//! A builder assembles the bundle from laboratory defaults plus user
//! overrides and validates it before any construction begins.
//!
//! ## Example
//!
//! ```rust
//! use lam_core::config::FeatureInput;
//!
//! // Laboratory defaults: standard 5-ply disk, HA/PSu, wilson_lt model
//! let input = FeatureInput::builder().build().unwrap();
//! assert_eq!(input.geometry.to_string(), "400.0-[200.0]-800.0");
//! assert_eq!(input.materials, vec!["HA", "PSu"]);
//!
//! // Override selectively
//! let input = FeatureInput::builder()
//!     .with_geometry("400-[100,100]-800")
//!     .unwrap()
//!     .with_materials(vec!["PSu".into(), "HA".into()])
//!     .build()
//!     .unwrap();
//! assert_eq!(input.geometry.nplies(), 7);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{LamError, LamResult};
use crate::geometry::Geometry;

/// Model-computed global constants, populated during a successful handshake.
///
/// Keys are model-specific (e.g. `D_11T`, `v_eq`, `K_r` for the built-in
/// Wilson model); the core never interprets them.
pub type Globals = BTreeMap<String, f64>;

/// Loading and sampling parameters for a circular biaxial flexure specimen.
///
/// ## JSON Example
///
/// ```json
/// {
///   "specimen_radius_m": 12e-3,
///   "support_radius_m": 7.5e-3,
///   "points_per_layer": 5,
///   "applied_load_n": 1.0,
///   "radial_distance_m": 2e-4
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadParameters {
    /// Specimen radius R (m)
    pub specimen_radius_m: f64,
    /// Support ring radius a (m)
    pub support_radius_m: f64,
    /// Points sampled per layer p
    pub points_per_layer: usize,
    /// Applied load P_a (N)
    pub applied_load_n: f64,
    /// Radial distance r from the loading center (m)
    pub radial_distance_m: f64,
}

impl Default for LoadParameters {
    /// Laboratory defaults for the reference disk specimen.
    fn default() -> Self {
        LoadParameters {
            specimen_radius_m: 12e-3,
            support_radius_m: 7.5e-3,
            points_per_layer: 5,
            applied_load_n: 1.0,
            radial_distance_m: 2e-4,
        }
    }
}

/// Per-material elastic properties in the canonical per-property form.
///
/// Sorted maps make the default material ordering (lexicographic by name)
/// deterministic.
///
/// ## JSON Example (canonical form)
///
/// ```json
/// {
///   "Modulus": { "HA": 5.2e10, "PSu": 2.7e9 },
///   "Poissons": { "HA": 0.25, "PSu": 0.33 }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatProps {
    /// Elastic modulus per material (Pa)
    #[serde(rename = "Modulus")]
    pub modulus: BTreeMap<String, f64>,
    /// Poisson's ratio per material
    #[serde(rename = "Poissons")]
    pub poissons: BTreeMap<String, f64>,
}

impl MatProps {
    /// Build from the compact "quick" form: `{material: [modulus, poisson]}`.
    pub fn from_quick<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, [f64; 2])>,
        S: Into<String>,
    {
        let mut props = MatProps::default();
        for (material, [modulus, poisson]) in pairs {
            let material = material.into();
            props.modulus.insert(material.clone(), modulus);
            props.poissons.insert(material, poisson);
        }
        props
    }

    /// Render back into the quick form.
    pub fn to_quick(&self) -> BTreeMap<String, [f64; 2]> {
        self.modulus
            .iter()
            .filter_map(|(material, &modulus)| {
                self.poissons
                    .get(material)
                    .map(|&poisson| (material.clone(), [modulus, poisson]))
            })
            .collect()
    }

    /// Materials in the default (lexicographic) ordering.
    pub fn materials(&self) -> Vec<String> {
        self.modulus.keys().cloned().collect()
    }

    /// Look up `(modulus, poisson)` for a material.
    pub fn get(&self, material: &str) -> Option<(f64, f64)> {
        match (self.modulus.get(material), self.poissons.get(material)) {
            (Some(&e), Some(&v)) => Some((e, v)),
            _ => None,
        }
    }

    /// Check the two property tables agree on the material set.
    pub fn validate(&self) -> LamResult<()> {
        if self.modulus.is_empty() {
            return Err(LamError::validation(
                "properties",
                "at least one material is required",
            ));
        }
        for material in self.modulus.keys() {
            if !self.poissons.contains_key(material) {
                return Err(LamError::validation(
                    "properties",
                    format!("material '{material}' has a Modulus but no Poissons entry"),
                ));
            }
        }
        for material in self.poissons.keys() {
            if !self.modulus.contains_key(material) {
                return Err(LamError::validation(
                    "properties",
                    format!("material '{material}' has a Poissons but no Modulus entry"),
                ));
            }
        }
        Ok(())
    }
}

/// The cross-component configuration bundle for one analysis invocation.
///
/// Created before stack construction, read by the dimensional calculator,
/// and updated (Globals only) by a successful model handshake. Each
/// invocation owns its bundle; nothing is shared between analyses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureInput {
    /// Parsed laminate geometry
    #[serde(rename = "Geometry")]
    pub geometry: Geometry,
    /// Loading and sampling parameters
    #[serde(rename = "Parameters")]
    pub parameters: LoadParameters,
    /// Material property tables
    #[serde(rename = "Properties")]
    pub properties: MatProps,
    /// Cyclic material ordering applied to the stack, bottom up
    #[serde(rename = "Materials")]
    pub materials: Vec<String>,
    /// Identifier of the theory model to hand the table to
    #[serde(rename = "Model")]
    pub model: String,
    /// Model-computed constants; `None` until a successful handshake,
    /// and left `None` when the handshake rolls back
    #[serde(rename = "Globals")]
    pub globals: Option<Globals>,
}

impl FeatureInput {
    /// Start a builder seeded with the laboratory defaults.
    pub fn builder() -> FeatureInputBuilder {
        FeatureInputBuilder::default()
    }

    /// Points per layer, as sampled by the dimensional calculator.
    pub fn p(&self) -> usize {
        self.parameters.points_per_layer
    }

    /// Validate the bundle for internal consistency.
    pub fn validate(&self) -> LamResult<()> {
        if self.parameters.points_per_layer == 0 {
            return Err(LamError::validation(
                "points_per_layer",
                "points per layer must be at least 1",
            ));
        }
        self.properties.validate()?;
        if self.materials.is_empty() {
            return Err(LamError::validation(
                "materials",
                "material ordering must name at least one material",
            ));
        }
        for material in &self.materials {
            if self.properties.get(material).is_none() {
                return Err(LamError::validation(
                    "materials",
                    format!("material '{material}' is not in the property tables"),
                ));
            }
        }
        if self.model.is_empty() {
            return Err(LamError::validation("model", "model identifier is empty"));
        }
        Ok(())
    }
}

/// Builder assembling a validated [`FeatureInput`] from defaults plus
/// overrides.
#[derive(Debug, Clone)]
pub struct FeatureInputBuilder {
    geometry: Geometry,
    parameters: LoadParameters,
    properties: MatProps,
    materials: Option<Vec<String>>,
    model: String,
}

impl Default for FeatureInputBuilder {
    fn default() -> Self {
        FeatureInputBuilder {
            // Standard 5-ply disk
            geometry: Geometry {
                outer: 400.0,
                inner: vec![200.0],
                middle: 800.0,
                symmetric: false,
            },
            parameters: LoadParameters::default(),
            properties: MatProps::from_quick([
                ("HA", [5.2e10, 0.25]),
                ("PSu", [2.7e9, 0.33]),
            ]),
            materials: None,
            model: "wilson_lt".to_string(),
        }
    }
}

impl FeatureInputBuilder {
    /// Override the geometry from a geometry string.
    pub fn with_geometry(mut self, input: &str) -> LamResult<Self> {
        self.geometry = input.parse()?;
        Ok(self)
    }

    /// Override the geometry with an already-parsed value.
    pub fn with_geometry_value(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Override all loading parameters.
    pub fn with_parameters(mut self, parameters: LoadParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Override the sampling density only.
    pub fn with_points_per_layer(mut self, p: usize) -> Self {
        self.parameters.points_per_layer = p;
        self
    }

    /// Override the material property tables (canonical form).
    pub fn with_properties(mut self, properties: MatProps) -> Self {
        self.properties = properties;
        self
    }

    /// Override the material property tables from the quick form.
    pub fn with_quick_properties<I, S>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, [f64; 2])>,
        S: Into<String>,
    {
        self.with_properties(MatProps::from_quick(pairs))
    }

    /// Override the cyclic material ordering. The list is cycled, not
    /// filtered, when shorter than the layer count.
    pub fn with_materials(mut self, materials: Vec<String>) -> Self {
        self.materials = Some(materials);
        self
    }

    /// Override the theory model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Validate and produce the bundle. The material ordering defaults to
    /// the property table keys in lexicographic order.
    pub fn build(self) -> LamResult<FeatureInput> {
        let materials = self
            .materials
            .unwrap_or_else(|| self.properties.materials());
        let input = FeatureInput {
            geometry: self.geometry,
            parameters: self.parameters,
            properties: self.properties,
            materials,
            model: self.model,
            globals: None,
        };
        input.validate()?;
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_build() {
        let input = FeatureInput::builder().build().unwrap();
        assert_eq!(input.geometry.nplies(), 5);
        assert_eq!(input.p(), 5);
        assert_eq!(input.model, "wilson_lt");
        assert_eq!(input.materials, vec!["HA", "PSu"]);
        assert!(input.globals.is_none());
    }

    #[test]
    fn test_quick_form_conversion() {
        let props = MatProps::from_quick([("HA", [5.2e10, 0.25]), ("PSu", [2.7e9, 0.33])]);
        assert_eq!(props.modulus["HA"], 5.2e10);
        assert_eq!(props.poissons["PSu"], 0.33);
        assert_eq!(props.get("HA"), Some((5.2e10, 0.25)));

        let quick = props.to_quick();
        assert_eq!(quick["PSu"], [2.7e9, 0.33]);
    }

    #[test]
    fn test_default_ordering_is_lexicographic() {
        let props = MatProps::from_quick([("PSu", [2.7e9, 0.33]), ("HA", [5.2e10, 0.25])]);
        // Insertion order does not matter
        assert_eq!(props.materials(), vec!["HA", "PSu"]);
    }

    #[test]
    fn test_inconsistent_properties_rejected() {
        let mut props = MatProps::from_quick([("HA", [5.2e10, 0.25])]);
        props.modulus.insert("PSu".into(), 2.7e9);
        let err = props.validate().unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION");
        assert!(err.to_string().contains("PSu"));
    }

    #[test]
    fn test_empty_properties_rejected() {
        assert!(MatProps::default().validate().is_err());
    }

    #[test]
    fn test_zero_points_rejected() {
        let err = FeatureInput::builder()
            .with_points_per_layer(0)
            .build()
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION");
    }

    #[test]
    fn test_unknown_material_in_ordering_rejected() {
        let err = FeatureInput::builder()
            .with_materials(vec!["HA".into(), "Zirconia".into()])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Zirconia"));
    }

    #[test]
    fn test_materials_override() {
        let input = FeatureInput::builder()
            .with_materials(vec!["PSu".into(), "HA".into()])
            .build()
            .unwrap();
        assert_eq!(input.materials, vec!["PSu", "HA"]);
    }

    #[test]
    fn test_canonical_json_shape() {
        let input = FeatureInput::builder().build().unwrap();
        let json = serde_json::to_string(&input).unwrap();
        assert!(json.contains("\"Geometry\""));
        assert!(json.contains("\"Parameters\""));
        assert!(json.contains("\"Modulus\""));
        assert!(json.contains("\"Poissons\""));
        assert!(json.contains("\"Globals\":null"));

        let roundtrip: FeatureInput = serde_json::from_str(&json).unwrap();
        assert_eq!(input, roundtrip);
    }
}
