//! # Theory Model Handshake
//!
//! The interface between the trusted laminate core and pluggable,
//! user-authored theory models. Models are registered under a string
//! identifier and resolved at handshake time; the handshake hands them the
//! dimensional [`LFrame`](crate::laminate::LFrame) and reintegrates their
//! columns, or rolls back when anything goes wrong on the model side.
//!
//! ## Plug-in contract
//!
//! A model is anything implementing [`LaminateTheory`]: one operation
//! taking the frame, the configuration, and the `adjusted_z` flag, and
//! returning per-point columns plus the model's global constants. Both
//! styles the original ecosystem supports are covered:
//!
//! - stateless function style, via [`register_fn`];
//! - stateful object style, via [`register_model`].
//!
//! ## Isolation boundary
//!
//! Models are third-party code of variable quality. Whatever a model
//! returns as an error - numeric trouble, loading validation, an explicit
//! domain error - is logged with full detail and answered with a
//! **rollback**: the caller receives an [`LmFrame`] value-equal to the
//! input LFrame and the configuration with Globals unset. A rollback is a
//! normal outcome, not a failure; the geometric table stays consumable no
//! matter what the model did.
//!
//! ## Example
//!
//! ```rust
//! use lam_core::config::FeatureInput;
//! use lam_core::laminate::Laminate;
//!
//! let input = FeatureInput::builder().build().unwrap();
//! let laminate = Laminate::analyze(input).unwrap();
//! assert!(laminate.frame.is_modeled());
//! assert!(laminate.input.globals.is_some());
//! ```

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::config::{FeatureInput, Globals};
use crate::errors::ModelError;
use crate::laminate::{LFrame, LmFrame, ModelColumns};
use crate::models::WilsonLt;

/// What a model hands back on success: per-point columns and the global
/// constants destined for `FeatureInput.globals`.
pub type ModelOutput = (ModelColumns, Globals);

/// The plug-in contract every theory model implements.
///
/// The call must be synchronous and side-effect-free from the caller's
/// perspective: read the frame and configuration, return columns and
/// globals, touch nothing else.
pub trait LaminateTheory: Send + Sync {
    /// Compute model columns for the given frame.
    ///
    /// `adjusted_z` selects the alternative `z_*` midplane convention for
    /// models that distinguish the two.
    fn apply(
        &self,
        frame: &LFrame,
        input: &FeatureInput,
        adjusted_z: bool,
    ) -> Result<ModelOutput, ModelError>;
}

/// Adapter lifting a stateless function into the [`LaminateTheory`] trait.
struct FnTheory<F>(F);

impl<F> LaminateTheory for FnTheory<F>
where
    F: Fn(&LFrame, &FeatureInput, bool) -> Result<ModelOutput, ModelError> + Send + Sync,
{
    fn apply(
        &self,
        frame: &LFrame,
        input: &FeatureInput,
        adjusted_z: bool,
    ) -> Result<ModelOutput, ModelError> {
        (self.0)(frame, input, adjusted_z)
    }
}

/// Registry of theory models keyed by identifier. Built-ins are inserted
/// at first use; user models are added through the registration functions.
static REGISTRY: Lazy<RwLock<HashMap<String, Arc<dyn LaminateTheory>>>> = Lazy::new(|| {
    let mut models: HashMap<String, Arc<dyn LaminateTheory>> = HashMap::new();
    models.insert("wilson_lt".to_string(), Arc::new(WilsonLt::default()));
    RwLock::new(models)
});

/// Register an object-style model under an identifier.
///
/// Re-registering an identifier replaces the previous model.
pub fn register_model(id: impl Into<String>, model: impl LaminateTheory + 'static) {
    let mut registry = REGISTRY.write().unwrap_or_else(|e| e.into_inner());
    registry.insert(id.into(), Arc::new(model));
}

/// Register a function-style model under an identifier.
pub fn register_fn<F>(id: impl Into<String>, model: F)
where
    F: Fn(&LFrame, &FeatureInput, bool) -> Result<ModelOutput, ModelError>
        + Send
        + Sync
        + 'static,
{
    register_model(id, FnTheory(model));
}

/// Resolve a model identifier to its implementation.
pub fn resolve(id: &str) -> Option<Arc<dyn LaminateTheory>> {
    let registry = REGISTRY.read().unwrap_or_else(|e| e.into_inner());
    registry.get(id).cloned()
}

/// Identifiers of all registered models, sorted.
pub fn registered_models() -> Vec<String> {
    let registry = REGISTRY.read().unwrap_or_else(|e| e.into_inner());
    let mut ids: Vec<String> = registry.keys().cloned().collect();
    ids.sort();
    ids
}

/// The explicit outcome of a model handshake.
///
/// Either the model completed and its columns are merged, or it failed and
/// the frame was rolled back. Both variants carry a consumable table and
/// the configuration bundle; only the `Modeled` variant has Globals set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HandshakeOutcome {
    /// The model completed; the frame carries its columns and the
    /// configuration carries its Globals.
    Modeled {
        /// Frame with model columns merged
        frame: LmFrame,
        /// Configuration with Globals populated
        input: FeatureInput,
    },
    /// The model failed; the frame equals the input LFrame and Globals
    /// stay unset.
    RolledBack {
        /// Frame without model columns, value-equal to the input LFrame
        frame: LmFrame,
        /// Configuration unchanged, Globals unset
        input: FeatureInput,
        /// What the model reported
        error: ModelError,
    },
}

impl HandshakeOutcome {
    /// The resulting frame, modeled or rolled back.
    pub fn frame(&self) -> &LmFrame {
        match self {
            HandshakeOutcome::Modeled { frame, .. } => frame,
            HandshakeOutcome::RolledBack { frame, .. } => frame,
        }
    }

    /// The resulting configuration bundle.
    pub fn input(&self) -> &FeatureInput {
        match self {
            HandshakeOutcome::Modeled { input, .. } => input,
            HandshakeOutcome::RolledBack { input, .. } => input,
        }
    }

    /// The model error behind a rollback, if any.
    pub fn error(&self) -> Option<&ModelError> {
        match self {
            HandshakeOutcome::Modeled { .. } => None,
            HandshakeOutcome::RolledBack { error, .. } => Some(error),
        }
    }

    /// True if the model completed.
    pub fn is_modeled(&self) -> bool {
        matches!(self, HandshakeOutcome::Modeled { .. })
    }

    /// Decompose into `(frame, input, reported error)`.
    pub fn into_parts(self) -> (LmFrame, FeatureInput, Option<ModelError>) {
        match self {
            HandshakeOutcome::Modeled { frame, input } => (frame, input, None),
            HandshakeOutcome::RolledBack {
                frame,
                input,
                error,
            } => (frame, input, Some(error)),
        }
    }
}

/// Hand the frame to the configured model and reintegrate the result.
///
/// Resolves `input.model` in the registry, runs the model, validates its
/// columns against the frame shape, and produces the explicit outcome.
/// Every model-side failure - and a missing registry entry, and a
/// malformed column set - ends in a rollback, never in a panic or an
/// error propagating out of the handshake.
pub fn handshake(lframe: &LFrame, input: &FeatureInput, adjusted_z: bool) -> HandshakeOutcome {
    let model_id = input.model.as_str();

    let Some(theory) = resolve(model_id) else {
        return roll_back(
            lframe,
            input,
            ModelError::UnknownModel {
                model: model_id.to_string(),
            },
        );
    };

    match theory.apply(lframe, input, adjusted_z) {
        Ok((columns, globals)) => {
            let n_rows = lframe.rows().len();
            for column in columns.columns() {
                if column.values.len() != n_rows {
                    return roll_back(
                        lframe,
                        input,
                        ModelError::ColumnMismatch {
                            column: column.name.clone(),
                            expected: n_rows,
                            actual: column.values.len(),
                        },
                    );
                }
            }

            tracing::debug!(model = model_id, rows = n_rows, "model handshake complete");
            let mut updated = input.clone();
            updated.globals = Some(globals);
            HandshakeOutcome::Modeled {
                frame: LmFrame::with_model(lframe.clone(), columns),
                input: updated,
            }
        }
        Err(error) => roll_back(lframe, input, error),
    }
}

/// Build the rollback outcome and log the failure in full.
fn roll_back(lframe: &LFrame, input: &FeatureInput, error: ModelError) -> HandshakeOutcome {
    tracing::error!(
        model = input.model.as_str(),
        code = error.error_code(),
        %error,
        "model handshake failed; rolling back to the unmodeled frame"
    );
    let mut untouched = input.clone();
    untouched.globals = None;
    HandshakeOutcome::RolledBack {
        frame: LmFrame::unmodeled(lframe.clone()),
        input: untouched,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureInput;
    use crate::laminate::LFrame;
    use crate::stack::{Snapshot, Stack};

    fn frame_and_input() -> (LFrame, FeatureInput) {
        let input = FeatureInput::builder().build().unwrap();
        let stack = Stack::build(&input).unwrap();
        let snapshot = Snapshot::build(&stack, &input.materials).unwrap();
        let frame = LFrame::build(&snapshot, &input).unwrap();
        (frame, input)
    }

    #[test]
    fn test_builtin_model_resolves() {
        assert!(resolve("wilson_lt").is_some());
        assert!(registered_models().contains(&"wilson_lt".to_string()));
    }

    #[test]
    fn test_handshake_completes_with_builtin() {
        let (frame, input) = frame_and_input();
        let outcome = handshake(&frame, &input, false);
        assert!(outcome.is_modeled());
        assert!(outcome.input().globals.is_some());
        assert!(outcome.frame().column("Q_11").is_some());
    }

    #[test]
    fn test_unknown_model_rolls_back() {
        let (frame, mut input) = frame_and_input();
        input.model = "no_such_theory".to_string();
        let outcome = handshake(&frame, &input, false);
        assert!(!outcome.is_modeled());
        assert_eq!(outcome.error().unwrap().error_code(), "UNKNOWN_MODEL");
        assert_eq!(outcome.frame().lframe(), &frame);
        assert!(outcome.input().globals.is_none());
    }

    #[test]
    fn test_failing_model_rolls_back() {
        register_fn("always_fails", |_frame, _input, _adjusted_z| {
            Err(ModelError::failed("deliberate test failure"))
        });
        let (frame, mut input) = frame_and_input();
        input.model = "always_fails".to_string();

        let outcome = handshake(&frame, &input, false);
        assert!(!outcome.is_modeled());
        // Rollback: the frame is value-equal to the input LFrame and
        // Globals stay unset
        assert_eq!(outcome.frame().lframe(), &frame);
        assert!(outcome.frame().model_columns().is_none());
        assert!(outcome.input().globals.is_none());
        assert_eq!(outcome.error().unwrap().error_code(), "FAILED");
    }

    #[test]
    fn test_function_style_model() {
        register_fn("constant_column", |frame, _input, _adjusted_z| {
            let mut columns = ModelColumns::new();
            columns.push("ones", vec![1.0; frame.rows().len()]);
            Ok((columns, Globals::new()))
        });
        let (frame, mut input) = frame_and_input();
        input.model = "constant_column".to_string();

        let outcome = handshake(&frame, &input, false);
        assert!(outcome.is_modeled());
        assert_eq!(outcome.frame().column("ones").unwrap().len(), 25);
    }

    #[test]
    fn test_object_style_model() {
        struct Doubler;
        impl LaminateTheory for Doubler {
            fn apply(
                &self,
                frame: &LFrame,
                _input: &FeatureInput,
                _adjusted_z: bool,
            ) -> Result<ModelOutput, ModelError> {
                let mut columns = ModelColumns::new();
                columns.push(
                    "double_d",
                    frame.rows().iter().map(|r| 2.0 * r.d_m).collect(),
                );
                let mut globals = Globals::new();
                globals.insert("doubled".to_string(), 1.0);
                Ok((columns, globals))
            }
        }
        register_model("doubler", Doubler);
        let (frame, mut input) = frame_and_input();
        input.model = "doubler".to_string();

        let outcome = handshake(&frame, &input, false);
        assert!(outcome.is_modeled());
        assert_eq!(outcome.input().globals.as_ref().unwrap()["doubled"], 1.0);
    }

    #[test]
    fn test_ragged_columns_roll_back() {
        register_fn("ragged", |_frame, _input, _adjusted_z| {
            let mut columns = ModelColumns::new();
            columns.push("short", vec![1.0, 2.0]);
            Ok((columns, Globals::new()))
        });
        let (frame, mut input) = frame_and_input();
        input.model = "ragged".to_string();

        let outcome = handshake(&frame, &input, false);
        assert!(!outcome.is_modeled());
        assert_eq!(outcome.error().unwrap().error_code(), "COLUMN_MISMATCH");
    }

    #[test]
    fn test_rollback_clears_stale_globals() {
        let (frame, mut input) = frame_and_input();
        input.model = "no_such_theory".to_string();
        input.globals = Some(Globals::new());
        let outcome = handshake(&frame, &input, false);
        assert!(outcome.input().globals.is_none());
    }

    #[test]
    fn test_outcome_serialization() {
        let (frame, input) = frame_and_input();
        let outcome = handshake(&frame, &input, false);
        let json = serde_json::to_string(&outcome).unwrap();
        let roundtrip: HandshakeOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(outcome, roundtrip);
    }
}
