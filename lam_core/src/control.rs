//! # Control Table Rendering
//!
//! Renders an [`LmFrame`](crate::laminate::LmFrame) as the row-per-point
//! CSV control table used to diff expected-vs-actual outputs for known
//! configurations. The core owns the column contract, so the renderer
//! lives here; reading and comparing control files is the regression
//! tooling's job.
//!
//! Fixed columns, in order:
//! `layer_, side_, matl_, type_, t_, label_, h_, d_, intf_, k_, Z_, z_`,
//! followed by the model-specific columns of a modeled frame.
//!
//! ## Example
//!
//! ```rust
//! use lam_core::config::FeatureInput;
//! use lam_core::control::control_table;
//! use lam_core::laminate::Laminate;
//!
//! let laminate = Laminate::analyze(FeatureInput::builder().build().unwrap()).unwrap();
//! let table = control_table(&laminate.frame).unwrap();
//! assert!(table.starts_with("layer_,side_,matl_,type_"));
//! ```

use crate::errors::{LamError, LamResult};
use crate::laminate::LmFrame;

/// Fixed identification and dimensional columns of every control table.
const FIXED_COLUMNS: [&str; 12] = [
    "layer_", "side_", "matl_", "type_", "t_", "label_", "h_", "d_", "intf_", "k_", "Z_", "z_",
];

/// Render the frame as CSV text, fixed columns first, model columns after.
///
/// The indeterminate `intf_` of a neutral-axis row renders as an empty
/// field.
pub fn control_table(frame: &LmFrame) -> LamResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<String> = FIXED_COLUMNS.iter().map(|&c| c.to_string()).collect();
    if let Some(model) = frame.model_columns() {
        header.extend(model.columns().iter().map(|c| c.name.clone()));
    }
    writer
        .write_record(&header)
        .map_err(|e| LamError::validation("control_table", e.to_string()))?;

    for (i, row) in frame.rows().iter().enumerate() {
        let mut record = vec![
            row.layer.to_string(),
            row.side.to_string(),
            row.matl.clone(),
            row.kind.to_string(),
            fmt_value(row.t_um),
            row.label.to_string(),
            fmt_value(row.h_m),
            fmt_value(row.d_m),
            row.intf.map(|v| v.to_string()).unwrap_or_default(),
            fmt_value(row.k),
            fmt_value(row.z_intf_m),
            fmt_value(row.z_mid_m),
        ];
        if let Some(model) = frame.model_columns() {
            record.extend(model.columns().iter().map(|c| fmt_value(c.values[i])));
        }
        writer
            .write_record(&record)
            .map_err(|e| LamError::validation("control_table", e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| LamError::validation("control_table", e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| LamError::validation("control_table", e.to_string()))
}

/// Shortest round-trippable decimal representation.
fn fmt_value(value: f64) -> String {
    format!("{value}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureInput;
    use crate::laminate::Laminate;

    fn analyzed() -> Laminate {
        Laminate::analyze(FeatureInput::builder().build().unwrap()).unwrap()
    }

    #[test]
    fn test_header_contract() {
        let laminate = analyzed();
        let table = control_table(&laminate.frame).unwrap();
        let header = table.lines().next().unwrap();
        assert!(header.starts_with(
            "layer_,side_,matl_,type_,t_,label_,h_,d_,intf_,k_,Z_,z_"
        ));
        // Modeled frames append the model columns
        assert!(header.contains("Q_11"));
        assert!(header.ends_with("stress_f (MPa/N)"));
    }

    #[test]
    fn test_one_line_per_point() {
        let laminate = analyzed();
        let table = control_table(&laminate.frame).unwrap();
        // Header plus 25 point rows
        assert_eq!(table.lines().count(), 26);
    }

    #[test]
    fn test_unmodeled_frame_has_fixed_columns_only() {
        let laminate = analyzed();
        let bare = LmFrame::unmodeled(laminate.lframe.clone());
        let table = control_table(&bare).unwrap();
        let header = table.lines().next().unwrap();
        assert_eq!(
            header,
            "layer_,side_,matl_,type_,t_,label_,h_,d_,intf_,k_,Z_,z_"
        );
    }

    #[test]
    fn test_neutral_axis_intf_is_empty() {
        let laminate = analyzed();
        let table = control_table(&laminate.frame).unwrap();
        // Row 13 (after the header) is the neutral axis row
        let line = table.lines().nth(13).unwrap();
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields[0], "3");
        assert_eq!(fields[1], "none");
        assert_eq!(fields[5], "neutralaxis");
        assert_eq!(fields[8], "", "indeterminate intf_ renders empty");
    }

    #[test]
    fn test_table_is_rectangular() {
        let laminate = analyzed();
        let table = control_table(&laminate.frame).unwrap();
        let mut reader = csv::Reader::from_reader(table.as_bytes());
        let width = reader.headers().unwrap().len();
        for record in reader.records() {
            assert_eq!(record.unwrap().len(), width);
        }
    }
}
