//! # Wilson Laminate Theory
//!
//! A modified classical laminate theory for circular biaxial flexure
//! disks loaded with a flat piston punch on a 3-ball support, for
//! laminates of two alternating materials (polymer and ceramic).
//!
//! Per-point columns: stiffness terms `Q_11`/`Q_12`, bending terms
//! `D_11`/`D_12`, radial and tangential strains and stresses, and the
//! MPa-scaled failure stress. Globals: laminate stiffness totals,
//! equivalent Poisson ratio, applied moments, and curvatures.
//!
//! Moments follow Timoshenko & Woinowsky-Krieger, Eq. 91.

use std::f64::consts::PI;

use crate::config::{FeatureInput, Globals};
use crate::errors::ModelError;
use crate::laminate::{LFrame, ModelColumns, PointLabel};
use crate::theories::{LaminateTheory, ModelOutput};

/// The built-in `wilson_lt` model.
#[derive(Debug, Clone, Copy, Default)]
pub struct WilsonLt;

impl LaminateTheory for WilsonLt {
    fn apply(
        &self,
        frame: &LFrame,
        input: &FeatureInput,
        adjusted_z: bool,
    ) -> Result<ModelOutput, ModelError> {
        let params = &input.parameters;
        let r = params.radial_distance_m;
        let a = params.support_radius_m;
        let specimen_radius = params.specimen_radius_m;
        let p_a = params.applied_load_n;

        if r == 0.0 {
            return Err(ModelError::numeric(
                "moment equation",
                "r=0 is invalid for the log term",
            ));
        }
        if a == 0.0 {
            return Err(ModelError::numeric(
                "moment equation",
                "a=0 is invalid for the log term",
            ));
        }
        if r < 0.0 {
            return Err(ModelError::invalid_loading(
                "r",
                r.to_string(),
                "negative values are invalid for the log term",
            ));
        }
        if a < 0.0 {
            return Err(ModelError::invalid_loading(
                "a",
                a.to_string(),
                "negative values are invalid for the log term",
            ));
        }
        if a > specimen_radius {
            return Err(ModelError::invalid_loading(
                "a",
                a.to_string(),
                "support radius is larger than the specimen radius",
            ));
        }

        let rows = frame.rows();

        // Per-lamina stiffness from the row's material
        let mut q_11 = Vec::with_capacity(rows.len());
        let mut q_12 = Vec::with_capacity(rows.len());
        for row in rows {
            let Some((modulus, poisson)) = input.properties.get(&row.matl) else {
                return Err(ModelError::failed(format!(
                    "material '{}' is missing from the property tables",
                    row.matl
                )));
            };
            let denom = 1.0 - poisson * poisson;
            q_11.push(modulus / denom);
            q_12.push(poisson * modulus / denom);
        }

        // Per-lamina bending terms; D = Q h^3/12 + Q h z^2
        let mut d_11 = Vec::with_capacity(rows.len());
        let mut d_12 = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let z = if adjusted_z {
                row.z_mid_adj_m
            } else {
                row.z_mid_m
            };
            let h = row.h_m;
            d_11.push(q_11[i] * h.powi(3) / 12.0 + q_11[i] * h * z * z);
            d_12.push(q_12[i] * h.powi(3) / 12.0 + q_12[i] * h * z * z);
        }

        // Laminate totals over the interfacial rows; even-ply laminates
        // sampled at p=1 have no interfacial rows flagged per layer side,
        // so every row counts
        let use_all_rows = frame.p() == 1 && frame.nplies() % 2 == 0;
        let mut d_11t = 0.0;
        let mut d_12t = 0.0;
        for (i, row) in rows.iter().enumerate() {
            if use_all_rows || row.label == PointLabel::Interfacial {
                d_11t += d_11[i];
                d_12t += d_12[i];
            }
        }

        let det = d_11t * d_11t - d_12t * d_12t;
        if det == 0.0 {
            return Err(ModelError::numeric(
                "stiffness inversion",
                "D_11T^2 - D_12T^2 is zero",
            ));
        }
        let d_11p = d_11t / det;
        let d_12n = -d_12t / det;
        let v_eq = d_12t / d_11t;

        let log_term = (a / r).log10();
        let m_r = p_a / (4.0 * PI) * ((1.0 + v_eq) * log_term);
        let m_t = p_a / (4.0 * PI) * ((1.0 + v_eq) * log_term + (1.0 - v_eq));
        let k_r = d_11p * m_r + d_12n * m_t;
        let k_t = d_12n * m_r + d_11p * m_t;

        let mut globals = Globals::new();
        globals.insert("D_11T".to_string(), d_11t);
        globals.insert("D_12T".to_string(), d_12t);
        globals.insert("D_11p".to_string(), d_11p);
        globals.insert("D_12n".to_string(), d_12n);
        globals.insert("v_eq".to_string(), v_eq);
        globals.insert("M_r".to_string(), m_r);
        globals.insert("M_t".to_string(), m_t);
        globals.insert("K_r".to_string(), k_r);
        globals.insert("K_t".to_string(), k_t);

        // Strains grow linearly with the interface distance; stresses
        // couple the two directions through Q
        let mut strain_r = Vec::with_capacity(rows.len());
        let mut strain_t = Vec::with_capacity(rows.len());
        let mut stress_r = Vec::with_capacity(rows.len());
        let mut stress_t = Vec::with_capacity(rows.len());
        let mut stress_f = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let e_r = k_r * row.z_intf_m;
            let e_t = k_t * row.z_intf_m;
            let s_r = e_r * q_11[i] + e_t * q_12[i];
            let s_t = e_t * q_11[i] + e_r * q_12[i];
            strain_r.push(e_r);
            strain_t.push(e_t);
            stress_r.push(s_r);
            stress_t.push(s_t);
            stress_f.push(s_t / 1e6);
        }

        let mut columns = ModelColumns::new();
        columns.push("Q_11", q_11);
        columns.push("Q_12", q_12);
        columns.push("D_11", d_11);
        columns.push("D_12", d_12);
        columns.push("strain_r", strain_r);
        columns.push("strain_t", strain_t);
        columns.push("stress_r (Pa/N)", stress_r);
        columns.push("stress_t (Pa/N)", stress_t);
        columns.push("stress_f (MPa/N)", stress_f);

        Ok((columns, globals))
    }
}
