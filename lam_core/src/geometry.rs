//! # Geometry Parsing
//!
//! Parses laminate geometry strings into [`Geometry`] values and renders
//! them back in the canonical General Convention.
//!
//! ## Grammar
//!
//! `outer - [inner_1,inner_2,...] - middle` with `-` separating the three
//! zones and `,` separating multiple inner thicknesses. Brackets may be
//! omitted when exactly one inner thickness is given (short-hand). An
//! optional trailing `S` on the middle token selects the symmetric
//! convention, where the written middle value is half the physical middle
//! layer. All thicknesses are non-negative numbers in micrometers; `0`
//! denotes an absent zone.
//!
//! ## Example
//!
//! ```rust
//! use lam_core::geometry::Geometry;
//!
//! let geo: Geometry = "400-[200]-800".parse().unwrap();
//! assert_eq!(geo.outer, 400.0);
//! assert_eq!(geo.inner, vec![200.0]);
//! assert_eq!(geo.middle, 800.0);
//! assert_eq!(geo.nplies(), 5);
//!
//! // Short-hand normalizes to the General Convention
//! let short: Geometry = "400-200-800".parse().unwrap();
//! assert_eq!(short.to_string(), "400.0-[200.0]-800.0");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{LamError, LamResult};

/// An immutable laminate geometry: outer/inner/middle zone thicknesses.
///
/// Thicknesses are in micrometers. The value is independent of the input
/// formatting; [`fmt::Display`] renders the canonical General Convention
/// string, which is idempotent under reparse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Outer lamina thickness (mirrored top and bottom)
    pub outer: f64,
    /// Inner laminae thicknesses, outside-in (mirrored)
    pub inner: Vec<f64>,
    /// Middle lamina thickness as written
    pub middle: f64,
    /// True if the symmetric (half-middle) convention was used:
    /// the physical middle layer is `2 * middle`
    pub symmetric: bool,
}

impl Geometry {
    /// Create a geometry from explicit zone thicknesses.
    ///
    /// Fails with a validation error if any thickness is negative or
    /// non-finite.
    pub fn new(outer: f64, inner: Vec<f64>, middle: f64, symmetric: bool) -> LamResult<Self> {
        for (name, value) in std::iter::once(("outer", outer))
            .chain(inner.iter().map(|&t| ("inner", t)))
            .chain(std::iter::once(("middle", middle)))
        {
            if !value.is_finite() || value < 0.0 {
                return Err(LamError::validation(
                    name,
                    format!("thickness must be a non-negative finite number, got {value}"),
                ));
            }
        }
        Ok(Geometry {
            outer,
            inner,
            middle,
            symmetric,
        })
    }

    /// Parse a geometry string. Equivalent to `input.parse::<Geometry>()`.
    pub fn parse(input: &str) -> LamResult<Self> {
        input.parse()
    }

    /// Number of plies: zero-thickness placeholder zones are excluded.
    pub fn nplies(&self) -> usize {
        let mirrored = usize::from(self.outer > 0.0)
            + self.inner.iter().filter(|&&t| t > 0.0).count();
        2 * mirrored + usize::from(self.middle > 0.0)
    }

    /// True if the symmetric (half-middle) convention was used.
    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    /// Total laminate thickness (um), any convention.
    pub fn total(&self) -> f64 {
        2.0 * self.outer + self.total_inner() + self.total_middle()
    }

    /// Total physical middle thickness (um), symmetric-aware.
    pub fn total_middle(&self) -> f64 {
        if self.symmetric {
            2.0 * self.middle
        } else {
            self.middle
        }
    }

    /// Total thickness of all inner laminae (um), both halves.
    pub fn total_inner(&self) -> f64 {
        2.0 * self.inner.iter().sum::<f64>()
    }

    /// Total thickness per inner lamina (um), both halves each.
    pub fn total_inner_each(&self) -> Vec<f64> {
        self.inner.iter().map(|t| 2.0 * t).collect()
    }

    /// Total thickness of the outer laminae (um), both halves.
    pub fn total_outer(&self) -> f64 {
        2.0 * self.outer
    }
}

impl fmt::Display for Geometry {
    /// Canonical General Convention string, e.g. `400.0-[200.0]-800.0`
    /// or `400.0-[100.0,100.0]-400.0S`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = if self.inner.is_empty() {
            fmt_thickness(0.0)
        } else {
            self.inner
                .iter()
                .map(|&t| fmt_thickness(t))
                .collect::<Vec<_>>()
                .join(",")
        };
        write!(
            f,
            "{}-[{}]-{}{}",
            fmt_thickness(self.outer),
            inner,
            fmt_thickness(self.middle),
            if self.symmetric { "S" } else { "" }
        )
    }
}

impl FromStr for Geometry {
    type Err = LamError;

    fn from_str(input: &str) -> LamResult<Self> {
        // Formatting whitespace carries no meaning
        let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();

        let tokens: Vec<&str> = cleaned.split('-').collect();
        if tokens.len() != 3 {
            return Err(LamError::geometry_parse(
                input,
                format!(
                    "expected exactly 3 zones 'outer-[inner_i]-middle', found {}",
                    tokens.len()
                ),
            ));
        }

        let outer = parse_thickness(input, "outer", tokens[0])?;
        let inner = parse_inner(input, tokens[1])?;
        let (middle, symmetric) = parse_middle(input, tokens[2])?;

        Ok(Geometry {
            outer,
            inner,
            middle,
            symmetric,
        })
    }
}

/// Parse one thickness token, rejecting negatives and non-numbers.
fn parse_thickness(input: &str, zone: &str, token: &str) -> LamResult<f64> {
    if token.is_empty() {
        return Err(LamError::geometry_parse(
            input,
            format!("{zone} thickness is empty"),
        ));
    }
    let value: f64 = token.parse().map_err(|_| {
        LamError::geometry_parse(input, format!("{zone} thickness '{token}' is not a number"))
    })?;
    if !value.is_finite() {
        return Err(LamError::geometry_parse(
            input,
            format!("{zone} thickness '{token}' is not finite"),
        ));
    }
    if value < 0.0 {
        return Err(LamError::geometry_parse(
            input,
            format!("{zone} thickness '{token}' is negative"),
        ));
    }
    Ok(value)
}

/// Parse the inner zone: `[a,b,...]`, `[a]`, or short-hand bare `a`.
fn parse_inner(input: &str, token: &str) -> LamResult<Vec<f64>> {
    if let Some(stripped) = token.strip_prefix('[') {
        let Some(inside) = stripped.strip_suffix(']') else {
            return Err(LamError::geometry_parse(
                input,
                "inner bracket is not closed",
            ));
        };
        if inside.is_empty() {
            return Err(LamError::geometry_parse(input, "inner bracket is empty"));
        }
        inside
            .split(',')
            .map(|item| parse_thickness(input, "inner", item))
            .collect()
    } else if token.contains(']') {
        Err(LamError::geometry_parse(
            input,
            "inner bracket is not opened",
        ))
    } else {
        // Short-hand: exactly one unbracketed inner value
        Ok(vec![parse_thickness(input, "inner", token)?])
    }
}

/// Parse the middle zone with its optional trailing symmetry marker.
fn parse_middle(input: &str, token: &str) -> LamResult<(f64, bool)> {
    if let Some(stripped) = token.strip_suffix('S') {
        Ok((parse_thickness(input, "middle", stripped)?, true))
    } else {
        Ok((parse_thickness(input, "middle", token)?, false))
    }
}

/// Format a thickness the way the canonical convention writes it:
/// whole numbers keep one decimal place (`400.0`), others print exact.
fn fmt_thickness(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
