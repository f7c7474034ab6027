//! Kubernetes resource quantity parsing
//!
//! Normalizes quantity strings as they appear in pod specs and in the
//! metrics API into two units:
//! - memory in mebibytes (MiB), rounded to 2 decimal places
//! - CPU in millicores
//!
//! An absent value or the literal `none` parses to `Ok(None)`, which is
//! distinct from a configured zero.

use crate::error::QuantityError;
use serde::Serialize;
use std::fmt;

const MIB: f64 = 1024.0 * 1024.0;

/// Sentinel used when a request or limit is not configured
pub const UNSET: &str = "none";

/// Normalized unit of a [`ResourceQuantity`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceUnit {
    /// Mebibytes
    Memory,
    /// Millicores
    Cpu,
}

/// A non-negative normalized resource amount
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResourceQuantity {
    value: f64,
    unit: ResourceUnit,
}

impl ResourceQuantity {
    /// Memory amount in MiB
    pub fn mebibytes(value: f64) -> Self {
        Self {
            value: round_2dp(value.max(0.0)),
            unit: ResourceUnit::Memory,
        }
    }

    /// CPU amount in millicores
    pub fn millicores(value: f64) -> Self {
        Self {
            value: value.max(0.0),
            unit: ResourceUnit::Cpu,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> ResourceUnit {
        self.unit
    }
}

impl fmt::Display for ResourceQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            ResourceUnit::Memory => {
                let formatted = format!("{:.2}", self.value);
                let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
                write!(f, "{}Mi", trimmed)
            }
            ResourceUnit::Cpu => write!(f, "{:.0}m", self.value.round()),
        }
    }
}

/// Parse a memory quantity ("512Mi", "1048576Ki", "1Gi", "134217728") into MiB
pub fn parse_memory(raw: Option<&str>) -> Result<Option<ResourceQuantity>, QuantityError> {
    let Some(raw) = present(raw) else {
        return Ok(None);
    };

    let (number, suffix) = split_quantity(raw);
    let mantissa = parse_mantissa(raw, number)?;

    let bytes_per_unit = match suffix {
        "" => 1.0,
        "Ki" => 1024.0,
        "Mi" => MIB,
        "Gi" => MIB * 1024.0,
        "Ti" => MIB * 1024.0 * 1024.0,
        "Pi" => MIB * 1024.0 * 1024.0 * 1024.0,
        "Ei" => MIB * 1024.0 * 1024.0 * 1024.0 * 1024.0,
        "m" => 1e-3,
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        other => exponent(other).ok_or_else(|| unknown_suffix(raw, other))?,
    };

    let mebibytes = finite(raw, mantissa * bytes_per_unit / MIB)?;
    Ok(Some(ResourceQuantity::mebibytes(mebibytes)))
}

/// Parse a CPU quantity ("250m", "2", "0.5", "250000000n", "1k") into millicores
pub fn parse_cpu(raw: Option<&str>) -> Result<Option<ResourceQuantity>, QuantityError> {
    let Some(raw) = present(raw) else {
        return Ok(None);
    };

    let (number, suffix) = split_quantity(raw);
    let mantissa = parse_mantissa(raw, number)?;

    // Divide rather than multiply by fractions so "250000000n" lands on 250 exactly
    let millicores = match suffix {
        "" => mantissa * 1000.0,
        "m" => mantissa,
        "u" => mantissa / 1_000.0,
        "n" => mantissa / 1_000_000.0,
        "k" => mantissa * 1e6,
        "M" => mantissa * 1e9,
        "G" => mantissa * 1e12,
        "T" => mantissa * 1e15,
        "P" => mantissa * 1e18,
        "E" => mantissa * 1e21,
        other => {
            let scale = exponent(other).ok_or_else(|| unknown_suffix(raw, other))?;
            mantissa * scale * 1000.0
        }
    };

    let millicores = finite(raw, millicores)?;
    Ok(Some(ResourceQuantity::millicores(millicores)))
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case(UNSET))
}

/// Split "100Mi" into ("100", "Mi")
fn split_quantity(raw: &str) -> (&str, &str) {
    let idx = raw
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '+' || c == '-'))
        .unwrap_or(raw.len());
    raw.split_at(idx)
}

fn parse_mantissa(raw: &str, number: &str) -> Result<f64, QuantityError> {
    let value: f64 = number.parse().map_err(|_| QuantityError::InvalidNumber {
        raw: raw.to_string(),
    })?;

    if !value.is_finite() {
        return Err(QuantityError::InvalidNumber {
            raw: raw.to_string(),
        });
    }
    if value < 0.0 {
        return Err(QuantityError::Negative {
            raw: raw.to_string(),
        });
    }
    Ok(value)
}

/// A scaled value can overflow even when the mantissa is finite ("1e400")
fn finite(raw: &str, value: f64) -> Result<f64, QuantityError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(QuantityError::InvalidNumber {
            raw: raw.to_string(),
        })
    }
}

/// Decimal exponent suffix such as "e3" or "E-2"
fn exponent(suffix: &str) -> Option<f64> {
    let digits = suffix.strip_prefix(['e', 'E'])?;
    let exp: i32 = digits.parse().ok()?;
    Some(10f64.powi(exp))
}

fn unknown_suffix(raw: &str, suffix: &str) -> QuantityError {
    QuantityError::UnknownSuffix {
        raw: raw.to_string(),
        suffix: suffix.to_string(),
    }
}

fn round_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem(raw: &str) -> f64 {
        parse_memory(Some(raw)).unwrap().unwrap().value()
    }

    fn cpu(raw: &str) -> f64 {
        parse_cpu(Some(raw)).unwrap().unwrap().value()
    }

    #[test]
    fn test_parse_memory_binary_suffixes() {
        assert!((mem("1024Ki") - 1.0).abs() < 0.01);
        assert!((mem("100Mi") - 100.0).abs() < 0.01);
        assert!((mem("1Gi") - 1024.0).abs() < 0.01);
        assert!((mem("1.5Gi") - 1536.0).abs() < 0.01);
        assert!((mem("1Ti") - 1_048_576.0).abs() < 0.01);
    }

    #[test]
    fn test_parse_memory_bytes_and_decimal_suffixes() {
        assert!((mem("1048576") - 1.0).abs() < 0.01);
        // 128M = 128e6 bytes
        assert!((mem("128M") - 122.07).abs() < 0.01);
        assert!((mem("1e6") - 0.95).abs() < 0.01);
    }

    #[test]
    fn test_parse_memory_rounds_to_two_places() {
        // 12345Ki = 12.0556640625 MiB
        assert_eq!(mem("12345Ki"), 12.06);
    }

    #[test]
    fn test_parse_cpu() {
        assert_eq!(cpu("500m"), 500.0);
        assert_eq!(cpu("2"), 2000.0);
        assert_eq!(cpu("0.5"), 500.0);
        assert_eq!(cpu("250000000n"), 250.0);
        assert_eq!(cpu("1500u"), 1.5);
    }

    #[test]
    fn test_parse_cpu_decimal_suffixes() {
        assert_eq!(cpu("1k"), 1_000_000.0);
        assert_eq!(cpu("2M"), 2e9);
        assert_eq!(cpu("1e3"), 1_000_000.0);
    }

    #[test]
    fn test_overflowing_exponent_is_invalid() {
        assert_eq!(
            parse_memory(Some("1e400")),
            Err(QuantityError::InvalidNumber {
                raw: "1e400".to_string(),
            })
        );
        assert!(matches!(
            parse_cpu(Some("1e400")),
            Err(QuantityError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_unset_values() {
        assert_eq!(parse_memory(None).unwrap(), None);
        assert_eq!(parse_memory(Some("none")).unwrap(), None);
        assert_eq!(parse_cpu(Some("")).unwrap(), None);
        assert_eq!(parse_cpu(Some(" none ")).unwrap(), None);
    }

    #[test]
    fn test_zero_is_not_unset() {
        let zero = parse_cpu(Some("0")).unwrap();
        assert_eq!(zero, Some(ResourceQuantity::millicores(0.0)));
    }

    #[test]
    fn test_unknown_suffix_is_error() {
        let err = parse_memory(Some("10Xi")).unwrap_err();
        assert_eq!(
            err,
            QuantityError::UnknownSuffix {
                raw: "10Xi".to_string(),
                suffix: "Xi".to_string(),
            }
        );
        assert!(matches!(
            parse_cpu(Some("3Gi")),
            Err(QuantityError::UnknownSuffix { .. })
        ));
    }

    #[test]
    fn test_invalid_and_negative() {
        assert!(matches!(
            parse_cpu(Some("abc")),
            Err(QuantityError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse_memory(Some("-5Mi")),
            Err(QuantityError::Negative { .. })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(ResourceQuantity::mebibytes(100.0).to_string(), "100Mi");
        assert_eq!(ResourceQuantity::mebibytes(12.5).to_string(), "12.5Mi");
        assert_eq!(ResourceQuantity::mebibytes(12.057).to_string(), "12.06Mi");
        assert_eq!(ResourceQuantity::millicores(249.6).to_string(), "250m");
    }
}
