//! Low-usage detection against configured requests

use crate::quantity::ResourceQuantity;

/// Whether `usage` is below `threshold_percent` of `request`.
///
/// Never flags when no request is configured, when usage meets or exceeds
/// the request, or when the two quantities are in different units.
pub fn is_underutilized(
    usage: &ResourceQuantity,
    request: Option<&ResourceQuantity>,
    threshold_percent: u8,
) -> bool {
    let Some(request) = request else {
        return false;
    };
    if usage.unit() != request.unit() {
        return false;
    }
    // Also covers request == 0, since usage is never negative
    if usage.value() >= request.value() {
        return false;
    }

    let ratio = usage.value() / request.value() * 100.0;
    ratio < f64::from(threshold_percent)
}

/// Usage as a percentage of the request, if one is configured and non-zero
pub fn utilization_percent(
    usage: &ResourceQuantity,
    request: Option<&ResourceQuantity>,
) -> Option<f64> {
    let request = request?;
    if usage.unit() != request.unit() || request.value() <= 0.0 {
        return None;
    }
    Some(usage.value() / request.value() * 100.0)
}
