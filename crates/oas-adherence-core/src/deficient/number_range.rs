//! Numbers just outside `[minimum, maximum]`

use serde_json::Value;

use super::{Deficiency, DeficiencyKind, DeficiencyOptions};
use crate::path::JsonPath;
use crate::report::ErrorDetails;
use crate::schema::{whole_number_value, Schema, SchemaType};

pub(super) fn deficiencies(
    schema: &Schema,
    path: &JsonPath,
    options: &DeficiencyOptions,
) -> Vec<Deficiency> {
    if schema.enum_values.is_some() {
        return Vec::new();
    }
    let integral = match schema.schema_type {
        Some(SchemaType::Integer) => true,
        Some(SchemaType::Number) => false,
        _ => return Vec::new(),
    };

    let below = schema
        .minimum
        .filter(|_| options.check_minimum)
        .and_then(|low| step_outside(low, -1.0, integral));
    let above = schema
        .maximum
        .filter(|_| options.check_maximum)
        .and_then(|high| step_outside(high, 1.0, integral));

    below
        .into_iter()
        .chain(above)
        .map(|value| {
            Deficiency::new(
                DeficiencyKind::NumberRange,
                path.clone(),
                value,
                ErrorDetails::Range {
                    low: schema.minimum,
                    high: schema.maximum,
                },
            )
        })
        .collect()
}

/// One unit past `bound` in the direction of `step`.
///
/// `None` when the result cannot be told apart from the bound.
fn step_outside(bound: f64, step: f64, integral: bool) -> Option<Value> {
    if integral {
        let edge = (if step < 0.0 { bound.ceil() } else { bound.floor() }) + step;
        let outside = if step < 0.0 { edge < bound } else { edge > bound };
        return outside.then(|| whole_number_value(edge));
    }

    let candidate = bound + step;
    let outside = if step < 0.0 { candidate < bound } else { candidate > bound };
    outside.then(|| Value::from(candidate))
}
