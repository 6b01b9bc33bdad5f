//! Strings one character outside `[minLength, maxLength]`
//!
//! Strings with a `format` or `pattern` are skipped: those rules take
//! priority over length when a string is validated.

use rand::Rng;
use serde_json::Value;

use super::{Deficiency, DeficiencyKind, DeficiencyOptions};
use crate::format::alphanumeric;
use crate::path::JsonPath;
use crate::report::ErrorDetails;
use crate::schema::{Schema, SchemaType};

pub(super) fn deficiencies<R: Rng + ?Sized>(
    schema: &Schema,
    path: &JsonPath,
    options: &DeficiencyOptions,
    rng: &mut R,
) -> Vec<Deficiency> {
    if schema.schema_type != Some(SchemaType::String)
        || schema.enum_values.is_some()
        || schema.format.is_some()
        || schema.pattern.is_some()
    {
        return Vec::new();
    }

    let short = schema
        .min_length
        .filter(|min| options.check_minimum_length && *min > 0)
        .map(|min| min - 1);
    let long = schema
        .max_length
        .filter(|_| options.check_maximum_length)
        .map(|max| max + 1);

    short
        .into_iter()
        .chain(long)
        .map(|len| {
            Deficiency::new(
                DeficiencyKind::StringLength,
                path.clone(),
                Value::String(alphanumeric(rng, len)),
                ErrorDetails::Length {
                    low: schema.min_length,
                    high: schema.max_length,
                    actual: len,
                },
            )
        })
        .collect()
}
