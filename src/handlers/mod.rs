//! HTTP handlers, one module per resource.

pub mod adoption;
pub mod favorites;
pub mod pets;
pub mod tags;

use serde_json::{Map, Value};

/// Copy only `keys` that the body actually carries.
pub(crate) fn pick(body: &Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    keys.iter()
        .filter_map(|k| body.get(*k).map(|v| (k.to_string(), v.clone())))
        .collect()
}
