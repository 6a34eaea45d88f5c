//! Plan computation shared by every resource.
//!
//! Given a resource schema, the prior state and the proposed state, this
//! works out the planned state, the per-attribute changes and whether the
//! resource must be replaced.

use serde_json::{Map, Value};

use crate::schema::Schema;
use crate::types::{AttributeChange, PlanResult};

/// Plan a create, update or destroy for a resource with the given schema.
///
/// - `prior` is `None` when the resource is being created.
/// - A `null` proposal means the resource is being destroyed.
pub fn plan_resource(schema: &Schema, prior: Option<&Value>, proposed: Value) -> PlanResult {
    match (prior, proposed) {
        (None, Value::Null) => PlanResult::no_change(Value::Null),
        (Some(prior), Value::Null) => plan_destroy(schema, prior),
        (None, proposed) => plan_create(schema, proposed),
        (Some(prior), proposed) => plan_update(schema, prior, proposed),
    }
}

fn plan_create(schema: &Schema, proposed: Value) -> PlanResult {
    let mut planned = into_object(proposed);
    let mut changes = Vec::new();

    for (name, attr) in &schema.block.attributes {
        let value = planned.get(name).cloned().unwrap_or(Value::Null);
        let value = match (value, &attr.default) {
            (Value::Null, Some(default)) => default.clone(),
            (value, _) => value,
        };
        if !value.is_null() {
            changes.push(AttributeChange::added(name.clone(), value.clone()));
        }
        planned.insert(name.clone(), value);
    }

    PlanResult::with_changes(Value::Object(planned), changes, false)
}

fn plan_update(schema: &Schema, prior: &Value, proposed: Value) -> PlanResult {
    let mut planned = into_object(proposed);
    let mut changes = Vec::new();
    let mut requires_replace = false;

    for (name, attr) in &schema.block.attributes {
        let before = prior.get(name).cloned().unwrap_or(Value::Null);
        let mut after = planned.get(name).cloned().unwrap_or(Value::Null);

        if after.is_null() {
            if attr.flags.computed {
                // unset computed values keep what the API told us last time
                after = before.clone();
            } else if let Some(default) = &attr.default {
                after = default.clone();
            }
        }

        if before != after {
            if attr.force_new {
                requires_replace = true;
            }
            changes.push(match (&before, &after) {
                (Value::Null, _) => AttributeChange::added(name.clone(), after.clone()),
                (_, Value::Null) => AttributeChange::removed(name.clone(), before.clone()),
                _ => AttributeChange::modified(name.clone(), before.clone(), after.clone()),
            });
        }
        planned.insert(name.clone(), after);
    }

    if requires_replace {
        // computed values will be assigned afresh by the replacement
        for (name, attr) in &schema.block.attributes {
            if attr.flags.is_computed_only() {
                planned.insert(name.clone(), Value::Null);
            }
        }
    }

    PlanResult::with_changes(Value::Object(planned), changes, requires_replace)
}

fn plan_destroy(schema: &Schema, prior: &Value) -> PlanResult {
    let changes = schema
        .block
        .attributes
        .keys()
        .filter_map(|name| match prior.get(name) {
            Some(value) if !value.is_null() => {
                Some(AttributeChange::removed(name.clone(), value.clone()))
            },
            _ => None,
        })
        .collect();

    PlanResult::with_changes(Value::Null, changes, false)
}

fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
