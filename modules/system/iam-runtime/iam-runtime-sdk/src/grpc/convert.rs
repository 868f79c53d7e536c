//! Conversions between SDK models and generated protobuf messages.

use std::collections::{BTreeMap, HashMap};

use prost_types::value::Kind;

use super::proto;
use crate::models::{AccessRequestAction, Relationship, Subject};

/// Encode claims as a `google.protobuf.Struct`.
#[must_use]
pub fn claims_to_struct(claims: &HashMap<String, serde_json::Value>) -> prost_types::Struct {
    prost_types::Struct {
        fields: claims
            .iter()
            .map(|(k, v)| (k.clone(), json_to_value(v)))
            .collect::<BTreeMap<_, _>>(),
    }
}

/// Decode a `google.protobuf.Struct` into claims.
#[must_use]
pub fn struct_to_claims(s: prost_types::Struct) -> HashMap<String, serde_json::Value> {
    s.fields
        .into_iter()
        .map(|(k, v)| (k, value_to_json(v)))
        .collect()
}

fn json_to_value(v: &serde_json::Value) -> prost_types::Value {
    let kind = match v {
        serde_json::Value::Null => Kind::NullValue(prost_types::NullValue::NullValue.into()),
        serde_json::Value::Bool(b) => Kind::BoolValue(*b),
        serde_json::Value::Number(n) => n.as_f64().map_or(
            Kind::NullValue(prost_types::NullValue::NullValue.into()),
            Kind::NumberValue,
        ),
        serde_json::Value::String(s) => Kind::StringValue(s.clone()),
        serde_json::Value::Array(items) => Kind::ListValue(prost_types::ListValue {
            values: items.iter().map(json_to_value).collect(),
        }),
        serde_json::Value::Object(map) => Kind::StructValue(prost_types::Struct {
            fields: map
                .iter()
                .map(|(k, v)| (k.clone(), json_to_value(v)))
                .collect(),
        }),
    };

    prost_types::Value { kind: Some(kind) }
}

fn value_to_json(v: prost_types::Value) -> serde_json::Value {
    match v.kind {
        None | Some(Kind::NullValue(_)) => serde_json::Value::Null,
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(Kind::NumberValue(n)) => serde_json::Number::from_f64(n)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        Some(Kind::StringValue(s)) => serde_json::Value::String(s),
        Some(Kind::ListValue(list)) => {
            serde_json::Value::Array(list.values.into_iter().map(value_to_json).collect())
        }
        Some(Kind::StructValue(s)) => serde_json::Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, value_to_json(v)))
                .collect(),
        ),
    }
}

impl From<&Subject> for proto::Subject {
    fn from(subject: &Subject) -> Self {
        Self {
            subject_id: subject.subject_id.clone(),
            claims: Some(claims_to_struct(&subject.claims)),
        }
    }
}

impl From<proto::Subject> for Subject {
    fn from(subject: proto::Subject) -> Self {
        Self {
            subject_id: subject.subject_id,
            claims: subject.claims.map(struct_to_claims).unwrap_or_default(),
        }
    }
}

impl From<&AccessRequestAction> for proto::AccessRequestAction {
    fn from(action: &AccessRequestAction) -> Self {
        Self {
            action: action.action.clone(),
            resource_id: action.resource_id.clone(),
        }
    }
}

impl From<proto::AccessRequestAction> for AccessRequestAction {
    fn from(action: proto::AccessRequestAction) -> Self {
        Self {
            action: action.action,
            resource_id: action.resource_id,
        }
    }
}

impl From<&Relationship> for proto::Relationship {
    fn from(relationship: &Relationship) -> Self {
        Self {
            relation: relationship.relation.clone(),
            subject_id: relationship.subject_id.clone(),
        }
    }
}

impl From<proto::Relationship> for Relationship {
    fn from(relationship: proto::Relationship) -> Self {
        Self {
            relation: relationship.relation,
            subject_id: relationship.subject_id,
        }
    }
}
