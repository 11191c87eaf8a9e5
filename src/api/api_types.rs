//! Response shapes that wrap resources on the wire.

use serde::{Deserialize, Serialize};

/// List endpoints answer with a bare array or a paginated envelope.
#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
  Items(Vec<T>),
  Page {
    #[serde(default)]
    count: Option<u64>,
    results: Vec<T>,
  },
}

impl<T> ListEnvelope<T> {
  pub fn into_items(self) -> Vec<T> {
    match self {
      Self::Items(items) => items,
      Self::Page { results, .. } => results,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::Feature;
  use serde_json::json;

  #[test]
  fn test_bare_array() {
    let list: ListEnvelope<Feature> =
      serde_json::from_value(json!([{"feature_uuid": "f1", "name": "Login"}])).unwrap();
    let items = list.into_items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].feature_uuid.as_deref(), Some("f1"));
  }

  #[test]
  fn test_paginated_envelope() {
    let list: ListEnvelope<Feature> = serde_json::from_value(json!({
      "count": 2,
      "next": null,
      "results": [{"name": "A"}, {"name": "B"}]
    }))
    .unwrap();
    let names: Vec<_> = list.into_items().into_iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["A", "B"]);
  }

  #[test]
  fn test_unknown_fields_survive() {
    let list: ListEnvelope<Feature> =
      serde_json::from_value(json!([{"name": "A", "complexity": 5}])).unwrap();
    let feature = &list.into_items()[0];
    assert_eq!(feature.extra.get("complexity"), Some(&json!(5)));
    assert_eq!(serde_json::to_value(feature).unwrap()["complexity"], json!(5));
  }
}
