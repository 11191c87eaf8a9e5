//! Backend resources.
//!
//! Identifiers are optional so the same struct serves as a create payload.
//! Fields the client does not model are kept in `extra` and sent back as-is.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Organization {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub organization_uuid: Option<String>,
  pub name: String,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreUser {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub core_user_uuid: Option<String>,
  pub username: String,
  pub email: String,
  pub first_name: String,
  pub last_name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub organization_uuid: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub product_uuid: Option<String>,
  pub name: String,
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub organization_uuid: Option<String>,
  pub start_date: Option<String>,
  pub end_date: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Release {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub release_uuid: Option<String>,
  pub name: String,
  pub description: Option<String>,
  pub product_uuid: Option<String>,
  pub release_date: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feature {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub feature_uuid: Option<String>,
  pub name: String,
  pub description: Option<String>,
  pub product_uuid: Option<String>,
  pub release_uuid: Option<String>,
  /// Status uuid
  pub status: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Issue {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub issue_uuid: Option<String>,
  pub name: String,
  pub description: Option<String>,
  pub product_uuid: Option<String>,
  pub feature_uuid: Option<String>,
  pub issue_type: Option<String>,
  /// Status uuid
  pub status: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// A workflow column of a product board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Status {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status_uuid: Option<String>,
  pub name: String,
  pub description: Option<String>,
  pub product_uuid: Option<String>,
  pub rank: Option<i64>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub comment_uuid: Option<String>,
  pub comment: String,
  pub product_uuid: Option<String>,
  /// Feature uuid the comment is attached to
  pub feature: Option<String>,
  /// Issue uuid the comment is attached to
  pub issue: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Budget {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub budget_uuid: Option<String>,
  pub product_uuid: Option<String>,
  pub total_budget: Option<f64>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskCategory {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category_uuid: Option<String>,
  pub category_name: String,
  pub product_uuid: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Board {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub board_uuid: Option<String>,
  pub name: String,
  pub product_uuid: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Punchlist {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub punchlist_uuid: Option<String>,
  pub title: String,
  pub description: Option<String>,
  pub product_uuid: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// A bug report row in the feedback sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bug {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bug_uuid: Option<String>,
  pub title: String,
  pub description: Option<String>,
  pub product_uuid: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}
