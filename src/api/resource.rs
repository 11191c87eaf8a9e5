//! Where each resource lives and which cached lists it belongs to.

use serde::{de::DeserializeOwned, Serialize};

use crate::cache::QueryKey;
use crate::config::ServiceTarget;

use super::types::{
  Board, Budget, Bug, Comment, CoreUser, Feature, Issue, Organization, Product, Punchlist, Release,
  Status, TaskCategory,
};

/// Lists keyed by product uuid.
pub const PRODUCT_SCOPED_QUERIES: &[&str] = &[
  Release::QUERY_NAME,
  Feature::QUERY_NAME,
  Issue::QUERY_NAME,
  Status::QUERY_NAME,
  Comment::QUERY_NAME,
  Budget::QUERY_NAME,
  TaskCategory::QUERY_NAME,
  Board::QUERY_NAME,
  Punchlist::QUERY_NAME,
  Bug::QUERY_NAME,
];

/// A backend REST resource.
pub trait Resource: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
  /// Singular name used in alerts (e.g. "feature")
  const LABEL: &'static str;

  /// First segment of the list query key (e.g. "allFeatures")
  const QUERY_NAME: &'static str;

  const SERVICE: ServiceTarget;

  /// Collection path relative to the service base, with trailing slash
  const PATH: &'static str;

  /// Query parameter and field naming the parent the list is scoped to
  const PARENT_FIELD: Option<&'static str>;

  /// Other lists under the same parent whose data embeds this resource
  const RELATED: &'static [&'static str] = &[];

  fn uuid(&self) -> Option<&str>;

  fn parent_uuid(&self) -> Option<&str>;

  /// Key of the list under `parent`, or of every list when unscoped.
  fn list_key(parent: Option<&str>) -> QueryKey {
    match (Self::PARENT_FIELD, parent) {
      (Some(_), Some(parent)) => QueryKey::list(Self::QUERY_NAME, parent),
      _ => QueryKey::new([Self::QUERY_NAME]),
    }
  }

  /// Every key a write to this entity could have made stale.
  fn affected_keys(&self) -> Vec<QueryKey> {
    let parent = self.parent_uuid().filter(|p| !is_blank(p));
    std::iter::once(Self::QUERY_NAME)
      .chain(Self::RELATED.iter().copied())
      .map(|name| match parent {
        Some(parent) => QueryKey::list(name, parent),
        None => QueryKey::new([name]),
      })
      .collect()
  }
}

/// Identifiers that mean "nothing selected yet".
pub fn is_blank(id: &str) -> bool {
  matches!(id.trim(), "" | "0" | "null" | "undefined")
}

impl Resource for Organization {
  const LABEL: &'static str = "organization";
  const QUERY_NAME: &'static str = "allOrganizations";
  const SERVICE: ServiceTarget = ServiceTarget::Main;
  const PATH: &'static str = "organization/";
  const PARENT_FIELD: Option<&'static str> = None;

  fn uuid(&self) -> Option<&str> {
    self.organization_uuid.as_deref()
  }

  fn parent_uuid(&self) -> Option<&str> {
    None
  }
}

impl Resource for CoreUser {
  const LABEL: &'static str = "user";
  const QUERY_NAME: &'static str = "allCoreUsers";
  const SERVICE: ServiceTarget = ServiceTarget::Main;
  const PATH: &'static str = "coreuser/";
  const PARENT_FIELD: Option<&'static str> = Some("organization_uuid");

  fn uuid(&self) -> Option<&str> {
    self.core_user_uuid.as_deref()
  }

  fn parent_uuid(&self) -> Option<&str> {
    self.organization_uuid.as_deref()
  }
}

impl Resource for Product {
  const LABEL: &'static str = "product";
  const QUERY_NAME: &'static str = "allProducts";
  const SERVICE: ServiceTarget = ServiceTarget::Product;
  const PATH: &'static str = "product/";
  const PARENT_FIELD: Option<&'static str> = Some("organization_uuid");

  fn uuid(&self) -> Option<&str> {
    self.product_uuid.as_deref()
  }

  fn parent_uuid(&self) -> Option<&str> {
    self.organization_uuid.as_deref()
  }
}

impl Resource for Release {
  const LABEL: &'static str = "release";
  const QUERY_NAME: &'static str = "allReleases";
  const SERVICE: ServiceTarget = ServiceTarget::Release;
  const PATH: &'static str = "release/";
  const PARENT_FIELD: Option<&'static str> = Some("product_uuid");
  // Features are listed per release
  const RELATED: &'static [&'static str] = &[Feature::QUERY_NAME];

  fn uuid(&self) -> Option<&str> {
    self.release_uuid.as_deref()
  }

  fn parent_uuid(&self) -> Option<&str> {
    self.product_uuid.as_deref()
  }
}

impl Resource for Feature {
  const LABEL: &'static str = "feature";
  const QUERY_NAME: &'static str = "allFeatures";
  const SERVICE: ServiceTarget = ServiceTarget::Release;
  const PATH: &'static str = "feature/";
  const PARENT_FIELD: Option<&'static str> = Some("product_uuid");
  const RELATED: &'static [&'static str] = &[Issue::QUERY_NAME, Release::QUERY_NAME];

  fn uuid(&self) -> Option<&str> {
    self.feature_uuid.as_deref()
  }

  fn parent_uuid(&self) -> Option<&str> {
    self.product_uuid.as_deref()
  }
}

impl Resource for Issue {
  const LABEL: &'static str = "issue";
  const QUERY_NAME: &'static str = "allIssues";
  const SERVICE: ServiceTarget = ServiceTarget::Release;
  const PATH: &'static str = "issue/";
  const PARENT_FIELD: Option<&'static str> = Some("product_uuid");

  fn uuid(&self) -> Option<&str> {
    self.issue_uuid.as_deref()
  }

  fn parent_uuid(&self) -> Option<&str> {
    self.product_uuid.as_deref()
  }
}

impl Resource for Status {
  const LABEL: &'static str = "status";
  const QUERY_NAME: &'static str = "allStatuses";
  const SERVICE: ServiceTarget = ServiceTarget::Release;
  const PATH: &'static str = "status/";
  const PARENT_FIELD: Option<&'static str> = Some("product_uuid");
  // Board columns are derived from statuses
  const RELATED: &'static [&'static str] = &[Feature::QUERY_NAME, Issue::QUERY_NAME];

  fn uuid(&self) -> Option<&str> {
    self.status_uuid.as_deref()
  }

  fn parent_uuid(&self) -> Option<&str> {
    self.product_uuid.as_deref()
  }
}

impl Resource for Comment {
  const LABEL: &'static str = "comment";
  const QUERY_NAME: &'static str = "allComments";
  const SERVICE: ServiceTarget = ServiceTarget::Release;
  const PATH: &'static str = "comment/";
  const PARENT_FIELD: Option<&'static str> = Some("product_uuid");

  fn uuid(&self) -> Option<&str> {
    self.comment_uuid.as_deref()
  }

  fn parent_uuid(&self) -> Option<&str> {
    self.product_uuid.as_deref()
  }
}

impl Resource for Budget {
  const LABEL: &'static str = "budget";
  const QUERY_NAME: &'static str = "allBudgets";
  const SERVICE: ServiceTarget = ServiceTarget::Product;
  const PATH: &'static str = "budget/";
  const PARENT_FIELD: Option<&'static str> = Some("product_uuid");

  fn uuid(&self) -> Option<&str> {
    self.budget_uuid.as_deref()
  }

  fn parent_uuid(&self) -> Option<&str> {
    self.product_uuid.as_deref()
  }
}

impl Resource for TaskCategory {
  const LABEL: &'static str = "task category";
  const QUERY_NAME: &'static str = "allTaskCategories";
  const SERVICE: ServiceTarget = ServiceTarget::Product;
  const PATH: &'static str = "task_category/";
  const PARENT_FIELD: Option<&'static str> = Some("product_uuid");
  const RELATED: &'static [&'static str] = &[Budget::QUERY_NAME];

  fn uuid(&self) -> Option<&str> {
    self.category_uuid.as_deref()
  }

  fn parent_uuid(&self) -> Option<&str> {
    self.product_uuid.as_deref()
  }
}

impl Resource for Board {
  const LABEL: &'static str = "board";
  const QUERY_NAME: &'static str = "allBoards";
  const SERVICE: ServiceTarget = ServiceTarget::CollabHub;
  const PATH: &'static str = "board/";
  const PARENT_FIELD: Option<&'static str> = Some("product_uuid");

  fn uuid(&self) -> Option<&str> {
    self.board_uuid.as_deref()
  }

  fn parent_uuid(&self) -> Option<&str> {
    self.product_uuid.as_deref()
  }
}

impl Resource for Punchlist {
  const LABEL: &'static str = "punchlist";
  const QUERY_NAME: &'static str = "allPunchlists";
  const SERVICE: ServiceTarget = ServiceTarget::Release;
  const PATH: &'static str = "punchlist/";
  const PARENT_FIELD: Option<&'static str> = Some("product_uuid");

  fn uuid(&self) -> Option<&str> {
    self.punchlist_uuid.as_deref()
  }

  fn parent_uuid(&self) -> Option<&str> {
    self.product_uuid.as_deref()
  }
}

impl Resource for Bug {
  const LABEL: &'static str = "bug";
  const QUERY_NAME: &'static str = "allBugs";
  const SERVICE: ServiceTarget = ServiceTarget::FeedbackSheet;
  const PATH: &'static str = "";
  const PARENT_FIELD: Option<&'static str> = Some("product_uuid");

  fn uuid(&self) -> Option<&str> {
    self.bug_uuid.as_deref()
  }

  fn parent_uuid(&self) -> Option<&str> {
    self.product_uuid.as_deref()
  }
}
