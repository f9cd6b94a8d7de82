use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A child slot of an instance: another instance (by id) or literal text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InstanceChild {
    Id { value: String },
    Text { value: String },
}

impl InstanceChild {
    #[inline]
    pub fn id(value: impl Into<String>) -> Self {
        Self::Id {
            value: value.into(),
        }
    }

    #[inline]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
        }
    }

    /// The instance id for `Id` children.
    #[inline]
    pub fn as_id(&self) -> Option<&str> {
        match self {
            Self::Id { value } => Some(value),
            Self::Text { .. } => None,
        }
    }
}

/// A node of the document tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: String,
    pub component: String,
    #[serde(default)]
    pub children: Vec<InstanceChild>,
}

impl Instance {
    pub fn new(id: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            component: component.into(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = InstanceChild>,
    {
        self.children.extend(children);
        self
    }

    /// Ids of the direct instance children, in order.
    pub fn child_ids(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.children.iter().filter_map(InstanceChild::as_id)
    }
}

/// `root_id` and every instance below it, depth first, parents before
/// children. Ids without an instance are listed but not descended into.
pub fn descendants(instances: &IndexMap<String, Instance>, root_id: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut stack = vec![root_id.to_owned()];
    while let Some(id) = stack.pop() {
        if found.contains(&id) {
            continue;
        }
        if let Some(instance) = instances.get(&id) {
            stack.extend(instance.child_ids().rev().map(str::to_owned));
        }
        found.push(id);
    }
    found
}

/// The instance whose child list contains `child_id`.
pub fn find_parent<'map>(
    instances: &'map IndexMap<String, Instance>,
    child_id: &str,
) -> Option<&'map Instance> {
    instances
        .values()
        .find(|instance| instance.child_ids().any(|id| id == child_id))
}
