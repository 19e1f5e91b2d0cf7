//! List-backed domain documents.
//!
//! Every list-backed collection (tasks, kit, shots, vendors, notes, tags,
//! key people) shares this shape: a `config` header, `categories`, and
//! `items` carrying a common base plus domain-specific fields. The
//! repository layer operates on `ListDocument<I>` generically; domain
//! crates supply their own `I: ListItemModel`.

use crate::core::{AppError, AppResult};
use crate::sanitize::{sanitize_json_strings, sanitize_string};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::HashSet;
use uuid::Uuid;

/// Ownership scope a list instance belongs to. A list is exactly one of
/// these for its whole lifetime; moving content across scopes goes through
/// a wholesale create-or-reset, never a mutation of `source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListSource {
    Master,
    User,
    Project,
}

/// Identity, attribution and denormalized counts for a list.
///
/// `total_categories`/`total_items` are recomputed from the live arrays on
/// every write; values supplied by callers are never trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConfig {
    pub id: String,
    pub name: String,
    pub list_type: String,
    pub source: ListSource,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub total_categories: usize,
    pub total_items: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sort_order: i64,
}

/// Fields shared by every list item across all domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemBase {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub item_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_description: Option<String>,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default)]
    pub is_checked: bool,
    #[serde(default)]
    pub is_disabled: bool,
}

impl ItemBase {
    pub fn new(item_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            category_id: None,
            item_name: item_name.into(),
            item_description: None,
            is_custom: false,
            is_checked: false,
            is_disabled: false,
        }
    }

    fn sanitize(&mut self) {
        self.item_name = sanitize_string(&self.item_name);
        if let Some(description) = self.item_description.take() {
            let cleaned = sanitize_string(&description);
            self.item_description = (!cleaned.is_empty()).then_some(cleaned);
        }
    }
}

/// Seam between the generic repository and domain item types.
pub trait ListItemModel:
    Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{
    fn base(&self) -> &ItemBase;
    fn base_mut(&mut self) -> &mut ItemBase;

    fn id(&self) -> &str {
        &self.base().id
    }

    /// Normalizes the item in place. The default cleans the shared base;
    /// domain types override to also clean their own fields.
    fn sanitize(&mut self) {
        self.base_mut().sanitize();
    }
}

/// Item type with no compiled-in domain fields: the shared base plus a
/// free-form field map. Domains that want typed extras define their own
/// model instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardItem {
    #[serde(flatten)]
    pub base: ItemBase,
    #[serde(flatten)]
    pub fields: JsonMap<String, JsonValue>,
}

impl StandardItem {
    pub fn new(item_name: impl Into<String>) -> Self {
        Self {
            base: ItemBase::new(item_name),
            fields: JsonMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.base.id = id.into();
        self
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.base.category_id = Some(category_id.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.fields.insert(key.into(), value);
        self
    }
}

impl ListItemModel for StandardItem {
    fn base(&self) -> &ItemBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ItemBase {
        &mut self.base
    }

    fn sanitize(&mut self) {
        self.base.sanitize();
        for (_, value) in self.fields.iter_mut() {
            sanitize_json_strings(value);
        }
    }
}

/// One list instance: header, categories, items, and identifiers of
/// mutations applied locally but not yet confirmed by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDocument<I> {
    pub config: ListConfig,
    pub categories: Vec<ListCategory>,
    pub items: Vec<I>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending_updates: Vec<String>,
}

impl<I: ListItemModel> ListDocument<I> {
    /// Empty master-scope list, as synthesized when a template document has
    /// not been created yet.
    pub fn new_master(list_type: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            config: ListConfig {
                id: Uuid::new_v4().to_string(),
                name: name.into(),
                list_type: list_type.into(),
                source: ListSource::Master,
                version: 1,
                created_by: None,
                updated_by: None,
                created_at: now,
                updated_at: now,
                total_categories: 0,
                total_items: 0,
            },
            categories: Vec::new(),
            items: Vec::new(),
            pending_updates: Vec::new(),
        }
    }

    pub fn contains_item(&self, item_id: &str) -> bool {
        self.items.iter().any(|item| item.id() == item_id)
    }

    pub fn find_item(&self, item_id: &str) -> Option<&I> {
        self.items.iter().find(|item| item.id() == item_id)
    }

    /// Re-derives the denormalized counts from the live item array:
    /// `total_items` is the item count, `total_categories` the number of
    /// distinct non-empty category ids actually referenced by items.
    pub fn recompute_counts(&mut self) {
        self.config.total_items = self.items.len();
        let referenced: HashSet<&str> = self
            .items
            .iter()
            .filter_map(|item| item.base().category_id.as_deref())
            .filter(|id| !id.is_empty())
            .collect();
        self.config.total_categories = referenced.len();
    }

    /// Normalizes every string field on the config, categories and items.
    pub fn sanitize(&mut self) {
        self.config.name = sanitize_string(&self.config.name);
        self.config.list_type = sanitize_string(&self.config.list_type);
        for category in &mut self.categories {
            category.name = sanitize_string(&category.name);
        }
        for item in &mut self.items {
            item.sanitize();
        }
    }

    /// Re-homes this document under a new owner scope: used when a
    /// user/project list is instantiated (or reset) from a template
    /// snapshot. Fresh identity stamps, fresh timestamps, version reset.
    pub fn reattribute(&mut self, source: ListSource, actor: Option<&str>, now: DateTime<Utc>) {
        self.config.source = source;
        self.config.version = 1;
        self.config.created_by = actor.map(str::to_string);
        self.config.updated_by = actor.map(str::to_string);
        self.config.created_at = now;
        self.config.updated_at = now;
        self.pending_updates.clear();
    }
}

/// Identifier-addressed partial update for one item: the listed fields are
/// merged over the item's serialized form. The `id` key itself is never
/// patchable.
#[derive(Debug, Clone)]
pub struct ItemPatch {
    pub id: String,
    pub fields: JsonMap<String, JsonValue>,
}

impl ItemPatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: JsonMap::new(),
        }
    }

    pub fn set(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.fields.insert(key.into(), value);
        self
    }
}

/// Applies a patch to a single item via its serialized form, so patches
/// reach domain-specific fields the generic layer knows nothing about. A
/// patch producing an undeserializable item is a validation failure.
pub fn patch_item<I: ListItemModel>(item: &I, patch: &ItemPatch, context: &str) -> AppResult<I> {
    let mut raw = serde_json::to_value(item)
        .map_err(|err| AppError::data_integrity(format!("item serialization failed: {}", err), context))?;

    let Some(map) = raw.as_object_mut() else {
        return Err(AppError::data_integrity("item did not serialize to an object", context));
    };

    for (key, value) in &patch.fields {
        if key == "id" {
            log::debug!("ignoring attempt to patch item id '{}'", patch.id);
            continue;
        }
        map.insert(key.clone(), value.clone());
    }

    let mut patched: I = serde_json::from_value(raw).map_err(|err| {
        AppError::validation(
            format!("patch for item '{}' produced an invalid item: {}", patch.id, err),
            context,
            None,
        )
    })?;
    patched.sanitize();
    Ok(patched)
}
