//! Generic scoped-list repository.
//!
//! One engine serves every list-backed domain across the three ownership
//! scopes. Scope differences are confined to key-path builders supplied at
//! construction; sanitization, count recomputation and defensive parsing
//! live in exactly one place.
//!
//! Concurrency: overlapping operations against the same key path are not
//! ordered and there is no in-process locking or compare-and-swap; the last
//! write wins at the store. The system targets a single active editor per
//! entity, not concurrent multi-writer editing.

pub mod provision;

pub use provision::{ProvisionReport, ScopeProvisioner};

use crate::core::{AppError, AppResult};
use crate::keypath::KeyPath;
use crate::lists::{ItemPatch, ListDocument, ListItemModel, ListSource, patch_item};
use crate::remote::{
    RemoteDocumentStore, SubscriptionHandle, WriteMode, normalize_timestamps,
};
use crate::sanitize::remove_missing_values;
use crate::schema::{ListSchema, standard_list_schema, validate_with_schema};
use chrono::Utc;
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Ownership scope a repository call targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Template,
    User(String),
    Project(String),
}

impl Scope {
    pub fn user(id: impl Into<String>) -> Self {
        Scope::User(id.into())
    }

    pub fn project(id: impl Into<String>) -> Self {
        Scope::Project(id.into())
    }

    pub fn owner_id(&self) -> Option<&str> {
        match self {
            Scope::Template => None,
            Scope::User(id) | Scope::Project(id) => Some(id),
        }
    }

    pub fn source(&self) -> ListSource {
        match self {
            Scope::Template => ListSource::Master,
            Scope::User(_) => ListSource::User,
            Scope::Project(_) => ListSource::Project,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Scope::Template => "template",
            Scope::User(_) => "user",
            Scope::Project(_) => "project",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Template => f.write_str("template"),
            Scope::User(id) => write!(f, "user:{}", id),
            Scope::Project(id) => write!(f, "project:{}", id),
        }
    }
}

type TemplatePathFn = Arc<dyn Fn() -> AppResult<KeyPath> + Send + Sync>;
type OwnerPathFn = Arc<dyn Fn(&str) -> AppResult<KeyPath> + Send + Sync>;

/// Per-list-kind wiring for the repository: key-path builders for the three
/// scopes, the validation schema, and the kind tag.
///
/// Malformed definitions fail here, at construction; repository calls never
/// fail on configuration.
#[derive(Clone)]
pub struct ListDefinition {
    list_type: String,
    display_name: String,
    template_path: TemplatePathFn,
    user_path: OwnerPathFn,
    project_path: OwnerPathFn,
    schema: Arc<ListSchema>,
}

impl ListDefinition {
    pub fn new(
        list_type: impl Into<String>,
        display_name: impl Into<String>,
        template_path: TemplatePathFn,
        user_path: OwnerPathFn,
        project_path: OwnerPathFn,
        schema: ListSchema,
    ) -> AppResult<Self> {
        let list_type = list_type.into();
        let display_name = display_name.into();
        if list_type.is_empty() {
            return Err(AppError::validation(
                "List definition requires a non-empty list_type",
                "ListDefinition::new",
                None,
            ));
        }

        // Probe the builders once so a broken path function is caught now.
        template_path()?;
        user_path("probe")?;
        project_path("probe")?;

        Ok(Self {
            list_type,
            display_name,
            template_path,
            user_path,
            project_path,
            schema: Arc::new(schema),
        })
    }

    /// Definition using the conventional key-path layout
    /// (`master_lists/{kind}`, `users/{id}/lists/{kind}`,
    /// `projects/{id}/lists/{kind}`) and the standard list schema.
    pub fn standard(list_type: &str, display_name: &str) -> AppResult<Self> {
        let kind_for_template = list_type.to_string();
        let kind_for_user = list_type.to_string();
        let kind_for_project = list_type.to_string();
        Self::new(
            list_type,
            display_name,
            Arc::new(move || KeyPath::master_list(&kind_for_template)),
            Arc::new(move |user_id| KeyPath::user_list(user_id, &kind_for_user)),
            Arc::new(move |project_id| KeyPath::project_list(project_id, &kind_for_project)),
            standard_list_schema(list_type),
        )
    }

    pub fn list_type(&self) -> &str {
        &self.list_type
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn schema(&self) -> &ListSchema {
        &self.schema
    }

    fn path_for(&self, scope: &Scope) -> AppResult<KeyPath> {
        match scope {
            Scope::Template => (self.template_path)(),
            Scope::User(id) => (self.user_path)(id),
            Scope::Project(id) => (self.project_path)(id),
        }
    }
}

/// Behavior toggles, construction-time only.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// Run schema validation on every document read back from the store.
    pub validate_on_read: bool,
    /// Re-sanitize string fields on every read.
    pub sanitize_on_read: bool,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            validate_on_read: true,
            sanitize_on_read: true,
        }
    }
}

/// CRUD, batch mutation and subscription over one list kind in all three
/// scopes.
pub struct ListRepository<I, S> {
    store: Arc<S>,
    definition: ListDefinition,
    config: RepositoryConfig,
    _item: PhantomData<fn() -> I>,
}

impl<I, S> ListRepository<I, S>
where
    I: ListItemModel,
    S: RemoteDocumentStore,
{
    pub fn new(store: Arc<S>, definition: ListDefinition) -> Self {
        Self::with_config(store, definition, RepositoryConfig::default())
    }

    pub fn with_config(store: Arc<S>, definition: ListDefinition, config: RepositoryConfig) -> Self {
        Self {
            store,
            definition,
            config,
            _item: PhantomData,
        }
    }

    pub fn definition(&self) -> &ListDefinition {
        &self.definition
    }

    fn context(&self, method: &str, scope: &Scope) -> String {
        format!(
            "ListRepository::{}({}/{})",
            method,
            self.definition.list_type,
            scope.kind_name()
        )
    }

    /// Fetches the list at `scope`.
    ///
    /// A missing template synthesizes a default empty list; a missing
    /// user/project list is a not-found error; those must be explicitly
    /// created (see [`create_or_reset`](Self::create_or_reset)) before
    /// being read.
    pub async fn get(&self, scope: &Scope) -> AppResult<ListDocument<I>> {
        let context = self.context("get", scope);
        let path = self.definition.path_for(scope)?;
        let raw = self
            .store
            .read(&path)
            .await
            .map_err(|err| AppError::from_remote_store(&err, context.clone()))?;

        match raw {
            Some(raw) => parse_list_document(&self.definition.schema, &self.config, raw, &context),
            None if *scope == Scope::Template => Ok(ListDocument::new_master(
                self.definition.list_type.clone(),
                self.definition.display_name.clone(),
            )),
            None => Err(AppError::entity_not_found(context)),
        }
    }

    /// Persists `list` at `scope` with merge semantics, after sanitizing and
    /// recomputing the denormalized counts from the live arrays.
    pub async fn save(&self, scope: &Scope, list: &ListDocument<I>) -> AppResult<()> {
        let context = self.context("save", scope);
        let mut document = list.clone();
        document.sanitize();
        document.recompute_counts();
        document.config.updated_at = Utc::now();
        document.config.updated_by = scope.owner_id().map(str::to_string);

        let payload = encode_document(&document, &context)?;
        let path = self.definition.path_for(scope)?;
        self.store
            .write(&path, payload, WriteMode::Merge)
            .await
            .map_err(|err| AppError::from_remote_store(&err, context))
    }

    /// Instantiates (or wholesale resets) the list at `scope` from a source
    /// snapshot, typically a master template: re-attributes ownership,
    /// stamps fresh timestamps and overwrites the whole document.
    pub async fn create_or_reset(
        &self,
        scope: &Scope,
        source: &ListDocument<I>,
    ) -> AppResult<ListDocument<I>> {
        let context = self.context("create_or_reset", scope);
        let mut document = source.clone();
        document.reattribute(scope.source(), scope.owner_id(), Utc::now());
        document.sanitize();
        document.recompute_counts();

        let payload = encode_document(&document, &context)?;
        let path = self.definition.path_for(scope)?;
        self.store
            .write(&path, payload, WriteMode::Overwrite)
            .await
            .map_err(|err| AppError::from_remote_store(&err, context))?;
        Ok(document)
    }

    /// Appends one item. Rejects with a validation error, leaving the
    /// stored list untouched, when an item with the same id already exists.
    pub async fn add_item(&self, scope: &Scope, item: I) -> AppResult<()> {
        let context = self.context("add_item", scope);
        let mut item = item;
        item.sanitize();

        let mut list = self.get(scope).await?;
        if list.contains_item(item.id()) {
            return Err(AppError::validation(
                format!("Item '{}' already exists in this list", item.id()),
                context,
                None,
            ));
        }
        list.items.push(item);
        self.save(scope, &list).await
    }

    /// Removes the item with `item_id`. Absence is a no-op, not an error.
    pub async fn delete_item(&self, scope: &Scope, item_id: &str) -> AppResult<()> {
        let mut list = self.get(scope).await?;
        let before = list.items.len();
        list.items.retain(|item| item.id() != item_id);
        if list.items.len() == before {
            log::debug!(
                "delete_item: '{}' not present in {}/{}",
                item_id,
                self.definition.list_type,
                scope
            );
        }
        self.save(scope, &list).await
    }

    /// Applies identifier-addressed patches in one load/write cycle.
    ///
    /// Patches naming unknown ids are silently dropped (logged at debug);
    /// there is no error path for a missing patch target.
    pub async fn batch_update_items(&self, scope: &Scope, patches: &[ItemPatch]) -> AppResult<()> {
        if patches.is_empty() {
            return Ok(());
        }
        let context = self.context("batch_update_items", scope);
        let mut list = self.get(scope).await?;

        let index: HashMap<String, usize> = list
            .items
            .iter()
            .enumerate()
            .map(|(position, item)| (item.id().to_string(), position))
            .collect();

        for patch in patches {
            match index.get(&patch.id) {
                Some(&position) => {
                    list.items[position] = patch_item(&list.items[position], patch, &context)?;
                }
                None => {
                    log::debug!(
                        "batch_update_items: dropping patch for unknown item '{}' in {}/{}",
                        patch.id,
                        self.definition.list_type,
                        scope
                    );
                }
            }
        }

        self.save(scope, &list).await
    }

    /// Removes every listed id in a single load/write cycle. Unknown ids
    /// are ignored.
    pub async fn batch_delete_items(&self, scope: &Scope, item_ids: &[String]) -> AppResult<()> {
        if item_ids.is_empty() {
            return Ok(());
        }
        let mut list = self.get(scope).await?;
        let doomed: HashSet<&str> = item_ids.iter().map(String::as_str).collect();
        list.items.retain(|item| !doomed.contains(item.id()));
        self.save(scope, &list).await
    }

    /// Deletes the whole list document at `scope`. Deleting an absent
    /// document is a no-op. The template scope is refused: master lists are
    /// shared defaults, not per-owner state.
    pub async fn remove(&self, scope: &Scope) -> AppResult<()> {
        let context = self.context("remove", scope);
        if *scope == Scope::Template {
            return Err(AppError::validation(
                "Refusing to delete a master template list",
                context,
                None,
            ));
        }
        let path = self.definition.path_for(scope)?;
        self.store
            .delete(&path)
            .await
            .map_err(|err| AppError::from_remote_store(&err, context))
    }

    /// Registers a push listener for the list at `scope`. Every inbound
    /// snapshot runs the full defensive parse before delivery; an absent
    /// document is delivered as `Ok(None)` (not yet created, as opposed to
    /// failed to read). The caller owns the returned handle and must
    /// release it when the owning context goes away.
    pub async fn subscribe<F>(&self, scope: &Scope, mut on_update: F) -> AppResult<SubscriptionHandle>
    where
        F: FnMut(AppResult<Option<ListDocument<I>>>) + Send + 'static,
    {
        let context = self.context("subscribe", scope);
        let path = self.definition.path_for(scope)?;
        let schema = Arc::clone(&self.definition.schema);
        let config = self.config.clone();
        let handler_context = context.clone();

        let handler = Box::new(move |snapshot: crate::remote::StoreResult<Option<JsonValue>>| {
            let update = match snapshot {
                Err(raw) => Err(AppError::from_remote_store(&raw, handler_context.clone())),
                Ok(None) => Ok(None),
                Ok(Some(raw)) => {
                    parse_list_document(&schema, &config, raw, &handler_context).map(Some)
                }
            };
            on_update(update);
        });

        self.store
            .subscribe(&path, handler)
            .await
            .map_err(|err| AppError::from_remote_store(&err, context))
    }
}

/// The defensive-parse pipeline applied to every document read back from
/// the store: timestamp normalization, schema validation, typed
/// deserialization, re-sanitization. A document that fails any step is a
/// data-integrity failure, never silently coerced.
fn parse_list_document<I: ListItemModel>(
    schema: &ListSchema,
    config: &RepositoryConfig,
    mut raw: JsonValue,
    context: &str,
) -> AppResult<ListDocument<I>> {
    normalize_timestamps(&mut raw);

    let raw = if config.validate_on_read {
        validate_with_schema(schema, raw, context)?
    } else {
        raw
    };

    let mut document: ListDocument<I> = serde_json::from_value(raw).map_err(|err| {
        AppError::data_integrity(format!("stored document failed to decode: {}", err), context)
    })?;

    if config.sanitize_on_read {
        document.sanitize();
    }
    Ok(document)
}

/// Serializes a document for the wire, stripping unset-optional fields:
/// the store rejects writes carrying them.
fn encode_document<I: ListItemModel>(
    document: &ListDocument<I>,
    context: &str,
) -> AppResult<JsonValue> {
    let mut payload = serde_json::to_value(document).map_err(|err| {
        AppError::data_integrity(format!("document failed to serialize: {}", err), context)
    })?;
    remove_missing_values(&mut payload);
    Ok(payload)
}
