//! shuttersync: data-synchronization core for photography-event workflows.
//!
//! Layered pipeline between app screens and the remote document store:
//! Result/error primitives -> loading-state machine -> schema validation ->
//! generic scoped-list repository -> optimistic-update engine.
//!
//! # Quick start
//!
//! ```no_run
//! use shuttersync::{ListDefinition, ListRepository, MemoryDocumentStore, Scope, StandardItem};
//! use std::sync::Arc;
//!
//! # async fn demo() -> shuttersync::AppResult<()> {
//! let store = Arc::new(MemoryDocumentStore::new());
//! let repo: ListRepository<StandardItem, _> =
//!     ListRepository::new(store, ListDefinition::standard("tasks", "Tasks")?);
//!
//! // Missing templates synthesize an empty default.
//! let template = repo.get(&Scope::Template).await?;
//!
//! // Instantiate a user's list from the template, then work against it.
//! let scope = Scope::user("u1");
//! repo.create_or_reset(&scope, &template).await?;
//! repo.add_item(&scope, StandardItem::new("Charge batteries")).await?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod keypath;
pub mod lists;
pub mod optimistic;
pub mod prelude;
pub mod remote;
pub mod repo;
pub mod sanitize;
pub mod schema;

// Re-export main types for convenience
pub use crate::core::{
    AppError, AppResult, BatchFailure, BatchReport, ErrorCode, ErrorKind, FieldIssue,
    LoadingState,
};
pub use crate::keypath::KeyPath;
pub use crate::lists::{
    ItemBase, ItemPatch, ListCategory, ListConfig, ListDocument, ListItemModel, ListSource,
    StandardItem,
};
pub use crate::optimistic::{
    MutationKind, MutationStatus, OptimisticFailure, OptimisticUpdate, apply_optimistic,
};
pub use crate::remote::{
    MemoryDocumentStore, RemoteDocumentStore, RemoteFailure, SubscriptionHandle, WriteMode,
};
pub use crate::repo::{
    ListDefinition, ListRepository, ProvisionReport, RepositoryConfig, Scope, ScopeProvisioner,
};
pub use crate::schema::{FieldSpec, FieldType, ListSchema, SchemaCheck, standard_list_schema};
