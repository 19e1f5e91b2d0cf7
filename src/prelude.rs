//! Recommended API entrypoints grouped by abstraction level.
//!
//! `sync` is the surface app code works against; `advanced` exposes the
//! lower seams for custom store bindings and schema work.

pub mod sync {
    //! Stable high-level surface: repositories, documents, loading state,
    //! optimistic mutations.
    pub use crate::{
        AppError, AppResult, ItemBase, ItemPatch, ListDefinition, ListDocument, ListItemModel,
        ListRepository, LoadingState, MutationKind, Scope, ScopeProvisioner, StandardItem,
        apply_optimistic,
    };
}

pub mod advanced {
    //! Escape hatch for store bindings, schema declarations and raw
    //! sanitization.
    pub use crate::keypath::KeyPath;
    pub use crate::remote::{
        MemoryDocumentStore, RemoteDocumentStore, RemoteFailure, SnapshotHandler, StoreResult,
        SubscriptionHandle, WriteMode, normalize_timestamps,
    };
    pub use crate::sanitize;
    pub use crate::schema::{
        FieldSpec, FieldType, ListSchema, SchemaCheck, standard_list_schema,
        validate_partial_with_schema, validate_with_schema,
    };
}
