//! Whole-scope provisioning across heterogeneous list kinds.
//!
//! When a user signs up or a project is created, every registered list kind
//! is instantiated from its master template in one call. Kinds are
//! registered behind boxed closures so repositories with different item
//! types can live in one registry.

use super::{ListRepository, Scope};
use crate::core::{AppError, AppResult, BatchFailure, ErrorCode};
use crate::lists::ListItemModel;
use crate::remote::RemoteDocumentStore;
use futures::future::BoxFuture;
use std::sync::Arc;

type ProvisionFn = Arc<dyn Fn(Scope) -> BoxFuture<'static, AppResult<()>> + Send + Sync>;
type DecommissionFn = Arc<dyn Fn(Scope) -> BoxFuture<'static, AppResult<()>> + Send + Sync>;

struct ListRegistration {
    list_type: String,
    provision: ProvisionFn,
    decommission: DecommissionFn,
}

/// Kinds provisioned for a scope, in registration order.
#[derive(Debug, Clone)]
pub struct ProvisionReport {
    pub provisioned: Vec<String>,
}

/// Registry of list kinds that make up a complete user/project scope.
#[derive(Default)]
pub struct ScopeProvisioner {
    registrations: Vec<ListRegistration>,
}

impl ScopeProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a list kind. Provisioning reads the kind's master template
    /// and create-or-resets the target scope from it.
    pub fn register<I, S>(&mut self, repository: Arc<ListRepository<I, S>>)
    where
        I: ListItemModel,
        S: RemoteDocumentStore + 'static,
    {
        let list_type = repository.definition().list_type().to_string();

        let provision_repo = Arc::clone(&repository);
        let provision: ProvisionFn = Arc::new(move |scope: Scope| {
            let repository = Arc::clone(&provision_repo);
            Box::pin(async move {
                let template = repository.get(&Scope::Template).await?;
                repository.create_or_reset(&scope, &template).await?;
                Ok(())
            })
        });

        let decommission_repo = repository;
        let decommission: DecommissionFn = Arc::new(move |scope: Scope| {
            let repository = Arc::clone(&decommission_repo);
            Box::pin(async move { repository.remove(&scope).await })
        });

        self.registrations.push(ListRegistration {
            list_type,
            provision,
            decommission,
        });
    }

    pub fn registered_kinds(&self) -> Vec<&str> {
        self.registrations
            .iter()
            .map(|registration| registration.list_type.as_str())
            .collect()
    }

    /// Instantiates (or resets) every registered kind for `scope` from its
    /// master template. Kinds fail independently; any failure yields an
    /// aggregated error carrying the per-kind breakdown, retryable iff any
    /// constituent failure is.
    pub async fn provision(&self, scope: &Scope) -> AppResult<ProvisionReport> {
        let context = format!("ScopeProvisioner::provision({})", scope);
        if *scope == Scope::Template {
            return Err(AppError::validation(
                "Cannot provision the template scope from itself",
                context,
                None,
            ));
        }

        let mut provisioned = Vec::new();
        let mut failures = Vec::new();

        for registration in &self.registrations {
            match (registration.provision)(scope.clone()).await {
                Ok(()) => provisioned.push(registration.list_type.clone()),
                Err(error) => {
                    log::warn!(
                        "provision failed for '{}' at {}: {}",
                        registration.list_type,
                        scope,
                        error
                    );
                    failures.push(BatchFailure {
                        operation: registration.list_type.clone(),
                        error,
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(ProvisionReport { provisioned })
        } else {
            let failed = failures.len();
            let total = self.registrations.len();
            Err(AppError::aggregated(
                ErrorCode::BatchPartialFailure,
                format!("{} of {} list(s) failed to provision", failed, total),
                "Some of your lists could not be set up. Please try again.",
                context,
                failures,
                provisioned.len(),
            ))
        }
    }

    /// Removes every registered kind's document for `scope`.
    ///
    /// Cleanup failures are logged and skipped rather than failing the
    /// operation: a half-decommissioned scope re-runs cleanly, and the next
    /// provision overwrites whatever was left behind. Returns the number of
    /// kinds actually removed.
    pub async fn decommission(&self, scope: &Scope) -> AppResult<usize> {
        let context = format!("ScopeProvisioner::decommission({})", scope);
        if *scope == Scope::Template {
            return Err(AppError::validation(
                "Refusing to decommission the template scope",
                context,
                None,
            ));
        }

        let mut removed = 0usize;
        for registration in &self.registrations {
            match (registration.decommission)(scope.clone()).await {
                Ok(()) => removed += 1,
                Err(error) => {
                    log::warn!(
                        "decommission cleanup failed for '{}' at {}: {}",
                        registration.list_type,
                        scope,
                        error
                    );
                }
            }
        }
        Ok(removed)
    }
}
