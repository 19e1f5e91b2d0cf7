//! Optimistic mutation with automatic rollback.
//!
//! A consumer observing this engine never sees a permanently inconsistent
//! state: every optimistic application is matched by either an
//! authoritative refresh (the confirm operation's responsibility) or a
//! rollback to the exact prior value. The two outcomes are mutually
//! exclusive and exhaustive.

use crate::core::{AppError, AppResult};
use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Add,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Pending,
    Succeeded,
    Failed,
}

/// Record of one optimistic mutation. Created when the mutation starts and
/// discarded when the call returns; it never outlives the call.
#[derive(Debug, Clone)]
pub struct OptimisticUpdate<T> {
    pub kind: MutationKind,
    pub status: MutationStatus,
    pub applied: T,
    pub rollback: T,
}

/// Failure outcome: the mapped error plus the value that was re-published
/// during rollback, for error hooks that want to inspect it.
#[derive(Debug)]
pub struct OptimisticFailure<T> {
    pub error: AppError,
    pub rollback: T,
}

impl<T> From<OptimisticFailure<T>> for AppError {
    fn from(failure: OptimisticFailure<T>) -> Self {
        failure.error
    }
}

/// Applies a mutation optimistically.
///
/// 1. `make_next` derives the tentative value from `current`;
/// 2. `publish` pushes it to the consumer immediately, before confirmation;
/// 3. `operation` confirms against the store. On success the operation is
///    responsible for re-fetching/publishing the authoritative value; the
///    store may normalize fields, so the tentative value is never assumed
///    confirmed as-is;
/// 4. on failure the exact pre-optimistic value is re-published and the
///    mapped error is surfaced together with the rollback value.
pub async fn apply_optimistic<T, N, P, Op, Fut>(
    kind: MutationKind,
    current: &T,
    make_next: N,
    mut publish: P,
    operation: Op,
) -> Result<OptimisticUpdate<T>, OptimisticFailure<T>>
where
    T: Clone,
    N: FnOnce(&T) -> T,
    P: FnMut(&T),
    Op: FnOnce(T) -> Fut,
    Fut: Future<Output = AppResult<()>>,
{
    let rollback = current.clone();
    let applied = make_next(current);
    publish(&applied);

    let mut update = OptimisticUpdate {
        kind,
        status: MutationStatus::Pending,
        applied: applied.clone(),
        rollback: rollback.clone(),
    };

    match operation(applied).await {
        Ok(()) => {
            update.status = MutationStatus::Succeeded;
            Ok(update)
        }
        Err(error) => {
            publish(&rollback);
            log::debug!("optimistic {:?} rolled back: {}", kind, error);
            Err(OptimisticFailure { error, rollback })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn published() -> (Arc<Mutex<Vec<i32>>>, impl FnMut(&i32)) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        (log, move |value: &i32| sink.lock().unwrap().push(*value))
    }

    #[test]
    fn success_keeps_the_applied_value_published() {
        let (log, publish) = published();
        let update = tokio_test::block_on(apply_optimistic(
            MutationKind::Update,
            &1,
            |current| current + 10,
            publish,
            |_| async { Ok(()) },
        ))
        .unwrap();

        assert_eq!(update.status, MutationStatus::Succeeded);
        assert_eq!(update.applied, 11);
        assert_eq!(update.rollback, 1);
        assert_eq!(*log.lock().unwrap(), vec![11]);
    }

    #[test]
    fn failure_republishes_the_exact_prior_value() {
        let (log, publish) = published();
        let failure = tokio_test::block_on(apply_optimistic(
            MutationKind::Delete,
            &7,
            |_| 0,
            publish,
            |_| async { Err(AppError::validation("rejected", "test", None)) },
        ))
        .unwrap_err();

        assert_eq!(failure.rollback, 7);
        assert!(failure.error.is_validation());
        // Tentative value first, then the rollback.
        assert_eq!(*log.lock().unwrap(), vec![0, 7]);
    }

    #[test]
    fn operation_receives_the_tentative_value() {
        let (_, publish) = published();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);

        tokio_test::block_on(apply_optimistic(
            MutationKind::Add,
            &2,
            |current| current * 3,
            publish,
            move |tentative| {
                *sink.lock().unwrap() = Some(tentative);
                async { Ok(()) }
            },
        ))
        .unwrap();

        assert_eq!(*seen.lock().unwrap(), Some(6));
    }

    #[test]
    fn failure_converts_into_app_error() {
        let (_, publish) = published();
        let result: AppResult<()> = tokio_test::block_on(async {
            apply_optimistic(
                MutationKind::Update,
                &1,
                |c| *c,
                publish,
                |_| async { Err(AppError::validation("nope", "test", None)) },
            )
            .await?;
            Ok(())
        });
        assert!(result.is_err());
    }
}
