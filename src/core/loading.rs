//! Fetch/mutation lifecycle tracking that never forgets the last good value.
//!
//! Consumers render `current_data()` under a spinner or error banner instead
//! of blanking the screen between refreshes.

use super::error::AppError;

/// Four-phase state of an asynchronous fetch.
///
/// Entering `Loading` or `Error` always carries the previously successful
/// value forward; no transition discards data. Every state is re-enterable,
/// so repeated fetch/retry cycles run through the same machine.
#[derive(Debug, Clone)]
pub enum LoadingState<T> {
    /// Nothing requested yet.
    Idle,
    /// A request is in flight; `previous` is the last successful value.
    Loading { previous: Option<T> },
    /// The most recent request completed with a valid payload.
    Success { data: T },
    /// The most recent request failed; `previous` is retained for display.
    Error {
        error: AppError,
        previous: Option<T>,
    },
}

impl<T> Default for LoadingState<T> {
    fn default() -> Self {
        LoadingState::Idle
    }
}

impl<T> LoadingState<T> {
    /// Transition into `Loading`, carrying the current best value forward.
    pub fn start_loading(self) -> Self {
        LoadingState::Loading {
            previous: self.into_current_data(),
        }
    }

    /// Transition into `Success` with a fresh payload.
    pub fn succeed(self, data: T) -> Self {
        LoadingState::Success { data }
    }

    /// Transition into `Error`, retaining whatever value was held before.
    pub fn fail(self, error: AppError) -> Self {
        LoadingState::Error {
            error,
            previous: self.into_current_data(),
        }
    }

    /// Best-available data regardless of phase: the payload when `Success`,
    /// the retained previous value when `Loading`/`Error`, otherwise `None`.
    pub fn current_data(&self) -> Option<&T> {
        match self {
            LoadingState::Idle => None,
            LoadingState::Loading { previous } => previous.as_ref(),
            LoadingState::Success { data } => Some(data),
            LoadingState::Error { previous, .. } => previous.as_ref(),
        }
    }

    /// Owning variant of [`current_data`](Self::current_data).
    pub fn into_current_data(self) -> Option<T> {
        match self {
            LoadingState::Idle => None,
            LoadingState::Loading { previous } => previous,
            LoadingState::Success { data } => Some(data),
            LoadingState::Error { previous, .. } => previous,
        }
    }

    pub fn error(&self) -> Option<&AppError> {
        match self {
            LoadingState::Error { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, LoadingState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadingState::Loading { .. })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LoadingState::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LoadingState::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some_error() -> AppError {
        AppError::validation("boom", "test", None)
    }

    #[test]
    fn idle_has_no_data() {
        let state: LoadingState<i32> = LoadingState::Idle;
        assert!(state.is_idle());
        assert_eq!(state.current_data(), None);
    }

    #[test]
    fn first_load_carries_no_previous() {
        let state: LoadingState<i32> = LoadingState::Idle.start_loading();
        assert!(state.is_loading());
        assert_eq!(state.current_data(), None);
    }

    #[test]
    fn refetch_preserves_last_success() {
        let state = LoadingState::Idle.succeed(41).start_loading();
        assert!(state.is_loading());
        assert_eq!(state.current_data(), Some(&41));

        let state = state.succeed(42);
        assert_eq!(state.current_data(), Some(&42));
    }

    #[test]
    fn failure_preserves_last_success() {
        let state = LoadingState::Idle.succeed(7).start_loading().fail(some_error());
        assert!(state.is_error());
        assert_eq!(state.current_data(), Some(&7));
        assert!(state.error().is_some());
    }

    #[test]
    fn retry_after_failure_keeps_previous_data() {
        let state = LoadingState::Idle
            .succeed(7)
            .fail(some_error())
            .start_loading();
        assert!(state.is_loading());
        assert_eq!(state.current_data(), Some(&7));
    }

    #[test]
    fn failure_on_first_load_has_no_previous() {
        let state: LoadingState<i32> = LoadingState::Idle.start_loading().fail(some_error());
        assert!(state.is_error());
        assert_eq!(state.current_data(), None);
    }

    #[test]
    fn machine_is_reenterable() {
        let mut state = LoadingState::Idle;
        for round in 0..3 {
            state = state.start_loading().succeed(round);
            assert_eq!(state.current_data(), Some(&round));
        }
    }
}
