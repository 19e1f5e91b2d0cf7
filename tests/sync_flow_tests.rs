//! End-to-end flows a screen-level consumer would drive: live
//! subscriptions feeding parsed documents, and optimistic mutations layered
//! over the repository with loading-state tracking.

use serde_json::json;
use shuttersync::{
    AppResult, KeyPath, ListDefinition, ListDocument, ListRepository, LoadingState,
    MemoryDocumentStore, MutationKind, RemoteDocumentStore, Scope, StandardItem, WriteMode,
    apply_optimistic,
};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

type StandardRepository = ListRepository<StandardItem, MemoryDocumentStore>;

fn repository(list_type: &str) -> (Arc<MemoryDocumentStore>, Arc<StandardRepository>) {
    let store = Arc::new(MemoryDocumentStore::new());
    let definition = ListDefinition::standard(list_type, "Flow list").unwrap();
    let repo = Arc::new(ListRepository::new(Arc::clone(&store), definition));
    (store, repo)
}

async fn seed(repo: &StandardRepository, scope: &Scope, items: Vec<StandardItem>) {
    let mut template = repo.get(&Scope::Template).await.unwrap();
    template.items = items;
    repo.create_or_reset(scope, &template).await.unwrap();
}

#[tokio::test]
async fn subscription_distinguishes_absent_from_failed() {
    let (store, repo) = repository("notes");
    let scope = Scope::user("u1");
    let (tx, mut rx) = mpsc::unbounded_channel();

    let handle = repo
        .subscribe(&scope, move |update: AppResult<Option<ListDocument<StandardItem>>>| {
            let _ = tx.send(update.map(|doc| doc.map(|d| d.items.len())));
        })
        .await
        .unwrap();

    // Not yet created: Ok(None), not an error.
    assert_eq!(rx.recv().await.unwrap().unwrap(), None);

    seed(&repo, &scope, vec![StandardItem::new("First note")]).await;
    assert_eq!(rx.recv().await.unwrap().unwrap(), Some(1));

    // A corrupt snapshot is delivered as a parse error, not dropped.
    store
        .write(
            &KeyPath::user_list("u1", "notes").unwrap(),
            json!({ "config": "garbage" }),
            WriteMode::Overwrite,
        )
        .await
        .unwrap();
    let update = rx.recv().await.unwrap();
    assert!(update.is_err());
    assert!(update.unwrap_err().is_validation());

    handle.unsubscribe();
}

#[tokio::test]
async fn optimistic_toggle_confirmed_by_the_repository() {
    let (_, repo) = repository("tasks");
    let scope = Scope::user("u1");
    seed(&repo, &scope, vec![StandardItem::new("Pack bags").with_id("i1")]).await;

    let current = repo.get(&scope).await.unwrap();
    let published: Arc<Mutex<Vec<bool>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&published);

    let confirm_repo = Arc::clone(&repo);
    let confirm_scope = scope.clone();
    let outcome = apply_optimistic(
        MutationKind::Update,
        &current,
        |list| {
            let mut next = list.clone();
            next.items[0].base.is_checked = true;
            next
        },
        move |list: &ListDocument<StandardItem>| {
            sink.lock().unwrap().push(list.items[0].base.is_checked);
        },
        |tentative| async move { confirm_repo.save(&confirm_scope, &tentative).await },
    )
    .await;

    assert!(outcome.is_ok());
    assert_eq!(*published.lock().unwrap(), vec![true]);

    let confirmed = repo.get(&scope).await.unwrap();
    assert!(confirmed.items[0].base.is_checked);
}

#[tokio::test]
async fn failed_optimistic_mutation_rolls_back_the_published_value() {
    let (store, repo) = repository("tasks");
    let scope = Scope::user("u1");
    let path = KeyPath::user_list("u1", "tasks").unwrap();
    seed(&repo, &scope, vec![StandardItem::new("Pack bags").with_id("i1")]).await;

    let current = repo.get(&scope).await.unwrap();
    let published: Arc<Mutex<Vec<bool>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&published);

    // Confirmation will fail at the store.
    store.inject_failure(&path, "unavailable").await;

    let confirm_repo = Arc::clone(&repo);
    let confirm_scope = scope.clone();
    let failure = apply_optimistic(
        MutationKind::Update,
        &current,
        |list| {
            let mut next = list.clone();
            next.items[0].base.is_checked = true;
            next
        },
        move |list: &ListDocument<StandardItem>| {
            sink.lock().unwrap().push(list.items[0].base.is_checked);
        },
        |tentative| async move { confirm_repo.save(&confirm_scope, &tentative).await },
    )
    .await
    .unwrap_err();

    // Tentative value first, then the exact prior value.
    assert_eq!(*published.lock().unwrap(), vec![true, false]);
    assert!(!failure.rollback.items[0].base.is_checked);
    assert!(failure.error.retryable);

    // The store was never touched.
    store.clear_failure(&path).await;
    let stored = repo.get(&scope).await.unwrap();
    assert!(!stored.items[0].base.is_checked);
}

#[tokio::test]
async fn loading_state_tracks_a_fetch_retry_cycle() {
    let (store, repo) = repository("tasks");
    let scope = Scope::user("u1");
    let path = KeyPath::user_list("u1", "tasks").unwrap();
    seed(&repo, &scope, vec![StandardItem::new("Pack bags")]).await;

    // First fetch succeeds.
    let mut state: LoadingState<ListDocument<StandardItem>> = LoadingState::Idle.start_loading();
    assert!(state.current_data().is_none());
    state = match repo.get(&scope).await {
        Ok(list) => state.succeed(list),
        Err(err) => state.fail(err),
    };
    assert!(state.is_success());

    // Refresh fails transiently; the stale list stays renderable.
    store.inject_failure(&path, "unavailable").await;
    state = state.start_loading();
    assert_eq!(state.current_data().unwrap().items.len(), 1);
    state = match repo.get(&scope).await {
        Ok(list) => state.succeed(list),
        Err(err) => state.fail(err),
    };
    assert!(state.is_error());
    assert_eq!(state.current_data().unwrap().items.len(), 1);
    assert!(state.error().unwrap().retryable);

    // Retry succeeds and replaces the retained value.
    store.clear_failure(&path).await;
    state = state.start_loading();
    state = match repo.get(&scope).await {
        Ok(list) => state.succeed(list),
        Err(err) => state.fail(err),
    };
    assert!(state.is_success());
    assert_eq!(state.current_data().unwrap().items.len(), 1);
}
