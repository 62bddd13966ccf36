//! Integration tests for the live task board over the in-process store.
//!
//! Covers the board lifecycle end to end:
//! - Created tasks arrive through the live query, not a local insert
//! - Title ordering and sort switches
//! - Exactly one listener while active, none after leaving
//! - Updates and deletes, including missing documents

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use stickywall::board::{Board, BoardError, SortOrder};
use stickywall::store::memory::MemoryStore;
use stickywall::store::{DocumentStore, StoreError};
use stickywall_proto::task::{NewTask, TASKS_COLLECTION, TaskColor, TaskId};

fn board_over(store: &MemoryStore) -> Board<MemoryStore> {
    Board::with_rng(Arc::new(store.clone()), StdRng::seed_from_u64(42))
}

fn new_task(title: &str) -> NewTask {
    NewTask {
        title: title.to_string(),
        description: String::new(),
        due_date: String::new(),
        completed: false,
        created_at: 1,
        color: TaskColor::Orange,
    }
}

async fn settle(board: &mut Board<MemoryStore>) {
    tokio::time::timeout(Duration::from_secs(5), board.next_snapshot())
        .await
        .expect("snapshot timed out")
        .unwrap();
    board.poll_snapshots();
}

fn titles(board: &Board<MemoryStore>) -> Vec<String> {
    board
        .state()
        .tasks()
        .iter()
        .map(|t| t.title.clone())
        .collect()
}

// =============================================================================
// Creating tasks
// =============================================================================

#[tokio::test]
async fn created_task_arrives_via_snapshot() {
    let store = MemoryStore::new();
    let mut board = board_over(&store);
    board.activate().await.unwrap();
    settle(&mut board).await;
    assert!(board.state().tasks().is_empty());

    {
        let draft = board.draft_mut();
        draft.title = "Buy milk".to_string();
        draft.description = "2 liters".to_string();
        draft.due_date = "2026-10-20".to_string();
    }
    let id = board.create_task().await.unwrap().expect("task id");

    // Nothing is inserted locally before the store reports back.
    assert!(board.state().tasks().is_empty());
    assert!(board.state().draft.is_blank());
    assert!(board.state().draft.description.is_empty());

    settle(&mut board).await;
    let task = board.state().task(&id).expect("task in snapshot");
    assert_eq!(task.title, "Buy milk");
    assert_eq!(task.description, "2 liters");
    assert_eq!(task.due_date, "2026-10-20");
    assert!(!task.completed);
    assert!(task.created_at > 0);
}

#[tokio::test]
async fn blank_title_sends_nothing() {
    let store = MemoryStore::new();
    let mut board = board_over(&store);
    board.draft_mut().title = "   ".to_string();
    board.draft_mut().description = "kept".to_string();

    assert_eq!(board.create_task().await.unwrap(), None);
    assert_eq!(store.create_requests(), 0);
    assert_eq!(board.state().draft.description, "kept");
}

#[tokio::test]
async fn rejected_create_keeps_draft() {
    let store = MemoryStore::new();
    let mut board = board_over(&store);
    store.set_unavailable("offline");
    board.draft_mut().title = "Buy milk".to_string();

    let result = board.create_task().await;
    assert!(matches!(
        result,
        Err(BoardError::Store(StoreError::Unavailable(_)))
    ));
    assert_eq!(board.state().draft.title, "Buy milk");
}

// =============================================================================
// Ordering
// =============================================================================

#[tokio::test]
async fn titles_follow_sort_order() {
    let store = MemoryStore::new();
    for title in ["Banana", "Cherry", "Apple"] {
        store.create(TASKS_COLLECTION, new_task(title)).await.unwrap();
    }

    let mut board = board_over(&store);
    board.activate().await.unwrap();
    settle(&mut board).await;
    assert_eq!(titles(&board), ["Apple", "Banana", "Cherry"]);

    board.set_sort_order(SortOrder::Descending).await.unwrap();
    assert_eq!(titles(&board), ["Cherry", "Banana", "Apple"]);

    settle(&mut board).await;
    assert_eq!(titles(&board), ["Cherry", "Banana", "Apple"]);
}

#[tokio::test]
async fn initial_sort_order_applies_to_first_snapshot() {
    let store = MemoryStore::new();
    for title in ["apple", "Banana", "cherry"] {
        store.create(TASKS_COLLECTION, new_task(title)).await.unwrap();
    }

    let mut board = board_over(&store).with_sort_order(SortOrder::Descending);
    board.activate().await.unwrap();
    settle(&mut board).await;
    assert_eq!(titles(&board), ["cherry", "Banana", "apple"]);
}

// =============================================================================
// Listener lifecycle
// =============================================================================

#[tokio::test]
async fn one_listener_across_sort_switches() {
    let store = MemoryStore::new();
    let mut board = board_over(&store);
    board.activate().await.unwrap();
    assert_eq!(store.listener_count(), 1);
    let first = board.subscription_id();

    board.set_sort_order(SortOrder::Descending).await.unwrap();
    assert_eq!(store.listener_count(), 1);
    assert_ne!(board.subscription_id(), first);

    // Re-selecting the current order keeps the subscription.
    let second = board.subscription_id();
    board.set_sort_order(SortOrder::Descending).await.unwrap();
    assert_eq!(board.subscription_id(), second);

    board.deactivate();
    assert_eq!(store.listener_count(), 0);
}

#[tokio::test]
async fn dropping_the_board_releases_its_listener() {
    let store = MemoryStore::new();
    {
        let mut board = board_over(&store);
        board.activate().await.unwrap();
        assert_eq!(store.listener_count(), 1);
    }
    assert_eq!(store.listener_count(), 0);
}

#[tokio::test]
async fn two_boards_see_each_others_changes() {
    let store = MemoryStore::new();
    let mut alice = board_over(&store);
    let mut bob = board_over(&store);
    alice.activate().await.unwrap();
    bob.activate().await.unwrap();
    settle(&mut alice).await;
    settle(&mut bob).await;

    alice.draft_mut().title = "Shared".to_string();
    let id = alice.create_task().await.unwrap().unwrap();

    settle(&mut bob).await;
    assert!(bob.state().task(&id).is_some());
    assert_eq!(store.listener_count(), 2);
}

// =============================================================================
// Updates and deletes
// =============================================================================

#[tokio::test]
async fn toggle_and_describe() {
    let store = MemoryStore::new();
    let id = store
        .create(TASKS_COLLECTION, new_task("Walk dog"))
        .await
        .unwrap();
    let mut board = board_over(&store);
    board.activate().await.unwrap();
    settle(&mut board).await;

    board.toggle_completed(&id, false).await.unwrap();
    settle(&mut board).await;
    assert!(board.state().task(&id).unwrap().completed);

    board.toggle_completed(&id, true).await.unwrap();
    settle(&mut board).await;
    assert!(!board.state().task(&id).unwrap().completed);

    board.update_description(&id, "around the block").await.unwrap();
    settle(&mut board).await;
    assert_eq!(board.state().task(&id).unwrap().description, "around the block");
}

#[tokio::test]
async fn delete_present_and_absent() {
    let store = MemoryStore::new();
    let id = store
        .create(TASKS_COLLECTION, new_task("Old"))
        .await
        .unwrap();
    let mut board = board_over(&store);
    board.activate().await.unwrap();
    settle(&mut board).await;
    assert_eq!(board.state().tasks().len(), 1);

    board.delete_task(&id).await.unwrap();
    settle(&mut board).await;
    assert!(board.state().tasks().is_empty());

    let result = board.delete_task(&TaskId::new("ghost")).await;
    assert!(matches!(
        result,
        Err(BoardError::Store(StoreError::NotFound { .. }))
    ));
    assert!(board.is_active());
}
