//! Property tests for board ordering.
//!
//! Uses proptest to verify:
//! 1. The rendered order depends only on the set of tasks, not on the
//!    order a snapshot lists them in.
//! 2. Titles come out sorted case-insensitively in the chosen direction.
//! 3. Descending is the exact reverse of ascending for distinct titles.
//! 4. Switching the sort order locally matches a fresh snapshot.

use proptest::prelude::*;
use stickywall::board::{BoardState, SortOrder, compare_titles, sort_tasks};
use stickywall_proto::task::{Snapshot, Task, TaskColor, TaskId};

fn task(id: usize, title: String) -> Task {
    Task {
        id: TaskId::new(format!("task-{id:04}")),
        title,
        description: String::new(),
        due_date: String::new(),
        completed: false,
        created_at: 0,
        color: TaskColor::from_index(id),
    }
}

/// Strategy for a collection of tasks with unique ids.
fn arb_tasks() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec("[a-zA-Z ]{1,12}", 0..24).prop_map(|titles| {
        titles
            .into_iter()
            .enumerate()
            .map(|(i, title)| task(i, title))
            .collect()
    })
}

fn arb_order() -> impl Strategy<Value = SortOrder> {
    prop_oneof![Just(SortOrder::Ascending), Just(SortOrder::Descending)]
}

fn ids(state: &BoardState) -> Vec<TaskId> {
    state.tasks().iter().map(|t| t.id.clone()).collect()
}

proptest! {
    #[test]
    fn snapshot_order_is_irrelevant(
        (tasks, shuffled) in arb_tasks().prop_flat_map(|tasks| {
            let shuffled = Just(tasks.clone()).prop_shuffle();
            (Just(tasks), shuffled)
        }),
        order in arb_order(),
    ) {
        let mut a = BoardState::new(order);
        let mut b = BoardState::new(order);
        a.apply_snapshot(Snapshot::new(tasks));
        b.apply_snapshot(Snapshot::new(shuffled));
        prop_assert_eq!(ids(&a), ids(&b));
    }

    #[test]
    fn titles_are_sorted(mut tasks in arb_tasks(), order in arb_order()) {
        sort_tasks(&mut tasks, order);
        for pair in tasks.windows(2) {
            let cmp = compare_titles(&pair[0].title, &pair[1].title);
            match order {
                SortOrder::Ascending => prop_assert!(cmp.is_le()),
                SortOrder::Descending => prop_assert!(cmp.is_ge()),
            }
        }
    }

    #[test]
    fn descending_reverses_distinct_titles(titles in prop::collection::btree_set("[a-z]{1,8}", 0..16)) {
        let tasks: Vec<Task> = titles
            .into_iter()
            .enumerate()
            .map(|(i, title)| task(i, title))
            .collect();

        let mut asc = tasks.clone();
        let mut desc = tasks;
        sort_tasks(&mut asc, SortOrder::Ascending);
        sort_tasks(&mut desc, SortOrder::Descending);
        desc.reverse();
        prop_assert_eq!(asc, desc);
    }

    #[test]
    fn local_resort_matches_fresh_snapshot(tasks in arb_tasks(), order in arb_order()) {
        let mut switched = BoardState::new(order.toggled());
        switched.apply_snapshot(Snapshot::new(tasks.clone()));
        prop_assert!(switched.set_sort_order(order));

        let mut fresh = BoardState::new(order);
        fresh.apply_snapshot(Snapshot::new(tasks));
        prop_assert_eq!(ids(&switched), ids(&fresh));
    }
}
