//! Integration tests for the crawler
//!
//! These drive the frontier controller against a scripted in-memory graph
//! and check the directory and checkpoint it leaves behind.

use crate::support::{controller, located, FakeGraph, SharedDirectory};
use geoflock::crawler::{StartPoint, StopReason};
use geoflock::output::{CrawlEvent, EventLog};
use geoflock::remote::AccountProfile;
use geoflock::state::{Checkpoint, Cursor};
use geoflock::storage::{AccountDirectory, CheckpointStore};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn seed(id: &str) -> StartPoint {
    StartPoint::Seed(id.to_string())
}

#[tokio::test]
async fn test_end_to_end_single_seed() {
    let dir = tempdir().unwrap();
    let checkpoint_path = dir.path().join("checkpoint");
    let graph = Arc::new(FakeGraph::new().with_connections(
        "alice",
        vec![located("bob", "Lima, Peru"), located("carol", "Paris")],
    ));
    let directory = SharedDirectory::new();
    let events = Arc::new(EventLog::in_memory());

    let mut controller = controller(graph, directory.clone(), &checkpoint_path, events)
        .with_max_seeds(Some(1));
    let report = controller.run(seed("alice")).await.unwrap();

    assert_eq!(report.seeds_expanded, 1);
    assert_eq!(report.accounts_discovered, 1);

    let bob = directory.get("bob").unwrap().expect("bob recorded");
    assert!(!bob.visited);
    assert_eq!(bob.location, "Lima, Peru");
    assert_eq!(bob.follower_count, 10);
    assert!(directory.get("carol").unwrap().is_none());

    let content = std::fs::read_to_string(&checkpoint_path).unwrap();
    assert_eq!(content.lines().collect::<Vec<_>>(), vec!["alice", "2", "0"]);
}

#[tokio::test]
async fn test_pages_follow_cursors() {
    let dir = tempdir().unwrap();
    let graph = Arc::new(
        FakeGraph::new()
            .with_account("alice")
            .with_page("alice", Cursor::First, vec![located("bob", "Peru")], Cursor::Next(77))
            .with_page(
                "alice",
                Cursor::Next(77),
                vec![located("carol", "Cusco, Peru")],
                Cursor::Exhausted,
            ),
    );
    let events = Arc::new(EventLog::in_memory());

    let mut controller = controller(
        Arc::clone(&graph),
        SharedDirectory::new(),
        &dir.path().join("checkpoint"),
        Arc::clone(&events),
    )
    .with_max_seeds(Some(1));
    let report = controller.run(seed("alice")).await.unwrap();

    assert_eq!(report.pages_fetched, 2);
    assert_eq!(
        graph.calls(),
        vec!["account:alice", "page:alice:-1", "page:alice:77"]
    );
    assert_eq!(controller.directory().list(false).unwrap(), vec!["bob", "carol"]);
    assert_eq!(
        controller.checkpoints().read().unwrap(),
        Some(Checkpoint::after_page("alice", 2, Cursor::Exhausted))
    );

    let committed: Vec<u32> = events
        .events()
        .into_iter()
        .filter_map(|e| match e {
            CrawlEvent::PageCommitted { page_number, .. } => Some(page_number),
            _ => None,
        })
        .collect();
    assert_eq!(committed, vec![1, 2]);
}

#[tokio::test]
async fn test_resume_continues_from_checkpoint_cursor() {
    let dir = tempdir().unwrap();
    let graph = Arc::new(
        FakeGraph::new()
            .with_account("alice")
            .with_page("alice", Cursor::First, vec![located("zed", "Peru")], Cursor::Next(512))
            .with_page(
                "alice",
                Cursor::Next(1024),
                vec![located("bob", "Lima, Peru")],
                Cursor::Exhausted,
            ),
    );
    let events = Arc::new(EventLog::in_memory());
    let checkpoint = Checkpoint {
        seed: "alice".to_string(),
        page_number: 3,
        cursor: Cursor::Next(1024),
    };

    let mut controller = controller(
        Arc::clone(&graph),
        SharedDirectory::new(),
        &dir.path().join("checkpoint"),
        Arc::clone(&events),
    )
    .with_max_seeds(Some(1));
    controller.run(StartPoint::Resume(checkpoint)).await.unwrap();

    assert_eq!(graph.calls(), vec!["account:alice", "page:alice:1024"]);
    assert!(controller.directory().get("zed").unwrap().is_none());
    assert!(controller.directory().get("bob").unwrap().is_some());
    assert_eq!(
        controller.checkpoints().read().unwrap(),
        Some(Checkpoint::after_page("alice", 3, Cursor::Exhausted))
    );
    assert!(events.events().contains(&CrawlEvent::SeedStarted {
        seed: "alice".to_string(),
        page_number: 3,
        cursor: 1024,
        resumed: true,
    }));
}

#[tokio::test]
async fn test_finished_checkpoint_moves_to_next_eligible() {
    let dir = tempdir().unwrap();
    let graph = Arc::new(FakeGraph::new().with_connections("bob", vec![]));
    let directory = SharedDirectory::new();
    directory.seed_account("bob", "Lima, Peru");

    let mut controller = controller(
        Arc::clone(&graph),
        directory.clone(),
        &dir.path().join("checkpoint"),
        Arc::new(EventLog::in_memory()),
    );
    let report = controller
        .run(StartPoint::Resume(Checkpoint::after_page(
            "alice",
            1,
            Cursor::Exhausted,
        )))
        .await
        .unwrap();

    assert_eq!(graph.calls(), vec!["account:bob", "page:bob:-1"]);
    assert_eq!(report.seeds_expanded, 1);
    assert!(directory.get("bob").unwrap().unwrap().visited);
}

#[tokio::test]
async fn test_missing_seed_is_pruned_and_never_returns() {
    let dir = tempdir().unwrap();
    let graph = Arc::new(
        FakeGraph::new()
            .with_connections(
                "alice",
                vec![located("ghost", "Lima, Peru"), located("bob", "Lima, Peru")],
            )
            .with_connections("bob", vec![located("ghost", "Lima, Peru")]),
    );
    let directory = SharedDirectory::new();
    directory.seed_account("ghost", "Lima, Peru");
    let events = Arc::new(EventLog::in_memory());

    let mut controller = controller(
        Arc::clone(&graph),
        directory.clone(),
        &dir.path().join("checkpoint"),
        Arc::clone(&events),
    );
    let report = controller.run(seed("alice")).await.unwrap();

    assert_eq!(report.seeds_pruned, 1);
    assert_eq!(report.stop, StopReason::FrontierExhausted);
    assert!(directory.get("ghost").unwrap().is_none());
    assert_eq!(
        graph
            .calls()
            .iter()
            .filter(|c| c.as_str() == "account:ghost")
            .count(),
        1
    );
    assert!(events.events().contains(&CrawlEvent::SeedPruned {
        seed: "ghost".to_string(),
        reason: "account not found".to_string(),
    }));
}

#[tokio::test]
async fn test_seed_with_missing_connections_is_pruned() {
    let dir = tempdir().unwrap();
    let checkpoint_path = dir.path().join("checkpoint");
    let graph = Arc::new(
        FakeGraph::new()
            .with_connections(
                "alice",
                vec![located("ghost", "Lima, Peru"), located("bob", "Lima, Peru")],
            )
            .with_missing_pages("ghost")
            .with_connections("bob", vec![located("carol", "Cusco, Peru")]),
    );
    let directory = SharedDirectory::new();
    let events = Arc::new(EventLog::in_memory());

    let mut controller = controller(
        Arc::clone(&graph),
        directory.clone(),
        &checkpoint_path,
        Arc::clone(&events),
    );
    let report = controller.run(seed("alice")).await.unwrap();

    assert_eq!(report.seeds_pruned, 1);
    assert_eq!(report.stop, StopReason::FrontierExhausted);
    assert!(directory.get("ghost").unwrap().is_none());
    assert!(directory.get("bob").unwrap().unwrap().visited);
    assert!(directory.get("carol").unwrap().unwrap().visited);
    assert!(graph.calls().contains(&"page:bob:-1".to_string()));
    assert!(events.events().contains(&CrawlEvent::SeedPruned {
        seed: "ghost".to_string(),
        reason: "connections not found".to_string(),
    }));

    // The last seed finished normally, so its checkpoint survives
    let checkpoint = controller.checkpoints().read().unwrap().unwrap();
    assert_eq!(checkpoint.seed, "carol");
}

#[tokio::test]
async fn test_missing_connections_clear_checkpoint_naming_the_seed() {
    let dir = tempdir().unwrap();
    let graph = Arc::new(FakeGraph::new().with_missing_pages("ghost"));

    let mut controller = controller(
        graph,
        SharedDirectory::new(),
        &dir.path().join("checkpoint"),
        Arc::new(EventLog::in_memory()),
    );
    let report = controller.run(seed("ghost")).await.unwrap();

    assert_eq!(report.seeds_pruned, 1);
    assert_eq!(report.seeds_expanded, 1);
    assert_eq!(controller.checkpoints().read().unwrap(), None);
    assert!(controller.directory().get("ghost").unwrap().is_none());
}

#[tokio::test]
async fn test_pruned_resume_seed_clears_checkpoint() {
    let dir = tempdir().unwrap();
    let graph = Arc::new(FakeGraph::new());

    let mut controller = controller(
        graph,
        SharedDirectory::new(),
        &dir.path().join("checkpoint"),
        Arc::new(EventLog::in_memory()),
    );
    let checkpoint = Checkpoint {
        seed: "ghost".to_string(),
        page_number: 2,
        cursor: Cursor::Next(5),
    };
    std::fs::write(dir.path().join("checkpoint"), "ghost\n2\n5\n").unwrap();

    let report = controller.run(StartPoint::Resume(checkpoint)).await.unwrap();

    assert_eq!(report.seeds_pruned, 1);
    assert_eq!(controller.checkpoints().read().unwrap(), None);
}

#[tokio::test]
async fn test_cyclic_graph_terminates_with_empty_frontier() {
    let dir = tempdir().unwrap();
    let graph = Arc::new(
        FakeGraph::new()
            .with_connections(
                "alice",
                vec![located("bob", "Peru"), located("carol", "Lima, Peru")],
            )
            .with_connections(
                "bob",
                vec![located("alice", "Peru"), located("carol", "Lima, Peru")],
            )
            .with_connections(
                "carol",
                vec![located("alice", "Peru"), located("bob", "Peru")],
            ),
    );
    let directory = SharedDirectory::new();

    let mut controller = controller(
        Arc::clone(&graph),
        directory.clone(),
        &dir.path().join("checkpoint"),
        Arc::new(EventLog::in_memory()),
    );
    let report = controller.run(seed("alice")).await.unwrap();

    assert_eq!(report.stop, StopReason::FrontierExhausted);
    assert_eq!(report.seeds_expanded, 3);
    assert_eq!(directory.count(Some(false)).unwrap(), 0);
    assert_eq!(directory.list(true).unwrap(), vec!["alice", "bob", "carol"]);

    let expansions = graph
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("account:"))
        .count();
    assert_eq!(expansions, 3);
}

#[tokio::test]
async fn test_visited_and_eligible_stay_disjoint() {
    let dir = tempdir().unwrap();
    let graph = Arc::new(
        FakeGraph::new()
            .with_connections(
                "alice",
                vec![located("bob", "Peru"), located("carol", "Peru")],
            )
            .with_connections(
                "bob",
                vec![located("alice", "Peru"), located("dave", "Peru")],
            )
            .with_connections("carol", vec![located("bob", "Peru")])
            .with_connections("dave", vec![located("carol", "Peru")]),
    );
    let directory = SharedDirectory::new();

    let mut controller = controller(
        graph,
        directory.clone(),
        &dir.path().join("checkpoint"),
        Arc::new(EventLog::in_memory()),
    );
    controller.run(seed("alice")).await.unwrap();

    let snapshots = directory.snapshots();
    assert!(snapshots.len() >= 4);
    for (checked, eligible) in snapshots {
        let checked: HashSet<_> = checked.into_iter().collect();
        assert!(
            eligible.iter().all(|id| !checked.contains(id)),
            "{:?} overlaps {:?}",
            checked,
            eligible
        );
    }
}

#[tokio::test]
async fn test_crash_mid_page_resumes_to_same_result() {
    let graph = || {
        Arc::new(
            FakeGraph::new()
                .with_connections(
                    "alice",
                    vec![located("bob", "Peru"), located("dave", "Peru")],
                )
                .with_connections("bob", vec![])
                .with_connections("dave", vec![located("erin", "Lima, Peru")])
                .with_connections("erin", vec![]),
        )
    };

    let baseline_dir = tempdir().unwrap();
    let baseline = SharedDirectory::new();
    controller(
        graph(),
        baseline.clone(),
        &baseline_dir.path().join("checkpoint"),
        Arc::new(EventLog::in_memory()),
    )
    .run(seed("alice"))
    .await
    .unwrap();

    let dir = tempdir().unwrap();
    let checkpoint_path = dir.path().join("checkpoint");
    let directory = SharedDirectory::new();

    // Inserts: alice (seed record), bob, then dave fails mid-page
    let mut crashing = controller(
        graph(),
        directory.failing_on_insert(3),
        &checkpoint_path,
        Arc::new(EventLog::in_memory()),
    );
    assert!(crashing.run(seed("alice")).await.is_err());
    assert_eq!(
        crashing.checkpoints().read().unwrap(),
        Some(Checkpoint::start_of("alice"))
    );
    assert!(directory.get("bob").unwrap().is_some());
    assert!(directory.get("dave").unwrap().is_none());

    let resume_point = crashing.checkpoints().read().unwrap().unwrap();
    let mut resumed = controller(
        graph(),
        directory.clone(),
        &checkpoint_path,
        Arc::new(EventLog::in_memory()),
    );
    resumed.run(StartPoint::Resume(resume_point)).await.unwrap();

    assert_eq!(directory.list(true).unwrap(), baseline.list(true).unwrap());
    assert_eq!(directory.list(false).unwrap(), baseline.list(false).unwrap());
    assert_eq!(directory.count(None).unwrap(), 4);
}

#[tokio::test]
async fn test_unencodable_candidate_is_dropped() {
    let dir = tempdir().unwrap();
    let bad = AccountProfile::new("bad")
        .with_name("Bad\u{0}Name")
        .with_location("Lima, Peru");
    let graph = Arc::new(
        FakeGraph::new().with_connections("alice", vec![bad, located("bob", "Lima, Peru")]),
    );
    let events = Arc::new(EventLog::in_memory());

    let mut controller = controller(
        graph,
        SharedDirectory::new(),
        &dir.path().join("checkpoint"),
        Arc::clone(&events),
    )
    .with_max_seeds(Some(1));
    let report = controller.run(seed("alice")).await.unwrap();

    assert_eq!(report.candidates_dropped, 1);
    assert!(controller.directory().get("bad").unwrap().is_none());
    assert!(controller.directory().get("bob").unwrap().is_some());
    assert_eq!(
        controller.checkpoints().read().unwrap(),
        Some(Checkpoint::after_page("alice", 1, Cursor::Exhausted))
    );
    assert!(events
        .events()
        .iter()
        .any(|e| matches!(e, CrawlEvent::CandidateDropped { identifier, .. } if identifier == "bad")));
}

#[tokio::test]
async fn test_profile_without_name_is_a_non_match() {
    let dir = tempdir().unwrap();
    let nameless = AccountProfile::new("nameless").with_location("Lima, Peru");
    let graph = Arc::new(
        FakeGraph::new().with_connections("alice", vec![nameless, located("bob", "Peru")]),
    );

    let mut controller = controller(
        graph,
        SharedDirectory::new(),
        &dir.path().join("checkpoint"),
        Arc::new(EventLog::in_memory()),
    )
    .with_max_seeds(Some(1));
    let report = controller.run(seed("alice")).await.unwrap();

    assert_eq!(report.accounts_discovered, 1);
    assert_eq!(report.candidates_dropped, 0);
    assert!(controller.directory().get("nameless").unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_throttled_seed_fetch_waits_and_continues() {
    let dir = tempdir().unwrap();
    let graph = Arc::new(
        FakeGraph::new()
            .with_connections("alice", vec![located("bob", "Peru")])
            .throttled(1, Duration::from_secs(5)),
    );
    let events = Arc::new(EventLog::in_memory());

    let started = tokio::time::Instant::now();
    let mut controller = controller(
        Arc::clone(&graph),
        SharedDirectory::new(),
        &dir.path().join("checkpoint"),
        Arc::clone(&events),
    )
    .with_max_seeds(Some(1));
    let report = controller.run(seed("alice")).await.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(4900));
    assert_eq!(report.accounts_discovered, 1);
    assert_eq!(
        graph.calls(),
        vec!["account:alice", "account:alice", "page:alice:-1"]
    );
    let throttled = events
        .events()
        .iter()
        .filter(|e| matches!(e, CrawlEvent::RateLimited { .. }))
        .count();
    assert_eq!(throttled, 1);
}
