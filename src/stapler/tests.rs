//! Tests for the pagination controller

use super::*;
use crate::source::{MemorySource, PageSource};
use async_trait::async_trait;
use futures::future::join_all;
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use test_case::test_case;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{oneshot, watch};
use tokio_test::{assert_pending, assert_ready, task};

#[derive(Debug, Clone, PartialEq, Eq)]
struct TestError(String);

fn size(n: u64) -> PageSize {
    PageSize::new(n).unwrap()
}

fn numbers(n: u32) -> Vec<u32> {
    (0..n).collect()
}

// ============================================================================
// Test Sources
// ============================================================================

/// Serves `0..len` and fails fetches at chosen offsets
struct ListSource {
    items: Vec<u32>,
    calls: AtomicUsize,
    failing: Mutex<HashSet<u64>>,
}

impl ListSource {
    fn new(len: u32) -> Arc<Self> {
        Arc::new(Self {
            items: numbers(len),
            calls: AtomicUsize::new(0),
            failing: Mutex::new(HashSet::new()),
        })
    }

    fn fail_at(&self, offset: u64) {
        self.failing.lock().unwrap().insert(offset);
    }

    fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for ListSource {
    type Item = u32;
    type Error = TestError;

    async fn fetch(&self, request: PageRequest) -> std::result::Result<Page<u32>, TestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(&request.offset) {
            return Err(TestError(format!("offset {} unavailable", request.offset)));
        }
        let start = (request.offset as usize).min(self.items.len());
        let end = (request.end() as usize).min(self.items.len());
        Ok(Page::new(
            self.items[start..end].to_vec(),
            self.items.len() as u64,
        ))
    }
}

type Reply = std::result::Result<Page<u32>, TestError>;

/// Holds every fetch open until the test replies to it
struct ScriptedSource {
    calls: watch::Sender<Vec<PageRequest>>,
    replies: Mutex<Vec<Option<oneshot::Sender<Reply>>>>,
}

impl ScriptedSource {
    fn new() -> Arc<Self> {
        let (calls, _) = watch::channel(Vec::new());
        Arc::new(Self {
            calls,
            replies: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<PageRequest> {
        self.calls.borrow().clone()
    }

    async fn wait_calls(&self, count: usize) {
        let mut calls = self.calls.subscribe();
        calls.wait_for(|calls| calls.len() >= count).await.unwrap();
    }

    fn reply(&self, call: usize, reply: Reply) {
        let sender = self.replies.lock().unwrap()[call]
            .take()
            .expect("call already answered");
        sender.send(reply).unwrap();
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    type Item = u32;
    type Error = TestError;

    async fn fetch(&self, request: PageRequest) -> Reply {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().unwrap().push(Some(tx));
        self.calls.send_modify(|calls| calls.push(request));
        rx.await
            .unwrap_or_else(|_| Err(TestError("reply dropped".to_string())))
    }
}

fn page(range: std::ops::Range<u32>, total: u64) -> Reply {
    Ok(Page::new(range.collect(), total))
}

// ============================================================================
// Construction Tests
// ============================================================================

#[tokio::test]
async fn test_new_controller_is_empty() {
    let stapler = Stapler::new(size(5), ListSource::new(23)).unwrap();

    assert_eq!(stapler.page_size().get(), 5);
    assert!(stapler.items().get().is_empty());
    assert_eq!(stapler.pages().get(), 0);
    assert_eq!(stapler.total().get(), 0);
    assert!(!stapler.should_show_next_page_activity_indicator().get());
    assert!(!stapler.initial_load_action().is_executing().get());
    assert!(!stapler.refresh_action().is_executing().get());
    assert!(!stapler.next_page_action().is_executing().get());
    assert_eq!(stapler.next_offset(), 0);
}

#[test]
fn test_build_without_runtime_fails() {
    let result = Stapler::builder(ListSource::new(3)).page_size(size(2)).build();
    assert!(matches!(result, Err(Error::NoRuntime)));
}

#[test]
fn test_build_with_explicit_runtime() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    let stapler = Stapler::builder(ListSource::new(3))
        .runtime(runtime.handle().clone())
        .build()
        .unwrap();

    assert_eq!(stapler.page_size(), PageSize::DEFAULT);
    runtime.block_on(async {
        stapler.initial_load().await.unwrap();
    });
    assert_eq!(stapler.items().get().len(), 3);
}

#[tokio::test]
async fn test_from_config() {
    let config = StaplerConfig::new(7).unwrap();
    let stapler = Stapler::from_config(&config, ListSource::new(3)).unwrap();
    assert_eq!(stapler.page_size().get(), 7);
}

// ============================================================================
// First Page Tests
// ============================================================================

#[tokio::test]
async fn test_initial_load_sets_first_page() {
    let stapler = Stapler::new(size(5), ListSource::new(23)).unwrap();

    stapler.initial_load().await.unwrap();

    assert_eq!(*stapler.items().get(), numbers(5));
    assert_eq!(stapler.pages().get(), 1);
    assert_eq!(stapler.total().get(), 23);
    assert!(stapler.should_show_next_page_activity_indicator().get());
    assert_eq!(stapler.next_offset(), 5);
}

#[tokio::test]
async fn test_initial_load_failure_leaves_state_untouched() {
    let source = ListSource::new(23);
    let stapler = Stapler::new(size(5), source.clone()).unwrap();
    stapler.initial_load().await.unwrap();
    stapler.load_next_page().await;

    let mut initial_errors = stapler.initial_load_action().errors().subscribe();
    let mut next_errors = stapler.next_page_errors().subscribe();
    source.fail_at(0);

    let err = stapler.initial_load().await.unwrap_err();

    assert_eq!(*err, TestError("offset 0 unavailable".to_string()));
    assert_eq!(*stapler.items().get(), numbers(10));
    assert_eq!(stapler.pages().get(), 2);
    assert_eq!(stapler.total().get(), 23);
    assert_eq!(initial_errors.try_recv().unwrap(), err);
    assert_eq!(next_errors.try_recv(), Err(TryRecvError::Empty));
    assert!(stapler.initial_load_action().state().is_failed());
    assert!(matches!(
        stapler.refresh_action().state(),
        crate::action::ActionState::Idle
    ));
}

#[tokio::test]
async fn test_refresh_resets_to_first_page() {
    let stapler = Stapler::new(size(5), ListSource::new(23)).unwrap();
    stapler.initial_load().await.unwrap();
    stapler.load_next_page().await;
    stapler.load_next_page().await;
    assert_eq!(stapler.pages().get(), 3);

    stapler.refresh().await.unwrap();

    assert_eq!(*stapler.items().get(), numbers(5));
    assert_eq!(stapler.pages().get(), 1);
    assert_eq!(stapler.total().get(), 23);
}

#[tokio::test]
async fn test_refresh_errors_are_routed_to_refresh_only() {
    let source = ListSource::new(10);
    let stapler = Stapler::new(size(5), source.clone()).unwrap();
    let mut refresh_errors = stapler.refresh_action().errors().subscribe();
    let mut initial_errors = stapler.initial_load_action().errors().subscribe();
    source.fail_at(0);

    assert!(stapler.refresh().await.is_err());

    assert!(refresh_errors.try_recv().is_ok());
    assert_eq!(initial_errors.try_recv(), Err(TryRecvError::Empty));
    assert!(stapler.refresh_action().last_error().get().is_some());
    assert!(stapler.initial_load_action().last_error().get().is_none());

    source.heal();
    stapler.refresh().await.unwrap();
    assert!(stapler.refresh_action().last_error().get().is_none());
}

#[tokio::test]
async fn test_start_initial_load_runs_in_background() {
    let stapler = Stapler::new(size(4), ListSource::new(6)).unwrap();

    let handle = stapler.start_initial_load();
    handle.await.unwrap().unwrap();

    assert_eq!(stapler.pages().get(), 1);
    assert_eq!(*stapler.items().get(), numbers(4));
}

#[tokio::test]
async fn test_first_page_in_flight_flags() {
    let source = ScriptedSource::new();
    let stapler = Stapler::new(size(5), source.clone()).unwrap();

    let initial = stapler.start_initial_load();
    source.wait_calls(1).await;
    assert!(stapler.initial_load_action().is_executing().get());
    assert!(!stapler.refresh_action().is_executing().get());

    source.reply(0, page(0..5, 12));
    initial.await.unwrap().unwrap();

    assert!(!stapler.initial_load_action().is_executing().get());
    assert_eq!(stapler.total().get(), 12);
}

// ============================================================================
// Next Page Guard Tests
// ============================================================================

#[tokio::test]
async fn test_next_page_before_any_load_is_noop() {
    let source = ListSource::new(23);
    let stapler = Stapler::new(size(5), source.clone()).unwrap();

    let outcome = stapler.load_next_page().await;

    assert_eq!(outcome.skip_reason(), Some(SkipReason::Exhausted));
    assert!(!stapler.load_next_page_if_needed());
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_next_page_appends_and_advances() {
    let stapler = Stapler::new(size(5), ListSource::new(23)).unwrap();
    stapler.initial_load().await.unwrap();

    let outcome = stapler.load_next_page().await;

    assert!(matches!(
        outcome,
        NextPageOutcome::Loaded {
            offset: 5,
            count: 5
        }
    ));
    assert_eq!(*stapler.items().get(), numbers(10));
    assert_eq!(stapler.pages().get(), 2);
    assert_eq!(stapler.next_offset(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_triggers_from_many_threads_start_one_fetch() {
    for _ in 0..20 {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = crate::source::FnSource::new({
            let calls = calls.clone();
            move |request: PageRequest| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    let end = request.end().min(23) as u32;
                    Ok::<_, TestError>(Page::new((request.offset as u32..end).collect(), 23))
                }
            }
        });
        let stapler = Stapler::new(size(5), source).unwrap();
        stapler.initial_load().await.unwrap();

        let barrier = Arc::new(tokio::sync::Barrier::new(16));
        let triggers: Vec<_> = (0..16)
            .map(|_| {
                let stapler = stapler.clone();
                let barrier = barrier.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    stapler.load_next_page_if_needed()
                })
            })
            .collect();
        let started = join_all(triggers)
            .await
            .into_iter()
            .filter(|started| *started.as_ref().unwrap())
            .count();

        stapler
            .next_page_action()
            .is_executing()
            .wait_for(|busy| !busy)
            .await;

        assert_eq!(started, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(stapler.pages().get(), 2);
        assert_eq!(*stapler.items().get(), numbers(10));
    }
}

#[tokio::test]
async fn test_empty_list_has_no_next_page() {
    let source = ListSource::new(0);
    let stapler = Stapler::new(size(5), source.clone()).unwrap();

    stapler.initial_load().await.unwrap();

    assert_eq!(stapler.pages().get(), 1);
    assert_eq!(stapler.total().get(), 0);
    assert!(stapler.items().get().is_empty());
    assert!(!stapler.should_show_next_page_activity_indicator().get());
    assert!(!stapler.load_next_page_if_needed());
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_repeated_triggers_start_one_fetch() {
    let source = ScriptedSource::new();
    let stapler = Stapler::new(size(5), source.clone()).unwrap();

    let initial = stapler.start_initial_load();
    source.wait_calls(1).await;
    source.reply(0, page(0..5, 23));
    initial.await.unwrap().unwrap();

    let started: Vec<bool> = (0..10).map(|_| stapler.load_next_page_if_needed()).collect();
    assert_eq!(started.iter().filter(|s| **s).count(), 1);
    assert!(started[0]);
    assert!(stapler.next_page_action().is_executing().get());
    assert_eq!(
        stapler.load_next_page().await.skip_reason(),
        Some(SkipReason::NextPageInFlight)
    );

    source.wait_calls(2).await;
    source.reply(1, page(5..10, 23));
    stapler.pages().wait_for(|pages| *pages == 2).await;
    stapler
        .next_page_action()
        .is_executing()
        .wait_for(|executing| !executing)
        .await;

    assert_eq!(
        source.requests(),
        vec![
            PageRequest { offset: 0, size: 5 },
            PageRequest { offset: 5, size: 5 }
        ]
    );
    assert_eq!(*stapler.items().get(), numbers(10));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_awaited_attempts_fetch_once() {
    let source = MemorySource::new(numbers(23)).with_latency(Duration::from_millis(50));
    let stapler = Stapler::new(size(5), source).unwrap();
    stapler.initial_load().await.unwrap();

    let outcomes = join_all((0..8).map(|_| stapler.load_next_page())).await;

    let loaded = outcomes.iter().filter(|o| o.is_loaded()).count();
    let skipped: Vec<_> = outcomes.iter().filter_map(NextPageOutcome::skip_reason).collect();
    assert_eq!(loaded, 1);
    assert_eq!(skipped, vec![SkipReason::NextPageInFlight; 7]);
    assert_eq!(stapler.pages().get(), 2);
    assert_eq!(*stapler.items().get(), numbers(10));
}

#[tokio::test]
async fn test_awaited_next_page_pends_until_reply() {
    let source = ScriptedSource::new();
    let stapler = Stapler::new(size(5), source.clone()).unwrap();

    let initial = stapler.start_initial_load();
    source.wait_calls(1).await;
    source.reply(0, page(0..5, 23));
    initial.await.unwrap().unwrap();

    let mut next = task::spawn(stapler.load_next_page());
    assert_pending!(next.poll());
    assert_eq!(source.requests().len(), 2);
    assert!(stapler.next_page_action().is_executing().get());

    source.reply(1, page(5..10, 23));
    assert!(next.is_woken());
    let outcome = assert_ready!(next.poll());

    assert!(outcome.is_loaded());
    assert!(!stapler.next_page_action().is_executing().get());
}

#[tokio::test]
async fn test_next_page_ignored_while_refresh_in_flight() {
    let source = ScriptedSource::new();
    let stapler = Stapler::new(size(5), source.clone()).unwrap();

    let initial = stapler.start_initial_load();
    source.wait_calls(1).await;
    source.reply(0, page(0..5, 23));
    initial.await.unwrap().unwrap();

    let refresh = stapler.start_refresh();
    source.wait_calls(2).await;

    assert!(!stapler.load_next_page_if_needed());
    assert_eq!(
        stapler.load_next_page().await.skip_reason(),
        Some(SkipReason::RefreshInFlight)
    );

    source.reply(1, page(0..5, 23));
    refresh.await.unwrap().unwrap();

    assert!(stapler.load_next_page_if_needed());
    source.wait_calls(3).await;
    assert_eq!(source.requests()[2].offset, 5);
    source.reply(2, page(5..10, 23));
    stapler.pages().wait_for(|pages| *pages == 2).await;
}

#[tokio::test]
async fn test_initial_load_in_flight_does_not_block_next_page() {
    let source = ScriptedSource::new();
    let stapler = Stapler::new(size(5), source.clone()).unwrap();

    let first = stapler.start_initial_load();
    source.wait_calls(1).await;
    source.reply(0, page(0..5, 23));
    first.await.unwrap().unwrap();

    let second = stapler.start_initial_load();
    source.wait_calls(2).await;

    assert!(stapler.load_next_page_if_needed());

    source.wait_calls(3).await;
    source.reply(2, page(5..10, 23));
    source.reply(1, page(0..5, 23));
    second.await.unwrap().unwrap();
}

#[test_case(0, 0, false ; "nothing loaded")]
#[test_case(1, 23, true ; "first of five")]
#[test_case(4, 23, true ; "fourth of five")]
#[test_case(5, 23, false ; "all loaded")]
#[test_case(2, 10, false ; "exact multiple")]
#[test_case(3, 10, false ; "server shrank")]
fn test_next_page_guard_exhaustion(pages: u64, total: u64, eligible: bool) {
    let mut ledger = Ledger::<u32>::new();
    ledger.pages = pages;
    ledger.total = total;

    let claimed = ledger.claim_next_page(size(5));

    assert_eq!(claimed.is_ok(), eligible);
    if let Ok(request) = claimed {
        assert_eq!(request.offset, pages * 5);
        assert!(ledger.next_page);
    } else {
        assert_eq!(claimed, Err(SkipReason::Exhausted));
        assert!(!ledger.next_page);
    }
}

#[test]
fn test_next_page_guard_order() {
    let mut ledger = Ledger::<u32>::new();
    ledger.pages = 1;
    ledger.total = 23;
    ledger.refreshes = 1;
    ledger.next_page = true;

    assert_eq!(
        ledger.claim_next_page(size(5)),
        Err(SkipReason::RefreshInFlight)
    );

    ledger.refreshes = 0;
    assert_eq!(
        ledger.claim_next_page(size(5)),
        Err(SkipReason::NextPageInFlight)
    );
}

// ============================================================================
// Next Page Failure Tests
// ============================================================================

#[tokio::test]
async fn test_next_page_failure_keeps_state_and_reports_once() {
    let source = ListSource::new(23);
    let stapler = Stapler::new(size(5), source.clone()).unwrap();
    stapler.initial_load().await.unwrap();
    let mut errors = stapler.next_page_errors().subscribe();
    source.fail_at(5);

    let outcome = stapler.load_next_page().await;

    assert!(outcome.is_failed());
    assert_eq!(*stapler.items().get(), numbers(5));
    assert_eq!(stapler.pages().get(), 1);
    assert_eq!(stapler.total().get(), 23);
    assert_eq!(
        *errors.try_recv().unwrap(),
        TestError("offset 5 unavailable".to_string())
    );
    assert_eq!(errors.try_recv(), Err(TryRecvError::Empty));
    assert!(!stapler.next_page_action().is_executing().get());

    source.heal();
    assert!(stapler.load_next_page().await.is_loaded());
    assert!(stapler.next_page_action().last_error().get().is_none());
    assert_eq!(stapler.pages().get(), 2);
}

#[tokio::test]
async fn test_exhausted_trigger_raises_no_error() {
    let source = ListSource::new(8);
    let stapler = Stapler::new(size(5), source.clone()).unwrap();
    stapler.initial_load().await.unwrap();
    assert!(stapler.load_next_page().await.is_loaded());
    let mut errors = stapler.next_page_errors().subscribe();
    let calls = source.calls();

    assert!(!stapler.load_next_page_if_needed());
    assert!(stapler.load_next_page().await.is_skipped());

    assert_eq!(source.calls(), calls);
    assert_eq!(errors.try_recv(), Err(TryRecvError::Empty));
    assert!(stapler.next_page_action().last_error().get().is_none());
}

// ============================================================================
// Race Tests
// ============================================================================

#[tokio::test]
async fn test_overlapping_refreshes_last_completion_wins() {
    let source = ScriptedSource::new();
    let stapler = Stapler::new(size(5), source.clone()).unwrap();

    let first = stapler.start_refresh();
    let second = stapler.start_refresh();
    source.wait_calls(2).await;
    assert!(stapler.refresh_action().is_executing().get());

    source.reply(1, page(100..105, 30));
    stapler.total().wait_for(|total| *total == 30).await;
    assert!(stapler.refresh_action().is_executing().get());

    source.reply(0, page(0..5, 10));
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    assert_eq!(*stapler.items().get(), numbers(5));
    assert_eq!(stapler.total().get(), 10);
    assert_eq!(stapler.pages().get(), 1);
    assert!(!stapler.refresh_action().is_executing().get());
}

#[tokio::test]
async fn test_server_total_is_authoritative() {
    let source = ScriptedSource::new();
    let stapler = Stapler::new(size(5), source.clone()).unwrap();

    let initial = stapler.start_initial_load();
    source.wait_calls(1).await;
    source.reply(0, page(0..5, 23));
    initial.await.unwrap().unwrap();

    assert!(stapler.load_next_page_if_needed());
    source.wait_calls(2).await;
    source.reply(1, page(5..8, 8));
    stapler.pages().wait_for(|pages| *pages == 2).await;

    assert_eq!(stapler.total().get(), 8);
    assert!(!stapler.should_show_next_page_activity_indicator().get());
}

// ============================================================================
// Contract Violation Tests
// ============================================================================

#[tokio::test]
async fn test_oversized_page_is_truncated() {
    let source = crate::source::FnSource::new(|request: PageRequest| async move {
        let items: Vec<u32> = (request.offset as u32..request.offset as u32 + 8).collect();
        Ok::<_, TestError>(Page::new(items, 20))
    });
    let stapler = Stapler::new(size(5), source).unwrap();

    stapler.initial_load().await.unwrap();
    assert_eq!(*stapler.items().get(), numbers(5));

    stapler.load_next_page().await;
    assert_eq!(*stapler.items().get(), numbers(10));
}

// ============================================================================
// Observable Tests
// ============================================================================

#[tokio::test]
async fn test_snapshot_is_consistent() {
    let stapler = Stapler::new(size(5), MemorySource::new(numbers(12))).unwrap();
    stapler.initial_load().await.unwrap();
    stapler.load_next_page().await;

    let snapshot = stapler.snapshot();

    assert_eq!(*snapshot.items, numbers(10));
    assert_eq!(snapshot.pages, 2);
    assert_eq!(snapshot.total, 12);
    assert!(snapshot.has_more(stapler.page_size()));
}

#[tokio::test]
async fn test_subscribers_are_notified_per_completion() {
    let stapler = Stapler::new(size(5), MemorySource::new(numbers(12))).unwrap();
    let mut pages = stapler.pages().subscribe();
    let mut items = stapler.items().subscribe();

    stapler.initial_load().await.unwrap();

    assert!(pages.has_changed().unwrap());
    assert_eq!(*pages.borrow_and_update(), 1);
    assert_eq!(items.borrow_and_update().len(), 5);

    stapler.load_next_page().await;
    assert_eq!(*pages.borrow_and_update(), 2);
    assert_eq!(items.borrow_and_update().len(), 10);
}

#[tokio::test]
async fn test_clone_shares_controller() {
    let stapler = Stapler::new(size(5), MemorySource::new(numbers(12))).unwrap();
    let handle = stapler.clone();

    handle.initial_load().await.unwrap();

    assert_eq!(stapler.pages().get(), 1);
    assert!(format!("{stapler:?}").contains("pages: 1"));
}
