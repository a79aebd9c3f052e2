//! Paginated search session driven through a scripted transport.

use std::sync::Arc;
use std::time::Duration;

use logfolio_client::{
    Error, Gateway, Method, MockTransport, PageLoad, RawResponse, ScrollMetrics, SearchFilters,
    SearchItem, SearchSession, SearchView,
};
use logfolio_types::{Notice, NoticeLevel, SharedNotifier};
use parking_lot::Mutex;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
enum ViewEvent {
    Clear,
    Loading(bool),
    Append(usize),
    Empty(String),
    LoadingMore,
    LoadingMoreDone,
}

#[derive(Default)]
struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
    titles: Mutex<Vec<String>>,
}

impl RecordingView {
    fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().clone()
    }

    fn titles(&self) -> Vec<String> {
        self.titles.lock().clone()
    }
}

impl SearchView for RecordingView {
    fn clear(&self) {
        self.titles.lock().clear();
        self.events.lock().push(ViewEvent::Clear);
    }

    fn set_loading(&self, loading: bool) {
        self.events.lock().push(ViewEvent::Loading(loading));
    }

    fn append(&self, items: &[SearchItem]) {
        self.titles
            .lock()
            .extend(items.iter().map(|i| i.display_title().to_string()));
        self.events.lock().push(ViewEvent::Append(items.len()));
    }

    fn show_empty(&self, message: &str) {
        self.titles.lock().clear();
        self.events.lock().push(ViewEvent::Empty(message.to_string()));
    }

    fn show_loading_more(&self) {
        self.events.lock().push(ViewEvent::LoadingMore);
    }

    fn hide_loading_more(&self) {
        self.events.lock().push(ViewEvent::LoadingMoreDone);
    }
}

struct Harness {
    session: SearchSession,
    view: Arc<RecordingView>,
    mock: Arc<MockTransport>,
    notices: Arc<Mutex<Vec<Notice>>>,
}

fn harness(latency: Duration) -> Harness {
    let mock = Arc::new(MockTransport::new().with_latency(latency));
    let view = Arc::new(RecordingView::default());
    let notices = Arc::new(Mutex::new(Vec::new()));
    let sink = notices.clone();
    let notifier: SharedNotifier = Arc::new(move |n: Notice| sink.lock().push(n));

    let session = SearchSession::new(Gateway::new(mock.clone()), view.clone(), Some(notifier));
    Harness {
        session,
        view,
        mock,
        notices,
    }
}

fn endpoint(query: &str, page: u32) -> String {
    format!(
        "/anime-search?q={}&type=both&page={}&source=both",
        query, page
    )
}

fn page(prefix: &str, count: usize, has_next_page: bool) -> Value {
    let data: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "url": format!("https://img.example/{prefix}-{i}.jpg"),
                "title": format!("{prefix} {i}"),
                "type": "anime"
            })
        })
        .collect();
    json!({"data": data, "has_next_page": has_next_page})
}

const AT_BOTTOM: ScrollMetrics = ScrollMetrics {
    scroll_top: 900.0,
    client_height: 100.0,
    scroll_height: 1000.0,
};

#[tokio::test]
async fn test_spy_pagination_stops_when_server_says_so() {
    let h = harness(Duration::ZERO);
    h.mock.push_get(&endpoint("spy", 1), page("spy", 20, true));
    h.mock.push_get(&endpoint("spy", 2), page("spy-p2", 5, false));

    let first = h
        .session
        .start_search("  spy ", SearchFilters::default())
        .await
        .unwrap();
    assert!(matches!(first, PageLoad::Loaded { page: 1, has_next_page: true, .. }));

    let second = h.session.on_scroll(AT_BOTTOM).await.unwrap();
    assert!(matches!(second, PageLoad::Loaded { page: 2, has_next_page: false, .. }));

    let third = h.session.on_scroll(AT_BOTTOM).await.unwrap();
    assert_eq!(third, PageLoad::Skipped);

    assert_eq!(h.view.titles().len(), 25);
    assert_eq!(h.mock.request_count(), 2);

    let state = h.session.state();
    assert_eq!(state.query, "spy");
    assert_eq!(state.page, 2);
    assert!(!state.has_next_page);
    assert!(!state.loading_more);
}

#[tokio::test]
async fn test_scroll_far_from_bottom_does_nothing() {
    let h = harness(Duration::ZERO);
    h.mock.push_get(&endpoint("eva", 1), page("eva", 20, true));
    h.session
        .start_search("eva", SearchFilters::default())
        .await
        .unwrap();

    let result = h
        .session
        .on_scroll(ScrollMetrics {
            scroll_top: 0.0,
            client_height: 400.0,
            scroll_height: 2000.0,
        })
        .await
        .unwrap();
    assert_eq!(result, PageLoad::Skipped);
    assert_eq!(h.mock.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_rapid_scroll_triggers_fetch_one_page() {
    let h = harness(Duration::from_millis(40));
    h.mock.push_get(&endpoint("mob", 1), page("mob", 20, true));
    h.mock.push_get(&endpoint("mob", 2), page("mob-p2", 20, true));

    h.session
        .start_search("mob", SearchFilters::default())
        .await
        .unwrap();

    let (a, b, c) = tokio::join!(
        h.session.on_scroll(AT_BOTTOM),
        h.session.on_scroll(AT_BOTTOM),
        h.session.on_scroll(AT_BOTTOM),
    );
    let loaded = [a.unwrap(), b.unwrap(), c.unwrap()]
        .into_iter()
        .filter(|r| matches!(r, PageLoad::Loaded { .. }))
        .count();

    assert_eq!(loaded, 1);
    assert_eq!(h.mock.count(Method::Get, &endpoint("mob", 2)), 1);
    assert_eq!(h.session.state().page, 2);
}

#[tokio::test]
async fn test_items_without_url_are_not_shown() {
    let h = harness(Duration::ZERO);
    h.mock.push_get(
        &endpoint("akira", 1),
        json!({
            "data": [
                {"url": "https://img.example/akira.jpg", "title": "Akira", "title_japanese": "アキラ"},
                {"title": "No cover"}
            ],
            "has_next_page": false
        }),
    );

    h.session
        .start_search("akira", SearchFilters::default())
        .await
        .unwrap();
    assert_eq!(h.view.titles(), vec!["アキラ".to_string()]);
}

#[tokio::test]
async fn test_blank_query_is_rejected_locally() {
    let h = harness(Duration::ZERO);
    let err = h
        .session
        .start_search("   ", SearchFilters::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(h.mock.request_count(), 0);
    assert!(h.view.events().is_empty());
    let notices = h.notices.lock();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
}

#[tokio::test]
async fn test_first_page_failure_shows_empty_state_and_keeps_query() {
    let h = harness(Duration::ZERO);
    h.mock.push(
        Method::Get,
        &endpoint("nana", 1),
        Ok(RawResponse::json(502, &json!({"detail": "upstream unavailable"}))),
    );

    let err = h
        .session
        .start_search("nana", SearchFilters::default())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(502));

    let events = h.view.events();
    assert!(matches!(events.last(), Some(ViewEvent::Empty(_))));
    assert_eq!(h.session.state().query, "nana");
    assert!(!h.session.state().loading);
    assert_eq!(h.notices.lock().len(), 1);

    // The empty state blocks further paging.
    assert_eq!(h.session.load_more().await.unwrap(), PageLoad::Skipped);
}

#[tokio::test]
async fn test_later_page_failure_keeps_earlier_results() {
    let h = harness(Duration::ZERO);
    h.mock.push_get(&endpoint("mushishi", 1), page("mushishi", 20, true));
    h.mock.push(
        Method::Get,
        &endpoint("mushishi", 2),
        Err(Error::Network("connection reset".into())),
    );

    h.session
        .start_search("mushishi", SearchFilters::default())
        .await
        .unwrap();
    let err = h.session.load_more().await.unwrap_err();
    assert!(matches!(err, Error::Network(_)));

    assert_eq!(h.view.titles().len(), 20);
    assert_eq!(h.view.events().last(), Some(&ViewEvent::LoadingMoreDone));
    let state = h.session.state();
    assert_eq!(state.page, 1);
    assert!(state.has_next_page);
    assert!(!state.loading_more);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_search_does_not_touch_view() {
    let h = harness(Duration::from_millis(50));
    h.mock.push_get(&endpoint("old", 1), page("old", 3, false));
    h.mock.push_get(&endpoint("new", 1), page("new", 2, false));

    let (old, new) = tokio::join!(
        h.session.start_search("old", SearchFilters::default()),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            h.session.start_search("new", SearchFilters::default()).await
        },
    );

    assert_eq!(old.unwrap(), PageLoad::Superseded);
    assert!(matches!(new.unwrap(), PageLoad::Loaded { page: 1, .. }));
    assert_eq!(h.view.titles(), vec!["new 0".to_string(), "new 1".to_string()]);
    assert_eq!(h.session.state().query, "new");
}
