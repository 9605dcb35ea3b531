//! # Filter Manager
//!
//! Owns the filter, sort and pagination state of one list view and tells a
//! single subscriber which API parameters to fetch with.
//!
//! ```text
//! update_filter / update_filters / reset ──────────────► notify (sync)
//! update_search  ──► raw state ──► search timer (500ms) ─► commit ─► notify
//! update_sorting ──► raw state ──► sort timer (300ms)   ─► commit ─► notify
//! ```
//!
//! Debounced timers are Tokio tasks and need a runtime. Without one the
//! debounced operations commit immediately.

use super::debounce::Debouncer;
use super::mappers::{CommittedFilters, ConversationParams, ParamMapper, UserParams};
use super::params::ApiParams;
use super::state::{FilterKey, FilterState, FilterValue, SortOrder};
use crate::config::FilterConfig;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tracing::debug;

type Subscriber = Arc<dyn Fn(&ApiParams) + Send + Sync>;
type Notification = Option<(Subscriber, ApiParams)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Debounced {
    Search,
    Sort,
}

impl Debounced {
    fn label(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Sort => "sort",
        }
    }
}

struct Inner {
    state: FilterState,
    search: String,
    sort_by: String,
    sort_order: SortOrder,
    search_timer: Debouncer,
    sort_timer: Debouncer,
    subscriber: Option<Subscriber>,
}

impl Inner {
    fn timer(&mut self, field: Debounced) -> &mut Debouncer {
        match field {
            Debounced::Search => &mut self.search_timer,
            Debounced::Sort => &mut self.sort_timer,
        }
    }

    fn commit(&mut self, field: Debounced) {
        match field {
            Debounced::Search => self.search.clone_from(&self.state.search),
            Debounced::Sort => {
                self.sort_by.clone_from(&self.state.sort_by);
                self.sort_order = self.state.sort_order;
            }
        }
    }

    /// Apply one keyed update. Search and sort keys commit right away.
    fn apply(&mut self, key: &FilterKey, value: FilterValue) {
        if !self.state.set(key, value.clone()) {
            debug!(key = ?key, value = ?value, "Ignored malformed filter value");
        }
        let immediate = match key {
            FilterKey::Search => Some(Debounced::Search),
            FilterKey::SortBy | FilterKey::SortOrder => Some(Debounced::Sort),
            _ => None,
        };
        if let Some(field) = immediate {
            self.timer(field).cancel();
            self.commit(field);
        }
    }

    fn committed(&self) -> CommittedFilters<'_> {
        CommittedFilters {
            page: self.state.page,
            per_page: self.state.per_page,
            search: &self.search,
            sort_by: &self.sort_by,
            sort_order: self.sort_order,
            fields: &self.state.fields,
        }
    }

    fn api_params(&self, mapper: &dyn ParamMapper) -> ApiParams {
        let committed = self.committed();
        let mut params = committed.base_params();
        mapper.map_params(&committed, &mut params);
        params
    }

    fn notification(&self, mapper: &dyn ParamMapper) -> Notification {
        let subscriber = self.subscriber.clone()?;
        Some((subscriber, self.api_params(mapper)))
    }
}

fn notify(notification: Notification) {
    if let Some((subscriber, params)) = notification {
        subscriber(&params);
    }
}

/// Filter, sort and pagination state for one list view.
pub struct FilterManager {
    inner: Arc<Mutex<Inner>>,
    mapper: Arc<dyn ParamMapper>,
    defaults: FilterState,
}

impl FilterManager {
    /// Create a manager with configured defaults and no entity fields.
    pub fn new(config: &FilterConfig, mapper: impl ParamMapper + 'static) -> Self {
        Self::with_initial(config, Vec::<(FilterKey, FilterValue)>::new(), mapper)
    }

    /// Create a manager whose entity fields start from `initial`.
    ///
    /// `reset` restores these fields along with the configured defaults.
    pub fn with_initial<K, V>(
        config: &FilterConfig,
        initial: impl IntoIterator<Item = (K, V)>,
        mapper: impl ParamMapper + 'static,
    ) -> Self
    where
        K: Into<FilterKey>,
        V: Into<FilterValue>,
    {
        let mut defaults = FilterState {
            per_page: config.per_page(),
            sort_by: config.default_sort_by.clone(),
            sort_order: config.default_sort_order,
            ..FilterState::default()
        };
        for (key, value) in initial {
            let key = key.into();
            let value = value.into();
            if !defaults.set(&key, value.clone()) {
                debug!(key = ?key, value = ?value, "Ignored malformed initial filter value");
            }
        }

        let inner = Inner {
            search: defaults.search.clone(),
            sort_by: defaults.sort_by.clone(),
            sort_order: defaults.sort_order,
            state: defaults.clone(),
            search_timer: Debouncer::new(config.search_debounce()),
            sort_timer: Debouncer::new(config.sort_debounce()),
            subscriber: None,
        };
        defaults.page = 1;

        Self {
            inner: Arc::new(Mutex::new(inner)),
            mapper: Arc::new(mapper),
            defaults,
        }
    }

    /// Manager for the users list.
    pub fn users(config: &FilterConfig) -> Self {
        Self::new(config, UserParams)
    }

    /// Manager for the conversations list.
    pub fn conversations(config: &FilterConfig) -> Self {
        Self::new(config, ConversationParams)
    }

    /// Register the change subscriber, replacing any previous one.
    pub fn on_changes<F>(&self, callback: F)
    where
        F: Fn(&ApiParams) + Send + Sync + 'static,
    {
        self.inner.lock().subscriber = Some(Arc::new(callback));
    }

    // ─── Updates ───────────────────────────────────────────────────────────

    /// Set one field and notify. Keys other than `page` and `per_page`
    /// send the view back to page 1.
    pub fn update_filter(&self, key: impl Into<FilterKey>, value: impl Into<FilterValue>) {
        let key = key.into();
        let notification = {
            let mut inner = self.inner.lock();
            inner.apply(&key, value.into());
            if key.resets_page() {
                inner.state.page = 1;
            }
            inner.notification(self.mapper.as_ref())
        };
        notify(notification);
    }

    /// Set several fields and notify once.
    pub fn update_filters<K, V>(&self, partial: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<FilterKey>,
        V: Into<FilterValue>,
    {
        let notification = {
            let mut inner = self.inner.lock();
            let mut reset_page = false;
            for (key, value) in partial {
                let key = key.into();
                reset_page |= key.resets_page();
                inner.apply(&key, value.into());
            }
            if reset_page {
                inner.state.page = 1;
            }
            inner.notification(self.mapper.as_ref())
        };
        notify(notification);
    }

    /// Store search text immediately and commit it once typing pauses.
    pub fn update_search(&self, text: impl Into<String>) {
        let notification = {
            let mut inner = self.inner.lock();
            inner.state.search = text.into();
            inner.state.page = 1;
            self.schedule(&mut inner, Debounced::Search)
        };
        notify(notification);
    }

    /// Store the sort selection immediately and commit it once input pauses.
    pub fn update_sorting(&self, sort_by: impl Into<String>, sort_order: SortOrder) {
        let notification = {
            let mut inner = self.inner.lock();
            let sort_by = sort_by.into();
            if sort_by.trim().is_empty() {
                debug!("Ignored empty sort column");
            } else {
                inner.state.sort_by = sort_by;
            }
            inner.state.sort_order = sort_order;
            inner.state.page = 1;
            self.schedule(&mut inner, Debounced::Sort)
        };
        notify(notification);
    }

    /// Restore defaults, drop pending timers and notify.
    pub fn reset(&self) {
        let notification = {
            let mut inner = self.inner.lock();
            inner.search_timer.cancel();
            inner.sort_timer.cancel();
            inner.state = self.defaults.clone();
            inner.commit(Debounced::Search);
            inner.commit(Debounced::Sort);
            inner.notification(self.mapper.as_ref())
        };
        notify(notification);
    }

    /// Commit pending debounced values now. Notifies once if anything was
    /// pending.
    pub fn flush(&self) {
        let notification = {
            let mut inner = self.inner.lock();
            let mut flushed = false;
            for field in [Debounced::Search, Debounced::Sort] {
                if inner.timer(field).cancel() {
                    inner.commit(field);
                    flushed = true;
                }
            }
            if !flushed {
                return;
            }
            inner.notification(self.mapper.as_ref())
        };
        notify(notification);
    }

    // ─── Queries ───────────────────────────────────────────────────────────

    /// Parameters for the committed state.
    ///
    /// Page changes apply immediately while search and sort wait for their
    /// timers, so inside a debounce window this returns page 1 alongside the
    /// previously committed query or sort.
    pub fn to_api_params(&self) -> ApiParams {
        self.inner.lock().api_params(self.mapper.as_ref())
    }

    /// Raw state, including uncommitted search and sort input.
    pub fn state(&self) -> FilterState {
        self.inner.lock().state.clone()
    }

    /// Committed search text.
    pub fn committed_search(&self) -> String {
        self.inner.lock().search.clone()
    }

    /// Committed sort column and direction.
    pub fn committed_sort(&self) -> (String, SortOrder) {
        let inner = self.inner.lock();
        (inner.sort_by.clone(), inner.sort_order)
    }

    /// Whether a debounced commit is waiting on its timer.
    pub fn has_pending(&self) -> bool {
        let inner = self.inner.lock();
        inner.search_timer.is_pending() || inner.sort_timer.is_pending()
    }

    // ─── Timers ────────────────────────────────────────────────────────────

    fn schedule(&self, inner: &mut Inner, field: Debounced) -> Notification {
        let generation = inner.timer(field).rearm();
        let Ok(runtime) = Handle::try_current() else {
            debug!(field = field.label(), "No runtime, committing without debounce");
            inner.timer(field).complete(generation);
            inner.commit(field);
            return inner.notification(self.mapper.as_ref());
        };

        let delay = inner.timer(field).delay();
        let shared = Arc::downgrade(&self.inner);
        let mapper = Arc::clone(&self.mapper);
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            fire(&shared, mapper.as_ref(), field, generation);
        });
        inner.timer(field).track(handle);
        None
    }
}

fn fire(shared: &Weak<Mutex<Inner>>, mapper: &dyn ParamMapper, field: Debounced, generation: u64) {
    let Some(shared) = shared.upgrade() else {
        return;
    };
    let notification = {
        let mut inner = shared.lock();
        if !inner.timer(field).complete(generation) {
            debug!(field = field.label(), "Superseded debounce timer dropped");
            return;
        }
        inner.commit(field);
        debug!(field = field.label(), "Debounced value committed");
        inner.notification(mapper)
    };
    notify(notification);
}

impl Drop for FilterManager {
    fn drop(&mut self) {
        let mut inner = self.inner.lock();
        inner.search_timer.cancel();
        inner.sort_timer.cancel();
    }
}

impl std::fmt::Debug for FilterManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("FilterManager")
            .field("state", &inner.state)
            .field("search", &inner.search)
            .field("sort_by", &inner.sort_by)
            .field("sort_order", &inner.sort_order)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::mappers::BaseParams;
    use crate::filters::state::PerPage;
    use std::time::Duration;

    type Recorded = Arc<Mutex<Vec<ApiParams>>>;

    fn recording(manager: &FilterManager) -> Recorded {
        let recorded = Recorded::default();
        let sink = Arc::clone(&recorded);
        manager.on_changes(move |params| sink.lock().push(params.clone()));
        recorded
    }

    fn users() -> (FilterManager, Recorded) {
        let manager = FilterManager::users(&FilterConfig::default());
        let recorded = recording(&manager);
        (manager, recorded)
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    // ========================================================================
    // Immediate updates
    // ========================================================================

    #[test]
    fn test_filter_change_resets_page() {
        let (manager, recorded) = users();
        manager.update_filter("page", 5u32);
        manager.update_filter("status", "active");

        assert_eq!(manager.state().page, 1);
        let recorded = recorded.lock();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].get_i64("page"), Some(5));
        assert_eq!(recorded[1].get_i64("page"), Some(1));
        assert_eq!(recorded[1].get_str("status"), Some("active"));
    }

    #[test]
    fn test_per_page_keeps_page() {
        let (manager, _) = users();
        manager.update_filter(FilterKey::Page, 4u32);
        manager.update_filter("perPage", 50u32);

        let state = manager.state();
        assert_eq!(state.page, 4);
        assert_eq!(state.per_page, PerPage::Fifty);
    }

    #[test]
    fn test_batch_update_notifies_once() {
        let (manager, recorded) = users();
        manager.update_filter("page", 3u32);
        recorded.lock().clear();

        manager.update_filters([
            ("status", FilterValue::from("blocked")),
            ("segment", FilterValue::from("sms")),
        ]);

        let recorded = recorded.lock();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].get_i64("page"), Some(1));
        assert_eq!(recorded[0].get_i64("segment_id"), Some(-2));
    }

    #[test]
    fn test_batch_of_page_keys_keeps_page() {
        let (manager, _) = users();
        manager.update_filters([("page", 6u32), ("per_page", 100u32)]);
        assert_eq!(manager.state().page, 6);
    }

    #[test]
    fn test_malformed_values_ignored() {
        let (manager, recorded) = users();
        manager.update_filter("per_page", 33u32);
        manager.update_filter("sort_order", "sideways");
        manager.update_filter("page", 0i64);

        let params = manager.to_api_params();
        assert_eq!(params.get_i64("per_page"), Some(20));
        assert_eq!(params.get_str("sortorder"), Some("desc"));
        assert_eq!(params.get_i64("page"), Some(1));
        assert_eq!(recorded.lock().len(), 3);
    }

    #[test]
    fn test_last_subscriber_wins() {
        let (manager, first) = users();
        let second = recording(&manager);
        manager.update_filter("status", "active");

        assert!(first.lock().is_empty());
        assert_eq!(second.lock().len(), 1);
    }

    #[test]
    fn test_without_subscriber() {
        let manager = FilterManager::new(&FilterConfig::default(), BaseParams);
        manager.update_filter("status", "active");
        manager.reset();
        assert_eq!(manager.to_api_params().len(), 4);
    }

    #[test]
    fn test_reset_restores_initial_fields() {
        let manager = FilterManager::with_initial(
            &FilterConfig::default(),
            [("status", "open")],
            ConversationParams,
        );
        let recorded = recording(&manager);
        manager.update_filters([("status", "closed"), ("sortBy", "updated_at")]);
        manager.update_filter("page", 9u32);
        manager.reset();

        let state = manager.state();
        assert_eq!(state.page, 1);
        assert_eq!(state.sort_by, "id");
        assert_eq!(state.field("status"), Some(&FilterValue::from("open")));
        assert_eq!(recorded.lock().len(), 3);
        assert_eq!(manager.committed_sort(), ("id".to_string(), SortOrder::Desc));
    }

    #[test]
    fn test_search_key_commits_immediately() {
        let (manager, recorded) = users();
        manager.update_filter("search", "jane");

        assert_eq!(manager.committed_search(), "jane");
        assert_eq!(recorded.lock()[0].get_str("query"), Some("jane"));
    }

    #[test]
    fn test_debounced_updates_commit_without_runtime() {
        let (manager, recorded) = users();
        manager.update_search("jane");

        assert_eq!(manager.committed_search(), "jane");
        assert!(!manager.has_pending());
        assert_eq!(recorded.lock().len(), 1);
    }

    // ========================================================================
    // Debounced updates
    // ========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_search_debounced_to_last_value() {
        let (manager, recorded) = users();
        manager.update_search("abc");
        advance(200).await;
        manager.update_search("abcd");

        assert_eq!(manager.state().search, "abcd");
        assert_eq!(manager.committed_search(), "");

        advance(499).await;
        assert!(recorded.lock().is_empty());

        advance(2).await;
        let recorded = recorded.lock();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].get_str("query"), Some("abcd"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_resets_page_before_commit() {
        let (manager, _) = users();
        manager.update_filter("page", 4u32);
        manager.update_search("jo");

        assert_eq!(manager.state().page, 1);
        assert!(!manager.to_api_params().contains_key("query"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sorting_debounced() {
        let (manager, recorded) = users();
        manager.update_sorting("name", SortOrder::Asc);
        advance(100).await;
        manager.update_sorting("email", SortOrder::Asc);
        advance(299).await;
        assert!(recorded.lock().is_empty());
        assert_eq!(manager.committed_sort(), ("id".to_string(), SortOrder::Desc));

        advance(2).await;
        assert_eq!(recorded.lock().len(), 1);
        assert_eq!(manager.committed_sort(), ("email".to_string(), SortOrder::Asc));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sorting_resets_page() {
        let (manager, recorded) = users();
        manager.update_filter("page", 7u32);
        recorded.lock().clear();

        manager.update_sorting("name", SortOrder::Asc);
        assert_eq!(manager.state().page, 1);
        advance(400).await;

        let recorded = recorded.lock();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].get_i64("page"), Some(1));
        assert_eq!(recorded[0].get_str("sortby"), Some("name"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_params_inside_search_window() {
        let (manager, _) = users();
        manager.update_filter("search", "old");
        manager.update_filter("page", 3u32);
        manager.update_search("new");

        let params = manager.to_api_params();
        assert_eq!(params.get_i64("page"), Some(1));
        assert_eq!(params.get_str("query"), Some("old"));

        advance(501).await;
        let params = manager.to_api_params();
        assert_eq!(params.get_i64("page"), Some(1));
        assert_eq!(params.get_str("query"), Some("new"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fields_debounce_independently() {
        let (manager, recorded) = users();
        manager.update_search("a");
        manager.update_sorting("name", SortOrder::Asc);
        advance(1_000).await;

        let recorded = recorded.lock();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].get_str("sortby"), Some("name"));
        assert_eq!(recorded[1].get_str("query"), Some("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_commits_pending_search() {
        let (manager, recorded) = users();
        manager.update_search("refund");
        manager.flush();

        assert_eq!(manager.committed_search(), "refund");
        assert!(!manager.has_pending());
        assert_eq!(recorded.lock().len(), 1);

        advance(1_000).await;
        assert_eq!(recorded.lock().len(), 1);

        manager.flush();
        assert_eq!(recorded.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_cancels_pending_timers() {
        let (manager, recorded) = users();
        manager.update_search("stale");
        manager.reset();
        advance(1_000).await;

        let recorded = recorded.lock();
        assert_eq!(recorded.len(), 1);
        assert!(!recorded[0].contains_key("query"));
        assert_eq!(manager.state().search, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_search_cancels_pending_timer() {
        let (manager, recorded) = users();
        manager.update_search("typed");
        manager.update_filter("search", "picked");
        advance(1_000).await;

        let recorded = recorded.lock();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].get_str("query"), Some("picked"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_timers() {
        let (manager, recorded) = users();
        manager.update_search("gone");
        drop(manager);
        advance(1_000).await;

        assert!(recorded.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_windows() {
        let config = FilterConfig {
            search_debounce_ms: 50,
            ..FilterConfig::default()
        };
        let manager = FilterManager::users(&config);
        let recorded = recording(&manager);
        manager.update_search("fast");
        advance(51).await;

        assert_eq!(recorded.lock().len(), 1);
    }
}
