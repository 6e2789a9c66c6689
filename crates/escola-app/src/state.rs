// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::Duration;

use crate::{
    DEFAULT_ITEMS_PER_PAGE, DEFAULT_MAX_PAGES_TO_SHOW, FetchQuery, FilterChoice, FilterState,
    ListProfile, MutationOutcome, PageWindow, Record, RecordBatch, RecordKey, ServerPagination,
    StatValue, apply_filters, clamp_page, page_window, paginate, search, total_pages,
};

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(400);
pub const EMPTY_MESSAGE: &str = "Nenhum registo encontrado";
const DELETED_MESSAGE: &str = "registo eliminado";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListSettings {
    pub items_per_page: usize,
    pub max_pages_to_show: usize,
    pub search_debounce: Duration,
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            max_pages_to_show: DEFAULT_MAX_PAGES_TO_SHOW,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Loading,
    Loaded,
    Errored(String),
}

/// Where paging happens. Decided by the last successful fetch: a batch that
/// carries server pagination switches the list to server mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingMode {
    Client,
    Server,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListCommand {
    Mount,
    Retry,
    SearchInput(String),
    SearchDebounceElapsed { token: u64 },
    SetFilter { name: String, choice: FilterChoice },
    ClearFilters,
    GoToPage(usize),
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    RequestDelete(RecordKey),
    ConfirmDelete,
    CancelDelete,
    DismissNotice,
}

/// Effects for the host to carry out, plus notifications for redraws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    FetchRequested { request_id: u64, query: FetchQuery },
    Loaded { total_items: usize },
    LoadFailed(String),
    StaleResponseIgnored { request_id: u64 },
    DebounceScheduled { token: u64, delay: Duration },
    SearchApplied(String),
    FiltersChanged,
    PageChanged(usize),
    DeleteConfirmationOpened(RecordKey),
    DeleteRequested(RecordKey),
    DeleteCancelled,
    Notice(String),
    NoticeCleared,
}

/// One list page: fetched records plus the user's search, filters and page.
pub struct ListState<R> {
    profile: ListProfile<R>,
    settings: ListSettings,
    phase: LoadPhase,
    records: Vec<R>,
    server: Option<ServerPagination>,
    filters: FilterState,
    search_input: String,
    search_term: String,
    current_page: usize,
    confirming_delete: Option<RecordKey>,
    deleting: Option<RecordKey>,
    notice: Option<String>,
    last_request_id: u64,
    in_flight: Option<u64>,
    search_token: u64,
}

impl<R: Record + 'static> ListState<R> {
    pub fn new(profile: ListProfile<R>, settings: ListSettings) -> Self {
        Self {
            profile,
            settings: ListSettings {
                items_per_page: settings.items_per_page.max(1),
                max_pages_to_show: settings.max_pages_to_show.max(1),
                search_debounce: settings.search_debounce,
            },
            phase: LoadPhase::Idle,
            records: Vec::new(),
            server: None,
            filters: FilterState::new(),
            search_input: String::new(),
            search_term: String::new(),
            current_page: 1,
            confirming_delete: None,
            deleting: None,
            notice: None,
            last_request_id: 0,
            in_flight: None,
            search_token: 0,
        }
    }

    pub fn profile(&self) -> &ListProfile<R> {
        &self.profile
    }

    pub fn settings(&self) -> &ListSettings {
        &self.settings
    }

    pub fn phase(&self) -> &LoadPhase {
        &self.phase
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn confirming_delete(&self) -> Option<&RecordKey> {
        self.confirming_delete.as_ref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    pub fn paging_mode(&self) -> PagingMode {
        if self.server.is_some() {
            PagingMode::Server
        } else {
            PagingMode::Client
        }
    }

    pub fn dispatch(&mut self, command: ListCommand) -> Vec<ListEvent> {
        match command {
            ListCommand::Mount => {
                if self.phase != LoadPhase::Idle {
                    return Vec::new();
                }
                vec![self.start_fetch()]
            }
            ListCommand::Retry => vec![self.start_fetch()],
            ListCommand::SearchInput(text) => {
                if text == self.search_input {
                    return Vec::new();
                }
                self.search_input = text;
                self.search_token += 1;
                vec![ListEvent::DebounceScheduled {
                    token: self.search_token,
                    delay: self.settings.search_debounce,
                }]
            }
            ListCommand::SearchDebounceElapsed { token } => {
                if token != self.search_token || self.search_input == self.search_term {
                    return Vec::new();
                }
                self.search_term = self.search_input.clone();
                let mut events = vec![ListEvent::SearchApplied(self.search_term.clone())];
                self.criteria_changed(&mut events);
                events
            }
            ListCommand::SetFilter { name, choice } => {
                if !self.filters.set(&name, choice) {
                    return Vec::new();
                }
                let mut events = vec![ListEvent::FiltersChanged];
                self.criteria_changed(&mut events);
                events
            }
            ListCommand::ClearFilters => self.clear_criteria(),
            ListCommand::GoToPage(page) => self.go_to_page(page),
            ListCommand::NextPage => self.go_to_page(self.current_page.saturating_add(1)),
            ListCommand::PrevPage => self.go_to_page(self.current_page.saturating_sub(1)),
            ListCommand::FirstPage => self.go_to_page(1),
            ListCommand::LastPage => self.go_to_page(self.total_pages()),
            ListCommand::RequestDelete(key) => {
                if self.phase != LoadPhase::Loaded
                    || self.confirming_delete.is_some()
                    || self.deleting.is_some()
                {
                    return Vec::new();
                }
                self.confirming_delete = Some(key.clone());
                vec![ListEvent::DeleteConfirmationOpened(key)]
            }
            ListCommand::ConfirmDelete => {
                let Some(key) = self.confirming_delete.take() else {
                    return Vec::new();
                };
                tracing::info!(%key, "delete confirmed");
                self.deleting = Some(key.clone());
                vec![ListEvent::DeleteRequested(key)]
            }
            ListCommand::CancelDelete => match self.confirming_delete.take() {
                Some(_) => vec![ListEvent::DeleteCancelled],
                None => Vec::new(),
            },
            ListCommand::DismissNotice => match self.notice.take() {
                Some(_) => vec![ListEvent::NoticeCleared],
                None => Vec::new(),
            },
        }
    }

    /// Applies a fetch result. Only the most recently requested fetch may
    /// change state; anything else is dropped.
    pub fn complete_fetch(
        &mut self,
        request_id: u64,
        result: Result<RecordBatch<R>, String>,
    ) -> Vec<ListEvent> {
        if self.in_flight != Some(request_id) {
            tracing::debug!(
                request_id,
                current = ?self.in_flight,
                "ignoring stale fetch response"
            );
            return vec![ListEvent::StaleResponseIgnored { request_id }];
        }
        self.in_flight = None;

        match result {
            Ok(batch) => {
                self.records = batch.records;
                self.server = batch.pagination;
                self.current_page = match self.server {
                    Some(pagination) => {
                        clamp_page(pagination.current_page, pagination.total_pages)
                    }
                    None => clamp_page(self.current_page, self.total_pages()),
                };
                self.phase = LoadPhase::Loaded;
                let total_items = self.total_items();
                tracing::debug!(request_id, total_items, "fetch completed");
                vec![ListEvent::Loaded { total_items }]
            }
            Err(message) => {
                tracing::warn!(request_id, error = %message, "fetch failed");
                self.phase = LoadPhase::Errored(message.clone());
                vec![ListEvent::LoadFailed(message)]
            }
        }
    }

    /// Applies the result of the delete issued by `ConfirmDelete`. Success
    /// refetches; failure leaves page, filters and search untouched.
    pub fn complete_mutation(&mut self, result: Result<MutationOutcome, String>) -> Vec<ListEvent> {
        let Some(key) = self.deleting.take() else {
            tracing::debug!("ignoring mutation result with no delete pending");
            return Vec::new();
        };
        match result {
            Ok(outcome) => {
                let message = outcome
                    .message
                    .unwrap_or_else(|| DELETED_MESSAGE.to_owned());
                vec![self.set_notice(message), self.start_fetch()]
            }
            Err(message) => {
                tracing::warn!(%key, error = %message, "mutation failed");
                vec![self.set_notice(message)]
            }
        }
    }

    pub fn view(&self) -> ListView<'_, R> {
        let all = self.records.iter().collect::<Vec<_>>();
        let can_clear = self.filters.has_active() || !self.search_term.is_empty();

        match self.server {
            Some(pagination) => {
                let per_page = if pagination.items_per_page == 0 {
                    self.settings.items_per_page
                } else {
                    pagination.items_per_page
                };
                let total_pages = pagination.total_pages.max(1);
                let start_index = (self.current_page - 1) * per_page;
                ListView {
                    phase: &self.phase,
                    mode: PagingMode::Server,
                    stats: self.profile.server_stats(pagination.total_items, can_clear),
                    end_index: start_index + all.len(),
                    rows: all,
                    page: self.current_page,
                    total_pages,
                    total_items: pagination.total_items,
                    start_index,
                    window: page_window(
                        self.current_page,
                        total_pages,
                        self.settings.max_pages_to_show,
                    ),
                    can_clear,
                }
            }
            None => {
                let visible = self.visible(&all);
                let page = paginate(&visible, self.current_page, self.settings.items_per_page);
                ListView {
                    phase: &self.phase,
                    mode: PagingMode::Client,
                    stats: self.profile.stats(&all, &visible),
                    window: page_window(
                        page.page,
                        page.total_pages,
                        self.settings.max_pages_to_show,
                    ),
                    rows: page.items,
                    page: page.page,
                    total_pages: page.total_pages,
                    total_items: page.total_items,
                    start_index: page.start_index,
                    end_index: page.end_index,
                    can_clear,
                }
            }
        }
    }

    fn start_fetch(&mut self) -> ListEvent {
        self.last_request_id += 1;
        let request_id = self.last_request_id;
        if let Some(previous) = self.in_flight.replace(request_id) {
            tracing::debug!(previous, request_id, "superseding in-flight fetch");
        }
        self.phase = LoadPhase::Loading;
        let query = self.query();
        tracing::debug!(request_id, page = query.page, "fetch requested");
        ListEvent::FetchRequested { request_id, query }
    }

    /// Client mode asks for the whole unfiltered set, with no page or limit,
    /// so that all-record stats stay meaningful. A server that pages anyway
    /// answers with `pagination`, which switches the list to server mode.
    fn query(&self) -> FetchQuery {
        match self.paging_mode() {
            PagingMode::Client => FetchQuery::default(),
            PagingMode::Server => FetchQuery {
                page: self.current_page,
                per_page: self.settings.items_per_page,
                search: self.search_term.clone(),
                filters: self
                    .filters
                    .active()
                    .map(|(name, value)| (name.to_owned(), value.to_owned()))
                    .collect(),
            },
        }
    }

    fn criteria_changed(&mut self, events: &mut Vec<ListEvent>) {
        if self.current_page != 1 {
            self.current_page = 1;
            events.push(ListEvent::PageChanged(1));
        }
        if self.paging_mode() == PagingMode::Server {
            events.push(self.start_fetch());
        }
    }

    fn clear_criteria(&mut self) -> Vec<ListEvent> {
        let had_filters = self.filters.clear();
        let had_search = !self.search_term.is_empty() || !self.search_input.is_empty();
        if !had_filters && !had_search {
            return Vec::new();
        }

        let mut events = Vec::new();
        if had_filters {
            events.push(ListEvent::FiltersChanged);
        }
        if had_search {
            self.search_input.clear();
            self.search_term.clear();
            // Drops any debounce still pending for the old input.
            self.search_token += 1;
            events.push(ListEvent::SearchApplied(String::new()));
        }
        self.criteria_changed(&mut events);
        events
    }

    fn go_to_page(&mut self, page: usize) -> Vec<ListEvent> {
        let page = clamp_page(page, self.total_pages());
        if page == self.current_page {
            return Vec::new();
        }
        self.current_page = page;
        let mut events = vec![ListEvent::PageChanged(page)];
        if self.paging_mode() == PagingMode::Server {
            events.push(self.start_fetch());
        }
        events
    }

    fn set_notice(&mut self, message: String) -> ListEvent {
        self.notice = Some(message.clone());
        ListEvent::Notice(message)
    }

    fn visible<'a>(&self, all: &[&'a R]) -> Vec<&'a R> {
        let searched = search(all, &self.search_term, &self.profile.search_fields);
        apply_filters(&searched, &self.filters, &self.profile.filters)
    }

    fn total_items(&self) -> usize {
        match self.server {
            Some(pagination) => pagination.total_items,
            None => self.visible(&self.records.iter().collect::<Vec<_>>()).len(),
        }
    }

    fn total_pages(&self) -> usize {
        match self.server {
            Some(pagination) => pagination.total_pages.max(1),
            None => total_pages(self.total_items(), self.settings.items_per_page),
        }
    }
}

/// Everything needed to draw the list once.
pub struct ListView<'a, R> {
    pub phase: &'a LoadPhase,
    pub mode: PagingMode,
    pub rows: Vec<&'a R>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub start_index: usize,
    pub end_index: usize,
    pub window: PageWindow,
    pub stats: Vec<StatValue>,
    /// Filters or a search term are narrowing the list.
    pub can_clear: bool,
}

impl<R> ListView<'_, R> {
    pub fn empty_message(&self) -> Option<&'static str> {
        (*self.phase == LoadPhase::Loaded && self.rows.is_empty()).then_some(EMPTY_MESSAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DEFAULT_SEARCH_DEBOUNCE, EMPTY_MESSAGE, ListCommand, ListEvent, ListSettings, ListState,
        LoadPhase, PagingMode,
    };
    use crate::{
        FetchQuery, FilterChoice, FilterOptions, ListProfile, MutationOutcome, RecordBatch,
        RecordKey, ServerPagination, StatScope,
    };
    use serde_json::{Value, json};

    const MARIAS: [i64; 5] = [3, 7, 11, 15, 19];

    fn profile() -> ListProfile<Value> {
        ListProfile::new("Alunos")
            .search_fields(&["nome", "curso.nome"])
            .exact_filter("estado", "Estado", "estado", FilterOptions::Distinct("estado"))
            .total_card("Total", StatScope::AllRecords)
            .card("Ativos", StatScope::Filtered, |record: &Value| {
                record["estado"] == "ativo"
            })
            .column("Nome", |record| {
                record["nome"].as_str().unwrap_or_default().to_owned()
            })
    }

    fn records(count: i64) -> Vec<Value> {
        (1..=count)
            .map(|id| {
                let first = if MARIAS.contains(&id) { "Maria" } else { "João" };
                json!({
                    "id": id,
                    "nome": format!("{first} {id}"),
                    "estado": if id % 2 == 1 { "ativo" } else { "inativo" },
                })
            })
            .collect()
    }

    fn ids(state: &ListState<Value>) -> Vec<i64> {
        state
            .view()
            .rows
            .iter()
            .filter_map(|row| row["id"].as_i64())
            .collect()
    }

    fn fetch_id(events: &[ListEvent]) -> u64 {
        events
            .iter()
            .find_map(|event| match event {
                ListEvent::FetchRequested { request_id, .. } => Some(*request_id),
                _ => None,
            })
            .expect("a fetch should have been requested")
    }

    fn loaded(count: i64) -> ListState<Value> {
        let mut state = ListState::new(profile(), ListSettings::default());
        let events = state.dispatch(ListCommand::Mount);
        state.complete_fetch(fetch_id(&events), Ok(RecordBatch::complete(records(count))));
        state
    }

    fn search_for(state: &mut ListState<Value>, term: &str) -> Vec<ListEvent> {
        let scheduled = state.dispatch(ListCommand::SearchInput(term.to_owned()));
        let token = match scheduled.as_slice() {
            [ListEvent::DebounceScheduled { token, delay }] => {
                assert_eq!(*delay, DEFAULT_SEARCH_DEBOUNCE);
                *token
            }
            other => panic!("expected a debounce, got {other:?}"),
        };
        state.dispatch(ListCommand::SearchDebounceElapsed { token })
    }

    fn set_filter(state: &mut ListState<Value>, name: &str, value: &str) -> Vec<ListEvent> {
        state.dispatch(ListCommand::SetFilter {
            name: name.to_owned(),
            choice: FilterChoice::parse(value),
        })
    }

    #[test]
    fn mount_requests_one_unfiltered_fetch() {
        let mut state = ListState::new(profile(), ListSettings::default());
        assert_eq!(state.phase(), &LoadPhase::Idle);

        let events = state.dispatch(ListCommand::Mount);
        assert_eq!(
            events,
            vec![ListEvent::FetchRequested {
                request_id: 1,
                query: FetchQuery::default(),
            }]
        );
        assert_eq!(state.phase(), &LoadPhase::Loading);
        assert!(state.dispatch(ListCommand::Mount).is_empty());
    }

    #[test]
    fn twenty_three_records_page_and_clamp() {
        let mut state = loaded(23);
        let view = state.view();
        assert_eq!(view.total_pages, 3);
        assert_eq!(view.mode, PagingMode::Client);
        assert_eq!(ids(&state), (1..=10).collect::<Vec<_>>());

        assert_eq!(
            state.dispatch(ListCommand::GoToPage(3)),
            vec![ListEvent::PageChanged(3)]
        );
        assert_eq!(ids(&state), vec![21, 22, 23]);

        assert!(state.dispatch(ListCommand::GoToPage(4)).is_empty());
        assert_eq!(state.current_page(), 3);
        assert!(state.dispatch(ListCommand::NextPage).is_empty());

        state.dispatch(ListCommand::FirstPage);
        assert_eq!(state.current_page(), 1);
        assert!(state.dispatch(ListCommand::PrevPage).is_empty());
        state.dispatch(ListCommand::LastPage);
        assert_eq!(state.current_page(), 3);
    }

    #[test]
    fn search_narrows_to_one_page_and_resets_current_page() {
        let mut state = loaded(23);
        state.dispatch(ListCommand::GoToPage(3));

        let events = search_for(&mut state, "MARIA");
        assert_eq!(
            events,
            vec![
                ListEvent::SearchApplied("MARIA".to_owned()),
                ListEvent::PageChanged(1),
            ]
        );
        let view = state.view();
        assert_eq!(view.total_pages, 1);
        assert_eq!(view.total_items, 5);
        assert_eq!(ids(&state), MARIAS.to_vec());
    }

    #[test]
    fn only_latest_debounce_token_applies() {
        let mut state = loaded(23);
        let first = state.dispatch(ListCommand::SearchInput("ma".to_owned()));
        let second = state.dispatch(ListCommand::SearchInput("mar".to_owned()));
        let (ListEvent::DebounceScheduled { token: old, .. }, ListEvent::DebounceScheduled { token: new, .. }) =
            (&first[0], &second[0])
        else {
            panic!("expected debounce events");
        };

        assert!(state
            .dispatch(ListCommand::SearchDebounceElapsed { token: *old })
            .is_empty());
        assert_eq!(state.search_term(), "");

        state.dispatch(ListCommand::SearchDebounceElapsed { token: *new });
        assert_eq!(state.search_term(), "mar");
        assert_eq!(state.search_input(), "mar");
    }

    #[test]
    fn filter_change_resets_page_four_to_one() {
        let mut state = loaded(40);
        state.dispatch(ListCommand::GoToPage(4));
        assert_eq!(state.current_page(), 4);

        let events = set_filter(&mut state, "estado", "ativo");
        assert_eq!(
            events,
            vec![ListEvent::FiltersChanged, ListEvent::PageChanged(1)]
        );
        assert_eq!(state.view().total_items, 20);
        assert!(set_filter(&mut state, "estado", "ativo").is_empty());
    }

    #[test]
    fn stats_follow_each_card_scope() {
        let mut state = loaded(10);
        set_filter(&mut state, "estado", "inativo");
        let stats = state
            .view()
            .stats
            .into_iter()
            .map(|stat| (stat.label, stat.count))
            .collect::<Vec<_>>();
        assert_eq!(
            stats,
            vec![("Total".to_owned(), Some(10)), ("Ativos".to_owned(), Some(0))]
        );
    }

    #[test]
    fn stale_fetch_response_is_ignored() {
        let mut state = ListState::new(profile(), ListSettings::default());
        let first = fetch_id(&state.dispatch(ListCommand::Mount));
        let second = fetch_id(&state.dispatch(ListCommand::Retry));
        assert_ne!(first, second);

        let events = state.complete_fetch(first, Ok(RecordBatch::complete(records(3))));
        assert_eq!(
            events,
            vec![ListEvent::StaleResponseIgnored { request_id: first }]
        );
        assert_eq!(state.phase(), &LoadPhase::Loading);
        assert!(state.records().is_empty());

        state.complete_fetch(second, Ok(RecordBatch::complete(records(7))));
        assert_eq!(state.phase(), &LoadPhase::Loaded);
        assert_eq!(state.records().len(), 7);
        assert_eq!(state.in_flight(), None);
    }

    #[test]
    fn failed_fetch_errors_and_retry_reloads() {
        let mut state = ListState::new(profile(), ListSettings::default());
        let id = fetch_id(&state.dispatch(ListCommand::Mount));
        let events = state.complete_fetch(id, Err("tempo limite excedido".to_owned()));
        assert_eq!(
            events,
            vec![ListEvent::LoadFailed("tempo limite excedido".to_owned())]
        );
        assert_eq!(
            state.phase(),
            &LoadPhase::Errored("tempo limite excedido".to_owned())
        );

        let retry = fetch_id(&state.dispatch(ListCommand::Retry));
        assert_eq!(state.phase(), &LoadPhase::Loading);
        state.complete_fetch(retry, Ok(RecordBatch::complete(records(2))));
        assert_eq!(ids(&state), vec![1, 2]);
    }

    #[test]
    fn delete_requires_confirmation_and_refetches() {
        let mut state = loaded(5);
        let key = RecordKey::Int(3);

        assert_eq!(
            state.dispatch(ListCommand::RequestDelete(key.clone())),
            vec![ListEvent::DeleteConfirmationOpened(key.clone())]
        );
        assert_eq!(
            state.dispatch(ListCommand::CancelDelete),
            vec![ListEvent::DeleteCancelled]
        );
        assert_eq!(state.confirming_delete(), None);
        assert_eq!(state.phase(), &LoadPhase::Loaded);

        state.dispatch(ListCommand::RequestDelete(key.clone()));
        assert_eq!(state.confirming_delete(), Some(&key));
        assert_eq!(
            state.dispatch(ListCommand::ConfirmDelete),
            vec![ListEvent::DeleteRequested(key.clone())]
        );

        let events = state.complete_mutation(Ok(MutationOutcome {
            key: Some(key),
            message: None,
        }));
        assert_eq!(events[0], ListEvent::Notice("registo eliminado".to_owned()));
        let refetch = fetch_id(&events);
        assert_eq!(state.phase(), &LoadPhase::Loading);

        let mut remaining = records(5);
        remaining.remove(2);
        state.complete_fetch(refetch, Ok(RecordBatch::complete(remaining)));
        assert_eq!(ids(&state), vec![1, 2, 4, 5]);
    }

    #[test]
    fn failed_delete_keeps_page_and_filters() {
        let mut state = loaded(40);
        set_filter(&mut state, "estado", "ativo");
        state.dispatch(ListCommand::NextPage);
        assert_eq!(state.current_page(), 2);

        state.dispatch(ListCommand::RequestDelete(RecordKey::Int(21)));
        state.dispatch(ListCommand::ConfirmDelete);
        let events = state.complete_mutation(Err("sem permissão".to_owned()));

        assert_eq!(events, vec![ListEvent::Notice("sem permissão".to_owned())]);
        assert_eq!(state.notice(), Some("sem permissão"));
        assert_eq!(state.phase(), &LoadPhase::Loaded);
        assert_eq!(state.current_page(), 2);
        assert_eq!(state.filters().choice("estado").as_str(), "ativo");

        assert_eq!(
            state.dispatch(ListCommand::DismissNotice),
            vec![ListEvent::NoticeCleared]
        );
    }

    #[test]
    fn delete_is_not_offered_while_loading() {
        let mut state = ListState::new(profile(), ListSettings::default());
        state.dispatch(ListCommand::Mount);
        assert!(state
            .dispatch(ListCommand::RequestDelete(RecordKey::Int(1)))
            .is_empty());
        assert!(state.dispatch(ListCommand::ConfirmDelete).is_empty());
    }

    #[test]
    fn empty_result_offers_to_clear() {
        let mut state = loaded(23);
        search_for(&mut state, "zzz");
        set_filter(&mut state, "estado", "ativo");

        let view = state.view();
        assert!(view.rows.is_empty());
        assert_eq!(view.total_pages, 1);
        assert_eq!(view.empty_message(), Some(EMPTY_MESSAGE));
        assert!(view.can_clear);

        let events = state.dispatch(ListCommand::ClearFilters);
        assert_eq!(
            events,
            vec![
                ListEvent::FiltersChanged,
                ListEvent::SearchApplied(String::new()),
            ]
        );
        assert_eq!(state.view().total_items, 23);
        assert!(state.dispatch(ListCommand::ClearFilters).is_empty());
    }

    #[test]
    fn server_paged_results_are_not_filtered_locally() {
        let mut state = ListState::new(profile(), ListSettings::default());
        let id = fetch_id(&state.dispatch(ListCommand::Mount));
        state.complete_fetch(
            id,
            Ok(RecordBatch::paged(
                records(10),
                ServerPagination {
                    current_page: 2,
                    total_pages: 5,
                    total_items: 48,
                    items_per_page: 10,
                },
            )),
        );
        assert_eq!(state.paging_mode(), PagingMode::Server);
        assert_eq!(state.current_page(), 2);

        let events = set_filter(&mut state, "estado", "ativo");
        assert_eq!(events[..2], [ListEvent::FiltersChanged, ListEvent::PageChanged(1)]);
        assert_eq!(
            events[2],
            ListEvent::FetchRequested {
                request_id: 2,
                query: FetchQuery {
                    page: 1,
                    per_page: 10,
                    search: String::new(),
                    filters: vec![("estado".to_owned(), "ativo".to_owned())],
                },
            }
        );

        let view = state.view();
        assert_eq!(view.rows.len(), 10);
        assert_eq!(view.total_items, 48);
        assert_eq!(view.total_pages, 5);
        assert_eq!(view.start_index, 0);
    }

    #[test]
    fn server_paged_stats_never_count_one_page_as_the_whole() {
        let mut state = ListState::new(profile(), ListSettings::default());
        let id = fetch_id(&state.dispatch(ListCommand::Mount));
        let pagination = ServerPagination {
            current_page: 1,
            total_pages: 5,
            total_items: 48,
            items_per_page: 10,
        };
        state.complete_fetch(id, Ok(RecordBatch::paged(records(10), pagination)));

        let view = state.view();
        assert_eq!(view.rows.len(), 10);
        let stats = view
            .stats
            .iter()
            .map(|stat| (stat.label.as_str(), stat.count))
            .collect::<Vec<_>>();
        assert_eq!(stats, vec![("Total", Some(48)), ("Ativos", None)]);

        let events = set_filter(&mut state, "estado", "ativo");
        let id = fetch_id(&events);
        let narrowed = ServerPagination {
            total_pages: 2,
            total_items: 12,
            ..pagination
        };
        state.complete_fetch(id, Ok(RecordBatch::paged(records(10), narrowed)));
        assert_eq!(state.view().stats[0].count, None, "filtered server total is not all records");
    }

    #[test]
    fn stray_mutation_completion_is_ignored() {
        let mut state = loaded(12);
        assert!(
            state
                .complete_mutation(Ok(MutationOutcome::default()))
                .is_empty()
        );
        assert!(state.complete_mutation(Err("sem permissão".to_owned())).is_empty());
        assert_eq!(state.notice(), None);
        assert_eq!(state.phase(), &LoadPhase::Loaded);
    }

    #[test]
    fn server_page_change_fetches_requested_page() {
        let mut state = ListState::new(profile(), ListSettings::default());
        let id = fetch_id(&state.dispatch(ListCommand::Mount));
        state.complete_fetch(
            id,
            Ok(RecordBatch::paged(
                records(10),
                ServerPagination {
                    current_page: 1,
                    total_pages: 3,
                    total_items: 25,
                    items_per_page: 10,
                },
            )),
        );

        let events = state.dispatch(ListCommand::GoToPage(9));
        assert_eq!(events[0], ListEvent::PageChanged(3));
        let ListEvent::FetchRequested { query, .. } = &events[1] else {
            panic!("expected a fetch, got {:?}", events[1]);
        };
        assert_eq!(query.page, 3);
    }
}
