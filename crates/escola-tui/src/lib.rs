// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use escola_app::{
    Enrollment, FetchQuery, FilterChoice, FilterOption, ListCommand, ListEvent,
    ListProfile, ListSettings, ListState, LoadPhase, MutationOutcome, PageLink, PageWindow,
    PagingMode, Payment, Record, RecordBatch, RecordKey, Resource, Route, SchoolClass, StatValue,
    Student, Teacher, classes_profile, enrollments_profile, payments_profile, students_profile,
    teachers_profile,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const ALL_LABEL: &str = "Todos";

/// Records of one resource, as returned by a runtime fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchedBatch {
    Students(RecordBatch<Student>),
    Teachers(RecordBatch<Teacher>),
    Classes(RecordBatch<SchoolClass>),
    Enrollments(RecordBatch<Enrollment>),
    Payments(RecordBatch<Payment>),
}

impl FetchedBatch {
    pub fn resource(&self) -> Resource {
        match self {
            Self::Students(_) => Resource::Students,
            Self::Teachers(_) => Resource::Teachers,
            Self::Classes(_) => Resource::Classes,
            Self::Enrollments(_) => Resource::Enrollments,
            Self::Payments(_) => Resource::Payments,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Students(batch) => batch.records.len(),
            Self::Teachers(batch) => batch.records.len(),
            Self::Classes(batch) => batch.records.len(),
            Self::Enrollments(batch) => batch.records.len(),
            Self::Payments(batch) => batch.records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A record type with its own list page.
pub trait Listed: Record + Clone + 'static {
    const RESOURCE: Resource;

    fn profile() -> ListProfile<Self>;
    fn from_batch(batch: FetchedBatch) -> Option<RecordBatch<Self>>;
}

macro_rules! listed {
    ($record:ty, $variant:ident, $profile:path) => {
        impl Listed for $record {
            const RESOURCE: Resource = Resource::$variant;

            fn profile() -> ListProfile<Self> {
                $profile()
            }

            fn from_batch(batch: FetchedBatch) -> Option<RecordBatch<Self>> {
                match batch {
                    FetchedBatch::$variant(batch) => Some(batch),
                    _ => None,
                }
            }
        }

        impl From<RecordBatch<$record>> for FetchedBatch {
            fn from(batch: RecordBatch<$record>) -> Self {
                Self::$variant(batch)
            }
        }
    };
}

listed!(Student, Students, students_profile);
listed!(Teacher, Teachers, teachers_profile);
listed!(SchoolClass, Classes, classes_profile);
listed!(Enrollment, Enrollments, enrollments_profile);
listed!(Payment, Payments, payments_profile);

/// Identifies the mounted list a background result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub mount: u64,
    pub resource: Resource,
    pub request_id: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    SearchDebounce {
        mount: u64,
        token: u64,
    },
    FetchCompleted {
        ticket: Ticket,
        result: Result<FetchedBatch, String>,
    },
    DeleteCompleted {
        ticket: Ticket,
        result: Result<MutationOutcome, String>,
    },
}

pub trait ListRuntime {
    fn fetch(&mut self, resource: Resource, query: &FetchQuery) -> Result<FetchedBatch>;
    fn delete(&mut self, resource: Resource, key: &RecordKey) -> Result<MutationOutcome>;

    fn spawn_fetch(
        &mut self,
        ticket: Ticket,
        query: &FetchQuery,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let result = self
            .fetch(ticket.resource, query)
            .map_err(|error| format!("{error:#}"));
        tx.send(InternalEvent::FetchCompleted { ticket, result })
            .map_err(|_| anyhow!("list event channel closed"))?;
        Ok(())
    }

    fn spawn_delete(
        &mut self,
        ticket: Ticket,
        key: &RecordKey,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let result = self
            .delete(ticket.resource, key)
            .map_err(|error| format!("{error:#}"));
        tx.send(InternalEvent::DeleteCompleted { ticket, result })
            .map_err(|_| anyhow!("list event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiSettings {
    pub list: ListSettings,
    pub start: Resource,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            list: ListSettings::default(),
            start: Resource::Students,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FrameRow {
    key: RecordKey,
    cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FilterFrame {
    name: &'static str,
    label: &'static str,
    options: Vec<FilterOption>,
    choice: FilterChoice,
}

impl FilterFrame {
    fn selected_label(&self) -> String {
        match &self.choice {
            FilterChoice::All => ALL_LABEL.to_owned(),
            FilterChoice::Only(value) => self
                .options
                .iter()
                .find(|option| &option.value == value)
                .map_or_else(|| value.clone(), |option| option.label.clone()),
        }
    }

    /// The choice after the current one, wrapping through `All`.
    fn next_choice(&self) -> Option<FilterChoice> {
        if self.options.is_empty() {
            return None;
        }
        let position = match &self.choice {
            FilterChoice::All => 0,
            FilterChoice::Only(value) => self
                .options
                .iter()
                .position(|option| &option.value == value)
                .map_or(0, |index| index + 1),
        };
        Some(match self.options.get(position) {
            Some(option) => FilterChoice::Only(option.value.clone()),
            None => FilterChoice::All,
        })
    }
}

/// Owned snapshot of one list, ready to draw.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScreenFrame {
    title: &'static str,
    phase: LoadPhase,
    mode: PagingMode,
    headers: Vec<&'static str>,
    rows: Vec<FrameRow>,
    page: usize,
    total_pages: usize,
    total_items: usize,
    start_index: usize,
    end_index: usize,
    window: PageWindow,
    stats: Vec<StatValue>,
    filters: Vec<FilterFrame>,
    search_input: String,
    confirming_delete: Option<RecordKey>,
    empty_message: Option<&'static str>,
    can_clear: bool,
}

trait Screen {
    fn resource(&self) -> Resource;
    fn dispatch(&mut self, command: ListCommand) -> Vec<ListEvent>;
    fn complete_fetch(
        &mut self,
        request_id: u64,
        result: Result<FetchedBatch, String>,
    ) -> Vec<ListEvent>;
    fn complete_mutation(&mut self, result: Result<MutationOutcome, String>) -> Vec<ListEvent>;
    fn frame(&self) -> ScreenFrame;
}

struct ListScreen<R> {
    state: ListState<R>,
}

impl<R: Listed> Screen for ListScreen<R> {
    fn resource(&self) -> Resource {
        R::RESOURCE
    }

    fn dispatch(&mut self, command: ListCommand) -> Vec<ListEvent> {
        self.state.dispatch(command)
    }

    fn complete_fetch(
        &mut self,
        request_id: u64,
        result: Result<FetchedBatch, String>,
    ) -> Vec<ListEvent> {
        let result = result.and_then(|batch| {
            let received = batch.resource();
            R::from_batch(batch).ok_or_else(|| {
                format!(
                    "expected {} records, got {}",
                    R::RESOURCE.path(),
                    received.path()
                )
            })
        });
        self.state.complete_fetch(request_id, result)
    }

    fn complete_mutation(&mut self, result: Result<MutationOutcome, String>) -> Vec<ListEvent> {
        self.state.complete_mutation(result)
    }

    fn frame(&self) -> ScreenFrame {
        let profile = self.state.profile();
        let view = self.state.view();
        let loaded = self.state.records().iter().collect::<Vec<_>>();
        let filters = profile
            .filter_controls
            .iter()
            .map(|control| FilterFrame {
                name: control.name,
                label: control.label,
                options: profile.options_for(control, &loaded),
                choice: self.state.filters().choice(control.name).clone(),
            })
            .collect();

        ScreenFrame {
            title: profile.title,
            phase: view.phase.clone(),
            mode: view.mode,
            headers: profile.columns.iter().map(|column| column.label).collect(),
            rows: view
                .rows
                .iter()
                .map(|record| FrameRow {
                    key: record.key(),
                    cells: profile.render_row(record),
                })
                .collect(),
            page: view.page,
            total_pages: view.total_pages,
            total_items: view.total_items,
            start_index: view.start_index,
            end_index: view.end_index,
            empty_message: view.empty_message(),
            can_clear: view.can_clear,
            window: view.window,
            stats: view.stats,
            filters,
            search_input: self.state.search_input().to_owned(),
            confirming_delete: self.state.confirming_delete().cloned(),
        }
    }
}

fn new_screen(resource: Resource, settings: ListSettings) -> Box<dyn Screen> {
    fn boxed<R: Listed>(settings: ListSettings) -> Box<dyn Screen> {
        Box::new(ListScreen {
            state: ListState::new(R::profile(), settings),
        })
    }

    match resource {
        Resource::Students => boxed::<Student>(settings),
        Resource::Teachers => boxed::<Teacher>(settings),
        Resource::Classes => boxed::<SchoolClass>(settings),
        Resource::Enrollments => boxed::<Enrollment>(settings),
        Resource::Payments => boxed::<Payment>(settings),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Nav,
    Search,
}

struct ViewData {
    screen: Box<dyn Screen>,
    settings: ListSettings,
    mount: u64,
    input: InputMode,
    cursor: usize,
    focused_filter: usize,
    detail_visible: bool,
    help_visible: bool,
    status_line: Option<String>,
    status_token: u64,
}

impl ViewData {
    fn new(settings: ListSettings, resource: Resource) -> Self {
        Self {
            screen: new_screen(resource, settings),
            settings,
            mount: 0,
            input: InputMode::Nav,
            cursor: 0,
            focused_filter: 0,
            detail_visible: false,
            help_visible: false,
            status_line: None,
            status_token: 0,
        }
    }

    fn ticket(&self, request_id: u64) -> Ticket {
        Ticket {
            mount: self.mount,
            resource: self.screen.resource(),
            request_id,
        }
    }
}

pub fn run_app<R: ListRuntime>(runtime: &mut R, settings: &UiSettings) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let result = Terminal::new(backend)
        .context("create terminal")
        .and_then(|mut terminal| event_loop(&mut terminal, runtime, settings));

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn event_loop<R: ListRuntime>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    runtime: &mut R,
    settings: &UiSettings,
) -> Result<()> {
    let (internal_tx, internal_rx) = mpsc::channel();
    let mut view_data = ViewData::new(settings.list, settings.start);
    mount(runtime, &mut view_data, &internal_tx, settings.start);

    loop {
        process_internal_events(runtime, &mut view_data, &internal_tx, &internal_rx);

        let frame_data = view_data.screen.frame();
        terminal
            .draw(|frame| render(frame, &view_data, &frame_data))
            .context("draw frame")?;

        if event::poll(Duration::from_millis(120)).context("poll event")? {
            if let Event::Key(key) = event::read().context("read event")? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(runtime, &mut view_data, &internal_tx, key) {
                    return Ok(());
                }
            }
        }
    }
}

/// Replaces the current list with a fresh one. State of the old list is
/// dropped and its pending results are ignored.
fn mount<R: ListRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    resource: Resource,
) {
    view_data.mount = view_data.mount.saturating_add(1);
    view_data.screen = new_screen(resource, view_data.settings);
    view_data.input = InputMode::Nav;
    view_data.cursor = 0;
    view_data.focused_filter = 0;
    view_data.detail_visible = false;
    dispatch(runtime, view_data, tx, ListCommand::Mount);
}

fn dispatch<R: ListRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: ListCommand,
) {
    let events = view_data.screen.dispatch(command);
    apply_list_events(runtime, view_data, tx, events);
}

fn apply_list_events<R: ListRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    events: Vec<ListEvent>,
) {
    for event in events {
        match event {
            ListEvent::FetchRequested { request_id, query } => {
                let ticket = view_data.ticket(request_id);
                if let Err(error) = runtime.spawn_fetch(ticket, &query, tx.clone()) {
                    emit_status(view_data, tx, format!("falha ao pedir registos: {error}"));
                }
            }
            ListEvent::DebounceScheduled { token, delay } => {
                schedule_debounce(tx, view_data.mount, token, delay);
            }
            ListEvent::DeleteRequested(key) => {
                let ticket = view_data.ticket(0);
                if let Err(error) = runtime.spawn_delete(ticket, &key, tx.clone()) {
                    emit_status(view_data, tx, format!("falha ao eliminar: {error}"));
                }
            }
            ListEvent::Notice(message) => emit_status(view_data, tx, message),
            ListEvent::NoticeCleared => view_data.status_line = None,
            ListEvent::PageChanged(_) | ListEvent::FiltersChanged | ListEvent::SearchApplied(_) => {
                view_data.cursor = 0;
            }
            ListEvent::Loaded { .. }
            | ListEvent::LoadFailed(_)
            | ListEvent::StaleResponseIgnored { .. }
            | ListEvent::DeleteConfirmationOpened(_)
            | ListEvent::DeleteCancelled => {}
        }
    }
    clamp_cursor(view_data);
}

fn process_internal_events<R: ListRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        handle_internal_event(runtime, view_data, tx, event);
    }
}

fn handle_internal_event<R: ListRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    event: InternalEvent,
) {
    match event {
        InternalEvent::ClearStatus { token } if token == view_data.status_token => {
            view_data.status_line = None;
            dispatch(runtime, view_data, tx, ListCommand::DismissNotice);
        }
        InternalEvent::ClearStatus { .. } => {}
        InternalEvent::SearchDebounce { mount, token } if mount == view_data.mount => {
            dispatch(
                runtime,
                view_data,
                tx,
                ListCommand::SearchDebounceElapsed { token },
            );
        }
        InternalEvent::SearchDebounce { .. } => {}
        InternalEvent::FetchCompleted { ticket, result } if ticket.mount == view_data.mount => {
            let events = view_data.screen.complete_fetch(ticket.request_id, result);
            apply_list_events(runtime, view_data, tx, events);
        }
        InternalEvent::DeleteCompleted { ticket, result } if ticket.mount == view_data.mount => {
            let events = view_data.screen.complete_mutation(result);
            apply_list_events(runtime, view_data, tx, events);
        }
        InternalEvent::FetchCompleted { ticket, .. } | InternalEvent::DeleteCompleted { ticket, .. } => {
            tracing::debug!(
                mount = ticket.mount,
                resource = ticket.resource.path(),
                "dropping result for unmounted list"
            );
        }
    }
}

fn schedule_debounce(internal_tx: &Sender<InternalEvent>, mount: u64, token: u64, delay: Duration) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(delay);
        let _ = sender.send(InternalEvent::SearchDebounce { mount, token });
    });
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    view_data.status_line = Some(message.into());
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn clamp_cursor(view_data: &mut ViewData) {
    let rows = view_data.screen.frame().rows.len();
    view_data.cursor = view_data.cursor.min(rows.saturating_sub(1));
}

fn handle_key_event<R: ListRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('q') {
        return true;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            view_data.help_visible = false;
        }
        return false;
    }

    if view_data.screen.frame().confirming_delete.is_some() {
        let command = match key.code {
            KeyCode::Char('y' | 'Y') => Some(ListCommand::ConfirmDelete),
            KeyCode::Char('n' | 'N') | KeyCode::Esc => Some(ListCommand::CancelDelete),
            _ => None,
        };
        if let Some(command) = command {
            dispatch(runtime, view_data, tx, command);
        }
        return false;
    }

    if view_data.detail_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
            view_data.detail_visible = false;
        }
        return false;
    }

    if view_data.input == InputMode::Search {
        handle_search_key(runtime, view_data, tx, key);
        return false;
    }

    match key.code {
        KeyCode::Char('/') => view_data.input = InputMode::Search,
        KeyCode::Tab => switch_resource(runtime, view_data, tx, 1),
        KeyCode::BackTab => switch_resource(runtime, view_data, tx, -1),
        KeyCode::Char('f') => cycle_focused_filter(runtime, view_data, tx),
        KeyCode::Char('F') => {
            let count = view_data.screen.frame().filters.len();
            if count > 0 {
                view_data.focused_filter = (view_data.focused_filter + 1) % count;
            }
        }
        KeyCode::Char('c') => dispatch(runtime, view_data, tx, ListCommand::ClearFilters),
        KeyCode::Left => dispatch(runtime, view_data, tx, ListCommand::PrevPage),
        KeyCode::Right => dispatch(runtime, view_data, tx, ListCommand::NextPage),
        KeyCode::Home => dispatch(runtime, view_data, tx, ListCommand::FirstPage),
        KeyCode::End => dispatch(runtime, view_data, tx, ListCommand::LastPage),
        KeyCode::Up => view_data.cursor = view_data.cursor.saturating_sub(1),
        KeyCode::Down => {
            view_data.cursor = view_data.cursor.saturating_add(1);
            clamp_cursor(view_data);
        }
        KeyCode::Enter => {
            view_data.detail_visible = !view_data.screen.frame().rows.is_empty();
        }
        KeyCode::Char('d') => {
            if let Some(row) = view_data.screen.frame().rows.get(view_data.cursor) {
                dispatch(
                    runtime,
                    view_data,
                    tx,
                    ListCommand::RequestDelete(row.key.clone()),
                );
            }
        }
        KeyCode::Char('r') => dispatch(runtime, view_data, tx, ListCommand::Retry),
        KeyCode::Char('?') => view_data.help_visible = true,
        KeyCode::Esc => dispatch(runtime, view_data, tx, ListCommand::DismissNotice),
        _ => {}
    }
    false
}

fn handle_search_key<R: ListRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let mut input = view_data.screen.frame().search_input;
    match key.code {
        KeyCode::Esc | KeyCode::Enter => {
            view_data.input = InputMode::Nav;
            return;
        }
        KeyCode::Backspace => {
            input.pop();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => input.clear(),
        KeyCode::Char(ch) => input.push(ch),
        _ => return,
    }
    dispatch(runtime, view_data, tx, ListCommand::SearchInput(input));
}

fn switch_resource<R: ListRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    delta: isize,
) {
    let tabs = Resource::ALL;
    let current = tabs
        .iter()
        .position(|resource| *resource == view_data.screen.resource())
        .unwrap_or(0) as isize;
    let next = (current + delta).rem_euclid(tabs.len() as isize) as usize;
    mount(runtime, view_data, tx, tabs[next]);
}

fn cycle_focused_filter<R: ListRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let frame = view_data.screen.frame();
    let Some(filter) = frame.filters.get(view_data.focused_filter) else {
        return;
    };
    if let Some(choice) = filter.next_choice() {
        let name = filter.name.to_owned();
        dispatch(
            runtime,
            view_data,
            tx,
            ListCommand::SetFilter { name, choice },
        );
    }
}

fn render(frame: &mut ratatui::Frame<'_>, view_data: &ViewData, screen: &ScreenFrame) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let selected = Resource::ALL
        .iter()
        .position(|resource| *resource == view_data.screen.resource())
        .unwrap_or(0);
    let tabs = Tabs::new(Resource::ALL.iter().map(|resource| resource.label()))
        .block(Block::default().title("escola").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    let criteria = [
        render_search_line(screen, view_data.input == InputMode::Search),
        render_filter_line(screen, view_data.focused_filter),
    ]
    .join("\n");
    frame.render_widget(
        Paragraph::new(criteria).block(Block::default().borders(Borders::ALL).title("filtros")),
        layout[1],
    );

    frame.render_widget(
        Paragraph::new(render_stats_line(screen))
            .block(Block::default().borders(Borders::ALL).title("resumo")),
        layout[2],
    );

    match render_body_message(screen) {
        Some(message) => {
            let style = match screen.phase {
                LoadPhase::Errored(_) => Style::default().fg(Color::Red),
                _ => Style::default().fg(Color::Gray),
            };
            frame.render_widget(
                Paragraph::new(message)
                    .style(style)
                    .wrap(Wrap { trim: true })
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .title(table_title(screen)),
                    ),
                layout[3],
            );
        }
        None => render_table(frame, layout[3], screen, view_data.cursor),
    }

    frame.render_widget(
        Paragraph::new(render_pager_line(screen)).block(Block::default().borders(Borders::ALL)),
        layout[4],
    );

    frame.render_widget(
        Paragraph::new(status_text(view_data))
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::TOP)),
        layout[5],
    );

    if let Some(key) = &screen.confirming_delete {
        let area = centered_rect(50, 20, frame.area());
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(render_delete_prompt(screen, key)).block(
                Block::default()
                    .title("confirmar")
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Red)),
            ),
            area,
        );
    }

    if view_data.detail_visible
        && let Some(text) = render_detail_text(screen, view_data.screen.resource(), view_data.cursor)
    {
        let area = centered_rect(60, 60, frame.area());
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(text).block(Block::default().title("detalhes").borders(Borders::ALL)),
            area,
        );
    }

    if view_data.help_visible {
        let area = centered_rect(70, 70, frame.area());
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(help_overlay_text())
                .block(Block::default().title("ajuda").borders(Borders::ALL)),
            area,
        );
    }
}

fn render_table(frame: &mut ratatui::Frame<'_>, area: Rect, screen: &ScreenFrame, cursor: usize) {
    let widths = vec![Constraint::Min(6); screen.headers.len().max(1)];
    let header = Row::new(screen.headers.iter().map(|label| {
        Cell::from(*label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let rows = screen.rows.iter().enumerate().map(|(index, row)| {
        let style = if index == cursor {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default()
        };
        Row::new(row.cells.iter().map(|cell| Cell::from(cell.as_str()))).style(style)
    });

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(table_title(screen))
                .borders(Borders::ALL),
        );
    frame.render_widget(table, area);
}

fn table_title(screen: &ScreenFrame) -> String {
    let mut title = format!("{} ({})", screen.title, screen.total_items);
    if screen.phase == LoadPhase::Loading && !screen.rows.is_empty() {
        title.push_str(" a carregar…");
    }
    if screen.mode == PagingMode::Server {
        title.push_str(" [servidor]");
    }
    title
}

fn render_search_line(screen: &ScreenFrame, editing: bool) -> String {
    let cursor = if editing { "▏" } else { "" };
    format!("pesquisa: {}{cursor}", screen.search_input)
}

fn render_filter_line(screen: &ScreenFrame, focused: usize) -> String {
    screen
        .filters
        .iter()
        .enumerate()
        .map(|(index, filter)| {
            let text = format!("{}: {}", filter.label, filter.selected_label());
            if index == focused {
                format!("[{text}]")
            } else {
                text
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn render_stats_line(screen: &ScreenFrame) -> String {
    screen
        .stats
        .iter()
        .map(|stat| match stat.count {
            Some(count) => format!("{}: {count}", stat.label),
            None => format!("{}: n/d", stat.label),
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

fn render_page_links(window: &PageWindow, current: usize) -> String {
    window
        .links
        .iter()
        .map(|link| match link {
            PageLink::Page(page) if *page == current => format!("[{page}]"),
            PageLink::Page(page) => page.to_string(),
            PageLink::Ellipsis => "…".to_owned(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_pager_line(screen: &ScreenFrame) -> String {
    let links = render_page_links(&screen.window, screen.page);
    if screen.total_items == 0 {
        return format!("{links}  |  0 registos");
    }
    format!(
        "{links}  |  {}-{} de {}",
        screen.start_index + 1,
        screen.end_index,
        screen.total_items
    )
}

fn render_body_message(screen: &ScreenFrame) -> Option<String> {
    match &screen.phase {
        LoadPhase::Idle | LoadPhase::Loading if screen.rows.is_empty() => {
            Some("A carregar…".to_owned())
        }
        LoadPhase::Errored(message) => Some(format!(
            "Não foi possível carregar {}: {message}\nprima r para tentar novamente",
            screen.title.to_lowercase()
        )),
        LoadPhase::Loaded => screen.empty_message.map(|empty| {
            if screen.can_clear {
                format!("{empty}\nprima c para limpar a pesquisa e os filtros")
            } else {
                empty.to_owned()
            }
        }),
        LoadPhase::Idle | LoadPhase::Loading => None,
    }
}

fn render_delete_prompt(screen: &ScreenFrame, key: &RecordKey) -> String {
    let label = screen
        .rows
        .iter()
        .find(|row| &row.key == key)
        .and_then(|row| row.cells.iter().find(|cell| !cell.is_empty()))
        .map_or_else(|| key.to_string(), |cell| format!("{cell} ({key})"));
    format!("Eliminar {label}?\n\ny confirmar | n cancelar")
}

fn render_detail_text(screen: &ScreenFrame, resource: Resource, cursor: usize) -> Option<String> {
    let row = screen.rows.get(cursor)?;
    let width = screen
        .headers
        .iter()
        .map(|header| header.chars().count())
        .max()
        .unwrap_or(0);
    let mut lines = screen
        .headers
        .iter()
        .zip(&row.cells)
        .map(|(header, cell)| format!("{header:<width$}  {cell}"))
        .collect::<Vec<_>>();
    lines.push(String::new());
    lines.push(format!(
        "ver     {}",
        Route::Details(resource, row.key.clone()).path()
    ));
    lines.push(format!(
        "editar  {}",
        Route::Edit(resource, row.key.clone()).path()
    ));
    Some(lines.join("\n"))
}

fn status_text(view_data: &ViewData) -> String {
    let (mode, hints) = match view_data.input {
        InputMode::Nav => (
            "NAV",
            "/ pesquisar | f/F filtro | c limpar | ←/→ página | enter detalhes | d eliminar | r recarregar | ? ajuda | ctrl+q sair",
        ),
        InputMode::Search => ("PESQUISA", "escreva para pesquisar | enter/esc terminar"),
    };
    match &view_data.status_line {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}

fn help_overlay_text() -> &'static str {
    "tab / shift+tab   mudar de lista\n\
     /                 pesquisar (enter ou esc para terminar)\n\
     f                 próximo valor do filtro em foco\n\
     F                 focar o filtro seguinte\n\
     c                 limpar pesquisa e filtros\n\
     ← / →             página anterior / seguinte\n\
     home / end        primeira / última página\n\
     ↑ / ↓             mover a seleção\n\
     enter             detalhes do registo\n\
     d                 eliminar o registo (y/n para confirmar)\n\
     r                 recarregar\n\
     esc               fechar aviso\n\
     ctrl+q            sair"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        FetchedBatch, InputMode, InternalEvent, ListRuntime, ScreenFrame, Ticket, ViewData,
        handle_internal_event, handle_key_event, mount, process_internal_events,
        render_body_message, render_detail_text, render_filter_line, render_page_links,
        render_pager_line, render_stats_line, status_text,
    };
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use escola_app::{
        EMPTY_MESSAGE, FetchQuery, ListSettings, MutationOutcome, RecordBatch, RecordKey,
        RecordMutator, RecordSource, Resource, SchoolClass, ServerPagination, Student, Teacher,
        page_window,
    };
    use escola_testkit::{ScriptedSource, numbered_students};
    use std::sync::mpsc;
    use std::time::Duration;

    struct TestRuntime {
        students: ScriptedSource<Student>,
        fetched: Vec<(Resource, FetchQuery)>,
    }

    impl TestRuntime {
        fn with_students(count: usize) -> Self {
            Self {
                students: ScriptedSource::new(numbered_students(count)),
                fetched: Vec::new(),
            }
        }
    }

    impl ListRuntime for TestRuntime {
        fn fetch(
            &mut self,
            resource: Resource,
            query: &FetchQuery,
        ) -> anyhow::Result<FetchedBatch> {
            self.fetched.push((resource, query.clone()));
            Ok(match resource {
                Resource::Students => self.students.fetch(query)?.into(),
                Resource::Teachers => RecordBatch::<Teacher>::complete(Vec::new()).into(),
                Resource::Classes => RecordBatch::<SchoolClass>::complete(Vec::new()).into(),
                Resource::Enrollments => {
                    RecordBatch::<escola_app::Enrollment>::complete(Vec::new()).into()
                }
                Resource::Payments => {
                    RecordBatch::<escola_app::Payment>::complete(Vec::new()).into()
                }
            })
        }

        fn delete(
            &mut self,
            resource: Resource,
            key: &RecordKey,
        ) -> anyhow::Result<MutationOutcome> {
            assert_eq!(resource, Resource::Students);
            self.students.delete(key)
        }
    }

    struct Harness {
        runtime: TestRuntime,
        view_data: ViewData,
        tx: mpsc::Sender<InternalEvent>,
        rx: mpsc::Receiver<InternalEvent>,
    }

    impl Harness {
        fn new(runtime: TestRuntime) -> Self {
            let settings = ListSettings {
                search_debounce: Duration::ZERO,
                ..ListSettings::default()
            };
            let (tx, rx) = mpsc::channel();
            let mut harness = Self {
                runtime,
                view_data: ViewData::new(settings, Resource::Students),
                tx,
                rx,
            };
            mount(
                &mut harness.runtime,
                &mut harness.view_data,
                &harness.tx,
                Resource::Students,
            );
            harness.pump();
            harness
        }

        fn pump(&mut self) {
            process_internal_events(&mut self.runtime, &mut self.view_data, &self.tx, &self.rx);
        }

        /// Waits for timer threads (debounce) as well.
        fn settle(&mut self) {
            while let Ok(event) = self.rx.recv_timeout(Duration::from_millis(200)) {
                handle_internal_event(&mut self.runtime, &mut self.view_data, &self.tx, event);
            }
        }

        fn press(&mut self, code: KeyCode) -> bool {
            self.press_with(code, KeyModifiers::NONE)
        }

        fn press_with(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
            let quit = handle_key_event(
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                KeyEvent::new(code, modifiers),
            );
            self.pump();
            quit
        }

        fn type_text(&mut self, text: &str) {
            for ch in text.chars() {
                self.press(KeyCode::Char(ch));
            }
        }

        fn frame(&self) -> ScreenFrame {
            self.view_data.screen.frame()
        }

        fn names(&self) -> Vec<String> {
            self.frame()
                .rows
                .iter()
                .map(|row| row.cells[1].clone())
                .collect()
        }
    }

    #[test]
    fn mount_loads_first_page() {
        let harness = Harness::new(TestRuntime::with_students(23));
        let frame = harness.frame();
        assert_eq!(frame.rows.len(), 10);
        assert_eq!(frame.total_pages, 3);
        assert_eq!(render_pager_line(&frame), "[1] 2 3  |  1-10 de 23");
        assert_eq!(harness.runtime.fetched.len(), 1);
        assert_eq!(harness.runtime.fetched[0].0, Resource::Students);
    }

    #[test]
    fn arrows_and_end_move_between_pages() {
        let mut harness = Harness::new(TestRuntime::with_students(23));
        harness.press(KeyCode::Right);
        assert_eq!(harness.frame().page, 2);
        harness.press(KeyCode::End);
        assert_eq!(harness.names(), vec!["Aluno 21", "Aluno 22", "Aluno 23"]);
        harness.press(KeyCode::Right);
        assert_eq!(harness.frame().page, 3);
        harness.press(KeyCode::Home);
        assert_eq!(harness.frame().page, 1);
        assert_eq!(harness.runtime.fetched.len(), 1, "client paging never refetches");
    }

    #[test]
    fn typing_a_search_filters_after_debounce() {
        let mut harness = Harness::new(TestRuntime::with_students(23));
        harness.press(KeyCode::End);
        harness.press(KeyCode::Char('/'));
        assert_eq!(harness.view_data.input, InputMode::Search);
        harness.type_text("aluno 2");
        harness.settle();

        let frame = harness.frame();
        assert_eq!(frame.page, 1);
        assert_eq!(frame.total_pages, 1);
        assert_eq!(
            harness.names(),
            vec!["Aluno 20", "Aluno 21", "Aluno 22", "Aluno 23"]
        );

        harness.press(KeyCode::Enter);
        assert_eq!(harness.view_data.input, InputMode::Nav);
        assert!(status_text(&harness.view_data).starts_with("NAV"));
    }

    #[test]
    fn filter_cycling_reaches_empty_state_and_clear_restores() {
        let mut harness = Harness::new(TestRuntime::with_students(23));
        harness.press(KeyCode::Char('f'));
        assert_eq!(harness.frame().total_items, 23);
        assert!(render_filter_line(&harness.frame(), 0).starts_with("[Estado: Ativo]"));

        harness.press(KeyCode::Char('f'));
        let frame = harness.frame();
        assert_eq!(frame.total_items, 0);
        let message = render_body_message(&frame).expect("empty state message");
        assert!(message.starts_with(EMPTY_MESSAGE));
        assert!(message.contains("prima c"));

        harness.press(KeyCode::Char('c'));
        assert_eq!(harness.frame().total_items, 23);
        assert!(render_body_message(&harness.frame()).is_none());
    }

    #[test]
    fn focus_moves_to_next_filter() {
        let mut harness = Harness::new(TestRuntime::with_students(4));
        harness.press(KeyCode::Char('F'));
        harness.press(KeyCode::Char('f'));
        let frame = harness.frame();
        assert!(render_filter_line(&frame, 1).contains("[Género: Feminino]"));
        assert_eq!(frame.total_items, 2);
    }

    #[test]
    fn delete_asks_before_removing() {
        let mut harness = Harness::new(TestRuntime::with_students(12));
        harness.press(KeyCode::Char('d'));
        assert_eq!(harness.frame().confirming_delete, Some(RecordKey::Int(1)));
        harness.press(KeyCode::Char('n'));
        assert_eq!(harness.frame().confirming_delete, None);
        assert!(harness.runtime.students.mutations().is_empty());

        harness.press(KeyCode::Down);
        harness.press(KeyCode::Char('d'));
        harness.press(KeyCode::Char('y'));
        assert_eq!(harness.runtime.students.mutations(), vec!["delete 2".to_owned()]);
        assert!(!harness.names().contains(&"Aluno 02".to_owned()));
        assert_eq!(harness.frame().total_items, 11);
        assert_eq!(
            harness.view_data.status_line.as_deref(),
            Some("registo eliminado")
        );
    }

    #[test]
    fn failed_delete_keeps_the_page() {
        let mut harness = Harness::new(TestRuntime::with_students(23));
        harness.press(KeyCode::Right);
        harness.runtime.students.fail_mutations(Some("sem permissão"));
        harness.press(KeyCode::Char('d'));
        harness.press(KeyCode::Char('y'));

        assert_eq!(harness.frame().page, 2);
        assert_eq!(harness.frame().total_items, 23);
        assert_eq!(
            harness.view_data.status_line.as_deref(),
            Some("sem permissão")
        );
    }

    #[test]
    fn fetch_failure_shows_retry_and_r_reloads() {
        let runtime = TestRuntime::with_students(5);
        runtime.students.push_failure("servidor indisponível");
        let mut harness = Harness::new(runtime);

        let message = render_body_message(&harness.frame()).expect("error banner");
        assert!(message.contains("servidor indisponível"), "{message}");
        assert!(message.contains("prima r"));

        harness.press(KeyCode::Char('r'));
        assert_eq!(harness.frame().rows.len(), 5);
    }

    #[test]
    fn tab_remounts_the_next_resource() {
        let mut harness = Harness::new(TestRuntime::with_students(5));
        let old_mount = harness.view_data.mount;
        harness.press(KeyCode::Tab);
        assert_eq!(harness.view_data.screen.resource(), Resource::Teachers);
        assert_eq!(harness.runtime.fetched.last().map(|(r, _)| *r), Some(Resource::Teachers));

        harness.press(KeyCode::BackTab);
        assert_eq!(harness.view_data.screen.resource(), Resource::Students);
        assert_eq!(harness.frame().rows.len(), 5);

        let stale = InternalEvent::FetchCompleted {
            ticket: Ticket {
                mount: old_mount,
                resource: Resource::Students,
                request_id: 1,
            },
            result: Ok(RecordBatch::complete(numbered_students(1)).into()),
        };
        harness.tx.send(stale).expect("channel open");
        harness.pump();
        assert_eq!(harness.frame().rows.len(), 5);
    }

    #[test]
    fn enter_opens_detail_with_routes() {
        let mut harness = Harness::new(TestRuntime::with_students(3));
        harness.press(KeyCode::Enter);
        assert!(harness.view_data.detail_visible);
        let text = render_detail_text(&harness.frame(), Resource::Students, 0)
            .expect("detail text for first row");
        assert!(text.contains("Aluno 01"));
        assert!(text.contains("/students/details/1"));
        assert!(text.contains("/students/edit/1"));

        harness.press(KeyCode::Char('d'));
        assert_eq!(harness.frame().confirming_delete, None, "detail swallows keys");
        harness.press(KeyCode::Esc);
        assert!(!harness.view_data.detail_visible);
    }

    #[test]
    fn ctrl_q_quits() {
        let mut harness = Harness::new(TestRuntime::with_students(1));
        assert!(!harness.press(KeyCode::Char('q')));
        assert!(harness.press_with(KeyCode::Char('q'), KeyModifiers::CONTROL));
    }

    #[test]
    fn stats_line_lists_cards_in_order() {
        let harness = Harness::new(TestRuntime::with_students(6));
        assert_eq!(
            render_stats_line(&harness.frame()),
            "Total: 6 | Ativos: 6 | Inativos: 0 | Sem data de nascimento: 6"
        );
    }

    #[test]
    fn server_paged_stats_show_unknown_cards() {
        let runtime = TestRuntime::with_students(10);
        runtime.students.push_batch(RecordBatch::paged(
            numbered_students(10),
            ServerPagination {
                current_page: 1,
                total_pages: 5,
                total_items: 48,
                items_per_page: 10,
            },
        ));
        let harness = Harness::new(runtime);
        let frame = harness.frame();
        assert_eq!(frame.total_items, 48);
        assert_eq!(
            render_stats_line(&frame),
            "Total: 48 | Ativos: n/d | Inativos: n/d | Sem data de nascimento: n/d"
        );
    }

    #[test]
    fn page_links_mark_current_page() {
        assert_eq!(
            render_page_links(&page_window(10, 20, 5), 10),
            "1 … 8 9 [10] 11 12 … 20"
        );
        assert_eq!(render_page_links(&page_window(2, 3, 5), 2), "1 [2] 3");
    }

    #[test]
    fn wrong_batch_kind_is_an_error() {
        struct Confused;
        impl ListRuntime for Confused {
            fn fetch(&mut self, _: Resource, _: &FetchQuery) -> anyhow::Result<FetchedBatch> {
                Ok(RecordBatch::<Teacher>::complete(Vec::new()).into())
            }
            fn delete(&mut self, _: Resource, _: &RecordKey) -> anyhow::Result<MutationOutcome> {
                Ok(MutationOutcome::default())
            }
        }

        let (tx, rx) = mpsc::channel();
        let mut runtime = Confused;
        let mut view_data = ViewData::new(ListSettings::default(), Resource::Students);
        mount(&mut runtime, &mut view_data, &tx, Resource::Students);
        process_internal_events(&mut runtime, &mut view_data, &tx, &rx);
        let message = render_body_message(&view_data.screen.frame()).expect("error banner");
        assert!(message.contains("expected students records, got teachers"));
    }
}
