//! Core application state and mode management

use std::sync::Arc;

use regdash_core::{
    Completion, DeleteConfirmation, EditDraft, FieldInput, FieldKind, ListController, MemorySink,
    Notice, NotificationSink, Operation, PendingOp,
};
use tracing::debug;

/// One resource tab
pub struct Tab {
    pub controller: ListController,
    /// Selected row within the visible page
    pub selected: usize,
    /// A refresh is in flight
    pub refreshing: bool,
}

impl Tab {
    pub fn new(controller: ListController) -> Self {
        Self {
            controller,
            selected: 0,
            refreshing: false,
        }
    }

    pub fn title(&self) -> &str {
        &self.controller.config().resource().title
    }

    pub fn visible_len(&self) -> usize {
        self.controller.engine().visible_slice().count()
    }

    pub fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.visible_len().saturating_sub(1));
    }

    /// Identity of the selected row
    pub fn selected_id(&self) -> Option<String> {
        let engine = self.controller.engine();
        engine
            .visible_slice()
            .nth(self.selected)
            .and_then(|r| r.identity_key(engine.identity_field()))
    }
}

/// Delete confirmation overlay
#[derive(Debug, Clone)]
pub struct DeleteOverlay {
    pub confirmation: DeleteConfirmation,
    pub input: String,
}

/// Edit (or create) form overlay
#[derive(Debug, Clone)]
pub struct EditOverlay {
    pub draft: EditDraft,
    /// Focused input
    pub field: usize,
}

impl EditOverlay {
    fn new(draft: EditDraft) -> Self {
        let field = draft.inputs().iter().position(|i| !i.disabled).unwrap_or(0);
        Self { draft, field }
    }

    pub fn current(&self) -> Option<&FieldInput> {
        self.draft.inputs().get(self.field)
    }

    /// Move focus to the next enabled input, wrapping around
    pub fn focus(&mut self, forward: bool) {
        let n = self.draft.inputs().len();
        for step in 1..=n {
            let idx = if forward {
                (self.field + step) % n
            } else {
                (self.field + n - step % n) % n
            };
            if !self.draft.inputs()[idx].disabled {
                self.field = idx;
                return;
            }
        }
    }

    pub fn type_char(&mut self, c: char) -> regdash_core::Result<()> {
        let Some(input) = self.current() else {
            return Ok(());
        };
        if input.kind == FieldKind::Select && !input.options.is_empty() {
            let name = input.name.clone();
            return self.draft.cycle_option(&name, c != '-');
        }
        let name = input.name.clone();
        let mut value = input.value.clone();
        value.push(c);
        self.draft.set(&name, value)
    }

    pub fn backspace(&mut self) -> regdash_core::Result<()> {
        let Some(input) = self.current() else {
            return Ok(());
        };
        let name = input.name.clone();
        let mut value = input.value.clone();
        if input.kind == FieldKind::Select && !input.options.is_empty() {
            value.clear();
        } else {
            value.pop();
        }
        self.draft.set(&name, value)
    }

    pub fn cycle(&mut self, forward: bool) -> regdash_core::Result<()> {
        match self.current() {
            Some(input) if input.kind == FieldKind::Select => {
                let name = input.name.clone();
                self.draft.cycle_option(&name, forward)
            }
            _ => Ok(()),
        }
    }
}

/// Input mode for the TUI
#[derive(Debug, Clone, Default)]
pub enum Mode {
    /// Navigate rows, pages and tabs
    #[default]
    Normal,
    /// Typing a search term
    Search,
    Delete(DeleteOverlay),
    Edit(EditOverlay),
}

/// Main application state
pub struct App {
    pub tabs: Vec<Tab>,
    pub active: usize,
    pub mode: Mode,
    /// Show the summary cards above the table
    pub show_summary: bool,
    /// Last notice, shown in the status bar
    pub status: Option<Notice>,
    /// Requests started and not yet completed
    pub in_flight: usize,
    sink: Arc<MemorySink>,
}

impl App {
    pub fn new(controllers: Vec<ListController>, sink: Arc<MemorySink>, active: usize) -> Self {
        let active = active.min(controllers.len().saturating_sub(1));
        Self {
            tabs: controllers.into_iter().map(Tab::new).collect(),
            active,
            mode: Mode::Normal,
            show_summary: false,
            status: None,
            in_flight: 0,
            sink,
        }
    }

    pub fn tab(&self) -> &Tab {
        &self.tabs[self.active]
    }

    pub fn tab_mut(&mut self) -> &mut Tab {
        &mut self.tabs[self.active]
    }

    /// Move the status bar to the newest notice
    pub fn pull_notices(&mut self) {
        if let Some(last) = self.sink.drain().pop() {
            self.status = Some(last);
        }
    }

    fn notify(&mut self, notice: Notice) {
        self.sink.notify(notice);
        self.pull_notices();
    }

    fn item_type(&self) -> String {
        self.tab().controller.config().resource().item_type.clone()
    }

    /// Switch tabs; returns the refresh to start when the tab was never loaded
    pub fn switch_tab(&mut self, index: usize) -> Option<(usize, PendingOp)> {
        if index >= self.tabs.len() {
            return None;
        }
        self.active = index;
        self.mode = Mode::Normal;
        if self.tab().controller.is_loaded() {
            None
        } else {
            self.begin_refresh()
        }
    }

    pub fn next_tab(&mut self) -> Option<(usize, PendingOp)> {
        self.switch_tab((self.active + 1) % self.tabs.len())
    }

    pub fn prev_tab(&mut self) -> Option<(usize, PendingOp)> {
        let n = self.tabs.len();
        self.switch_tab((self.active + n - 1) % n)
    }

    /// Reload the active tab unless a reload is already running
    pub fn begin_refresh(&mut self) -> Option<(usize, PendingOp)> {
        let index = self.active;
        let tab = &mut self.tabs[index];
        if tab.refreshing {
            debug!(tab = index, "refresh already in flight");
            return None;
        }
        tab.refreshing = true;
        let op = tab.controller.begin_refresh();
        self.in_flight += 1;
        Some((index, op))
    }

    /// Apply a finished request to the tab that started it
    pub fn complete(&mut self, index: usize, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let Some(tab) = self.tabs.get_mut(index) else {
            return;
        };
        if matches!(completion, Completion::Refreshed { .. }) {
            tab.refreshing = false;
        }
        if let Err(e) = tab.controller.complete(completion) {
            debug!(tab = index, error = %e, "request failed");
        }
        tab.clamp_selection();
        self.pull_notices();
    }

    pub fn select_next(&mut self) {
        let tab = self.tab_mut();
        let n = tab.visible_len();
        if n > 0 {
            tab.selected = (tab.selected + 1) % n;
        }
    }

    pub fn select_prev(&mut self) {
        let tab = self.tab_mut();
        let n = tab.visible_len();
        if n > 0 {
            tab.selected = tab.selected.checked_sub(1).unwrap_or(n - 1);
        }
    }

    pub fn next_page(&mut self) {
        let tab = self.tab_mut();
        tab.controller.engine_mut().next_page();
        tab.selected = 0;
    }

    pub fn prev_page(&mut self) {
        let tab = self.tab_mut();
        tab.controller.engine_mut().prev_page();
        tab.selected = 0;
    }

    pub fn first_page(&mut self) {
        let tab = self.tab_mut();
        tab.controller.engine_mut().go_to_page(1);
        tab.selected = 0;
    }

    pub fn last_page(&mut self) {
        let tab = self.tab_mut();
        let last = tab.controller.engine().page_info().total_pages();
        tab.controller.engine_mut().go_to_page(last);
        tab.selected = 0;
    }

    /// 10 → 20 → 50 → 10, then back into range
    pub fn cycle_page_size(&mut self) {
        let tab = self.tab_mut();
        let engine = tab.controller.engine_mut();
        let next = engine.state().page_size.next();
        engine.set_page_size(next);
        let page = engine.state().page;
        engine.go_to_page(page);
        tab.clamp_selection();
    }

    /// Sort by the n-th visible column (0-based); again toggles the direction
    pub fn sort_by_column(&mut self, n: usize) {
        let tab = self.tab_mut();
        let Some(column) = tab.controller.config().columns().get(n).cloned() else {
            return;
        };
        tab.controller.engine_mut().set_sort(&column);
        tab.selected = 0;
    }

    pub fn enter_search(&mut self) {
        self.mode = Mode::Search;
    }

    /// Filter as the term is typed
    pub fn search_insert(&mut self, c: char) {
        let tab = self.tab_mut();
        let mut term = tab.controller.engine().state().search.clone();
        term.push(c);
        tab.controller.engine_mut().set_search_term(term);
        tab.selected = 0;
    }

    pub fn search_backspace(&mut self) {
        let tab = self.tab_mut();
        let mut term = tab.controller.engine().state().search.clone();
        term.pop();
        tab.controller.engine_mut().set_search_term(term);
        tab.selected = 0;
    }

    pub fn clear_search(&mut self) {
        let tab = self.tab_mut();
        tab.controller.engine_mut().set_search_term("");
        tab.selected = 0;
        self.mode = Mode::Normal;
    }

    pub fn exit_mode(&mut self) {
        self.mode = Mode::Normal;
    }

    pub fn toggle_summary(&mut self) {
        self.show_summary = !self.show_summary;
    }

    pub fn open_delete(&mut self) {
        let Some(id) = self.tab().selected_id() else {
            return;
        };
        match self.tab().controller.delete_confirmation(&id) {
            Ok(confirmation) => {
                self.mode = Mode::Delete(DeleteOverlay {
                    confirmation,
                    input: String::new(),
                })
            }
            Err(e) => {
                let item_type = self.item_type();
                self.notify(Notice::error(Operation::Delete, &item_type, e));
            }
        }
    }

    /// Submit the typed identity. A mismatch keeps the overlay open.
    pub fn confirm_delete(&mut self) -> Option<(usize, PendingOp)> {
        let Mode::Delete(overlay) = &self.mode else {
            return None;
        };
        let result = self
            .tab()
            .controller
            .begin_delete(&overlay.confirmation, &overlay.input);
        self.pull_notices();
        let op = result.ok()?;
        self.mode = Mode::Normal;
        self.in_flight += 1;
        Some((self.active, op))
    }

    pub fn open_edit(&mut self) {
        let Some(id) = self.tab().selected_id() else {
            return;
        };
        match self.tab().controller.edit_draft(&id) {
            Ok(draft) => self.mode = Mode::Edit(EditOverlay::new(draft)),
            Err(e) => {
                let item_type = self.item_type();
                self.notify(Notice::error(Operation::Update, &item_type, e));
            }
        }
    }

    pub fn open_create(&mut self) {
        let controller = &self.tab().controller;
        let item_type = controller.config().resource().item_type.clone();
        let draft = EditDraft::blank(controller.schema(), &item_type);
        self.mode = Mode::Edit(EditOverlay::new(draft));
    }

    /// Validate and submit the form. Invalid input keeps the overlay open.
    pub fn submit_edit(&mut self) -> Option<(usize, PendingOp)> {
        let Mode::Edit(overlay) = &self.mode else {
            return None;
        };
        let draft = &overlay.draft;
        let controller = &self.tab().controller;

        let result = if draft.is_new() {
            match draft.finish() {
                Ok(record) => controller.begin_create(record),
                Err(e) => {
                    let notice = Notice::error(Operation::Validate, draft.item_type(), &e);
                    self.notify(notice);
                    return None;
                }
            }
        } else {
            controller.begin_save(draft)
        };
        self.pull_notices();
        let op = result.ok()?;
        self.mode = Mode::Normal;
        self.in_flight += 1;
        Some((self.active, op))
    }

    /// Apply an edit keystroke, reporting a rejected value in the status bar
    pub fn edit_with(&mut self, f: impl FnOnce(&mut EditOverlay) -> regdash_core::Result<()>) {
        let Mode::Edit(overlay) = &mut self.mode else {
            return;
        };
        if let Err(e) = f(overlay) {
            let item_type = overlay.draft.item_type().to_string();
            self.notify(Notice::error(Operation::Validate, &item_type, e));
        }
    }
}
