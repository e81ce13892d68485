//! Event handling for the TUI

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use regdash_core::PendingOp;

use super::app::{App, Mode};

/// Poll for events with timeout
pub fn poll_event(timeout: Duration) -> std::io::Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Result of handling a key event
pub enum HandleResult {
    /// Continue running
    Continue,
    /// Quit the application
    Quit,
    /// Run this request for the given tab in the background
    Submit(usize, PendingOp),
}

impl From<Option<(usize, PendingOp)>> for HandleResult {
    fn from(op: Option<(usize, PendingOp)>) -> Self {
        match op {
            Some((tab, op)) => HandleResult::Submit(tab, op),
            None => HandleResult::Continue,
        }
    }
}

/// Handle a key event
pub fn handle_key(app: &mut App, key: KeyEvent) -> HandleResult {
    if key.kind == KeyEventKind::Release {
        return HandleResult::Continue;
    }

    // Global quit shortcuts (Ctrl+C, Ctrl+Q)
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') => return HandleResult::Quit,
            _ => {}
        }
    }

    match app.mode {
        Mode::Normal => handle_normal_mode(app, key),
        Mode::Search => handle_search_mode(app, key),
        Mode::Delete(_) => handle_delete_mode(app, key),
        Mode::Edit(_) => handle_edit_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) -> HandleResult {
    match key.code {
        KeyCode::Char('q') => HandleResult::Quit,

        // Rows
        KeyCode::Char('j') | KeyCode::Down => {
            app.select_next();
            HandleResult::Continue
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.select_prev();
            HandleResult::Continue
        }

        // Pages
        KeyCode::Char('l') | KeyCode::Right | KeyCode::PageDown => {
            app.next_page();
            HandleResult::Continue
        }
        KeyCode::Char('h') | KeyCode::Left | KeyCode::PageUp => {
            app.prev_page();
            HandleResult::Continue
        }
        KeyCode::Home | KeyCode::Char('g') => {
            app.first_page();
            HandleResult::Continue
        }
        KeyCode::End | KeyCode::Char('G') => {
            app.last_page();
            HandleResult::Continue
        }
        KeyCode::Char('z') => {
            app.cycle_page_size();
            HandleResult::Continue
        }

        // Sort by column 1-9
        KeyCode::Char(c @ '1'..='9') => {
            let n = c as usize - '1' as usize;
            app.sort_by_column(n);
            HandleResult::Continue
        }

        // Tabs
        KeyCode::Tab => app.next_tab().into(),
        KeyCode::BackTab => app.prev_tab().into(),

        KeyCode::Char('/') => {
            app.enter_search();
            HandleResult::Continue
        }
        KeyCode::Esc => {
            app.clear_search();
            HandleResult::Continue
        }

        KeyCode::Char('c') => {
            app.toggle_summary();
            HandleResult::Continue
        }
        KeyCode::Char('r') => app.begin_refresh().into(),

        KeyCode::Char('d') | KeyCode::Delete => {
            app.open_delete();
            HandleResult::Continue
        }
        KeyCode::Char('e') | KeyCode::Enter => {
            app.open_edit();
            HandleResult::Continue
        }
        KeyCode::Char('a') => {
            app.open_create();
            HandleResult::Continue
        }

        _ => HandleResult::Continue,
    }
}

fn handle_search_mode(app: &mut App, key: KeyEvent) -> HandleResult {
    match key.code {
        KeyCode::Esc => app.clear_search(),
        KeyCode::Enter => app.exit_mode(),
        KeyCode::Backspace => app.search_backspace(),
        KeyCode::Char(c) => app.search_insert(c),
        _ => {}
    }
    HandleResult::Continue
}

fn handle_delete_mode(app: &mut App, key: KeyEvent) -> HandleResult {
    match key.code {
        KeyCode::Esc => {
            app.exit_mode();
            HandleResult::Continue
        }
        KeyCode::Enter => app.confirm_delete().into(),
        KeyCode::Backspace => {
            if let Mode::Delete(overlay) = &mut app.mode {
                overlay.input.pop();
            }
            HandleResult::Continue
        }
        KeyCode::Char(c) => {
            if let Mode::Delete(overlay) = &mut app.mode {
                overlay.input.push(c);
            }
            HandleResult::Continue
        }
        _ => HandleResult::Continue,
    }
}

fn handle_edit_mode(app: &mut App, key: KeyEvent) -> HandleResult {
    match key.code {
        KeyCode::Esc => {
            app.exit_mode();
            HandleResult::Continue
        }
        KeyCode::Enter => app.submit_edit().into(),
        KeyCode::Down | KeyCode::Tab => {
            app.edit_with(|form| {
                form.focus(true);
                Ok(())
            });
            HandleResult::Continue
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.edit_with(|form| {
                form.focus(false);
                Ok(())
            });
            HandleResult::Continue
        }
        KeyCode::Right => {
            app.edit_with(|form| form.cycle(true));
            HandleResult::Continue
        }
        KeyCode::Left => {
            app.edit_with(|form| form.cycle(false));
            HandleResult::Continue
        }
        KeyCode::Backspace => {
            app.edit_with(|form| form.backspace());
            HandleResult::Continue
        }
        KeyCode::Char(c) => {
            app.edit_with(|form| form.type_char(c));
            HandleResult::Continue
        }
        _ => HandleResult::Continue,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use regdash_core::{
        resources, ListController, MemorySink, MemorySource, PageSize, Record, ViewConfig,
    };

    use super::*;

    fn press(app: &mut App, code: KeyCode) -> HandleResult {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    async fn run(app: &mut App, result: HandleResult) {
        if let HandleResult::Submit(tab, op) = result {
            let completion = op.await;
            app.complete(tab, completion);
        }
    }

    async fn loaded_app() -> (App, Arc<MemorySource>) {
        let agents: Vec<Record> = (1..=23)
            .map(|i| {
                Record::new()
                    .with("agente_id", i as i64)
                    .with("nombre_agente", format!("Agente {}", i))
                    .with("telefono_agente", format!("300{:07}", i))
            })
            .collect();
        let programs = vec![Record::new()
            .with("programa_id", 1i64)
            .with("nombre_programa", "Sistemas")];
        let source = Arc::new(
            MemorySource::new()
                .with_resource("agentes", "agente_id", agents)
                .with_resource("programas", "programa_id", programs),
        );
        let sink = Arc::new(MemorySink::new());

        let controllers = [resources::agents(), resources::programs()]
            .into_iter()
            .map(|resource| {
                let config = ViewConfig::builder(resource.unwrap())
                    .page_size(PageSize::Ten)
                    .build()
                    .unwrap();
                ListController::new(config, source.clone(), sink.clone())
            })
            .collect();

        let mut app = App::new(controllers, sink, 0);
        let refresh = app.begin_refresh().into();
        run(&mut app, refresh).await;
        assert!(app.tab().controller.is_loaded());
        (app, source)
    }

    #[tokio::test]
    async fn paging_and_page_size_keys() {
        let (mut app, _) = loaded_app().await;

        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.tab().controller.engine().state().page, 3);
        assert_eq!(app.tab().visible_len(), 3);

        press(&mut app, KeyCode::Right);
        assert_eq!(app.tab().controller.engine().state().page, 3);

        // 20 per page: page 3 no longer exists, so the view lands on page 2
        press(&mut app, KeyCode::Char('z'));
        let state = app.tab().controller.engine().state();
        assert_eq!(state.page_size, PageSize::Twenty);
        assert_eq!(state.page, 2);

        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.tab().controller.engine().state().page, 1);
    }

    #[tokio::test]
    async fn live_search_and_clear() {
        let (mut app, _) = loaded_app().await;

        press(&mut app, KeyCode::Char('/'));
        type_str(&mut app, "agente 2");
        assert!(matches!(app.mode, Mode::Search));
        // Agente 2 and Agente 20..23
        assert_eq!(app.tab().controller.engine().filtered_len(), 5);

        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.tab().controller.engine().state().search, "agente 2");

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.tab().controller.engine().filtered_len(), 23);
    }

    #[tokio::test]
    async fn sort_key_toggles_direction() {
        let (mut app, _) = loaded_app().await;
        let first_id = |app: &App| app.tab().selected_id();

        press(&mut app, KeyCode::Char('1'));
        assert_eq!(first_id(&app).as_deref(), Some("1"));
        press(&mut app, KeyCode::Char('1'));
        assert_eq!(first_id(&app).as_deref(), Some("23"));
    }

    #[tokio::test]
    async fn delete_needs_the_exact_identity() {
        let (mut app, source) = loaded_app().await;
        press(&mut app, KeyCode::Down);
        assert_eq!(app.tab().selected_id().as_deref(), Some("2"));

        press(&mut app, KeyCode::Char('d'));
        type_str(&mut app, "3");
        let result = press(&mut app, KeyCode::Enter);
        assert!(matches!(result, HandleResult::Continue));
        assert!(matches!(app.mode, Mode::Delete(_)));
        assert!(app.status.as_ref().unwrap().is_error());

        press(&mut app, KeyCode::Backspace);
        type_str(&mut app, "2");
        let result = press(&mut app, KeyCode::Enter);
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.in_flight, 1);
        run(&mut app, result).await;

        assert_eq!(app.in_flight, 0);
        assert!(!app.status.as_ref().unwrap().is_error());
        assert_eq!(app.tab().controller.engine().collection().len(), 22);
        assert_eq!(source.records("agentes").len(), 22);
    }

    #[tokio::test]
    async fn edit_form_saves_changes() {
        let (mut app, source) = loaded_app().await;

        press(&mut app, KeyCode::Char('e'));
        let Mode::Edit(form) = &app.mode else {
            panic!("edit overlay not open");
        };
        assert_eq!(form.current().unwrap().name, "nombre_agente");

        for _ in 0.."Agente 1".len() {
            press(&mut app, KeyCode::Backspace);
        }
        type_str(&mut app, "Ana");
        let result = press(&mut app, KeyCode::Enter);
        run(&mut app, result).await;

        let saved = app.tab().controller.engine().collection().find("1").unwrap();
        assert_eq!(saved.value("nombre_agente").to_string(), "Ana");
        assert_eq!(
            source.records("agentes")[0].value("nombre_agente").to_string(),
            "Ana"
        );
    }

    #[tokio::test]
    async fn invalid_form_stays_open() {
        let (mut app, _) = loaded_app().await;

        press(&mut app, KeyCode::Char('a'));
        let result = press(&mut app, KeyCode::Enter);
        assert!(matches!(result, HandleResult::Continue));
        assert!(matches!(app.mode, Mode::Edit(_)));
        assert!(app.status.as_ref().unwrap().is_error());

        press(&mut app, KeyCode::Esc);
        assert!(matches!(app.mode, Mode::Normal));
    }

    #[tokio::test]
    async fn switching_to_an_unloaded_tab_loads_it() {
        let (mut app, _) = loaded_app().await;

        let result = press(&mut app, KeyCode::Tab);
        assert_eq!(app.active, 1);
        assert!(matches!(result, HandleResult::Submit(1, _)));
        run(&mut app, result).await;
        assert_eq!(app.tab().controller.engine().collection().len(), 1);

        // already loaded: no request
        press(&mut app, KeyCode::BackTab);
        assert!(matches!(press(&mut app, KeyCode::Tab), HandleResult::Continue));
    }

    #[test]
    fn ctrl_c_quits_from_any_mode() {
        let sink = Arc::new(MemorySink::new());
        let controller = ListController::new(
            ViewConfig::builder(resources::agents().unwrap()).build().unwrap(),
            Arc::new(MemorySource::new()),
            sink.clone(),
        );
        let mut app = App::new(vec![controller], sink, 0);
        app.enter_search();
        let quit = handle_key(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(matches!(quit, HandleResult::Quit));
    }
}
