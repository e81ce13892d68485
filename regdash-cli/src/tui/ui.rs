//! UI rendering using ratatui

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame,
};
use regdash_core::{Level, SortDirection};

use super::app::{App, DeleteOverlay, EditOverlay, Mode, Tab};

/// Primary accent color
const ACCENT: Color = Color::Cyan;
/// Secondary color for less important elements
const SECONDARY: Color = Color::DarkGray;
/// Highlight color for selected items
const HIGHLIGHT: Color = Color::Yellow;
/// Success color
const SUCCESS: Color = Color::Green;
/// Error color
const ERROR: Color = Color::Red;
/// Dim text color
const DIM: Color = Color::Rgb(100, 100, 100);

/// Render the entire UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let summary_height = if app.show_summary {
        app.tab().controller.summaries().len() as u16 + 2
    } else {
        0
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),              // Tabs
            Constraint::Length(summary_height), // Summary cards
            Constraint::Min(5),                 // Table
            Constraint::Length(1),              // Pagination / search
            Constraint::Length(1),              // Status bar
        ])
        .split(area);

    render_tabs(frame, app, chunks[0]);
    if app.show_summary {
        render_summary(frame, app.tab(), chunks[1]);
    }
    render_table(frame, app, chunks[2]);
    render_footer(frame, app, chunks[3]);
    render_status_bar(frame, app, chunks[4]);

    match &app.mode {
        Mode::Delete(overlay) => render_delete_overlay(frame, overlay),
        Mode::Edit(overlay) => render_edit_overlay(frame, overlay),
        Mode::Normal | Mode::Search => {}
    }
}

/// Render the tab header
fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<String> = app.tabs.iter().map(|t| t.title().to_string()).collect();

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .title(" Registro ")
                .title_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(SECONDARY)),
        )
        .select(app.active)
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD));

    frame.render_widget(tabs, area);
}

fn render_summary(frame: &mut Frame, tab: &Tab, area: Rect) {
    let lines: Vec<Line> = tab
        .controller
        .summaries()
        .iter()
        .map(|s| Line::from(Span::styled(s.to_string(), Style::default().fg(Color::White))))
        .collect();

    let block = Block::default()
        .title(" Resumen ")
        .title_style(Style::default().fg(SECONDARY))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(SECONDARY));

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

/// Render the records of the visible page
fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let tab = app.tab();
    let controller = &tab.controller;
    let engine = controller.engine();
    let state = engine.state();
    let columns = controller.config().columns();

    let header_cells: Vec<Cell> = controller
        .config()
        .headers(controller.schema())
        .into_iter()
        .zip(columns)
        .enumerate()
        .map(|(i, (header, column))| {
            let arrow = match &state.sort {
                Some(sort) if &sort.column == column => match sort.direction {
                    SortDirection::Ascending => " ▲",
                    SortDirection::Descending => " ▼",
                },
                _ => "",
            };
            let label = if i < 9 {
                format!("{}:{}{}", i + 1, header, arrow)
            } else {
                format!("{}{}", header, arrow)
            };
            Cell::from(label)
        })
        .collect();
    let headers =
        Row::new(header_cells).style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = controller
        .visible_rows()
        .into_iter()
        .map(|cells| Row::new(cells.into_iter().map(Cell::from)))
        .collect();

    let title = if tab.refreshing {
        format!(" {} (loading…) ", tab.title())
    } else {
        format!(" {} ", tab.title())
    };
    let block = Block::default()
        .title(title)
        .title_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));

    if rows.is_empty() {
        let placeholder = if !controller.is_loaded() {
            "  Loading…"
        } else if state.search.is_empty() {
            "  No records"
        } else {
            "  No matches"
        };
        frame.render_widget(
            Paragraph::new(Span::styled(placeholder, Style::default().fg(DIM))).block(block),
            area,
        );
        return;
    }

    let widths = vec![Constraint::Fill(1); columns.len().max(1)];
    let table = Table::new(rows, widths)
        .header(headers)
        .block(block)
        .row_highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(ACCENT)
                .add_modifier(Modifier::BOLD),
        );

    let mut table_state = TableState::default().with_selected(Some(tab.selected));
    frame.render_stateful_widget(table, area, &mut table_state);
}

/// Pagination info, or the search input while typing
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let engine = app.tab().controller.engine();
    let state = engine.state();
    let info = engine.page_info();

    let range = match info.shown_range() {
        Some((first, last)) => format!("{}-{} of {}", first, last, info.total),
        None => format!("0 of {}", info.total),
    };
    let pages = format!(
        "  page {}/{}  {} per page",
        info.page,
        info.total_pages(),
        state.page_size
    );

    let search = if matches!(app.mode, Mode::Search) {
        Span::styled(
            format!("  /{}|", state.search),
            Style::default().fg(Color::Magenta),
        )
    } else if !state.search.is_empty() {
        Span::styled(
            format!("  search '{}'", state.search),
            Style::default().fg(Color::Magenta),
        )
    } else {
        Span::raw("")
    };

    let line = Line::from(vec![
        Span::styled(format!(" {}", range), Style::default().fg(Color::White)),
        Span::styled(pages, Style::default().fg(DIM)),
        search,
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Render the status bar
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mode_indicator = match app.mode {
        Mode::Normal => Span::styled(" NORMAL ", Style::default().bg(ACCENT).fg(Color::Black)),
        Mode::Search => Span::styled(" SEARCH ", Style::default().bg(Color::Magenta).fg(Color::Black)),
        Mode::Delete(_) => Span::styled(" DELETE ", Style::default().bg(ERROR).fg(Color::Black)),
        Mode::Edit(_) => Span::styled(" EDIT ", Style::default().bg(SUCCESS).fg(Color::Black)),
    };

    let help_text = match app.mode {
        Mode::Normal => {
            "j/k:row  h/l:page  1-9:sort  /:search  z:size  a/e/d:add/edit/del  c:cards  r:reload  q:quit"
        }
        Mode::Search => "Type to filter  Enter:keep  Esc:clear",
        Mode::Delete(_) => "Type the identity  Enter:delete  Esc:cancel",
        Mode::Edit(_) => "Tab/↑↓:field  ←→:option  Enter:save  Esc:cancel",
    };

    let mut spans = vec![
        mode_indicator,
        Span::raw(" "),
        Span::styled(help_text, Style::default().fg(DIM)),
    ];
    if app.in_flight > 0 {
        spans.push(Span::styled(" ⟳", Style::default().fg(HIGHLIGHT)));
    }
    if let Some(notice) = &app.status {
        let color = match notice.level {
            Level::Success => SUCCESS,
            Level::Error => ERROR,
        };
        spans.push(Span::raw(" "));
        spans.push(Span::styled(notice.message.clone(), Style::default().fg(color)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn centered(frame: &Frame, width: u16, height: u16) -> Rect {
    let area = frame.area();
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    Rect {
        x: (area.width.saturating_sub(width)) / 2,
        y: (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

fn render_delete_overlay(frame: &mut Frame, overlay: &DeleteOverlay) {
    let popup_area = centered(frame, 60, 6);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(format!(" Delete {} ", overlay.confirmation.item_type()))
        .title_style(Style::default().fg(ERROR).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ERROR));

    let lines = vec![
        Line::from(overlay.confirmation.prompt()),
        Line::from(""),
        Line::from(Span::styled(
            format!("> {}|", overlay.input),
            Style::default().fg(HIGHLIGHT),
        )),
    ];

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        popup_area,
    );
}

fn render_edit_overlay(frame: &mut Frame, overlay: &EditOverlay) {
    let inputs = overlay.draft.inputs();
    let popup_area = centered(frame, 70, inputs.len() as u16 + 2);
    frame.render_widget(Clear, popup_area);

    let verb = if overlay.draft.is_new() { "New" } else { "Edit" };
    let block = Block::default()
        .title(format!(" {} {} ", verb, overlay.draft.item_type()))
        .title_style(Style::default().fg(SUCCESS).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(SUCCESS));

    let label_width = inputs.iter().map(|i| i.label.chars().count()).max().unwrap_or(0);

    let lines: Vec<Line> = inputs
        .iter()
        .enumerate()
        .map(|(idx, input)| {
            let focused = idx == overlay.field;
            let value = match input.selected_label() {
                Some(label) => format!("‹ {} ›", label),
                None if focused => format!("{}|", input.value),
                None => input.value.clone(),
            };
            let value_style = if input.disabled {
                Style::default().fg(DIM)
            } else if focused {
                Style::default()
                    .fg(Color::Black)
                    .bg(HIGHLIGHT)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(vec![
                Span::styled(
                    format!("{:>width$}  ", input.label, width = label_width),
                    Style::default().fg(if focused { HIGHLIGHT } else { SECONDARY }),
                ),
                Span::styled(value, value_style),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), popup_area);
}
