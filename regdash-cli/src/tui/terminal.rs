//! Terminal management and main run loop

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use regdash_core::{Completion, ListController, MemorySink, PendingOp, RefreshTimer};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::app::App;
use super::event::{handle_key, poll_event, HandleResult};
use super::ui;

type Completions = mpsc::UnboundedSender<(usize, Completion)>;

/// Initialize the terminal for TUI mode
fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok(terminal)
}

/// Restore the terminal to normal mode
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Run the TUI on the current (blocking) thread.
///
/// Requests run on `handle`; their results come back over a channel so the
/// table stays responsive while they are in flight.
pub fn run(
    handle: Handle,
    controllers: Vec<ListController>,
    sink: Arc<MemorySink>,
    active: usize,
    refresh_every: Duration,
) -> Result<()> {
    let mut terminal = init_terminal()?;

    let mut app = App::new(controllers, sink, active);
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    let (tick_tx, mut tick_rx) = mpsc::channel(1);

    let timer = {
        let _guard = handle.enter();
        RefreshTimer::spawn(refresh_every, tick_tx)
    };
    info!(period = ?timer.period(), "tui started");

    if let Some((tab, op)) = app.begin_refresh() {
        spawn(&handle, &done_tx, tab, op);
    }

    let result = run_loop(
        &mut terminal,
        &mut app,
        &handle,
        &done_tx,
        &mut done_rx,
        &mut tick_rx,
    );

    timer.cancel();
    // Restore terminal (even if loop failed)
    restore_terminal(&mut terminal)?;

    result
}

fn spawn(handle: &Handle, done: &Completions, tab: usize, op: PendingOp) {
    let done = done.clone();
    handle.spawn(async move {
        let completion = op.await;
        // the loop may already be gone
        let _ = done.send((tab, completion));
    });
}

/// Main event loop
fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    handle: &Handle,
    done_tx: &Completions,
    done_rx: &mut mpsc::UnboundedReceiver<(usize, Completion)>,
    tick_rx: &mut mpsc::Receiver<regdash_core::RefreshTick>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        // 100ms timeout keeps completions and ticks flowing without input
        if let Some(event) = poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => match handle_key(app, key) {
                    HandleResult::Quit => break,
                    HandleResult::Continue => {}
                    HandleResult::Submit(tab, op) => spawn(handle, done_tx, tab, op),
                },
                Event::Resize(_, _) => {
                    // Terminal resized, will be handled on next draw
                }
                _ => {}
            }
        }

        while let Ok((tab, completion)) = done_rx.try_recv() {
            app.complete(tab, completion);
        }

        while let Ok(tick) = tick_rx.try_recv() {
            debug!(seq = tick.seq, "refresh tick");
            if let Some((tab, op)) = app.begin_refresh() {
                spawn(handle, done_tx, tab, op);
            }
        }
    }

    Ok(())
}
