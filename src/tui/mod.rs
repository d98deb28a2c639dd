pub mod app;
pub mod events;
pub mod theme;
pub mod ui;
pub mod widgets;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::task::JoinHandle;

use crate::engine::types::SessionOutcome;
use crate::engine::SpeedTest;

use app::App;
use events::AppEvent;

/// Run the full-screen TUI speed test.
pub async fn run(speedtest: Arc<SpeedTest>) -> Result<()> {
    terminal::enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_inner(&mut terminal, speedtest).await;

    terminal::disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_inner(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    speedtest: Arc<SpeedTest>,
) -> Result<()> {
    let mut app = App::new(speedtest.config());

    // Subscribe before starting so the first stage change is not missed
    let mut rx = speedtest.subscribe();
    let mut handle: Option<JoinHandle<SessionOutcome>> = speedtest.start();

    let tick_rate = Duration::from_millis(50);

    loop {
        terminal.draw(|f| ui::draw(f, &app))?;

        loop {
            match rx.try_recv() {
                Ok(event) => app.handle_event(event),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        match events::next_event(tick_rate)? {
            Some(AppEvent::Quit) => {
                speedtest.cancel();
                app.should_quit = true;
            }
            Some(AppEvent::Cancel) => speedtest.cancel(),
            Some(AppEvent::Restart) if app.is_finished() && !speedtest.is_running() => {
                app.reset();
                handle = speedtest.start();
            }
            _ => {}
        }

        if app.should_quit {
            break;
        }
    }

    if let Some(handle) = handle {
        let _ = handle.await;
    }

    Ok(())
}
