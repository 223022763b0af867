//! Progress reporting for ingestion runs.
//!
//! The orchestrator reports through the [`Ui`] trait: the phase it is in,
//! which file it is working on and how each file ended. [`UiApp`] renders
//! that as a ratatui dashboard; [`SilentUi`] drops it.

mod components;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::time::Duration;

use components::{CurrentFile, Dashboard};

/// Run phases, in the order the orchestrator goes through them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Discovering,
    Channels,
    Structures,
    Arinc,
    Maintenance,
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Discovering => write!(f, "Discovering input files"),
            Phase::Channels => write!(f, "Ingesting channel topology"),
            Phase::Structures => write!(f, "Ingesting structures"),
            Phase::Arinc => write!(f, "Ingesting ARINC definitions"),
            Phase::Maintenance => write!(f, "Optimizing database"),
            Phase::Complete => write!(f, "Complete"),
        }
    }
}

/// How one input file ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Ingested { rows: u64 },
    Failed(String),
}

pub trait Ui {
    fn set_phase(&mut self, phase: Phase);
    fn set_info(&mut self, info: impl Into<String>);

    /// `index` is zero-based within the current phase
    fn file_started(&mut self, index: usize, total: usize, name: &str);
    fn file_finished(&mut self, name: &str, outcome: FileOutcome);

    /// Polled between files; once true the run stops at the next file boundary
    fn cancelled(&mut self) -> bool {
        false
    }
}

type Screen = Terminal<CrosstermBackend<Stdout>>;

fn enter_screen() -> Result<Screen> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn leave_screen(screen: &mut Screen) -> io::Result<()> {
    terminal::disable_raw_mode()?;
    screen.backend_mut().execute(LeaveAlternateScreen)?;
    screen.show_cursor()
}

/// Terminal dashboard; owns the alternate screen until dropped
pub struct UiApp {
    screen: Screen,
    dashboard: Dashboard,
    restored: bool,
}

impl UiApp {
    pub fn new() -> Result<Self> {
        Ok(Self {
            screen: enter_screen()?,
            dashboard: Dashboard::new(),
            restored: false,
        })
    }

    /// Drain pending key events; `q` or Ctrl+C asks the run to stop.
    /// Raw mode turns Ctrl+C into a key event instead of SIGINT.
    fn poll_stop_request(&mut self) -> bool {
        while event::poll(Duration::ZERO).unwrap_or(false) {
            let Ok(CrosstermEvent::Key(KeyEvent {
                code, modifiers, ..
            })) = event::read()
            else {
                continue;
            };
            let ctrl_c = code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL);
            if (code == KeyCode::Char('q') || ctrl_c) && !self.dashboard.stopping {
                self.dashboard.stopping = true;
                self.dashboard.note("Stopping after the current file...");
            }
        }
        self.dashboard.stopping
    }

    fn redraw(&mut self) {
        let dashboard = &self.dashboard;
        // A failed frame is dropped; the next update draws again.
        self.screen.draw(|frame| dashboard.render(frame)).ok();
    }

    /// Show the summary, wait for a key, then give the terminal back
    pub fn finish(mut self, summary: &str) -> Result<()> {
        self.dashboard.enter_phase(Phase::Complete);
        self.dashboard.note(summary);
        self.dashboard.note("Press any key to exit...");
        self.redraw();

        loop {
            if event::poll(Duration::from_millis(100))? {
                if let CrosstermEvent::Key(_) = event::read()? {
                    break;
                }
            }
        }
        self.restore()
    }

    /// Give the terminal back without waiting
    pub fn restore(mut self) -> Result<()> {
        self.restored = true;
        leave_screen(&mut self.screen)?;
        Ok(())
    }
}

impl Ui for UiApp {
    fn set_phase(&mut self, phase: Phase) {
        self.dashboard.enter_phase(phase);
        self.redraw();
    }

    fn set_info(&mut self, info: impl Into<String>) {
        self.dashboard.info = info.into();
        self.redraw();
    }

    fn file_started(&mut self, index: usize, total: usize, name: &str) {
        self.dashboard.current = Some(CurrentFile {
            index,
            total,
            name: name.to_string(),
        });
        self.redraw();
    }

    fn file_finished(&mut self, name: &str, outcome: FileOutcome) {
        self.dashboard.record(name, &outcome);
        self.redraw();
    }

    fn cancelled(&mut self) -> bool {
        let stop = self.poll_stop_request();
        self.redraw();
        stop
    }
}

impl Drop for UiApp {
    fn drop(&mut self) {
        if !self.restored {
            leave_screen(&mut self.screen).ok();
        }
    }
}

/// Ui that reports nothing, for plain runs and tests
#[derive(Debug, Default)]
pub struct SilentUi;

impl SilentUi {
    pub fn new() -> Self {
        Self
    }
}

impl Ui for SilentUi {
    fn set_phase(&mut self, _phase: Phase) {}
    fn set_info(&mut self, _info: impl Into<String>) {}
    fn file_started(&mut self, _index: usize, _total: usize, _name: &str) {}
    fn file_finished(&mut self, _name: &str, _outcome: FileOutcome) {}
}
