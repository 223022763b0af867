//! Dashboard state and rendering for the terminal UI

use std::collections::VecDeque;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Row, Table};
use ratatui::Frame;

use super::{FileOutcome, Phase};

const ACTIVITY_LIMIT: usize = 100;

/// Phases that ingest files, in run order
const INGEST_PHASES: [Phase; 3] = [Phase::Channels, Phase::Structures, Phase::Arinc];

/// File currently being ingested
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentFile {
    pub index: usize,
    pub total: usize,
    pub name: String,
}

impl CurrentFile {
    /// Fraction of the phase's files already done
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.index as f64 / self.total as f64).min(1.0)
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseTally {
    pub ingested: u64,
    pub failed: u64,
    pub rows: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityLine {
    pub text: String,
    pub failed: bool,
}

/// Everything the dashboard shows
#[derive(Debug)]
pub struct Dashboard {
    pub phase: Phase,
    pub info: String,
    pub current: Option<CurrentFile>,
    tallies: [PhaseTally; INGEST_PHASES.len()],
    activity: VecDeque<ActivityLine>,
    pub stopping: bool,
}

impl Dashboard {
    pub fn new() -> Self {
        Self {
            phase: Phase::Discovering,
            info: String::new(),
            current: None,
            tallies: [PhaseTally::default(); INGEST_PHASES.len()],
            activity: VecDeque::with_capacity(ACTIVITY_LIMIT),
            stopping: false,
        }
    }

    pub fn enter_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.current = None;
    }

    pub fn tally(&self, phase: Phase) -> Option<PhaseTally> {
        slot(phase).map(|i| self.tallies[i])
    }

    pub fn record(&mut self, name: &str, outcome: &FileOutcome) {
        let tally = match slot(self.phase) {
            Some(i) => self.tallies.get_mut(i),
            None => None,
        };
        let line = match outcome {
            FileOutcome::Ingested { rows } => {
                if let Some(tally) = tally {
                    tally.ingested += 1;
                    tally.rows += rows;
                }
                ActivityLine {
                    text: format!("{}: {} rows", name, rows),
                    failed: false,
                }
            }
            FileOutcome::Failed(reason) => {
                if let Some(tally) = tally {
                    tally.failed += 1;
                }
                ActivityLine {
                    text: format!("{}: {}", name, reason),
                    failed: true,
                }
            }
        };
        self.push(line);
    }

    pub fn note(&mut self, text: impl Into<String>) {
        self.push(ActivityLine {
            text: text.into(),
            failed: false,
        });
    }

    pub fn activity(&self) -> impl Iterator<Item = &ActivityLine> {
        self.activity.iter()
    }

    fn push(&mut self, line: ActivityLine) {
        if self.activity.len() == ACTIVITY_LIMIT {
            self.activity.pop_front();
        }
        self.activity.push_back(line);
    }

    pub fn render(&self, frame: &mut Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(5),
            ])
            .split(frame.area());
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(30), Constraint::Length(36)])
            .split(rows[2]);

        self.render_header(frame, rows[0]);
        self.render_gauge(frame, rows[1]);
        self.render_activity(frame, body[0]);
        self.render_tallies(frame, body[1]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let color = match self.phase {
            Phase::Complete => Color::Green,
            _ if self.stopping => Color::Yellow,
            _ => Color::Cyan,
        };
        let hint = if self.stopping {
            "stopping after the current file"
        } else {
            "q: stop after current file"
        };
        let lines = vec![
            Line::from(Span::styled(
                format!(" {}", self.phase),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(vec![
                Span::styled(format!(" {}", self.info), Style::default().fg(Color::Gray)),
                Span::styled(format!("   [{}]", hint), Style::default().fg(Color::DarkGray)),
            ]),
        ];
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" GILDA to SQLite ");
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_gauge(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::LEFT | Borders::RIGHT);
        let Some(current) = &self.current else {
            frame.render_widget(Paragraph::new("").block(block), area);
            return;
        };
        let gauge = Gauge::default()
            .block(block)
            .gauge_style(Style::default().fg(Color::Cyan).bg(Color::DarkGray))
            .ratio(current.ratio())
            .label(format!(
                "{} ({}/{})",
                current.name,
                current.index + 1,
                current.total
            ));
        frame.render_widget(gauge, area);
    }

    fn render_activity(&self, frame: &mut Frame, area: Rect) {
        let visible = area.height.saturating_sub(2) as usize;
        let skip = self.activity.len().saturating_sub(visible);
        let items: Vec<ListItem> = self
            .activity
            .iter()
            .skip(skip)
            .map(|line| {
                let color = if line.failed { Color::Red } else { Color::Gray };
                ListItem::new(Span::styled(
                    format!(" {}", line.text),
                    Style::default().fg(color),
                ))
            })
            .collect();
        let block = Block::default().borders(Borders::ALL).title(" Activity ");
        frame.render_widget(List::new(items).block(block), area);
    }

    fn render_tallies(&self, frame: &mut Frame, area: Rect) {
        let rows = INGEST_PHASES.iter().zip(self.tallies.iter()).map(|(phase, tally)| {
            let failed_style = if tally.failed > 0 {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };
            Row::new(vec![
                Span::raw(short_name(*phase)),
                Span::raw(tally.ingested.to_string()),
                Span::styled(tally.failed.to_string(), failed_style),
                Span::raw(tally.rows.to_string()),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(11),
                Constraint::Length(5),
                Constraint::Length(6),
                Constraint::Min(6),
            ],
        )
        .header(
            Row::new(vec!["phase", "ok", "fail", "rows"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title(" Files "));
        frame.render_widget(table, area);
    }
}

fn slot(phase: Phase) -> Option<usize> {
    INGEST_PHASES.iter().position(|p| *p == phase)
}

fn short_name(phase: Phase) -> &'static str {
    match phase {
        Phase::Channels => "channels",
        Phase::Structures => "structures",
        Phase::Arinc => "arinc",
        _ => "",
    }
}
