//! TUI module - Terminal dashboard with ratatui

use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};
use std::io::{Stdout, stdout};

use crate::db::{Database, PersonalRecord, Workout, WorkoutSummary};

type Tui = Terminal<CrosstermBackend<Stdout>>;

const RECENT_WORKOUTS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Panel {
    Workouts,
    Records,
}

/// Dashboard rows, loaded up front so drawing never touches the database
struct Snapshot {
    workouts: Vec<(Workout, WorkoutSummary)>,
    records: Vec<(String, PersonalRecord)>,
}

impl Snapshot {
    fn load(db: &Database) -> Result<Self> {
        let workouts = db
            .recent_workouts(RECENT_WORKOUTS)?
            .into_iter()
            .map(|w| {
                let summary = db.workout_summary(w.id)?;
                Ok((w, summary))
            })
            .collect::<Result<Vec<_>>>()?;
        let records = db
            .best_records(None)?
            .into_iter()
            .map(|r| Ok((db.exercise_label(r.exercise_id)?, r)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { workouts, records })
    }
}

/// App state for TUI
pub struct App {
    db: Database,
    snapshot: Snapshot,
    focus: Panel,
    should_quit: bool,
}

impl App {
    pub fn new(db: Database) -> Result<Self> {
        let snapshot = Snapshot::load(&db)?;
        Ok(Self {
            db,
            snapshot,
            focus: Panel::Workouts,
            should_quit: false,
        })
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;

        let result = self.event_loop(&mut terminal);
        restore_terminal()?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }
        Ok(())
    }

    fn panel_block(&self, panel: Panel, title: &str) -> Block<'static> {
        let style = if self.focus == panel {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        Block::default()
            .borders(Borders::ALL)
            .border_style(style)
            .title(title.to_string())
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
            ])
            .split(area);

        let unfinished = self.snapshot.workouts.iter().filter(|(w, _)| !w.completed).count();
        let title = if unfinished > 0 {
            format!("lift - strength log ({} unfinished)", unfinished)
        } else {
            "lift - strength log".to_string()
        };
        let header = Paragraph::new(title)
            .style(Style::default().fg(Color::Cyan).bold())
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[1]);

        let workout_rows: Vec<Row> = self
            .snapshot
            .workouts
            .iter()
            .map(|(w, summary)| {
                let duration = w
                    .duration_minutes
                    .map(|m| format!("{} min", m))
                    .unwrap_or_else(|| "open".to_string());
                Row::new(vec![
                    Cell::from(w.date.format("%Y-%m-%d").to_string()),
                    Cell::from(w.name.clone().unwrap_or_else(|| "Workout".to_string())),
                    Cell::from(summary.total_sets.to_string()),
                    Cell::from(format!("{:.0}", summary.total_volume)),
                    Cell::from(duration),
                ])
            })
            .collect();

        let workouts = Table::new(
            workout_rows,
            [
                Constraint::Length(12),
                Constraint::Min(14),
                Constraint::Length(5),
                Constraint::Length(9),
                Constraint::Length(8),
            ],
        )
        .header(Row::new(vec!["Date", "Workout", "Sets", "Volume", "Time"]).style(Style::default().bold()))
        .block(self.panel_block(Panel::Workouts, "Recent workouts"));
        frame.render_widget(workouts, panels[0]);

        let record_rows: Vec<Row> = self
            .snapshot
            .records
            .iter()
            .map(|(name, r)| {
                let set = match (r.weight, r.reps) {
                    (Some(weight), Some(reps)) => format!("{}x{}", weight, reps),
                    _ => "-".to_string(),
                };
                Row::new(vec![
                    Cell::from(name.clone()),
                    Cell::from(r.record_type.label()),
                    Cell::from(format!("{:.1}", r.value)),
                    Cell::from(set),
                ])
            })
            .collect();

        let records = Table::new(
            record_rows,
            [
                Constraint::Min(16),
                Constraint::Length(10),
                Constraint::Length(8),
                Constraint::Length(10),
            ],
        )
        .header(Row::new(vec!["Exercise", "Record", "Value", "Set"]).style(Style::default().bold()))
        .block(self.panel_block(Panel::Records, "Personal records"));
        frame.render_widget(records, panels[1]);

        let footer = Paragraph::new("q: quit | r: refresh | tab: switch panel")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[2]);
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                KeyCode::Char('r') => {
                    self.snapshot = Snapshot::load(&self.db)?;
                }
                KeyCode::Tab => {
                    self.focus = match self.focus {
                        Panel::Workouts => Panel::Records,
                        Panel::Records => Panel::Workouts,
                    };
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
