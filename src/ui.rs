use crate::app::{App, Field, Mode};
use crate::storage::KeyValueStore;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_millis(50);

pub fn run_app<B: Backend, S: KeyValueStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key, Instant::now());
                }
            }
        }
        app.tick(Instant::now());

        if app.should_quit {
            return Ok(());
        }
    }
}

pub fn draw<S: KeyValueStore>(f: &mut Frame, app: &App<S>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());

    draw_columns(f, app, rows[0]);
    draw_status(f, app, rows[1]);

    if app.mode == Mode::Adding {
        draw_form(f, app);
    }
}

fn draw_columns<S: KeyValueStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let columns = app.columns();
    let count = columns.len().max(1) as u32;
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(columns.iter().map(|_| Constraint::Ratio(1, count)))
        .split(area);

    let dragged = app.drag.as_ref().map(|d| d.task_id.as_str());
    for (i, column) in columns.iter().enumerate() {
        let items: Vec<ListItem> = column
            .tasks
            .iter()
            .map(|t| {
                let mut title = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
                let mut description = Style::default().fg(Color::Gray);
                if dragged == Some(t.id.as_str()) {
                    title = title.add_modifier(Modifier::DIM);
                    description = description.add_modifier(Modifier::DIM);
                }
                ListItem::new(vec![
                    Line::from(Span::styled(t.title.as_str(), title)),
                    Line::from(Span::styled(t.description.as_str(), description)),
                ])
            })
            .collect();

        let border_style = if app.mode == Mode::Dragging && app.drop_target == i {
            Style::default().fg(Color::Yellow)
        } else if app.selected_column == i {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };

        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!("{} ({})", column.title, column.tasks.len()))
                    .borders(Borders::ALL)
                    .border_style(border_style),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");

        let mut state = ListState::default();
        if app.selected_column == i && !column.tasks.is_empty() {
            state.select(Some(app.selected_task));
        }
        f.render_stateful_widget(list, chunks[i], &mut state);
    }
}

fn draw_status<S: KeyValueStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let line = match (&app.status, app.mode) {
        (Some(message), _) => {
            Line::from(Span::styled(message.as_str(), Style::default().fg(Color::Red)))
        }
        (None, Mode::Normal) => {
            Line::from("a: add  d: delete  space: drag  enter: next column  q: quit")
        }
        (None, Mode::Adding) => Line::from("tab: next field  enter: add  esc: close"),
        (None, Mode::Dragging) => {
            Line::from("left/right: choose column  space: drop  esc: cancel")
        }
    };
    f.render_widget(Paragraph::new(line), area);
}

fn draw_form<S: KeyValueStore>(f: &mut Frame, app: &App<S>) {
    let area = centered_rect(60, 50, f.area());
    let form = &app.form;

    let label = |field: Field, name: &'static str| {
        if form.field == field {
            Span::styled(name, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        } else {
            Span::styled(name, Style::default().fg(Color::Gray))
        }
    };
    let column_title = app
        .columns()
        .get(form.column)
        .map_or("", |c| c.title.as_str());
    let button = if app.is_submitting() {
        Span::styled("Adding Task...", Style::default().fg(Color::DarkGray))
    } else {
        let style = Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD);
        Span::styled("[ Add Task ]", style)
    };

    let lines = vec![
        Line::from(vec![label(Field::Title, "Title: "), Span::raw(form.title.as_str())]),
        Line::from(""),
        Line::from(vec![
            label(Field::Description, "Description: "),
            Span::raw(form.description.as_str()),
        ]),
        Line::from(""),
        Line::from(vec![
            label(Field::Column, "Column: "),
            Span::raw(format!("< {} >", column_title)),
        ]),
        Line::from(""),
        Line::from(button),
    ];

    let paragraph = Paragraph::new(lines)
        .block(Block::default().title("Add New Task").borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
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
        .split(vertical[1])[1]
}
