//! Frame rendering.

use crate::app::App;
use crate::colors;
use hitch_core::Mode;
use hitch_tui::widgets::LaunchGauge;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

/// Headline and hint shown instead of an empty list
pub fn empty_state(app: &App) -> (&'static str, &'static str) {
    if app.candidates.is_empty() {
        ("No candidates found", "Start the target application to continue")
    } else {
        ("Select a process", "Make sure it has fully loaded first")
    }
}

pub fn ui(f: &mut Frame, app: &mut App) {
    f.render_widget(
        Block::default().style(Style::default().bg(colors::BG)),
        f.area(),
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    if app.is_launching() {
        render_launch(f, app, chunks[1]);
    } else {
        render_candidates(f, app, chunks[1]);
    }
    render_help(f, app, chunks[2]);
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let (headline, hint) = empty_state(app);
    let mode = match app.mode {
        Mode::Scanning => " [scanning] ",
        Mode::Dragging => " [paused] ",
        Mode::Idle | Mode::Launching => "",
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            headline,
            Style::default()
                .fg(colors::ON_SURFACE)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {hint}"), Style::default().fg(colors::SUBTEXT)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Hitch{mode}"))
            .style(Style::default().bg(colors::SURFACE))
            .border_style(Style::default().fg(colors::OUTLINE)),
    );
    f.render_widget(header, area);
}

fn render_candidates(f: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Processes ({}) ", app.candidates.len()))
        .style(Style::default().bg(colors::SURFACE))
        .border_style(Style::default().fg(colors::OUTLINE));

    if app.candidates.is_empty() {
        let (headline, hint) = empty_state(app);
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(headline, Style::default().fg(colors::ON_SURFACE))),
            Line::from(Span::styled(hint, Style::default().fg(colors::OUTLINE))),
        ];
        f.render_widget(
            Paragraph::new(text).alignment(Alignment::Center).block(block),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = app
        .candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| {
            let style = if i == app.selected {
                Style::default()
                    .bg(colors::PRIMARY_CONTAINER)
                    .fg(colors::PRIMARY)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors::ON_SURFACE)
            };
            ListItem::new(Line::from(Span::styled(
                format!(" {}", candidate.display_title),
                style,
            )))
        })
        .collect();

    f.render_stateful_widget(List::new(items).block(block), area, &mut app.list_state);
}

fn render_launch(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Launching ")
        .style(Style::default().bg(colors::SURFACE))
        .border_style(Style::default().fg(colors::PRIMARY));

    let Some(launch) = &app.launch else {
        f.render_widget(block, area);
        return;
    };

    let target = app
        .candidates
        .get(launch.pid)
        .map_or_else(|| format!("PID {}", launch.pid), |c| c.display_title.clone());
    let status = match launch.spawned {
        None => "Preparing launcher",
        Some(true) => "Launcher started",
        Some(false) => "Launcher failed to start",
    };

    let width = usize::from(area.width.saturating_sub(12));
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(target, Style::default().fg(colors::ON_SURFACE))),
        Line::from(""),
        Line::from(LaunchGauge::new(launch.progress).to_spans(width)),
        Line::from(Span::styled(status, Style::default().fg(colors::SUBTEXT))),
    ];
    f.render_widget(
        Paragraph::new(text).alignment(Alignment::Center).block(block),
        area,
    );
}

fn render_help(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled("Esc", Style::default().fg(colors::PRIMARY)),
        Span::styled(": quit  ", Style::default().fg(colors::SUBTEXT)),
    ];

    if !app.is_launching() {
        spans.extend([
            Span::styled("Up/Down", Style::default().fg(colors::PRIMARY)),
            Span::styled(": move  ", Style::default().fg(colors::SUBTEXT)),
            Span::styled("Enter", Style::default().fg(colors::PRIMARY)),
            Span::styled(": launch  ", Style::default().fg(colors::SUBTEXT)),
        ]);
    }

    if let Some(msg) = &app.status_message {
        spans.push(Span::styled(msg.as_str(), Style::default().fg(colors::ERROR)));
    }

    let help = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .style(Style::default().bg(colors::SURFACE))
            .border_style(Style::default().fg(colors::OUTLINE)),
    );
    f.render_widget(help, area);
}
