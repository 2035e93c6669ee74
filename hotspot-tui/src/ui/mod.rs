/*!
 * Hotspot Connector screen
 * Two fields, a button, and what the platform reports back
 */

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tui_input::Input;

use crate::app::{App, Focus};

// Conservative color palette
const BLUE: Color = Color::Rgb(100, 149, 237);
const GRAY: Color = Color::Rgb(128, 128, 128);
const WHITE: Color = Color::Rgb(255, 255, 255);
const GREEN: Color = Color::Rgb(34, 139, 34);

const PANEL_WIDTH: u16 = 48;

pub fn render_ui(f: &mut Frame, app: &App) {
    let area = centered(f.area(), PANEL_WIDTH);

    let outer = Block::default()
        .borders(Borders::ALL)
        .title("Hotspot Connector")
        .border_style(Style::default().fg(BLUE));
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // SSID
            Constraint::Length(3), // Password
            Constraint::Length(1), // Button
            Constraint::Length(1), // Activity
            Constraint::Length(4), // Network info
            Constraint::Min(1),    // Help
        ])
        .split(inner);

    render_input(f, chunks[0], app, Focus::Ssid, "SSID", &app.ssid, false);
    render_input(f, chunks[1], app, Focus::Password, "Password", &app.password, true);
    render_button(f, chunks[2], app);
    render_activity(f, chunks[3], app);
    render_info(f, chunks[4], app);
    render_help(f, chunks[5]);
}

fn centered(area: Rect, width: u16) -> Rect {
    let width = width.min(area.width);
    Rect {
        x: area.x + (area.width - width) / 2,
        width,
        ..area
    }
}

fn render_input(
    f: &mut Frame,
    area: Rect,
    app: &App,
    focus: Focus,
    title: &str,
    input: &Input,
    masked: bool,
) {
    let focused = app.focus == focus;
    let border_style = if focused {
        Style::default().fg(BLUE)
    } else {
        Style::default().fg(GRAY)
    };

    let width = area.width.saturating_sub(2) as usize;
    let (text, cursor, scroll) = if masked {
        // One mask cell per character, whatever the character's width
        let cursor = input.cursor();
        let scroll = cursor.saturating_sub(width.saturating_sub(1));
        ("•".repeat(input.value().chars().count()), cursor, scroll)
    } else {
        (input.value().to_string(), input.visual_cursor(), input.visual_scroll(width))
    };

    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(WHITE))
        .scroll((0, scroll as u16))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(border_style),
        );
    f.render_widget(paragraph, area);

    if focused {
        let offset = cursor.saturating_sub(scroll) as u16;
        f.set_cursor_position((area.x + 1 + offset, area.y + 1));
    }
}

fn render_button(f: &mut Frame, area: Rect, app: &App) {
    let style = if app.focus == Focus::Connect {
        Style::default().bg(BLUE).fg(WHITE).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(WHITE)
    };

    let button = Paragraph::new(Line::from(Span::styled("[ Connect ]", style)))
        .alignment(Alignment::Center);
    f.render_widget(button, area);
}

fn render_activity(f: &mut Frame, area: Rect, app: &App) {
    if !app.is_busy() {
        return;
    }

    let line = Line::from(vec![
        Span::styled(app.spinner(), Style::default().fg(BLUE)),
        Span::styled(" Joining…", Style::default().fg(GRAY)),
    ]);
    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn render_info(f: &mut Frame, area: Rect, app: &App) {
    let lines: Vec<Line> = match app.info_label() {
        Some(label) => label
            .lines()
            .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(GREEN))))
            .collect(),
        None => vec![Line::from(Span::styled("Not joined", Style::default().fg(GRAY)))],
    };

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Network")
            .border_style(Style::default().fg(GRAY)),
    );
    f.render_widget(paragraph, area);
}

fn render_help(f: &mut Frame, area: Rect) {
    let help = Paragraph::new(Line::from(vec![
        Span::styled("[Tab] ", Style::default().fg(BLUE)),
        Span::styled("Next  ", Style::default().fg(GRAY)),
        Span::styled("[Enter] ", Style::default().fg(BLUE)),
        Span::styled("Connect  ", Style::default().fg(GRAY)),
        Span::styled("[Esc] ", Style::default().fg(BLUE)),
        Span::styled("Quit", Style::default().fg(GRAY)),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(help, area);
}
