use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget, Wrap},
};

use crate::keymap::hints;
use crate::session::{RoundStatus, SessionSnapshot, MAX_ROUNDS};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;
const TITLE: &str = "Boxing Combos";

impl Widget for &SessionSnapshot {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // styles
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);
        let current_style = Style::default().patch(bold_style).fg(Color::Yellow);

        // the whole screen turns red once the bell has gone
        let background = match self.status {
            RoundStatus::RoundOver => Style::default().bg(Color::Red).fg(Color::White),
            _ => Style::default(),
        };
        Block::default().style(background).render(area, buf);

        let combo_lines = self.combos.len() as u16;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(2),           // title + session line
                Constraint::Length(2),           // clock
                Constraint::Length(combo_lines), // combos
                Constraint::Length(2),           // confirmation banner
                Constraint::Min(0),
                Constraint::Length(1), // hints
            ])
            .split(area);

        let session_line = format!(
            "round {} of {}  ·  {} completed  ·  since {}",
            self.combos.len(),
            MAX_ROUNDS,
            self.rounds_completed,
            self.started_at.format("%H:%M"),
        );
        Paragraph::new(vec![
            Line::from(Span::styled(TITLE, bold_style)),
            Line::from(Span::styled(session_line, dim_style)),
        ])
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        Paragraph::new(Line::from(vec![
            Span::raw("Time Left: "),
            Span::styled(self.time_left(), bold_style),
        ]))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

        let top = self.combos.len();
        let combos = self
            .combos
            .iter()
            .enumerate()
            .map(|(i, combo)| {
                let style = if i + 1 == top && self.status == RoundStatus::Running {
                    current_style
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::styled(format!("Combo {}: ", i + 1), dim_style),
                    Span::styled(combo.to_string(), style),
                ])
            })
            .collect::<Vec<Line>>();
        Paragraph::new(combos)
            .alignment(Alignment::Center)
            .render(chunks[2], buf);

        if let Some(left) = self.confirm_secs_left {
            Paragraph::new(Span::styled(
                format!("Start round {}? Cancelling in {}s", top + 1, left),
                Style::default().patch(bold_style).fg(Color::Cyan),
            ))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[3], buf);
        } else if self.status == RoundStatus::RoundOver && !self.can_advance {
            Paragraph::new(Span::styled("Session complete", bold_style))
                .alignment(Alignment::Center)
                .render(chunks[3], buf);
        }

        Paragraph::new(Span::styled(hints(self), italic_style))
            .alignment(Alignment::Center)
            .render(chunks[5], buf);
    }
}
