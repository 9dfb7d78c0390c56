use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::session::{CharStatus, SessionState};
use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.session.state() {
            SessionState::Idle => render_menu(self, area, buf),
            SessionState::Running => render_typing(self, area, buf),
            SessionState::Finished => render_results(self, area, buf),
        }
    }
}

fn render_menu(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);

    let mut lines = vec![
        Line::from(Span::styled("speedtyper", bold_style)),
        Line::from(""),
        Line::from(vec![
            Span::styled("how many words? ", dim_style),
            Span::styled(app.menu_input.as_str(), bold_style),
            Span::styled("▏", dim_style),
        ]),
    ];

    if let Some(ref err) = app.menu_error {
        lines.push(Line::from(Span::styled(
            err.as_str(),
            Style::default().fg(Color::Red),
        )));
    } else {
        lines.push(Line::from(""));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "(enter) start  (esc) quit",
        Style::default()
            .add_modifier(Modifier::ITALIC)
            .fg(Color::Gray),
    )));

    let height = lines.len() as u16;
    let menu = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    menu.render(centered_block(area, height), buf);
}

fn render_typing(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
    let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
    let dim_bold_style = Style::default()
        .patch(bold_style)
        .add_modifier(Modifier::DIM);
    let underlined_dim_bold_style = Style::default()
        .patch(dim_bold_style)
        .add_modifier(Modifier::UNDERLINED);

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let prompt_width = session.text().raw().width();
    let prompt_occupied_lines = if prompt_width <= max_chars_per_line as usize {
        1
    } else {
        ((prompt_width as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints(
            [
                Constraint::Length(
                    (area.height.saturating_sub(prompt_occupied_lines) / 2).saturating_sub(1),
                ),
                Constraint::Length(prompt_occupied_lines),
                Constraint::Length(2),
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(area);

    // One span per typed character, one underlined span for the current
    // position, one dim span for the untouched remainder.
    let mut spans = session
        .status()
        .iter()
        .take(session.cursor())
        .enumerate()
        .map(|(idx, status)| {
            let shown = match session.text().char_at(idx) {
                Some(' ') => "·".to_owned(),
                Some(c) => c.to_string(),
                None => String::new(),
            };

            match status {
                CharStatus::Correct => Span::styled(shown, green_bold_style),
                CharStatus::Incorrect => Span::styled(shown, red_bold_style),
                CharStatus::Untyped => Span::styled(shown, dim_bold_style),
            }
        })
        .collect::<Vec<Span>>();

    if let Some(current) = session.text().char_at(session.cursor()) {
        spans.push(Span::styled(
            current.to_string(),
            underlined_dim_bold_style,
        ));
    }

    let rest = session
        .text()
        .raw()
        .chars()
        .skip(session.cursor() + 1)
        .collect::<String>();
    spans.push(Span::styled(rest, dim_bold_style));

    let prompt = Paragraph::new(Line::from(spans))
        .alignment(if prompt_occupied_lines == 1 {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true });

    prompt.render(chunks[1], buf);

    let live = session.live_stats();
    let stats_line = Paragraph::new(Span::styled(
        format!("{} wpm   {} mistakes", live.wpm, live.mistakes),
        dim_bold_style,
    ))
    .alignment(Alignment::Center);

    stats_line.render(chunks[2], buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let bold_style = Style::default().add_modifier(Modifier::BOLD);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(
            [
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    if let Some(summary) = session.summary() {
        let headline = Paragraph::new(Span::styled(
            format!("{} wpm   {}% acc", summary.wpm, summary.accuracy),
            bold_style,
        ))
        .alignment(Alignment::Center);
        headline.render(chunks[1], buf);

        let detail = Paragraph::new(Span::styled(
            format!(
                "uncorrected mistakes: {}   mistake keystrokes: {}",
                summary.uncorrected_mistakes, summary.total_mistake_keystrokes
            ),
            Style::default().fg(Color::Gray),
        ))
        .alignment(Alignment::Center);
        detail.render(chunks[2], buf);
    }

    let legend = Paragraph::new(Span::styled(
        "(r)estart  (esc)ape",
        Style::default()
            .add_modifier(Modifier::ITALIC)
            .fg(Color::Gray),
    ))
    .alignment(Alignment::Center);
    legend.render(chunks[4], buf);
}

// Vertically center a block of roughly `height` lines within `area`.
fn centered_block(area: Rect, height: u16) -> Rect {
    let top = area.height.saturating_sub(height) / 2;
    Rect {
        x: area.x,
        y: area.y + top,
        width: area.width,
        height: height.min(area.height),
    }
}
