use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};
use termctlr::widget::{AudioWidget, Panel};

const KEY_HINTS: [(&str, &str); 6] = [
    ("+/-", "vol"),
    ("m", "mute"),
    ("]/[", "mic"),
    ("n", "mic mute"),
    ("r", "resync"),
    ("q", "quit"),
];

/// Panel view inside a rounded block, with a one-line status footer.
pub(crate) fn draw(frame: &mut Frame<'_>, widget: &AudioWidget) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(frame.size());

    let border_color = Color::Rgb(255, 90, 90);
    let title_color = Color::Rgb(255, 110, 110);
    let hint_color = Color::Rgb(255, 220, 100);
    let dim = Color::Rgb(130, 70, 70);
    let text_color = Color::Rgb(210, 205, 200);

    let mut hints = Vec::with_capacity(KEY_HINTS.len() * 2);
    for (key, action) in KEY_HINTS {
        hints.push(Span::styled(
            format!(" {key} "),
            Style::default().fg(hint_color).add_modifier(Modifier::BOLD),
        ));
        hints.push(Span::styled(action, Style::default().fg(dim)));
    }

    let panel = Paragraph::new(widget.view())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(border_color))
                .title(Span::styled(
                    " Audio ",
                    Style::default()
                        .fg(title_color)
                        .add_modifier(Modifier::BOLD),
                ))
                .title_bottom(Line::from(hints)),
        )
        .style(Style::default().fg(text_color));
    frame.render_widget(panel, chunks[0]);

    let (status, color) = match status_text(widget) {
        Some(error) => (error, Color::Rgb(255, 90, 90)),
        None => ("ready".to_string(), Color::Rgb(160, 150, 150)),
    };
    frame.render_widget(
        Paragraph::new(status).style(Style::default().fg(color)),
        chunks[1],
    );
}

fn status_text(widget: &AudioWidget) -> Option<String> {
    widget.last_error().map(|err| format!("error: {err}"))
}
