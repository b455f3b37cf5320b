use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};
use sweetspot::{
    classifier::{CLOSE_MAX_MS, CLOSE_MIN_MS, PERFECT_MAX_MS, PERFECT_MIN_MS},
    util::round_ms,
    Classification, ControllerState, HISTORY_CAPACITY,
};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const KEY_BOX_WIDTH: u16 = 16;

fn classification_color(classification: Classification) -> Color {
    match classification {
        Classification::Perfect => Color::Green,
        Classification::Close => Color::Yellow,
        Classification::Fail => Color::Red,
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

impl App {
    /// Text for the duration readout under the key
    pub fn timer_text(&self) -> String {
        match self.controller.state() {
            ControllerState::Armed => match self.controller.timer_sample(self.now_ms()) {
                Some(sample) => format!("Duration: {} ms", round_ms(sample.elapsed)),
                None => "Duration: ? ms".to_string(),
            },
            ControllerState::Idle => match self.controller.history().latest() {
                Some(attempt) => format!("Duration: {} ms", round_ms(attempt.duration)),
                None if self.controller.settings().live_timer => "Duration: 0 ms".to_string(),
                None => "Duration: ? ms".to_string(),
            },
        }
    }

    pub fn subtitle(&self) -> String {
        match self.controller.binding() {
            Some(binding) => format!(
                "Hold {} for exactly {}-{}ms",
                binding.friendly_name(),
                PERFECT_MIN_MS,
                PERFECT_MAX_MS
            ),
            None => format!(
                "No usable key bound ({:?}); press F2 to pick one",
                self.controller.settings().key_binding
            ),
        }
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let feedback = self.feedback.borrow();
        let settings = self.controller.settings();
        let armed = self.controller.state() == ControllerState::Armed;

        // styles
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);
        let title_style = Style::default().patch(bold_style).fg(Color::Cyan);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints(
                [
                    Constraint::Min(0),    // top padding
                    Constraint::Length(1), // title
                    Constraint::Length(1), // subtitle
                    Constraint::Length(1), // padding
                    Constraint::Length(3), // key
                    Constraint::Length(1), // timer
                    Constraint::Length(1), // result banner
                    Constraint::Length(1), // padding
                    Constraint::Length(1), // history dots
                    Constraint::Length(1), // history durations
                    Constraint::Length(1), // stats
                    Constraint::Min(0),    // bottom padding
                    Constraint::Length(1), // hint
                    Constraint::Length(1), // legend
                ]
                .as_ref(),
            )
            .split(area);

        if feedback.is_flashing(self.now) {
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().patch(bold_style).fg(Color::Green))
                .render(area, buf);
        }

        Paragraph::new(Span::styled("S W E E T S P O T", title_style))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        Paragraph::new(Span::styled(self.subtitle(), italic_style))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);

        // the key itself, lit while held
        let key_label = self
            .controller
            .binding()
            .map(|b| b.friendly_name())
            .unwrap_or_else(|| "?".to_string());
        let key_style = if armed {
            Style::default()
                .patch(bold_style)
                .fg(Color::Black)
                .bg(Color::Cyan)
        } else {
            bold_style
        };
        let key_area = centered(chunks[4], KEY_BOX_WIDTH);
        Paragraph::new(Span::styled(key_label, key_style))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(if armed {
                        Style::default().fg(Color::Cyan)
                    } else {
                        dim_style
                    }),
            )
            .render(key_area, buf);

        Paragraph::new(Span::styled(self.timer_text(), bold_style))
            .alignment(Alignment::Center)
            .render(chunks[5], buf);

        if let Some(error) = &self.last_error {
            Paragraph::new(Span::styled(
                format!("not recorded: {error}"),
                Style::default().fg(Color::Magenta),
            ))
            .alignment(Alignment::Center)
            .render(chunks[6], buf);
        } else if let Some(banner) = feedback.banner() {
            let mut style = Style::default().fg(classification_color(banner.classification));
            if feedback.is_highlighted(self.now) {
                style = style.patch(bold_style);
            } else {
                style = style.patch(dim_style);
            }
            Paragraph::new(Span::styled(banner.text.clone(), style))
                .alignment(Alignment::Center)
                .render(chunks[6], buf);
        }

        // history: always HISTORY_CAPACITY slots, oldest on the left
        let history = self.controller.history();
        let mut dots = Vec::with_capacity(HISTORY_CAPACITY * 2);
        let mut durations = Vec::with_capacity(HISTORY_CAPACITY * 2);
        let newest = history.len().saturating_sub(1);
        for (idx, attempt) in history.iter().enumerate() {
            let mut style = Style::default().fg(classification_color(attempt.classification));
            if idx == newest && feedback.is_highlighted(self.now) {
                style = style.patch(bold_style);
            }
            dots.push(Span::styled(format!("{:^6}", "●"), style));
            durations.push(Span::styled(
                format!("{:^6}", round_ms(attempt.duration)),
                dim_style,
            ));
        }
        for _ in history.len()..HISTORY_CAPACITY {
            dots.push(Span::styled(format!("{:^6}", "○"), dim_style));
            durations.push(Span::raw(" ".repeat(6)));
        }
        Paragraph::new(Line::from(dots))
            .alignment(Alignment::Center)
            .render(chunks[8], buf);
        Paragraph::new(Line::from(durations))
            .alignment(Alignment::Center)
            .render(chunks[9], buf);

        let stats = self.controller.statistics();
        let streak_style = if stats.current_streak > 0 {
            Style::default().patch(bold_style).fg(Color::Yellow)
        } else {
            bold_style
        };
        Paragraph::new(Line::from(vec![
            Span::styled(format!("Success {}%", stats.success_rate), bold_style),
            Span::raw("   "),
            Span::styled(format!("Streak {}", stats.current_streak), streak_style),
            Span::raw("   "),
            Span::styled(format!("Best {}", stats.best_streak), bold_style),
        ]))
        .alignment(Alignment::Center)
        .render(chunks[10], buf);

        let hint = match self.state {
            AppState::Rebinding { .. } => Some(Span::styled(
                "Press the key to bind (esc to cancel)",
                Style::default().patch(bold_style).fg(Color::Yellow),
            )),
            AppState::Playing if !self.key_release_events => Some(Span::styled(
                format!(
                    "terminal does not report key releases: tap to start, tap again to stop, or hold the mouse button ({CLOSE_MIN_MS}-{CLOSE_MAX_MS}ms counts as close)"
                ),
                dim_style,
            )),
            AppState::Playing => None,
        };
        if let Some(hint) = hint {
            Paragraph::new(hint)
                .alignment(Alignment::Center)
                .render(chunks[12], buf);
        }

        let legend = format!(
            "(f2) key   (f3) timer: {}   (f4) sound: {}   (f5) flash: {}   (del) clear   (esc)ape",
            on_off(settings.live_timer),
            on_off(settings.sound_effects),
            on_off(settings.flash_effects),
        );
        Paragraph::new(Span::styled(legend, italic_style))
            .alignment(Alignment::Center)
            .render(chunks[13], buf);
    }
}

/// A horizontally centered slice of `area`
fn centered(area: Rect, width: u16) -> Rect {
    let width = width.min(area.width);
    Rect {
        x: area.x + (area.width - width) / 2,
        width,
        ..area
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered() {
        let area = Rect::new(0, 0, 80, 3);
        assert_eq!(centered(area, 16), Rect::new(32, 0, 16, 3));
        assert_eq!(centered(Rect::new(0, 0, 10, 3), 16), Rect::new(0, 0, 10, 3));
    }

    #[test]
    fn test_on_off() {
        assert_eq!(on_off(true), "on");
        assert_eq!(on_off(false), "off");
    }

    #[test]
    fn test_classification_color() {
        assert_eq!(classification_color(Classification::Perfect), Color::Green);
        assert_eq!(classification_color(Classification::Close), Color::Yellow);
        assert_eq!(classification_color(Classification::Fail), Color::Red);
    }
}
