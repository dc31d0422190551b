//! Launch progress bar.
//!
//! ASCII representation: `▓▓▓▓▓▓░░░░ 62%`

use ratatui::{
    style::{Color, Style},
    text::Span,
};

const BLOCK_DARK: char = '\u{2593}';
const BLOCK_LIGHT: char = '\u{2591}';

const FILL_COLOR: Color = Color::Rgb(0xb5, 0xcc, 0xba);
const TRACK_COLOR: Color = Color::Rgb(0x94, 0x8f, 0x94);
const LABEL_COLOR: Color = Color::Rgb(0xcb, 0xc5, 0xca);

/// Progress of the active launch, `0.0..=1.0`
#[derive(Debug, Clone)]
pub struct LaunchGauge {
    progress: f32,
    label: Option<String>,
}

impl LaunchGauge {
    #[must_use]
    pub fn new(progress: f32) -> Self {
        Self {
            progress: if progress.is_nan() {
                0.0
            } else {
                progress.clamp(0.0, 1.0)
            },
            label: None,
        }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Whole percent, rounded down so 100% only shows once complete.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percent(&self) -> u8 {
        (self.progress * 100.0).floor() as u8
    }

    fn display_label(&self) -> String {
        match &self.label {
            Some(label) => format!("{label} {}%", self.percent()),
            None => format!("{}%", self.percent()),
        }
    }

    // Filled width is bounded by the terminal width
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn to_spans(&self, width: usize) -> Vec<Span<'static>> {
        let filled = ((f64::from(self.progress) * width as f64).round() as usize).min(width);
        let empty = width - filled;

        vec![
            Span::styled(
                BLOCK_DARK.to_string().repeat(filled),
                Style::default().fg(FILL_COLOR),
            ),
            Span::styled(
                BLOCK_LIGHT.to_string().repeat(empty),
                Style::default().fg(TRACK_COLOR),
            ),
            Span::styled(
                format!(" {}", self.display_label()),
                Style::default().fg(LABEL_COLOR),
            ),
        ]
    }
}
