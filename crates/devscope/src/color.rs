//! ANSI color helpers.

/// Terminal tone used when painting output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Terminal default, no escape codes
    Neutral,
    Red,
    Yellow,
    Cyan,
    Magenta,
}

/// Tone for durations of calls under the slow threshold.
pub const TIME_TONE: Tone = Tone::Magenta;

/// Tone for durations of calls over the slow threshold.
pub const SLOW_TONE: Tone = Tone::Yellow;

const RESET: &str = "\x1b[0m";

impl Tone {
    /// SGR escape sequence for this tone.
    pub fn code(self) -> Option<&'static str> {
        match self {
            Tone::Neutral => None,
            Tone::Red => Some("\x1b[31m"),
            Tone::Yellow => Some("\x1b[33m"),
            Tone::Cyan => Some("\x1b[36m"),
            Tone::Magenta => Some("\x1b[35m"),
        }
    }
}

/// Wrap `text` in the escape codes for `tone`.
///
/// Returns the text unchanged when `enabled` is false or the tone is neutral.
pub fn paint(text: &str, tone: Tone, enabled: bool) -> String {
    match tone.code() {
        Some(code) if enabled => format!("{code}{text}{RESET}"),
        _ => text.to_string(),
    }
}
