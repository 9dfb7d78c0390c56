use std::fmt;
use std::time::Duration;

/// One "word" is five correct characters, the usual typing-test convention.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Floor on elapsed time so the very first keystroke never divides by zero.
const MIN_ELAPSED_MINUTES: f64 = 1.0 / 60_000.0;

/// Words per minute from the number of correctly typed characters and the
/// elapsed wall-clock time. Returns 0 if the computation is not finite.
pub fn wpm(correct_count: usize, elapsed: Duration) -> u32 {
    let minutes = (elapsed.as_millis() as f64 / 60_000.0).max(MIN_ELAPSED_MINUTES);
    let raw = (correct_count as f64 / CHARS_PER_WORD) / minutes;

    if raw.is_finite() {
        raw.round() as u32
    } else {
        0
    }
}

/// Percentage of text characters currently marked correct out of the total.
/// Returns 0 for empty text or a non-finite result.
pub fn accuracy(correct_count: usize, total_chars: usize) -> u32 {
    if total_chars == 0 {
        return 0;
    }

    let raw = (correct_count as f64 / total_chars as f64) * 100.0;

    if raw.is_finite() {
        raw.round() as u32
    } else {
        0
    }
}

/// Rolling numbers shown while a session is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiveStats {
    pub wpm: u32,
    pub mistakes: usize,
}

/// Snapshot taken once, at the moment a session finishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FinalSummary {
    pub wpm: u32,
    pub accuracy: u32,
    pub uncorrected_mistakes: usize,
    pub total_mistake_keystrokes: usize,
}

impl fmt::Display for FinalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} wpm | {}% acc | {} uncorrected | {} mistake keystrokes",
            self.wpm, self.accuracy, self.uncorrected_mistakes, self.total_mistake_keystrokes
        )
    }
}
