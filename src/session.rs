use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use thiserror::Error;

use crate::generator::{PracticeText, TextGenerator};
use crate::stats::{self, FinalSummary, LiveStats};

/// Per-character classification. One entry per text position, all
/// `Untyped` at the start of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharStatus {
    Untyped,
    Correct,
    Incorrect,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum SessionState {
    Idle,
    Running,
    Finished,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("word count must be a positive whole number (got {0})")]
    InvalidWordCount(usize),
}

/// Logical key fed into the session. Anything that is neither a printable
/// character nor backspace is `Other` and gets ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keystroke {
    Char(char),
    Backspace,
    Other,
}

/// A keystroke plus whether a control/alt/super modifier was held.
/// Shift is deliberately not a modifier here: it produces uppercase chars.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Keystroke,
    pub modified: bool,
}

impl KeyInput {
    pub fn plain(c: char) -> Self {
        Self {
            key: Keystroke::Char(c),
            modified: false,
        }
    }

    pub fn backspace() -> Self {
        Self {
            key: Keystroke::Backspace,
            modified: false,
        }
    }
}

impl From<&KeyEvent> for KeyInput {
    fn from(event: &KeyEvent) -> Self {
        let modified = event
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER);

        let key = match event.code {
            KeyCode::Char(c) => Keystroke::Char(c),
            KeyCode::Backspace => Keystroke::Backspace,
            _ => Keystroke::Other,
        };

        Self { key, modified }
    }
}

/// Notification emitted on every successful state transition, for the
/// presentation layer to react to. The session itself never renders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Started,
    CursorMoved,
    Finished,
    Reset,
}

/// One typing test: the generated text, per-character statuses, a cursor,
/// and the mistake counters everything else is derived from.
///
/// Invariants held across all transitions:
/// - `correct_count` equals the number of `Correct` positions
/// - `uncorrected_mistakes` equals the number of `Incorrect` positions
/// - `cursor <= text.len()`
#[derive(Debug)]
pub struct Session {
    generator: TextGenerator,
    text: PracticeText,
    status: Vec<CharStatus>,
    cursor: usize,
    state: SessionState,
    started_at: Option<Instant>,
    correct_count: usize,
    total_mistake_keystrokes: usize,
    uncorrected_mistakes: usize,
    summary: Option<FinalSummary>,
}

impl Session {
    pub fn new(generator: TextGenerator) -> Self {
        Self {
            generator,
            text: PracticeText::default(),
            status: Vec::new(),
            cursor: 0,
            state: SessionState::Idle,
            started_at: None,
            correct_count: 0,
            total_mistake_keystrokes: 0,
            uncorrected_mistakes: 0,
            summary: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn text(&self) -> &PracticeText {
        &self.text
    }

    pub fn status(&self) -> &[CharStatus] {
        &self.status
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    pub fn total_mistake_keystrokes(&self) -> usize {
        self.total_mistake_keystrokes
    }

    pub fn uncorrected_mistakes(&self) -> usize {
        self.uncorrected_mistakes
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.map(|t| t.elapsed()).unwrap_or_default()
    }

    pub fn live_stats(&self) -> LiveStats {
        LiveStats {
            wpm: stats::wpm(self.correct_count, self.elapsed()),
            mistakes: self.uncorrected_mistakes,
        }
    }

    /// Final results, available once the session has finished.
    pub fn summary(&self) -> Option<&FinalSummary> {
        self.summary.as_ref()
    }

    /// Generate fresh text and move to `Running`. A failed validation
    /// leaves the session exactly as it was.
    pub fn start(&mut self, word_count: usize) -> Result<SessionEvent, SessionError> {
        let text = self.generator.generate(word_count)?;

        self.status = vec![CharStatus::Untyped; text.len()];
        self.text = text;
        self.cursor = 0;
        self.correct_count = 0;
        self.total_mistake_keystrokes = 0;
        self.uncorrected_mistakes = 0;
        self.summary = None;
        self.started_at = Some(Instant::now());
        self.state = SessionState::Running;

        Ok(SessionEvent::Started)
    }

    /// Apply one keystroke. Returns the resulting transition, or `None`
    /// when the input is ignored (not running, modifier combo, control
    /// key, backspace at position 0, or typing past the end).
    pub fn apply_keystroke(&mut self, input: KeyInput) -> Option<SessionEvent> {
        if self.state != SessionState::Running || input.modified {
            return None;
        }

        match input.key {
            Keystroke::Backspace => self.undo_one(),
            Keystroke::Char(c) => self.write(c),
            Keystroke::Other => None,
        }
    }

    /// Force the session to finish now. When not running this is a no-op
    /// signal; the caller shows the menu instead.
    pub fn end(&mut self) -> Option<SessionEvent> {
        if self.state == SessionState::Running {
            Some(self.finish())
        } else {
            None
        }
    }

    /// Discard all session data and return to `Idle`. Calling this while
    /// running aborts the session.
    pub fn restart(&mut self) -> SessionEvent {
        self.text = PracticeText::default();
        self.status.clear();
        self.cursor = 0;
        self.correct_count = 0;
        self.total_mistake_keystrokes = 0;
        self.uncorrected_mistakes = 0;
        self.summary = None;
        self.started_at = None;
        self.state = SessionState::Idle;

        SessionEvent::Reset
    }

    fn write(&mut self, c: char) -> Option<SessionEvent> {
        // No further input accepted once every position is typed
        let expected = self.text.char_at(self.cursor)?;

        if c == expected {
            self.status[self.cursor] = CharStatus::Correct;
            self.correct_count += 1;
        } else {
            self.total_mistake_keystrokes += 1;
            // Repeated wrong keystrokes at one position count once
            if self.status[self.cursor] != CharStatus::Incorrect {
                self.uncorrected_mistakes += 1;
            }
            self.status[self.cursor] = CharStatus::Incorrect;
        }

        self.cursor += 1;

        if self.cursor == self.text.len() {
            Some(self.finish())
        } else {
            Some(SessionEvent::CursorMoved)
        }
    }

    /// Linear one-step undo: clears the character behind the cursor and
    /// rolls its counter back. Never reconstructs deeper history.
    fn undo_one(&mut self) -> Option<SessionEvent> {
        if self.cursor == 0 {
            return None;
        }

        self.cursor -= 1;
        match self.status[self.cursor] {
            CharStatus::Incorrect => {
                self.uncorrected_mistakes = self.uncorrected_mistakes.saturating_sub(1);
            }
            CharStatus::Correct => {
                self.correct_count = self.correct_count.saturating_sub(1);
            }
            CharStatus::Untyped => {}
        }
        self.status[self.cursor] = CharStatus::Untyped;

        Some(SessionEvent::CursorMoved)
    }

    fn finish(&mut self) -> SessionEvent {
        self.summary = Some(FinalSummary {
            wpm: stats::wpm(self.correct_count, self.elapsed()),
            accuracy: stats::accuracy(self.correct_count, self.text.len()),
            uncorrected_mistakes: self.uncorrected_mistakes,
            total_mistake_keystrokes: self.total_mistake_keystrokes,
        });
        self.state = SessionState::Finished;

        SessionEvent::Finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::Vocabulary;
    use assert_matches::assert_matches;

    /// Session whose generator can only ever produce known text.
    fn session_over(word: &str) -> Session {
        let vocab = Vocabulary {
            name: "test".to_string(),
            size: 1,
            words: vec![word.to_string()],
        };
        Session::new(TextGenerator::new(vocab))
    }

    fn assert_counter_invariants(session: &Session) {
        let correct = session
            .status()
            .iter()
            .filter(|s| **s == CharStatus::Correct)
            .count();
        let incorrect = session
            .status()
            .iter()
            .filter(|s| **s == CharStatus::Incorrect)
            .count();

        assert_eq!(session.correct_count(), correct);
        assert_eq!(session.uncorrected_mistakes(), incorrect);
        assert!(session.cursor() <= session.text().len());
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = session_over("ab");

        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.cursor(), 0);
        assert!(session.text().is_empty());
        assert!(session.summary().is_none());
    }

    #[test]
    fn test_start_resets_everything() {
        let mut session = session_over("ab");

        assert_eq!(session.start(1), Ok(SessionEvent::Started));
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(session.text().raw(), "ab");
        assert_eq!(session.status(), &[CharStatus::Untyped, CharStatus::Untyped]);
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.correct_count(), 0);
        assert_eq!(session.total_mistake_keystrokes(), 0);
        assert_eq!(session.uncorrected_mistakes(), 0);
    }

    #[test]
    fn test_start_zero_words_fails_and_leaves_state_untouched() {
        let mut session = session_over("ab");

        assert_matches!(session.start(0), Err(SessionError::InvalidWordCount(0)));
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.text().is_empty());
    }

    #[test]
    fn test_start_zero_words_preserves_prior_session() {
        let mut session = session_over("ab");
        session.start(1).unwrap();
        session.apply_keystroke(KeyInput::plain('a'));

        assert_matches!(session.start(0), Err(SessionError::InvalidWordCount(0)));
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(session.cursor(), 1);
        assert_eq!(session.correct_count(), 1);
    }

    #[test]
    fn test_match_then_mismatch_finishes() {
        let mut session = session_over("ab");
        session.start(1).unwrap();

        let event = session.apply_keystroke(KeyInput::plain('a'));
        assert_eq!(event, Some(SessionEvent::CursorMoved));
        assert_eq!(session.cursor(), 1);
        assert_eq!(session.correct_count(), 1);

        let event = session.apply_keystroke(KeyInput::plain('x'));
        assert_eq!(event, Some(SessionEvent::Finished));
        assert_eq!(session.cursor(), 2);
        assert_eq!(session.uncorrected_mistakes(), 1);
        assert_eq!(session.total_mistake_keystrokes(), 1);
        assert_eq!(session.state(), SessionState::Finished);

        let summary = session.summary().unwrap();
        assert_eq!(summary.accuracy, 50);
        assert_counter_invariants(&session);
    }

    #[test]
    fn test_backspace_clears_mistake() {
        let mut session = session_over("ab");
        session.start(1).unwrap();

        session.apply_keystroke(KeyInput::plain('z'));
        assert_eq!(session.uncorrected_mistakes(), 1);

        let event = session.apply_keystroke(KeyInput::backspace());
        assert_eq!(event, Some(SessionEvent::CursorMoved));
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.uncorrected_mistakes(), 0);
        assert_eq!(session.status()[0], CharStatus::Untyped);
        // The keystroke count is monotonic and keeps the mistake
        assert_eq!(session.total_mistake_keystrokes(), 1);
        assert_counter_invariants(&session);
    }

    #[test]
    fn test_correct_then_backspace_round_trip() {
        let mut session = session_over("ab");
        session.start(1).unwrap();

        session.apply_keystroke(KeyInput::plain('a'));
        session.apply_keystroke(KeyInput::backspace());

        assert_eq!(session.cursor(), 0);
        assert_eq!(session.correct_count(), 0);
        assert_eq!(session.uncorrected_mistakes(), 0);
        assert_eq!(session.total_mistake_keystrokes(), 0);
        assert_eq!(session.status()[0], CharStatus::Untyped);
        assert_counter_invariants(&session);
    }

    #[test]
    fn test_double_mistake_counts_keystrokes_but_not_positions() {
        let mut session = session_over("abc");
        session.start(1).unwrap();

        session.apply_keystroke(KeyInput::plain('x'));
        session.apply_keystroke(KeyInput::backspace());
        session.apply_keystroke(KeyInput::plain('y'));

        assert_eq!(session.total_mistake_keystrokes(), 2);
        assert_eq!(session.uncorrected_mistakes(), 1);
        assert_counter_invariants(&session);
    }

    #[test]
    fn test_backspace_at_start_is_noop() {
        let mut session = session_over("ab");
        session.start(1).unwrap();

        assert_eq!(session.apply_keystroke(KeyInput::backspace()), None);
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn test_modifier_combos_are_ignored() {
        let mut session = session_over("ab");
        session.start(1).unwrap();

        let input = KeyInput {
            key: Keystroke::Char('a'),
            modified: true,
        };
        assert_eq!(session.apply_keystroke(input), None);
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.correct_count(), 0);
    }

    #[test]
    fn test_shift_is_not_a_modifier() {
        let event = KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT);
        let input = KeyInput::from(&event);

        assert_eq!(input.key, Keystroke::Char('A'));
        assert!(!input.modified);
    }

    #[test]
    fn test_control_combo_converts_as_modified() {
        let event = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let input = KeyInput::from(&event);

        assert!(input.modified);
    }

    #[test]
    fn test_named_keys_convert_to_other() {
        let event = KeyEvent::new(KeyCode::F(1), KeyModifiers::NONE);
        assert_eq!(KeyInput::from(&event).key, Keystroke::Other);

        let event = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(KeyInput::from(&event).key, Keystroke::Other);

        let event = KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE);
        assert_eq!(KeyInput::from(&event).key, Keystroke::Backspace);
    }

    #[test]
    fn test_other_keys_are_ignored() {
        let mut session = session_over("ab");
        session.start(1).unwrap();

        let input = KeyInput {
            key: Keystroke::Other,
            modified: false,
        };
        assert_eq!(session.apply_keystroke(input), None);
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn test_keystrokes_ignored_when_idle_or_finished() {
        let mut session = session_over("a");
        assert_eq!(session.apply_keystroke(KeyInput::plain('a')), None);

        session.start(1).unwrap();
        session.apply_keystroke(KeyInput::plain('a'));
        assert_eq!(session.state(), SessionState::Finished);

        assert_eq!(session.apply_keystroke(KeyInput::plain('a')), None);
        assert_eq!(session.apply_keystroke(KeyInput::backspace()), None);
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn test_space_counts_as_printable() {
        let mut session = session_over("a");
        session.start(2).unwrap();
        assert_eq!(session.text().raw(), "a a");

        session.apply_keystroke(KeyInput::plain('a'));
        session.apply_keystroke(KeyInput::plain(' '));

        assert_eq!(session.correct_count(), 2);
        assert_eq!(session.status()[1], CharStatus::Correct);
    }

    #[test]
    fn test_end_while_running_takes_snapshot() {
        let mut session = session_over("ab");
        session.start(2).unwrap(); // "ab ab", 5 chars

        session.apply_keystroke(KeyInput::plain('a'));
        session.apply_keystroke(KeyInput::plain('x'));

        assert_eq!(session.end(), Some(SessionEvent::Finished));
        assert_eq!(session.state(), SessionState::Finished);

        let summary = session.summary().unwrap();
        assert_eq!(summary.accuracy, stats::accuracy(1, 5));
        assert_eq!(summary.uncorrected_mistakes, 1);
        assert_eq!(summary.total_mistake_keystrokes, 1);
    }

    #[test]
    fn test_end_when_not_running_is_noop() {
        let mut session = session_over("ab");
        assert_eq!(session.end(), None);

        session.start(1).unwrap();
        session.end();
        assert_eq!(session.end(), None);
    }

    #[test]
    fn test_restart_clears_session() {
        let mut session = session_over("ab");
        session.start(1).unwrap();
        session.apply_keystroke(KeyInput::plain('a'));
        session.apply_keystroke(KeyInput::plain('b'));
        assert_eq!(session.state(), SessionState::Finished);

        assert_eq!(session.restart(), SessionEvent::Reset);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.text().is_empty());
        assert!(session.status().is_empty());
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.correct_count(), 0);
        assert_eq!(session.total_mistake_keystrokes(), 0);
        assert_eq!(session.uncorrected_mistakes(), 0);
        assert!(session.summary().is_none());
    }

    #[test]
    fn test_restart_aborts_running_session() {
        let mut session = session_over("ab");
        session.start(1).unwrap();
        session.apply_keystroke(KeyInput::plain('a'));

        session.restart();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.apply_keystroke(KeyInput::plain('b')), None);
    }

    #[test]
    fn test_start_invalidates_prior_session() {
        let mut session = session_over("ab");
        session.start(1).unwrap();
        session.apply_keystroke(KeyInput::plain('x'));

        session.start(1).unwrap();
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.total_mistake_keystrokes(), 0);
        assert_eq!(session.status(), &[CharStatus::Untyped, CharStatus::Untyped]);
    }

    #[test]
    fn test_live_wpm_is_finite_at_first_keystroke() {
        // Right after start the elapsed time is effectively zero
        let mut session = session_over("ab");
        session.start(1).unwrap();
        session.apply_keystroke(KeyInput::plain('a'));

        let live = session.live_stats();
        assert!(live.wpm < u32::MAX);
        assert_eq!(live.mistakes, 0);
    }

    #[test]
    fn test_mistyped_space_shows_as_incorrect() {
        let mut session = session_over("a");
        session.start(2).unwrap(); // "a a"

        session.apply_keystroke(KeyInput::plain('a'));
        session.apply_keystroke(KeyInput::plain('q'));

        assert_eq!(session.status()[1], CharStatus::Incorrect);
        assert_eq!(session.uncorrected_mistakes(), 1);
        assert_counter_invariants(&session);
    }

    #[test]
    fn test_full_correction_flow() {
        let mut session = session_over("ab");
        session.start(1).unwrap();

        session.apply_keystroke(KeyInput::plain('x'));
        session.apply_keystroke(KeyInput::backspace());
        session.apply_keystroke(KeyInput::plain('a'));
        let event = session.apply_keystroke(KeyInput::plain('b'));

        assert_eq!(event, Some(SessionEvent::Finished));
        let summary = session.summary().unwrap();
        assert_eq!(summary.accuracy, 100);
        assert_eq!(summary.uncorrected_mistakes, 0);
        assert_eq!(summary.total_mistake_keystrokes, 1);
    }
}
