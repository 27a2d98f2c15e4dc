use crate::params::{Command, ParameterStore};
use crate::resize::ResizeFlag;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub(crate) fn map_key(key: &KeyEvent) -> Option<Command> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    // raw mode delivers Ctrl+C as a key, not a signal
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(Command::Quit),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Some(Command::Quit),

        KeyCode::Char('z') => Some(Command::ProbabilityScaleDown),
        KeyCode::Char('Z') => Some(Command::ProbabilityStepDown),
        KeyCode::Char('x') => Some(Command::ProbabilityScaleUp),
        KeyCode::Char('X') => Some(Command::ProbabilityStepUp),

        KeyCode::Char('a') => Some(Command::TemperatureScaleDown),
        KeyCode::Char('A') => Some(Command::TemperatureStepDown),
        KeyCode::Char('s') => Some(Command::TemperatureScaleUp),
        KeyCode::Char('S') => Some(Command::TemperatureStepUp),

        KeyCode::Char('d') => Some(Command::SlowerFrames),
        KeyCode::Char('f') => Some(Command::FasterFrames),

        KeyCode::Char('p') => Some(Command::TogglePause),
        _ => None,
    }
}

/// Applies one terminal event. Resizes only raise the flag; the loop does
/// the reallocation.
pub(crate) fn handle_event(ev: Event, params: &ParameterStore, resize: &ResizeFlag) {
    match ev {
        Event::Key(key) => {
            if let Some(cmd) = map_key(&key) {
                params.apply(cmd);
            }
        }
        Event::Resize(cols, rows) => {
            tracing::trace!(cols, rows, "resize notification");
            resize.notify();
        }
        _ => {}
    }
}

fn listen(params: &ParameterStore, resize: &ResizeFlag) {
    while params.is_running() {
        match event::poll(POLL_INTERVAL) {
            Ok(true) => match event::read() {
                Ok(ev) => handle_event(ev, params, resize),
                Err(err) => tracing::warn!(%err, "failed to read terminal event"),
            },
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(%err, "failed to poll terminal events");
                thread::sleep(POLL_INTERVAL);
            }
        }
    }
    tracing::debug!("input listener exiting");
}

/// Starts the operator listener. It polls with a timeout so it notices the
/// running flag and exits by itself; the caller joins it after the loop.
pub(crate) fn spawn_listener(
    params: Arc<ParameterStore>,
    resize: ResizeFlag,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("input".into())
        .spawn(move || listen(&params, &resize))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    fn store() -> ParameterStore {
        ParameterStore::new(1.0, 0.5, 24, 4, 60)
    }

    #[test]
    fn quit_keys() {
        for code in [KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')] {
            let k = KeyEvent::new(code, KeyModifiers::NONE);
            assert_eq!(map_key(&k), Some(Command::Quit));
        }
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(&ctrl_c), Some(Command::Quit));
        let ctrl_z = KeyEvent::new(KeyCode::Char('z'), KeyModifiers::CONTROL);
        assert_eq!(map_key(&ctrl_z), None);
    }

    #[test]
    fn release_events_are_ignored() {
        let mut k = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        k.kind = KeyEventKind::Release;
        assert_eq!(map_key(&k), None);
    }

    #[test]
    fn shifted_letters_take_the_additive_step() {
        let k = KeyEvent::new(KeyCode::Char('X'), KeyModifiers::SHIFT);
        assert_eq!(map_key(&k), Some(Command::ProbabilityStepUp));
        let k = KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT);
        assert_eq!(map_key(&k), Some(Command::TemperatureStepDown));
    }

    #[test]
    fn events_adjust_the_store() {
        let params = store();
        let flag = ResizeFlag::new();

        handle_event(key('Z'), &params, &flag);
        assert!((params.probability() - 0.4).abs() < 1e-12);
        handle_event(key('S'), &params, &flag);
        assert!((params.temperature() - 1.1).abs() < 1e-12);
        handle_event(key('f'), &params, &flag);
        assert_eq!(params.fps(), 25);
        handle_event(key('d'), &params, &flag);
        handle_event(key('d'), &params, &flag);
        assert_eq!(params.fps(), 23);
        handle_event(key('p'), &params, &flag);
        assert!(params.is_paused());
        handle_event(key('?'), &params, &flag);
        assert!(params.is_running());
        handle_event(key('q'), &params, &flag);
        assert!(!params.is_running());
        assert!(!flag.take());
    }

    #[test]
    fn resize_event_only_raises_the_flag() {
        let params = store();
        let flag = ResizeFlag::new();
        handle_event(Event::Resize(120, 40), &params, &flag);
        assert!(flag.take());
        assert_eq!(params.snapshot(), store().snapshot());
    }
}
