use anyhow::Result;
pub use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

/// Trait for abstracting event sources to enable testing
pub trait EventSource {
    /// Poll for events with a timeout
    fn poll(&mut self, timeout: Duration) -> Result<bool>;

    /// Read the next event
    fn read(&mut self) -> Result<Event>;
}

/// Real keyboard event source using crossterm
pub struct KeyboardEventSource;

impl EventSource for KeyboardEventSource {
    fn poll(&mut self, timeout: Duration) -> Result<bool> {
        Ok(crossterm::event::poll(timeout)?)
    }

    fn read(&mut self) -> Result<Event> {
        Ok(crossterm::event::read()?)
    }
}

/// Replays a fixed list of events. Once exhausted, the first `idle_polls`
/// polls wait out their timeout and report nothing, like a keyboard left
/// alone; after that `read` yields `q`, so `poll` reports an event as ready.
pub struct SimulatedEventSource {
    pub(crate) events: Vec<Event>,
    current_index: usize,
    idle_polls: usize,
}

impl SimulatedEventSource {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            current_index: 0,
            idle_polls: 0,
        }
    }

    pub fn with_idle_polls(mut self, idle_polls: usize) -> Self {
        self.idle_polls = idle_polls;
        self
    }

    pub fn key_event(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    pub fn char_key(c: char) -> Event {
        Self::key_event(KeyCode::Char(c), KeyModifiers::empty())
    }

    pub fn remaining(&self) -> usize {
        self.events.len() - self.current_index
    }
}

impl EventSource for SimulatedEventSource {
    fn poll(&mut self, timeout: Duration) -> Result<bool> {
        if self.current_index < self.events.len() || self.idle_polls == 0 {
            return Ok(true);
        }
        self.idle_polls -= 1;
        std::thread::sleep(timeout);
        Ok(false)
    }

    fn read(&mut self) -> Result<Event> {
        if self.current_index < self.events.len() {
            let event = self.events[self.current_index].clone();
            self.current_index += 1;
            Ok(event)
        } else {
            Ok(SimulatedEventSource::char_key('q'))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_polls_wait_out_the_timeout() {
        let mut source =
            SimulatedEventSource::new(vec![SimulatedEventSource::char_key('7')]).with_idle_polls(1);
        assert!(source.poll(Duration::from_millis(0)).unwrap());
        source.read().unwrap();

        let started = std::time::Instant::now();
        assert!(!source.poll(Duration::from_millis(20)).unwrap());
        assert!(started.elapsed() >= Duration::from_millis(20));
        assert!(source.poll(Duration::from_millis(20)).unwrap());
    }

    #[test]
    fn test_simulated_event_source() {
        let events = vec![
            SimulatedEventSource::char_key('j'),
            SimulatedEventSource::key_event(KeyCode::Tab, KeyModifiers::empty()),
        ];

        let mut source = SimulatedEventSource::new(events);
        assert!(source.poll(Duration::from_millis(0)).unwrap());

        if let Event::Key(key) = source.read().unwrap() {
            assert_eq!(key.code, KeyCode::Char('j'));
            assert!(key.modifiers.is_empty());
        }
        if let Event::Key(key) = source.read().unwrap() {
            assert_eq!(key.code, KeyCode::Tab);
        }

        assert_eq!(source.remaining(), 0);
        assert!(source.poll(Duration::from_millis(0)).unwrap());
        if let Event::Key(key) = source.read().unwrap() {
            assert_eq!(key.code, KeyCode::Char('q'));
        }
    }
}
