use std::time::{Duration, Instant};

/// Quiet period after which a digit sequence is taken as complete.
pub const JUMP_IDLE_TIMEOUT: Duration = Duration::from_millis(350);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpOutcome {
    /// More digits may follow before the deadline.
    Pending,
    /// The sequence is complete and names a valid index.
    Jump(usize),
    /// The sequence is complete but out of range.
    Discarded,
}

/// Decoder for "type a chapter number" input.
///
/// Digits accumulate while each arrives within the idle timeout of the
/// previous one. The sequence completes early when the next digit would push
/// the value past the highest index, or when the value already has as many
/// digits as the highest index.
#[derive(Debug)]
pub struct ChapterJump {
    value: Option<usize>,
    last_digit_time: Instant,
    timeout: Duration,
    max_index: usize,
}

impl ChapterJump {
    pub fn new(max_index: usize) -> Self {
        Self::with_timeout(max_index, JUMP_IDLE_TIMEOUT)
    }

    pub fn with_timeout(max_index: usize, timeout: Duration) -> Self {
        Self {
            value: None,
            last_digit_time: Instant::now(),
            timeout,
            max_index,
        }
    }

    /// Largest number with as many digits as the highest index (99 for 15).
    fn digit_ceiling(&self) -> usize {
        let mut ceiling = 9;
        while ceiling < self.max_index {
            ceiling = ceiling * 10 + 9;
        }
        ceiling
    }

    pub fn push(&mut self, digit: u8, now: Instant) -> JumpOutcome {
        debug_assert!(digit <= 9);
        let candidate = match self.value {
            Some(value) => value * 10 + usize::from(digit),
            None => usize::from(digit),
        };

        if candidate > self.max_index {
            self.value = None;
            return JumpOutcome::Discarded;
        }
        if candidate * 10 > self.digit_ceiling() {
            self.value = None;
            return JumpOutcome::Jump(candidate);
        }

        self.value = Some(candidate);
        self.last_digit_time = now;
        JumpOutcome::Pending
    }

    /// Complete the sequence if its idle timeout has passed by `now`.
    pub fn poll(&mut self, now: Instant) -> Option<JumpOutcome> {
        match self.deadline() {
            Some(deadline) if now >= deadline => self.finish(),
            _ => None,
        }
    }

    /// Complete the sequence right away, e.g. when a non-digit key arrives.
    pub fn finish(&mut self) -> Option<JumpOutcome> {
        let value = self.value.take()?;
        if value <= self.max_index {
            Some(JumpOutcome::Jump(value))
        } else {
            Some(JumpOutcome::Discarded)
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.value.map(|_| self.last_digit_time + self.timeout)
    }

    pub fn pending_value(&self) -> Option<usize> {
        self.value
    }

    pub fn is_pending(&self) -> bool {
        self.value.is_some()
    }

    pub fn clear(&mut self) {
        self.value = None;
    }
}
