//! Vim-style row motions with count prefixes
//!
//! Keys arrive one at a time. Digits accumulate a count, a lone `g` arms
//! the `gg` motion, and both expire after the configured timeout.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Down(usize),
    Up(usize),
    /// `gg` / `Ngg`: 1-based row N, or the first row
    First(Option<usize>),
    /// `G` / `NG`: 1-based row N, or the last row
    Last(Option<usize>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionInput {
    /// Key was absorbed into the pending state
    Pending,
    Motion(Motion),
    /// Not a motion key; any pending state has been dropped
    Unhandled,
}

#[derive(Debug, Clone)]
pub struct MotionState {
    count: Option<usize>,
    pending_g: bool,
    armed_at: Option<Instant>,
    timeout: Duration,
}

impl MotionState {
    pub fn new(timeout: Duration) -> Self {
        Self {
            count: None,
            pending_g: false,
            armed_at: None,
            timeout,
        }
    }

    pub fn handle_key(&mut self, key: char, now: Instant) -> MotionInput {
        self.expire(now);

        match key {
            '1'..='9' => {
                if self.pending_g {
                    self.reset();
                }
                self.push_digit(key, now);
                MotionInput::Pending
            }
            '0' if self.count.is_some() && !self.pending_g => {
                self.push_digit(key, now);
                MotionInput::Pending
            }
            'g' if self.pending_g => {
                let count = self.count;
                self.reset();
                MotionInput::Motion(Motion::First(count))
            }
            'g' => {
                self.pending_g = true;
                self.armed_at = Some(now);
                MotionInput::Pending
            }
            'G' => {
                let count = self.count;
                self.reset();
                MotionInput::Motion(Motion::Last(count))
            }
            'j' | 'k' if !self.pending_g => {
                let n = self.count.unwrap_or(1);
                self.reset();
                if key == 'j' {
                    MotionInput::Motion(Motion::Down(n))
                } else {
                    MotionInput::Motion(Motion::Up(n))
                }
            }
            _ => {
                self.reset();
                MotionInput::Unhandled
            }
        }
    }

    /// Drop pending state once the timeout has elapsed
    pub fn expire(&mut self, now: Instant) {
        if let Some(at) = self.armed_at
            && now.duration_since(at) > self.timeout
        {
            self.reset();
        }
    }

    pub fn reset(&mut self) {
        self.count = None;
        self.pending_g = false;
        self.armed_at = None;
    }

    pub fn is_pending(&self) -> bool {
        self.count.is_some() || self.pending_g
    }

    /// Pending keys for the status line, e.g. "12g"
    pub fn pending_display(&self) -> String {
        let mut s = self.count.map(|c| c.to_string()).unwrap_or_default();
        if self.pending_g {
            s.push('g');
        }
        s
    }

    fn push_digit(&mut self, digit: char, now: Instant) {
        let d = digit.to_digit(10).unwrap_or(0) as usize;
        let current = self.count.unwrap_or(0);
        self.count = Some(current.saturating_mul(10).saturating_add(d));
        self.armed_at = Some(now);
    }
}
