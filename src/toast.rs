use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastKind {
    #[default]
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub shown_at: Instant,
}

/// At most one toast on screen; a new one replaces the old
#[derive(Debug, Clone)]
pub struct ToastState {
    pub current: Option<Toast>,
    duration: Duration,
}

impl Default for ToastState {
    fn default() -> Self {
        Self::new(Duration::from_millis(3000))
    }
}

impl ToastState {
    pub fn new(duration: Duration) -> Self {
        Self {
            current: None,
            duration,
        }
    }

    pub fn show(&mut self, message: impl Into<String>, kind: ToastKind, now: Instant) {
        self.current = Some(Toast {
            message: message.into(),
            kind,
            shown_at: now,
        });
    }

    pub fn success(&mut self, message: impl Into<String>, now: Instant) {
        self.show(message, ToastKind::Success, now);
    }

    pub fn error(&mut self, message: impl Into<String>, now: Instant) {
        self.show(message, ToastKind::Error, now);
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }

    /// Drop the toast once it has been up long enough
    pub fn tick(&mut self, now: Instant) {
        if let Some(t) = &self.current {
            if now.duration_since(t.shown_at) >= self.duration {
                self.current = None;
            }
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.current.as_ref().map(|t| t.shown_at + self.duration)
    }
}
