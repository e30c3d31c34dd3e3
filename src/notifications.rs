//! User-visible notifications.
//!
//! Transport and persistence failures never cross the core boundary as
//! errors; they end up here as toasts for whatever front end is attached.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Maximum number of toasts kept at once
const MAX_TOASTS: usize = 5;

/// Toasts fade out over this final part of their lifetime
const FADE_DURATION: Duration = Duration::from_millis(300);

static NEXT_TOAST_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastVariant {
    Success,
    Error,
    Info,
    Warning,
}

impl ToastVariant {
    pub fn default_duration(&self) -> Duration {
        match self {
            Self::Success | Self::Info => Duration::from_secs(3),
            Self::Warning => Duration::from_secs(4),
            Self::Error => Duration::from_secs(5),
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Error => "✗",
            Self::Info => "ℹ",
            Self::Warning => "⚠",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub variant: ToastVariant,
    pub duration: Duration,
    pub created_at: Instant,
}

impl Toast {
    pub fn new(message: impl Into<String>, variant: ToastVariant) -> Self {
        Self {
            id: NEXT_TOAST_ID.fetch_add(1, Ordering::Relaxed),
            message: message.into(),
            variant,
            duration: variant.default_duration(),
            created_at: Instant::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, ToastVariant::Success)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, ToastVariant::Error)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, ToastVariant::Info)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, ToastVariant::Warning)
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= self.duration
    }

    /// Fraction of the lifetime left, `1.0` when fresh and `0.0` once expired.
    pub fn remaining_percent(&self) -> f32 {
        self.remaining_percent_at(Instant::now())
    }

    pub fn remaining_percent_at(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 0.0;
        }
        let elapsed = now.saturating_duration_since(self.created_at);
        let left = self.duration.saturating_sub(elapsed);
        left.as_secs_f32() / self.duration.as_secs_f32()
    }

    /// Render opacity. With reduced motion the toast never fades.
    pub fn opacity(&self, reduce_motion: bool) -> f32 {
        self.opacity_at(Instant::now(), reduce_motion)
    }

    pub fn opacity_at(&self, now: Instant, reduce_motion: bool) -> f32 {
        if reduce_motion {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.created_at);
        let left = self.duration.saturating_sub(elapsed);
        if left >= FADE_DURATION {
            1.0
        } else {
            left.as_secs_f32() / FADE_DURATION.as_secs_f32()
        }
    }
}

/// Queue of visible toasts, oldest first.
#[derive(Debug, Default)]
pub struct ToastManager {
    toasts: VecDeque<Toast>,
}

impl ToastManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a toast, dropping the oldest one when full.
    pub fn push(&mut self, toast: Toast) {
        if self.toasts.len() >= MAX_TOASTS {
            self.toasts.pop_front();
        }
        self.toasts.push_back(toast);
    }

    pub fn remove(&mut self, id: u64) {
        self.toasts.retain(|t| t.id != id);
    }

    pub fn remove_expired(&mut self) {
        let now = Instant::now();
        self.toasts.retain(|t| !t.is_expired_at(now));
    }

    pub fn clear(&mut self) {
        self.toasts.clear();
    }

    pub fn count(&self) -> usize {
        self.toasts.len()
    }

    pub fn toasts(&self) -> Vec<&Toast> {
        self.toasts.iter().collect()
    }

    pub fn latest(&self) -> Option<&Toast> {
        self.toasts.back()
    }
}
