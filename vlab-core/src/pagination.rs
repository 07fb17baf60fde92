//! Page-windowing cursor for the strategy carousel.
//!
//! The cursor owns the ordered sequence it pages over. Replacing the
//! sequence (after an async catalog load, say) clamps the page index so an
//! empty page is never shown. Page changes open a debounce window; moves
//! requested inside that window are dropped, not queued.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Monotonic time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock backed [`Clock`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-advanced clock for deterministic tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.origin + offset
    }
}

/// Snapshot of the cursor's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page_index: usize,
    pub page_size: usize,
    pub total_items: usize,
}

impl PageWindow {
    pub fn page_count(&self) -> usize {
        self.total_items.div_ceil(self.page_size)
    }

    /// Index range of the visible slice within the source sequence.
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = (self.page_index * self.page_size).min(self.total_items);
        let end = (start + self.page_size).min(self.total_items);
        start..end
    }

    pub fn is_first(&self) -> bool {
        self.page_index == 0
    }

    pub fn is_last(&self) -> bool {
        self.page_index + 1 >= self.page_count().max(1)
    }
}

pub struct PaginationCursor<T> {
    items: Vec<T>,
    page_index: usize,
    page_size: usize,
    transition: Duration,
    transition_started: Option<Instant>,
    clock: Arc<dyn Clock>,
}

impl<T> PaginationCursor<T> {
    /// Cursor without a transition window. A zero page size is treated as one.
    pub fn new(items: Vec<T>, page_size: usize) -> Self {
        Self {
            items,
            page_index: 0,
            page_size: page_size.max(1),
            transition: Duration::ZERO,
            transition_started: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Enable the page-change debounce window.
    pub fn with_transition(mut self, duration: Duration, clock: Arc<dyn Clock>) -> Self {
        self.transition = duration;
        self.clock = clock;
        self
    }

    pub fn window(&self) -> PageWindow {
        PageWindow {
            page_index: self.page_index,
            page_size: self.page_size,
            total_items: self.items.len(),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// True while a page change is still inside its debounce window.
    pub fn in_transition(&self) -> bool {
        match self.transition_started {
            Some(started) => self.clock.now().duration_since(started) < self.transition,
            None => false,
        }
    }

    pub fn next(&mut self) -> PageWindow {
        if !self.in_transition() && self.page_index + 1 < self.window().page_count() {
            self.page_index += 1;
            self.start_transition();
        }
        self.window()
    }

    pub fn prev(&mut self) -> PageWindow {
        if !self.in_transition() && self.page_index > 0 {
            self.page_index -= 1;
            self.start_transition();
        }
        self.window()
    }

    /// Visible slice of the current page.
    pub fn current_page(&self) -> &[T] {
        &self.items[self.window().range()]
    }

    /// Item at `slot` on the current page.
    pub fn item_on_page(&self, slot: usize) -> Option<&T> {
        self.current_page().get(slot)
    }

    /// Swap in a new source sequence, clamping the page index.
    pub fn replace_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.clamp();
    }

    fn clamp(&mut self) {
        let last = self.window().page_count().max(1) - 1;
        if self.page_index > last {
            self.page_index = last;
        }
    }

    fn start_transition(&mut self) {
        if !self.transition.is_zero() {
            self.transition_started = Some(self.clock.now());
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for PaginationCursor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginationCursor")
            .field("page_index", &self.page_index)
            .field("page_size", &self.page_size)
            .field("total_items", &self.items.len())
            .field("transition", &self.transition)
            .finish()
    }
}
