//! Routing state - which endpoint is primary and whether we failed over
//!
//! Every mutation goes through [`RoutingState::toggle`]. Escalating races use
//! [`RoutingState::fail_over`], which only toggles while not yet switched, so
//! two races failing together produce a single transition.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// Endpoint indices captured at call start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub primary: usize,
    pub secondary: usize,
}

/// Result of a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// `switched` went false -> true; a switchback must be armed
    FailedOver {
        primary: usize,
        /// Counter value before the increment, selects the cooldown
        switch_count: u64,
    },
    /// `switched` went true -> false
    SwitchedBack { primary: usize },
}

#[derive(Debug)]
struct Inner {
    primary: usize,
    switched: bool,
    switch_count: u64,
    last_switchback: Option<Instant>,
}

/// Shared routing state for one dispatcher
#[derive(Debug)]
pub struct RoutingState {
    inner: Mutex<Inner>,
    /// Reset the counter after this much stability (None = never)
    stable_reset: Option<Duration>,
}

impl Default for RoutingState {
    fn default() -> Self {
        Self::new(None)
    }
}

impl RoutingState {
    pub fn new(stable_reset: Option<Duration>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                primary: 0,
                switched: false,
                switch_count: 0,
                last_switchback: None,
            }),
            stable_reset,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Route {
        let inner = self.lock();
        Route {
            primary: inner.primary,
            secondary: 1 - inner.primary,
        }
    }

    pub fn is_switched(&self) -> bool {
        self.lock().switched
    }

    pub fn switch_count(&self) -> u64 {
        self.lock().switch_count
    }

    /// Flip primary and `switched` unconditionally
    pub fn toggle(&self) -> Transition {
        let mut inner = self.lock();
        self.flip(&mut inner)
    }

    /// Toggle only if not already switched
    pub fn fail_over(&self) -> Option<Transition> {
        let mut inner = self.lock();
        if inner.switched {
            return None;
        }
        Some(self.flip(&mut inner))
    }

    fn flip(&self, inner: &mut Inner) -> Transition {
        inner.primary = 1 - inner.primary;
        inner.switched = !inner.switched;

        if !inner.switched {
            inner.last_switchback = Some(Instant::now());
            return Transition::SwitchedBack {
                primary: inner.primary,
            };
        }

        if let (Some(window), Some(since)) = (self.stable_reset, inner.last_switchback) {
            if since.elapsed() >= window {
                inner.switch_count = 0;
            }
        }

        let switch_count = inner.switch_count;
        inner.switch_count += 1;
        Transition::FailedOver {
            primary: inner.primary,
            switch_count,
        }
    }
}
