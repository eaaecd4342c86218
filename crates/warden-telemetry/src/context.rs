//! Application-level span guard.
//!
//! # Design
//! - Keeps one top-level span entered for the lifetime of the process so every
//!   log line carries the component and build SHA.

use tracing::{Span, span::Entered};

use crate::init::build_sha;

/// Guard that keeps the application-level span entered for the lifetime of the process.
pub struct GlobalContextGuard {
    _guard: Entered<'static>,
}

impl GlobalContextGuard {
    /// Enter the application-level tracing span for the lifetime of the guard.
    #[must_use]
    pub fn new(component: impl Into<String>) -> Self {
        let component = component.into();
        let span: &'static Span = Box::leak(Box::new(
            tracing::info_span!("app", component = %component, build_sha = %build_sha()),
        ));
        let guard = span.enter();
        Self { _guard: guard }
    }
}
