//! Call wrappers.
//!
//! `watch*` take a function and return a function with the same calling
//! convention that also reports on every call: an info line with the
//! arguments before, and a performance line (duration and memory delta)
//! after. Results, `Err` values and panics reach the caller unchanged.
//!
//! Multiple arguments are passed as a tuple; methods are watched by
//! capturing the receiver in a closure:
//!
//! ```rust
//! use devscope::{DevScope, MemorySink};
//!
//! struct Cache { hits: u32 }
//! impl Cache {
//!     fn lookup(&self, key: &str) -> Option<u32> {
//!         (key == "a").then_some(self.hits)
//!     }
//! }
//!
//! let scope = DevScope::builder().sink(MemorySink::new()).build();
//! let cache = Cache { hits: 3 };
//! let lookup = scope.watch("Cache::lookup", |key: &str| cache.lookup(key));
//!
//! assert_eq!(lookup("a"), Some(3));
//! assert_eq!(scope.stats().total_logs, 2);
//! ```
//!
//! Watching an already watched function nests the wrappers; each layer
//! measures and reports on its own.

use crate::clock::format_millis;
use crate::color::{paint, SLOW_TONE, TIME_TONE};
use crate::console::LogCategory;
use crate::memory::delta_mb;
use crate::scope::DevScope;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe, Location};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use std::time::Instant;

/// Readings taken before a watched call.
#[derive(Debug, Clone, Copy)]
struct CallStart {
    started: Instant,
    memory: Option<u64>,
}

impl DevScope {
    /// Wrap `f` so that every call is reported.
    ///
    /// A panic inside `f` is reported as an error line and then resumed
    /// with its original payload.
    ///
    /// Every line the wrapper prints is attributed to the place `watch` was
    /// called, not to each invocation of the returned function: closures
    /// cannot be `#[track_caller]`.
    #[track_caller]
    pub fn watch<A, R, F>(&self, name: impl Into<String>, f: F) -> impl Fn(A) -> R
    where
        F: Fn(A) -> R,
        A: fmt::Debug,
    {
        let scope = self.clone();
        let name: String = name.into();
        let location = Location::caller();

        move |args: A| {
            let start = scope.begin_call(&name, &args, location);
            let result = scope.invoke(&name, location, || f(args));
            scope.finish_call(&name, start, location);
            result
        }
    }

    /// Wrap a fallible `f`.
    ///
    /// `Ok` results are reported like [`watch`](Self::watch). An `Err` is
    /// reported as an error line, with no performance line, and returned
    /// as is.
    #[track_caller]
    pub fn watch_result<A, T, E, F>(
        &self,
        name: impl Into<String>,
        f: F,
    ) -> impl Fn(A) -> Result<T, E>
    where
        F: Fn(A) -> Result<T, E>,
        A: fmt::Debug,
        E: fmt::Display,
    {
        let scope = self.clone();
        let name: String = name.into();
        let location = Location::caller();

        move |args: A| {
            let start = scope.begin_call(&name, &args, location);
            match scope.invoke(&name, location, || f(args)) {
                Ok(value) => {
                    scope.finish_call(&name, start, location);
                    Ok(value)
                }
                Err(err) => {
                    let message = format!("✗ {name} failed: {err}");
                    scope.record(LogCategory::Error, location, vec![message]);
                    Err(err)
                }
            }
        }
    }

    /// Wrap an asynchronous `f`.
    ///
    /// The returned future reports once the inner future completes, whatever
    /// its output, and then yields that output unchanged. A panic while
    /// polling is reported as an error line and resumed. Futures that are
    /// dropped before completing report nothing.
    #[track_caller]
    pub fn watch_async<A, Fut, F>(
        &self,
        name: impl Into<String>,
        f: F,
    ) -> impl Fn(A) -> WatchedFuture<Fut>
    where
        F: Fn(A) -> Fut,
        Fut: Future,
        A: fmt::Debug,
    {
        let scope = self.clone();
        let name: Arc<str> = Arc::from(name.into());
        let location = Location::caller();

        move |args: A| {
            let start = scope.begin_call(&name, &args, location);
            let inner = scope.invoke(&name, location, || f(args));
            WatchedFuture {
                inner: Box::pin(inner),
                scope: scope.clone(),
                name: Arc::clone(&name),
                start,
                location,
            }
        }
    }

    fn begin_call(
        &self,
        name: &str,
        args: &dyn fmt::Debug,
        location: &'static Location<'static>,
    ) -> CallStart {
        let started = self.clock().now();
        let memory = if self.config().show_memory {
            self.memory().resident_bytes()
        } else {
            None
        };

        self.record(
            LogCategory::Info,
            location,
            vec![format!("→ calling {name} with args: {args:?}")],
        );

        CallStart { started, memory }
    }

    /// Run `call`, reporting and resuming any panic.
    fn invoke<R>(
        &self,
        name: &str,
        location: &'static Location<'static>,
        call: impl FnOnce() -> R,
    ) -> R {
        match panic::catch_unwind(AssertUnwindSafe(call)) {
            Ok(result) => result,
            Err(payload) => {
                self.report_panic(name, location, &*payload);
                panic::resume_unwind(payload)
            }
        }
    }

    fn report_panic(
        &self,
        name: &str,
        location: &'static Location<'static>,
        payload: &(dyn Any + Send),
    ) {
        let message = format!("✗ {name} panicked: {}", panic_message(payload));
        self.record(LogCategory::Error, location, vec![message]);
    }

    fn finish_call(&self, name: &str, start: CallStart, location: &'static Location<'static>) {
        let config = self.config();
        let elapsed = self.clock().now().saturating_duration_since(start.started);
        let mut parts = Vec::with_capacity(2);

        if config.show_timings {
            let tone = if config.is_slow(elapsed) { SLOW_TONE } else { TIME_TONE };
            parts.push(format!("took {}", paint(&format_millis(elapsed), tone, config.colorize)));
        }

        if config.show_memory {
            if let (Some(before), Some(after)) = (start.memory, self.memory().resident_bytes()) {
                parts.push(format!("memory: {:+.2}MB", delta_mb(before, after)));
            }
        }

        if parts.is_empty() {
            return;
        }

        if config.is_slow(elapsed) {
            tracing::debug!(
                target: "devscope",
                call = name,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                "slow call"
            );
        }

        let message = format!("⚡ {} {}", name, parts.join(" | "));
        self.record(LogCategory::Log, location, vec![message]);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

// =============================================================================
// Watched Future
// =============================================================================

/// Future returned by functions wrapped with [`DevScope::watch_async`].
pub struct WatchedFuture<Fut> {
    inner: Pin<Box<Fut>>,
    scope: DevScope,
    name: Arc<str>,
    start: CallStart,
    location: &'static Location<'static>,
}

impl<Fut> fmt::Debug for WatchedFuture<Fut> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchedFuture").field("name", &self.name).finish_non_exhaustive()
    }
}

impl<Fut: Future> Future for WatchedFuture<Fut> {
    type Output = Fut::Output;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        let polled = panic::catch_unwind(AssertUnwindSafe(|| this.inner.as_mut().poll(cx)));
        let output = match polled {
            Ok(poll) => ready!(poll),
            Err(payload) => {
                this.scope.report_panic(&this.name, this.location, &*payload);
                panic::resume_unwind(payload)
            }
        };
        this.scope.finish_call(&this.name, this.start, this.location);
        Poll::Ready(output)
    }
}
