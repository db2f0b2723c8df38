//! Progress callbacks injected into the orchestrator.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Pipeline step currently waiting on the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Embedding,
    Searching,
    Generating,
}

impl Stage {
    #[inline]
    pub fn description(self) -> &'static str {
        match self {
            Self::Embedding => "Embedding question",
            Self::Searching => "Searching knowledge base",
            Self::Generating => "Generating answer",
        }
    }
}

/// Receives progress updates for one `get_answer` call at a time.
///
/// Implementations must not assume calls are serialized across invocations.
pub trait ProgressNotifier: Send + Sync {
    fn stage_started(&self, stage: Stage);

    /// Called once per invocation after validation passed, whatever the outcome
    fn finished(&self, success: bool);
}

/// Discards all updates
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    #[inline]
    fn stage_started(&self, _stage: Stage) {}

    #[inline]
    fn finished(&self, _success: bool) {}
}

/// Terminal spinner on stderr, hidden when nobody is watching.
///
/// Reusable: a new invocation restarts a spinner the previous one finished.
#[derive(Debug)]
pub struct SpinnerProgress {
    bar: ProgressBar,
}

impl SpinnerProgress {
    #[inline]
    pub fn new() -> Self {
        let bar = if console::user_attended_stderr() {
            let style = ProgressStyle::with_template("{spinner} {msg} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            ProgressBar::new_spinner().with_style(style)
        } else {
            ProgressBar::hidden()
        };

        Self { bar }
    }
}

impl Default for SpinnerProgress {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for SpinnerProgress {
    #[inline]
    fn stage_started(&self, stage: Stage) {
        if self.bar.is_finished() {
            self.bar.reset();
        }
        self.bar.set_message(stage.description());
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    #[inline]
    fn finished(&self, _success: bool) {
        self.bar.finish_and_clear();
    }
}
