use std::cell::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The override ran on this completion.
    Overridden,
    /// The override already ran on an earlier completion.
    AlreadyOverridden,
    /// The library's entry point was missing after load.
    LibraryMissing,
}

/// Gate around the loader's completion callback.
///
/// The override runs at most once per page load and only with a present entry
/// point. The previously registered completion callback always runs, after the
/// override.
#[derive(Debug, Default)]
pub struct LoadInterceptor {
    fired: Cell<bool>,
}

impl LoadInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_fired(&self) -> bool {
        self.fired.get()
    }

    pub fn complete<E>(
        &self,
        entry: Option<E>,
        on_ready: impl FnOnce(E),
        previous: impl FnOnce(),
    ) -> LoadOutcome {
        let outcome = match entry {
            None => {
                tracing::error!("map library entry point not found after load");
                LoadOutcome::LibraryMissing
            }
            Some(_) if self.fired.get() => LoadOutcome::AlreadyOverridden,
            Some(entry) => {
                self.fired.set(true);
                tracing::debug!("map library loaded, installing map override");
                on_ready(entry);
                LoadOutcome::Overridden
            }
        };
        previous();
        outcome
    }
}
