//! UI-facing navigation state: which site is active, whether input is gated
//! by a running transition and what the loading overlay should show.

use crate::resources::LoadProgress;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LoadingState {
    #[default]
    Hidden,
    Loading { percent: u8 },
    /// The model at `url` failed to load; a placeholder is shown and a retry can be offered.
    Failed { url: String },
}

#[derive(Clone, Debug)]
pub struct Navigator {
    site_count: usize,
    active: Option<usize>,
    transitioning: bool,
    loading: LoadingState,
    description: Option<String>,
}

impl Navigator {
    pub fn new(site_count: usize) -> Self {
        Self {
            site_count,
            active: None,
            transitioning: false,
            loading: LoadingState::Hidden,
            description: None,
        }
    }

    pub fn site_count(&self) -> usize {
        self.site_count
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// The site after the active one, wrapping around at the end of the catalog.
    pub fn next_index(&self) -> Option<usize> {
        if self.site_count == 0 {
            return None;
        }
        Some(self.active.map_or(0, |index| (index + 1) % self.site_count))
    }

    pub fn previous_index(&self) -> Option<usize> {
        if self.site_count == 0 {
            return None;
        }
        Some(
            self.active
                .map_or(0, |index| (index + self.site_count - 1) % self.site_count),
        )
    }

    /// Maps the digit keys `1`..`9` to site indices.
    pub fn index_for_key(&self, key: char) -> Option<usize> {
        let digit = key.to_digit(10)? as usize;
        (1..=self.site_count.min(9))
            .contains(&digit)
            .then(|| digit - 1)
    }

    /// Input is ignored while a transition runs.
    pub fn can_navigate(&self) -> bool {
        !self.transitioning
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    /// Records an accepted switch: gates input, shows the loading overlay and
    /// hides the description until the new one is set.
    pub fn begin_transition(&mut self, index: usize, description: impl Into<String>) {
        self.active = Some(index);
        self.transitioning = true;
        self.loading = LoadingState::Loading { percent: 0 };
        self.description = Some(description.into());
    }

    pub fn finish_transition(&mut self) {
        self.transitioning = false;
        if matches!(self.loading, LoadingState::Loading { .. }) {
            self.loading = LoadingState::Hidden;
        }
    }

    pub fn loading(&self) -> &LoadingState {
        &self.loading
    }

    pub fn set_progress(&mut self, progress: LoadProgress) {
        // A failure stays visible until dismissed or retried.
        if matches!(self.loading, LoadingState::Failed { .. }) {
            return;
        }
        self.loading = if progress.is_complete() {
            LoadingState::Hidden
        } else {
            LoadingState::Loading {
                percent: progress.percent(),
            }
        };
    }

    pub fn fail(&mut self, url: impl Into<String>) {
        self.loading = LoadingState::Failed { url: url.into() };
    }

    pub fn dismiss_error(&mut self) {
        if matches!(self.loading, LoadingState::Failed { .. }) {
            self.loading = LoadingState::Hidden;
        }
    }

    /// Description of the active site, once one was selected.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}
