/// Where a [`LabSearch`](crate::LabSearch) is in its request lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchPhase {
    /// Nothing in flight; results (possibly empty) are current.
    #[default]
    Idle,
    /// A fresh search is in flight; its page will replace the results.
    Searching,
    /// A continuation page is in flight; it will be appended.
    Appending,
    /// The latest request failed. Results from before it are kept.
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchEvent {
    Started { append: bool },
    Succeeded,
    Failed,
}

impl SearchPhase {
    /// The phase after `event`. A new request may start from any phase.
    pub fn on(self, event: SearchEvent) -> SearchPhase {
        match (self, event) {
            (_, SearchEvent::Started { append: false }) => SearchPhase::Searching,
            (_, SearchEvent::Started { append: true }) => SearchPhase::Appending,
            (SearchPhase::Searching | SearchPhase::Appending, SearchEvent::Succeeded) => {
                SearchPhase::Idle
            }
            (SearchPhase::Searching | SearchPhase::Appending, SearchEvent::Failed) => {
                SearchPhase::Error
            }
            // Completions with nothing in flight are stale and change nothing.
            (phase, SearchEvent::Succeeded | SearchEvent::Failed) => phase,
        }
    }

    pub fn is_loading(self) -> bool {
        matches!(self, SearchPhase::Searching | SearchPhase::Appending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_search_lifecycle() {
        let phase = SearchPhase::Idle.on(SearchEvent::Started { append: false });
        assert_eq!(phase, SearchPhase::Searching);
        assert!(phase.is_loading());
        assert_eq!(phase.on(SearchEvent::Succeeded), SearchPhase::Idle);
        assert_eq!(phase.on(SearchEvent::Failed), SearchPhase::Error);
    }

    #[test]
    fn error_recovers_on_next_request() {
        assert_eq!(
            SearchPhase::Error.on(SearchEvent::Started { append: true }),
            SearchPhase::Appending
        );
        assert_eq!(SearchPhase::Error.on(SearchEvent::Succeeded), SearchPhase::Error);
        assert!(!SearchPhase::Error.is_loading());
    }
}
