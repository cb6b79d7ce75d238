//! Model file loading and the in-flight load policy.

use std::path::Path;

use tracing::debug;

use crate::error::LoadError;
use crate::geometry::Surface;
use crate::stl::StlLoader;

/// Turns the bytes of a model file into a surface.
///
/// `base_path` is where the bytes came from, when known; formats that
/// reference sibling files resolve them against it.
pub trait ModelLoader: Send + Sync {
    /// Lower-case file extensions this loader understands.
    fn extensions(&self) -> &'static [&'static str];

    fn parse(&self, bytes: &[u8], base_path: Option<&Path>) -> Result<Surface, LoadError>;
}

/// Pick a loader by file extension. STL is the only format; anything else is
/// sniffed as STL too.
pub fn loader_for(path: &Path) -> Box<dyn ModelLoader> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let known = ext
        .as_deref()
        .is_some_and(|e| StlLoader.extensions().contains(&e));
    if !known {
        debug!(path = %path.display(), "unrecognized extension, trying STL");
    }
    Box::new(StlLoader)
}

/// Read and parse a model file from disk.
pub fn load_path(path: &Path) -> Result<Surface, LoadError> {
    let bytes = std::fs::read(path)?;
    loader_for(path).parse(&bytes, path.parent())
}

/// Identifies one load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Only the most recently issued ticket is honored on completion; earlier
/// requests still in flight are treated as cancelled.
#[derive(Debug, Default)]
pub struct LoadTracker {
    issued: u64,
    pending: Option<LoadTicket>,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> LoadTicket {
        self.issued += 1;
        let ticket = LoadTicket(self.issued);
        if let Some(previous) = self.pending.replace(ticket) {
            debug!(cancelled = previous.0, ticket = ticket.0, "load superseded");
        }
        ticket
    }

    /// Accept a completion. Returns `false` for a stale or already-finished
    /// ticket, which the caller must discard.
    pub fn complete(&mut self, ticket: LoadTicket) -> bool {
        if self.pending == Some(ticket) {
            self.pending = None;
            true
        } else {
            debug!(ticket = ticket.0, "discarding stale load");
            false
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_ticket_wins() {
        let mut tracker = LoadTracker::new();
        let first = tracker.begin();
        let second = tracker.begin();
        assert!(first < second);
        assert!(!tracker.complete(first));
        assert!(tracker.is_loading());
        assert!(tracker.complete(second));
        assert!(!tracker.is_loading());
    }

    #[test]
    fn test_ticket_completes_once() {
        let mut tracker = LoadTracker::new();
        let ticket = tracker.begin();
        assert!(tracker.complete(ticket));
        assert!(!tracker.complete(ticket));
    }

    #[test]
    fn test_loader_for_any_case() {
        assert_eq!(loader_for(Path::new("part.STL")).extensions(), ["stl"]);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = load_path(Path::new("/nonexistent/model.stl")).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }
}
