use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// State shared by every store of one application session.
///
/// Holds the submission latch (one network-bound action in flight at a time, across all
/// stores) and the headers sent with every request.
#[derive(Clone, Debug, Default)]
pub struct Session {
    submitting: Arc<AtomicBool>,
    submitting_silently: Arc<AtomicBool>,
    headers: BTreeMap<String, String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Whether a submission is in flight.
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Whether the in-flight submission asked for no visual feedback.
    pub fn is_submitting_silently(&self) -> bool {
        self.submitting_silently.load(Ordering::Acquire)
    }

    /// Take the submission latch.
    ///
    /// Returns `None` while another submission holds it. `silent`, when given, sets the
    /// silent flag for the duration of this submission.
    pub fn try_begin_submission(&self, silent: Option<bool>) -> Option<SubmissionGuard> {
        self.submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        if let Some(silent) = silent {
            self.submitting_silently.store(silent, Ordering::Release);
        }
        Some(SubmissionGuard {
            session: self.clone(),
            clears_silent: silent.is_some(),
        })
    }
}

/// Holds the submission latch; releases it when dropped.
#[derive(Debug)]
#[must_use = "the latch is released as soon as the guard is dropped"]
pub struct SubmissionGuard {
    session: Session,
    clears_silent: bool,
}

impl Drop for SubmissionGuard {
    fn drop(&mut self) {
        if self.clears_silent {
            self.session
                .submitting_silently
                .store(false, Ordering::Release);
        }
        self.session.submitting.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latch_is_exclusive_and_released_on_drop() {
        let session = Session::new();
        let guard = session.try_begin_submission(None).unwrap();
        assert!(session.is_submitting());
        assert!(session.try_begin_submission(None).is_none());

        // Clones share the latch.
        assert!(session.clone().try_begin_submission(None).is_none());

        drop(guard);
        assert!(!session.is_submitting());
        assert!(session.try_begin_submission(None).is_some());
    }

    #[test]
    fn test_silent_flag_follows_guard() {
        let session = Session::new();
        {
            let _guard = session.try_begin_submission(Some(true)).unwrap();
            assert!(session.is_submitting_silently());
        }
        assert!(!session.is_submitting_silently());

        let _guard = session.try_begin_submission(None).unwrap();
        assert!(!session.is_submitting_silently());
    }

    #[test]
    fn test_headers() {
        let session = Session::new().with_header("Authorization", "Bearer t");
        assert_eq!(session.headers().get("Authorization").map(String::as_str), Some("Bearer t"));
    }
}
