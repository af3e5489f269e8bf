//! Property-based tests for session revision accounting
//!
//! Operations are composed against randomly chosen earlier revisions, as
//! lagging participants would, and must all be transformed into something
//! the current document accepts.

use hubcollab::shared::ot::{DocumentSession, DocumentSnapshot, Operation, Revision};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Step {
    lag: usize,
    position: f64,
    extent: f64,
    insert: bool,
    text: String,
}

fn step() -> impl Strategy<Value = Step> {
    (0..4usize, 0.0..1.0f64, 0.0..1.0f64, any::<bool>(), "[a-zé]{1,4}").prop_map(
        |(lag, position, extent, insert, text)| Step {
            lag,
            position,
            extent,
            insert,
            text,
        },
    )
}

impl Step {
    /// Build an operation valid against a document of `len` code points
    fn operation(&self, author: &str, base: Revision, len: usize) -> Operation {
        let position = (self.position * len as f64) as usize;
        if self.insert || len == 0 {
            return Operation::insert(author, base, position.min(len), self.text.clone());
        }
        let position = position.min(len - 1);
        let length = 1 + (self.extent * (len - position - 1) as f64) as usize;
        Operation::delete(author, base, position, length)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn test_lagging_submissions_are_all_applied(steps in prop::collection::vec(step(), 1..40)) {
        let mut session = DocumentSession::new(DocumentSnapshot::empty("note"), 1000);
        // document length at every revision
        let mut lengths = vec![0usize];

        for (i, step) in steps.iter().enumerate() {
            let current = session.revision();
            let base = current.saturating_sub(step.lag as Revision);
            let op = step.operation(&format!("author-{}", i % 3), base, lengths[base as usize]);

            let submission = session.submit(&op).unwrap();
            prop_assert!(!submission.is_duplicate());
            prop_assert_eq!(submission.applied().revision, current + 1);
            lengths.push(session.document().len());
        }

        let n = steps.len() as Revision;
        prop_assert_eq!(session.revision(), n);
        prop_assert_eq!(session.history().len(), steps.len());
        prop_assert_eq!(session.document().len(), session.document().content().chars().count());
    }

    #[test]
    fn test_rejected_submission_leaves_session_unchanged(
        seed in "[a-z]{0,8}",
        overshoot in 1..5usize,
    ) {
        let mut session = DocumentSession::new(
            DocumentSnapshot {
                document_id: "note".into(),
                content: seed.clone(),
                revision: 3,
            },
            10,
        );
        let len = seed.chars().count();

        prop_assert!(session.submit(&Operation::insert("a", 3, len + overshoot, "x")).is_err());
        prop_assert!(session.submit(&Operation::delete("a", 3, 0, len + overshoot)).is_err());
        prop_assert!(session.submit(&Operation::insert("a", 4, 0, "x")).is_err());

        prop_assert_eq!(session.revision(), 3);
        prop_assert_eq!(session.document().content(), seed.as_str());
        prop_assert!(session.history().is_empty());
    }
}
