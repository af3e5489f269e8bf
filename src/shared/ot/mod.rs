//! Operational Transformation Core
//!
//! This module contains the collaborative editing engine: the document and
//! operation models, the pairwise transformation functions, the per-document
//! history buffer and the session that serializes edits for one document.
//!
//! Nothing in here performs I/O or locking. The async coordinator in
//! `backend::collab` wraps a [`DocumentSession`] per document behind a mutex
//! and broadcasts what it applies.
//!
//! # Module Structure
//!
//! ```text
//! ot/
//! ├── operation.rs - Operation, OperationKind, OperationId, Revision
//! ├── document.rs  - Document, DocumentSnapshot
//! ├── transform.rs - transform(), transform_against() and the four cases
//! ├── history.rs   - HistoryBuffer, AppliedOperation
//! └── session.rs   - DocumentSession submit pipeline
//! ```
//!
//! # Example
//!
//! ```rust
//! use hubcollab::shared::ot::{DocumentSession, DocumentSnapshot, Operation};
//!
//! let snapshot = DocumentSnapshot {
//!     document_id: "note-1".into(),
//!     content: "world".into(),
//!     revision: 0,
//! };
//! let mut session = DocumentSession::new(snapshot, 100);
//! session.submit(&Operation::insert("alice", 0, 0, "hello ")).unwrap();
//! // bob composed against revision 0 and has not seen alice's edit
//! session.submit(&Operation::insert("bob", 0, 5, "!")).unwrap();
//! assert_eq!(session.document().content(), "hello world!");
//! ```

pub mod document;
pub mod history;
pub mod operation;
pub mod session;
pub mod transform;

pub use document::{Document, DocumentSnapshot};
pub use history::{AppliedOperation, HistoryBuffer};
pub use operation::{Operation, OperationId, OperationKind, Revision};
pub use session::{ConnectionId, DocumentSession, PendingCommit, Prepared, Submission};
pub use transform::{transform, transform_against};
