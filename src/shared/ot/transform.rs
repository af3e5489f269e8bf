/**
 * Transformation Engine
 *
 * Pure functions that take two concurrent operations `a` and `b` (composed
 * against the same revision) and return `a'`, the version of `a` that can be
 * applied after `b` without corrupting the document.
 *
 * # Cases
 *
 * - Insert vs Insert: shift when `b` lands before `a`; equal positions are
 *   ordered by `Operation::tie_break_cmp`.
 * - Insert vs Delete: shift left past the deleted range, clamp to its start
 *   when the insert falls inside it.
 * - Delete vs Insert: shift right past the insert. An insert that lands
 *   strictly inside the delete range is swallowed: the delete grows by the
 *   inserted length and removes it too.
 * - Delete vs Delete: drop the overlap; a fully covered delete degenerates to
 *   a zero-length delete that is still applied.
 */

use crate::shared::error::CollabError;
use crate::shared::ot::history::AppliedOperation;
use crate::shared::ot::operation::{Operation, OperationKind};
use std::cmp::Ordering;

/// Transform `a` so it applies after the concurrent operation `b`
///
/// Both operations must share a base revision; the result is based on the
/// revision `b` produced.
pub fn transform(a: &Operation, b: &Operation) -> Result<Operation, CollabError> {
    if a.base_revision() != b.base_revision() {
        return Err(CollabError::unresolvable(format!(
            "operation {} (base {}) is not concurrent with {} (base {})",
            a.id(),
            a.base_revision(),
            b.id(),
            b.base_revision()
        )));
    }

    let transformed = match (a.kind(), b.kind()) {
        (OperationKind::Insert { .. }, OperationKind::Insert { .. }) => insert_insert(a, b),
        (OperationKind::Insert { .. }, OperationKind::Delete { .. }) => insert_delete(a, b),
        (OperationKind::Delete { .. }, OperationKind::Insert { .. }) => delete_insert(a, b),
        (OperationKind::Delete { .. }, OperationKind::Delete { .. }) => delete_delete(a, b),
    };
    Ok(transformed)
}

/// Fold `op` through already-applied operations in chronological order
///
/// This is the transform-against-history loop: `missed` must be exactly the
/// operations applied since `op.base_revision()`.
pub fn transform_against<'a, I>(op: &Operation, missed: I) -> Result<Operation, CollabError>
where
    I: IntoIterator<Item = &'a AppliedOperation>,
{
    missed
        .into_iter()
        .try_fold(op.clone(), |current, applied| transform(&current, &applied.operation))
}

/// Insert vs Insert
pub fn insert_insert(a: &Operation, b: &Operation) -> Operation {
    let shift = match a.position().cmp(&b.position()) {
        Ordering::Less => false,
        Ordering::Greater => true,
        // b logically first: a lands after b's text
        Ordering::Equal => a.tie_break_cmp(b) == Ordering::Greater,
    };
    let position = if shift {
        a.position() + b.inserted_len()
    } else {
        a.position()
    };
    a.rebased(position, a.kind().clone(), next_base(b))
}

/// Insert vs Delete
pub fn insert_delete(a: &Operation, b: &Operation) -> Operation {
    let start = b.position();
    let end = start + b.deleted_len();
    let position = if a.position() <= start {
        a.position()
    } else if a.position() >= end {
        a.position() - b.deleted_len()
    } else {
        start
    };
    a.rebased(position, a.kind().clone(), next_base(b))
}

/// Delete vs Insert
pub fn delete_insert(a: &Operation, b: &Operation) -> Operation {
    let start = a.position();
    let end = start + a.deleted_len();
    let inserted = b.inserted_len();
    let (position, length) = if b.position() <= start {
        (start + inserted, a.deleted_len())
    } else if b.position() >= end {
        (start, a.deleted_len())
    } else {
        (start, a.deleted_len() + inserted)
    };
    a.rebased(position, OperationKind::Delete { length }, next_base(b))
}

/// Delete vs Delete
pub fn delete_delete(a: &Operation, b: &Operation) -> Operation {
    let (a_start, a_end) = (a.position(), a.position() + a.deleted_len());
    let (b_start, b_end) = (b.position(), b.position() + b.deleted_len());

    let overlap = a_end.min(b_end).saturating_sub(a_start.max(b_start));
    let length = a.deleted_len() - overlap;
    let position = if a_start >= b_end {
        a_start - b.deleted_len()
    } else if a_start >= b_start {
        b_start
    } else {
        a_start
    };
    a.rebased(position, OperationKind::Delete { length }, next_base(b))
}

fn next_base(b: &Operation) -> u64 {
    b.base_revision() + 1
}
