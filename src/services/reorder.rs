use std::future::Future;

use crate::models::{OrderAssignment, ReorderFailure, ReorderOutcome, RepositoryResult};

/// Write each assignment on its own. A failed write is logged and reported,
/// and the remaining writes still go ahead; nothing is rolled back.
pub(crate) async fn persist_assignments<F, Fut>(
    list_len: usize,
    assignments: Vec<OrderAssignment>,
    write: F,
) -> ReorderOutcome
where
    F: Fn(String, i32) -> Fut,
    Fut: Future<Output = RepositoryResult<()>>,
{
    let mut outcome = ReorderOutcome {
        unchanged: list_len.saturating_sub(assignments.len()),
        ..Default::default()
    };

    for assignment in assignments {
        match write(assignment.id.clone(), assignment.display_order).await {
            Ok(()) => outcome.updated.push(assignment),
            Err(e) => {
                crate::error_with_trace!(
                    id = %assignment.id,
                    display_order = assignment.display_order,
                    error = %e,
                    "Failed to persist display order"
                );
                outcome.failed.push(ReorderFailure {
                    id: assignment.id,
                    error: e.to_string(),
                });
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RepositoryError;

    fn assignment(id: &str, order: i32) -> OrderAssignment {
        OrderAssignment {
            id: id.to_string(),
            display_order: order,
        }
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_remaining_writes() {
        let assignments = vec![assignment("a", 1), assignment("b", 2), assignment("c", 3)];

        let outcome = persist_assignments(5, assignments, |id, _| async move {
            if id == "b" {
                Err(RepositoryError::Timeout)
            } else {
                Ok(())
            }
        })
        .await;

        assert_eq!(outcome.unchanged, 2);
        assert_eq!(outcome.updated, vec![assignment("a", 1), assignment("c", 3)]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].id, "b");
        assert!(!outcome.is_complete());
    }

    #[tokio::test]
    async fn test_nothing_to_write() {
        let outcome = persist_assignments(3, Vec::new(), |_, _| async { Ok(()) }).await;
        assert_eq!(outcome.unchanged, 3);
        assert!(outcome.is_complete());
    }
}
