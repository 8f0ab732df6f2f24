// Auto-grouping heuristic. Operates on the same transaction that committed
// the new question, so the candidate search and the parent-linkage update
// are part of that question's atomic catalog write rather than a follow-up
// statement that could land after a failure elsewhere in the commit.

use qbank_catalog::{CatalogError, Repository};
use qbank_common::types::Question;
use sqlx::{Postgres, Transaction};

/// Link `new_question` to the most recent parentless sibling from the same
/// source within the grouping window, if one exists. A burst of three
/// extractions arriving within the window yields a star, not a chain: the
/// second extraction claims the first as its parent, and the third also
/// finds the first (the second is no longer parentless by then).
///
/// Never overwrites an existing parent and is silent when no candidate is
/// found — that's the common case, not an error.
pub async fn group(
    repo: &Repository,
    tx: &mut Transaction<'_, Postgres>,
    new_question: &Question,
) -> Result<(), CatalogError> {
    if new_question.parent_id.is_some() {
        return Ok(());
    }

    let candidate = repo
        .find_group_candidate_tx(
            tx,
            new_question.source_id,
            new_question.question_id,
            new_question.created_at,
        )
        .await?;

    if let Some(parent) = candidate {
        tracing::debug!(
            question_id = %new_question.question_id,
            parent_id = %parent.question_id,
            "auto-grouped question under recent sibling"
        );
        repo.set_parent_tx(tx, new_question.question_id, parent.question_id)
            .await?;
    }

    Ok(())
}
