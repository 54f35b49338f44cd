//! Step-by-step schema teardown used by `creatorhub-cli db reset`.

use sqlx::PgPool;

use crate::DbError;

/// Drop statements in dependency order, children before parents. The
/// migration history goes last so a re-run applies every migration again.
pub const DROP_STATEMENTS: &[&str] = &[
    "DROP TABLE IF EXISTS guidebook_resources CASCADE",
    "DROP TABLE IF EXISTS revenue_shares CASCADE",
    "DROP TABLE IF EXISTS payments CASCADE",
    "ALTER TABLE IF EXISTS task_assignments DROP CONSTRAINT IF EXISTS task_assignments_submission_fk",
    "DROP TABLE IF EXISTS video_submissions CASCADE",
    "DROP TABLE IF EXISTS task_assignments CASCADE",
    "DROP TABLE IF EXISTS monthly_tasks CASCADE",
    "DROP TABLE IF EXISTS marketing_projects CASCADE",
    "DROP TABLE IF EXISTS influencers CASCADE",
    "DROP TABLE IF EXISTS users CASCADE",
    "DROP TABLE IF EXISTS _sqlx_migrations",
];

/// Execute one teardown statement.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails. Callers log and move on.
pub async fn drop_step(pool: &PgPool, statement: &str) -> Result<(), DbError> {
    sqlx::query(statement).execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_history_is_dropped_last() {
        assert_eq!(
            DROP_STATEMENTS.last().copied(),
            Some("DROP TABLE IF EXISTS _sqlx_migrations")
        );
    }

    #[test]
    fn children_drop_before_parents() {
        let position = |table: &str| {
            DROP_STATEMENTS
                .iter()
                .position(|s| s.starts_with("DROP TABLE") && s.contains(table))
                .unwrap()
        };
        assert!(position("payments") < position("influencers"));
        assert!(position("task_assignments") < position("monthly_tasks"));
        assert!(position("influencers ") < position("users"));
    }

    #[test]
    fn dropped_constraints_exist_in_the_schema() {
        let schema = include_str!("../../../migrations/20250701000003_submissions_and_payments.sql");
        for statement in DROP_STATEMENTS.iter().filter(|s| s.contains("DROP CONSTRAINT")) {
            let name = statement.rsplit(' ').next().unwrap();
            assert!(
                schema.contains(&format!("ADD CONSTRAINT {name}")),
                "{name} is not declared in the migrations"
            );
        }
    }
}
