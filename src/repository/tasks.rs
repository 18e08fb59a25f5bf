use super::{RepoError, RepoResult, Repository};
use crate::models::Task;

pub type TasksRepository = Repository<Task>;

impl Repository<Task> {
    /// Case-insensitive substring match on title or description.
    pub async fn search(&self, term: &str) -> RepoResult<Vec<Task>> {
        const OP: &str = "search";
        let mut tx = self.begin(OP).await?;
        // strpos keeps `%` and `_` in the term literal.
        let result = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks \
             WHERE strpos(lower(title), lower($1)) > 0 \
                OR strpos(lower(coalesce(description, '')), lower($1)) > 0 \
             ORDER BY id",
        )
        .bind(term)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| RepoError::from_sqlx::<Task>(OP, e));
        Self::finish(OP, tx, result).await
    }

    pub async fn get_by_owner(&self, user_id: i32) -> RepoResult<Vec<Task>> {
        const OP: &str = "get_by_owner";
        let mut tx = self.begin(OP).await?;
        let result = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE user_id = $1 ORDER BY id")
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| RepoError::from_sqlx::<Task>(OP, e));
        Self::finish(OP, tx, result).await
    }
}
