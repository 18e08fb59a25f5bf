use super::{RepoError, RepoResult, Repository};
use crate::models::User;

pub type UsersRepository = Repository<User>;

impl Repository<User> {
    /// Finds a user by name, falling back to email. Matching is case-insensitive
    /// and ignores surrounding whitespace.
    pub async fn get_by_login(&self, login: &str) -> RepoResult<Option<User>> {
        const OP: &str = "get_by_login";
        let login = login.trim().to_lowercase();
        let mut tx = self.begin(OP).await?;

        let by_name = sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(name) = $1 LIMIT 1")
            .bind(&login)
            .fetch_optional(&mut *tx)
            .await;

        let result = match by_name {
            Ok(Some(user)) => Ok(Some(user)),
            Ok(None) => {
                sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = $1 LIMIT 1")
                    .bind(&login)
                    .fetch_optional(&mut *tx)
                    .await
            }
            Err(e) => Err(e),
        }
        .map_err(|e| RepoError::from_sqlx::<User>(OP, e));

        Self::finish(OP, tx, result).await
    }

    pub async fn get_by_refresh_token(&self, refresh_token: &str) -> RepoResult<User> {
        const OP: &str = "get_by_refresh_token";
        let mut tx = self.begin(OP).await?;
        let result = sqlx::query_as::<_, User>("SELECT * FROM users WHERE refresh_token = $1")
            .bind(refresh_token)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| RepoError::from_sqlx::<User>(OP, e))
            .and_then(|row| row.ok_or(RepoError::NotFound { entity: "User" }));
        Self::finish(OP, tx, result).await
    }
}
