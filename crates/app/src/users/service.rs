//! User management service, for admins.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    auth::Profile,
    database::Db,
    users::{
        UsersServiceError,
        models::{UserListQuery, UserPage, UserStats},
        repository::PgUsersRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgUsersService {
    db: Db,
    repository: PgUsersRepository,
}

impl PgUsersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgUsersRepository::new(),
        }
    }
}

#[async_trait]
impl UsersService for PgUsersService {
    async fn stats(&self) -> Result<UserStats, UsersServiceError> {
        let mut tx = self.db.begin().await?;

        let stats = self.repository.stats(&mut tx).await?;

        tx.commit().await?;

        Ok(stats)
    }

    async fn list(&self, query: &UserListQuery) -> Result<UserPage, UsersServiceError> {
        let page = query.page();
        let size = query.page_size();

        let mut tx = self.db.begin().await?;

        let users = self
            .repository
            .list_users(&mut tx, query.status(), query.email(), size, query.offset())
            .await?;

        let total = self
            .repository
            .count_users(&mut tx, query.status(), query.email())
            .await?;

        tx.commit().await?;

        Ok(UserPage {
            total,
            page,
            size,
            users,
        })
    }

    async fn detail(&self, id: i64) -> Result<Profile, UsersServiceError> {
        let mut tx = self.db.begin().await?;

        let user = self.repository.find_user(&mut tx, id).await?;

        tx.commit().await?;

        Ok(user)
    }
}

#[automock]
#[async_trait]
pub trait UsersService: Send + Sync {
    async fn stats(&self) -> Result<UserStats, UsersServiceError>;

    /// Page through users, newest first.
    async fn list(&self, query: &UserListQuery) -> Result<UserPage, UsersServiceError>;

    async fn detail(&self, id: i64) -> Result<Profile, UsersServiceError>;
}
