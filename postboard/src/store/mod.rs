//! Store: the single database handle shared by every request.
//!
//! Wraps a pooled sea-orm connection and exposes create/read/update/destroy
//! for users and posts, plus the joined reads that follow the one-to-many
//! user/post association. Field validation happens here, before any
//! write; database failures are folded into [`StoreError`].

mod entities;
mod error;
mod seed;
mod validation;


use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection,
    EntityTrait, IntoActiveModel, ModelTrait, QueryFilter, QueryOrder, Schema, Set,
};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::DatabaseConfig;

pub use entities::{post, user};
pub use error::StoreError;
pub use seed::FIXTURE_USER_UUIDS;
pub use validation::{
    IssueKind, PostAttributes, UserAttributes, ValidationErrors, ValidationIssue,
};

pub type StoreResult<T> = Result<T, StoreError>;

/// A user together with every post it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserWithPosts {
    #[serde(flatten)]
    pub user: user::Model,
    pub posts: Vec<post::Model>,
}

/// A post together with its owning user, serialized under `user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostWithUser {
    #[serde(flatten)]
    pub post: post::Model,
    pub user: Option<user::Model>,
}

#[derive(Debug, Clone)]
pub struct Store {
    conn: DatabaseConnection,
}

impl Store {
    /// Opens the connection pool and verifies the database answers.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let mut options = ConnectOptions::new(config.url.clone());
        options
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(config.connect_timeout)
            .acquire_timeout(config.connect_timeout)
            .sqlx_logging(config.log_statements);

        let conn = Database::connect(options).await?;
        let store = Self { conn };
        store.ping().await?;
        info!(backend = config.backend_name(), "database connection verified");
        Ok(store)
    }

    pub async fn ping(&self) -> StoreResult<()> {
        self.conn.ping().await?;
        Ok(())
    }

    pub async fn close(self) -> StoreResult<()> {
        self.conn.close().await?;
        debug!("database connection closed");
        Ok(())
    }

    /// Creates the `users` and `posts` tables from the entity definitions.
    /// Existing tables are left untouched.
    pub async fn create_schema(&self) -> StoreResult<()> {
        let backend = self.conn.get_database_backend();
        let schema = Schema::new(backend);

        let mut users = schema.create_table_from_entity(user::Entity);
        users.if_not_exists();
        self.conn.execute(backend.build(&users)).await?;

        let mut posts = schema.create_table_from_entity(post::Entity);
        posts.if_not_exists();
        self.conn.execute(backend.build(&posts)).await?;

        info!("schema ready");
        Ok(())
    }

    pub async fn create_user(&self, attributes: UserAttributes) -> StoreResult<user::Model> {
        let fields = attributes.validate()?;
        let now = Utc::now();
        let created = user::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            name: Set(fields.name),
            email: Set(fields.email),
            role: Set(fields.role),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;
        debug!(id = created.id, uuid = %created.uuid, "user inserted");
        Ok(created)
    }

    pub async fn list_users(&self) -> StoreResult<Vec<user::Model>> {
        let users = user::Entity::find()
            .order_by_asc(user::Column::Id)
            .all(&self.conn)
            .await?;
        Ok(users)
    }

    pub async fn find_user(&self, uuid: Uuid) -> StoreResult<Option<user::Model>> {
        let found = user::Entity::find()
            .filter(user::Column::Uuid.eq(uuid))
            .one(&self.conn)
            .await?;
        Ok(found)
    }

    pub async fn find_user_with_posts(&self, uuid: Uuid) -> StoreResult<Option<UserWithPosts>> {
        let Some(user) = self.find_user(uuid).await? else {
            return Ok(None);
        };
        let posts = user
            .find_related(post::Entity)
            .order_by_asc(post::Column::Id)
            .all(&self.conn)
            .await?;
        Ok(Some(UserWithPosts { user, posts }))
    }

    /// Overwrites name, email and role and persists the change.
    pub async fn update_user(
        &self,
        uuid: Uuid,
        attributes: UserAttributes,
    ) -> StoreResult<user::Model> {
        let fields = attributes.validate()?;
        let mut active = self.require_user(uuid).await?.into_active_model();
        active.name = Set(fields.name);
        active.email = Set(fields.email);
        active.role = Set(fields.role);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&self.conn).await?;
        debug!(id = updated.id, uuid = %updated.uuid, "user updated");
        Ok(updated)
    }

    /// Removes the user; owned posts go with it through the foreign key cascade.
    pub async fn delete_user(&self, uuid: Uuid) -> StoreResult<()> {
        let user = self.require_user(uuid).await?;
        let id = user.id;
        user.delete(&self.conn).await?;
        debug!(id, uuid = %uuid, "user deleted");
        Ok(())
    }

    pub async fn create_post(&self, attributes: PostAttributes) -> StoreResult<post::Model> {
        let fields = attributes.validate()?;
        let owner = self.require_user(fields.user_uuid).await?;
        let now = Utc::now();
        let created = post::ActiveModel {
            body: Set(fields.body),
            user_id: Set(owner.id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;
        debug!(id = created.id, user_id = owner.id, "post inserted");
        Ok(created)
    }

    pub async fn list_posts(&self) -> StoreResult<Vec<post::Model>> {
        let posts = post::Entity::find()
            .order_by_asc(post::Column::Id)
            .all(&self.conn)
            .await?;
        Ok(posts)
    }

    pub async fn list_posts_with_user(&self) -> StoreResult<Vec<PostWithUser>> {
        let rows = post::Entity::find()
            .find_also_related(user::Entity)
            .order_by_asc(post::Column::Id)
            .all(&self.conn)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(post, user)| PostWithUser { post, user })
            .collect())
    }

    pub async fn find_post(&self, id: i32) -> StoreResult<Option<post::Model>> {
        Ok(post::Entity::find_by_id(id).one(&self.conn).await?)
    }

    pub async fn destroy_post(&self, id: i32) -> StoreResult<()> {
        let post = self
            .find_post(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("post {id} not found")))?;
        post.delete(&self.conn).await?;
        debug!(id, "post deleted");
        Ok(())
    }

    async fn require_user(&self, uuid: Uuid) -> StoreResult<user::Model> {
        self.find_user(uuid)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {uuid} not found")))
    }
}
