use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::db::models::{
    AccountUpdate, Comment, Like, LikeTarget, MediaRef, NewUser, NewVideo, Page, PageRequest,
    Subscription, Tweet, User, Video, VideoFilter, VideoUpdate,
};
use crate::db::store::{ContentStore, EngagementStore, UserStore};
use crate::error::DatabaseError;
use crate::Result;

const USER_COLUMNS: &str = "id, username, email, full_name, password_hash, avatar_url, \
    avatar_public_id, cover_image_url, cover_image_public_id, refresh_token, watch_history, \
    created_at, updated_at";

const VIDEO_COLUMNS: &str = "id, video_url, video_public_id, thumbnail_url, thumbnail_public_id, \
    title, description, duration, views, is_published, owner_id, created_at, updated_at";

/// Postgres-backed store.
pub struct DbOperations {
    pool: Arc<PgPool>,
}

impl DbOperations {
    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        Ok(Self { pool: Arc::new(pool) })
    }

    pub fn pool(&self) -> &PgPool {
        self.pool.as_ref()
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(self.pool()).await?;
        Ok(())
    }

    pub async fn begin_transaction(&self) -> Result<Transaction<'_, Postgres>> {
        Ok(self.pool.as_ref().begin().await?)
    }
}

#[async_trait]
impl UserStore for DbOperations {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let user = user.into_user();
        let query = format!(
            "INSERT INTO users ({USER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {USER_COLUMNS}"
        );
        let created = sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.full_name)
            .bind(&user.password_hash)
            .bind(&user.avatar_url)
            .bind(&user.avatar_public_id)
            .bind(&user.cover_image_url)
            .bind(&user.cover_image_public_id)
            .bind(&user.refresh_token)
            .bind(&user.watch_history)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(self.pool())
            .await?;

        Ok(created)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(self.pool())
            .await?)
    }

    async fn find_user_by_identity(&self, identity: &str) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = $1");
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(identity)
            .fetch_optional(self.pool())
            .await?)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(self.pool())
            .await?)
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)");
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(ids)
            .fetch_all(self.pool())
            .await?)
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<()> {
        sqlx::query("UPDATE users SET refresh_token = $1 WHERE id = $2")
            .bind(token)
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<()> {
        let result = sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound.into());
        }
        Ok(())
    }

    async fn update_account(&self, id: Uuid, update: AccountUpdate) -> Result<Option<User>> {
        if let Some(email) = &update.email {
            let taken: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM users WHERE id <> $1 AND (username = $2 OR email = $2) LIMIT 1")
                    .bind(id)
                    .bind(email)
                    .fetch_optional(self.pool())
                    .await?;
            if taken.is_some() {
                return Err(DatabaseError::Duplicate("users_email_key".into()).into());
            }
        }

        let query = format!(
            "UPDATE users SET full_name = COALESCE($1, full_name), email = COALESCE($2, email), \
             updated_at = now() WHERE id = $3 RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(update.full_name)
            .bind(update.email)
            .bind(id)
            .fetch_optional(self.pool())
            .await?)
    }

    async fn update_avatar(&self, id: Uuid, avatar: MediaRef) -> Result<Option<User>> {
        let query = format!(
            "UPDATE users SET avatar_url = $1, avatar_public_id = $2, updated_at = now() \
             WHERE id = $3 RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(avatar.url)
            .bind(avatar.public_id)
            .bind(id)
            .fetch_optional(self.pool())
            .await?)
    }

    async fn update_cover_image(&self, id: Uuid, cover_image: MediaRef) -> Result<Option<User>> {
        let query = format!(
            "UPDATE users SET cover_image_url = $1, cover_image_public_id = $2, updated_at = now() \
             WHERE id = $3 RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(cover_image.url)
            .bind(cover_image.public_id)
            .bind(id)
            .fetch_optional(self.pool())
            .await?)
    }

    async fn push_watch_history(&self, id: Uuid, video_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET watch_history = array_append(watch_history, $1) WHERE id = $2")
            .bind(video_id)
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(())
    }
}

#[async_trait]
impl ContentStore for DbOperations {
    async fn create_video(&self, video: NewVideo) -> Result<Video> {
        let video = video.into_video();
        let query = format!(
            "INSERT INTO videos ({VIDEO_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {VIDEO_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Video>(&query)
            .bind(video.id)
            .bind(&video.video_url)
            .bind(&video.video_public_id)
            .bind(&video.thumbnail_url)
            .bind(&video.thumbnail_public_id)
            .bind(&video.title)
            .bind(&video.description)
            .bind(video.duration)
            .bind(video.views)
            .bind(video.is_published)
            .bind(video.owner_id)
            .bind(video.created_at)
            .bind(video.updated_at)
            .fetch_one(self.pool())
            .await?)
    }

    async fn find_video(&self, id: Uuid) -> Result<Option<Video>> {
        let query = format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1");
        Ok(sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(self.pool())
            .await?)
    }

    async fn find_videos(&self, ids: &[Uuid]) -> Result<Vec<Video>> {
        let query = format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = ANY($1)");
        Ok(sqlx::query_as::<_, Video>(&query)
            .bind(ids)
            .fetch_all(self.pool())
            .await?)
    }

    async fn list_videos(&self, filter: VideoFilter, page: PageRequest) -> Result<Page<Video>> {
        let predicate = "($1::uuid IS NULL OR owner_id = $1) AND (NOT $2 OR is_published)";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM videos WHERE {predicate}"))
            .bind(filter.owner_id)
            .bind(filter.published_only)
            .fetch_one(self.pool())
            .await?;

        let query = format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE {predicate} \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        );
        let videos = sqlx::query_as::<_, Video>(&query)
            .bind(filter.owner_id)
            .bind(filter.published_only)
            .bind(i64::from(page.limit))
            .bind(page.offset() as i64)
            .fetch_all(self.pool())
            .await?;

        Ok(Page::new(videos, total as u64, page))
    }

    async fn update_video(&self, id: Uuid, update: VideoUpdate) -> Result<Option<Video>> {
        let (thumbnail_url, thumbnail_public_id) = match update.thumbnail {
            Some(thumbnail) => (Some(thumbnail.url), Some(thumbnail.public_id)),
            None => (None, None),
        };
        let query = format!(
            "UPDATE videos SET title = COALESCE($1, title), description = COALESCE($2, description), \
             thumbnail_url = COALESCE($3, thumbnail_url), \
             thumbnail_public_id = COALESCE($4, thumbnail_public_id), updated_at = now() \
             WHERE id = $5 RETURNING {VIDEO_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Video>(&query)
            .bind(update.title)
            .bind(update.description)
            .bind(thumbnail_url)
            .bind(thumbnail_public_id)
            .bind(id)
            .fetch_optional(self.pool())
            .await?)
    }

    async fn set_video_published(&self, id: Uuid, published: bool) -> Result<Option<Video>> {
        let query = format!(
            "UPDATE videos SET is_published = $1, updated_at = now() WHERE id = $2 \
             RETURNING {VIDEO_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Video>(&query)
            .bind(published)
            .bind(id)
            .fetch_optional(self.pool())
            .await?)
    }

    async fn increment_video_views(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE videos SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(())
    }

    async fn delete_video(&self, id: Uuid) -> Result<bool> {
        // comments and likes go with the video through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_comment(&self, video_id: Uuid, owner_id: Uuid, content: &str) -> Result<Comment> {
        Ok(sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (id, content, video_id, owner_id) VALUES ($1, $2, $3, $4) \
             RETURNING id, content, video_id, owner_id, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(content)
        .bind(video_id)
        .bind(owner_id)
        .fetch_one(self.pool())
        .await?)
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        Ok(sqlx::query_as::<_, Comment>(
            "SELECT id, content, video_id, owner_id, created_at, updated_at FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?)
    }

    async fn list_comments(&self, video_id: Uuid, page: PageRequest) -> Result<Page<Comment>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE video_id = $1")
            .bind(video_id)
            .fetch_one(self.pool())
            .await?;

        let comments = sqlx::query_as::<_, Comment>(
            "SELECT id, content, video_id, owner_id, created_at, updated_at FROM comments \
             WHERE video_id = $1 ORDER BY created_at ASC LIMIT $2 OFFSET $3",
        )
        .bind(video_id)
        .bind(i64::from(page.limit))
        .bind(page.offset() as i64)
        .fetch_all(self.pool())
        .await?;

        Ok(Page::new(comments, total as u64, page))
    }

    async fn update_comment(&self, id: Uuid, content: &str) -> Result<Option<Comment>> {
        Ok(sqlx::query_as::<_, Comment>(
            "UPDATE comments SET content = $1, updated_at = now() WHERE id = $2 \
             RETURNING id, content, video_id, owner_id, created_at, updated_at",
        )
        .bind(content)
        .bind(id)
        .fetch_optional(self.pool())
        .await?)
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_tweet(&self, owner_id: Uuid, content: &str) -> Result<Tweet> {
        Ok(sqlx::query_as::<_, Tweet>(
            "INSERT INTO tweets (id, content, owner_id) VALUES ($1, $2, $3) \
             RETURNING id, content, owner_id, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(content)
        .bind(owner_id)
        .fetch_one(self.pool())
        .await?)
    }

    async fn find_tweet(&self, id: Uuid) -> Result<Option<Tweet>> {
        Ok(sqlx::query_as::<_, Tweet>(
            "SELECT id, content, owner_id, created_at, updated_at FROM tweets WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?)
    }

    async fn list_tweets_by_owner(&self, owner_id: Uuid) -> Result<Vec<Tweet>> {
        Ok(sqlx::query_as::<_, Tweet>(
            "SELECT id, content, owner_id, created_at, updated_at FROM tweets \
             WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(self.pool())
        .await?)
    }

    async fn update_tweet(&self, id: Uuid, content: &str) -> Result<Option<Tweet>> {
        Ok(sqlx::query_as::<_, Tweet>(
            "UPDATE tweets SET content = $1, updated_at = now() WHERE id = $2 \
             RETURNING id, content, owner_id, created_at, updated_at",
        )
        .bind(content)
        .bind(id)
        .fetch_optional(self.pool())
        .await?)
    }

    async fn delete_tweet(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tweets WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl EngagementStore for DbOperations {
    async fn toggle_like(&self, liked_by: Uuid, target: LikeTarget) -> Result<Option<Like>> {
        let like = Like::new(liked_by, target);
        let mut transaction = self.begin_transaction().await?;

        let removed = sqlx::query(
            "DELETE FROM likes WHERE liked_by = $1 \
             AND video_id IS NOT DISTINCT FROM $2 \
             AND comment_id IS NOT DISTINCT FROM $3 \
             AND tweet_id IS NOT DISTINCT FROM $4",
        )
        .bind(liked_by)
        .bind(like.video_id)
        .bind(like.comment_id)
        .bind(like.tweet_id)
        .execute(&mut *transaction)
        .await?;

        if removed.rows_affected() > 0 {
            transaction.commit().await?;
            return Ok(None);
        }

        let created = sqlx::query_as::<_, Like>(
            "INSERT INTO likes (id, liked_by, video_id, comment_id, tweet_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, liked_by, video_id, comment_id, tweet_id, created_at",
        )
        .bind(like.id)
        .bind(like.liked_by)
        .bind(like.video_id)
        .bind(like.comment_id)
        .bind(like.tweet_id)
        .bind(like.created_at)
        .fetch_one(&mut *transaction)
        .await?;

        transaction.commit().await?;
        Ok(Some(created))
    }

    async fn liked_videos(&self, liked_by: Uuid) -> Result<Vec<Like>> {
        Ok(sqlx::query_as::<_, Like>(
            "SELECT id, liked_by, video_id, comment_id, tweet_id, created_at FROM likes \
             WHERE liked_by = $1 AND video_id IS NOT NULL ORDER BY created_at DESC",
        )
        .bind(liked_by)
        .fetch_all(self.pool())
        .await?)
    }

    async fn toggle_subscription(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<bool> {
        let mut transaction = self.begin_transaction().await?;

        let removed = sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = $1 AND channel_id = $2")
            .bind(subscriber_id)
            .bind(channel_id)
            .execute(&mut *transaction)
            .await?;

        if removed.rows_affected() == 0 {
            sqlx::query("INSERT INTO subscriptions (id, subscriber_id, channel_id) VALUES ($1, $2, $3)")
                .bind(Uuid::new_v4())
                .bind(subscriber_id)
                .bind(channel_id)
                .execute(&mut *transaction)
                .await?;
        }

        transaction.commit().await?;
        Ok(removed.rows_affected() == 0)
    }

    async fn subscribers_of(&self, channel_id: Uuid) -> Result<Vec<Subscription>> {
        Ok(sqlx::query_as::<_, Subscription>(
            "SELECT id, subscriber_id, channel_id, created_at FROM subscriptions \
             WHERE channel_id = $1 ORDER BY created_at ASC",
        )
        .bind(channel_id)
        .fetch_all(self.pool())
        .await?)
    }

    async fn subscriptions_of(&self, subscriber_id: Uuid) -> Result<Vec<Subscription>> {
        Ok(sqlx::query_as::<_, Subscription>(
            "SELECT id, subscriber_id, channel_id, created_at FROM subscriptions \
             WHERE subscriber_id = $1 ORDER BY created_at ASC",
        )
        .bind(subscriber_id)
        .fetch_all(self.pool())
        .await?)
    }
}
