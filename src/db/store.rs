//! Storage seams consumed by the services and handlers.
//!
//! Two implementations exist: [`DbOperations`](super::DbOperations) over
//! Postgres and [`MemoryStore`](super::MemoryStore) for tests and local runs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::models::{
    AccountUpdate, Comment, Like, LikeTarget, MediaRef, NewUser, NewVideo, Page, PageRequest,
    Subscription, Tweet, User, Video, VideoFilter, VideoUpdate,
};
use crate::Result;

/// Credential store: one record per principal.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `DatabaseError::Duplicate` when username or email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Matches `identity` against username OR email.
    async fn find_user_by_identity(&self, identity: &str) -> Result<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>>;

    /// Overwrites the single live refresh token; `None` clears it.
    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<()>;

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<()>;

    async fn update_account(&self, id: Uuid, update: AccountUpdate) -> Result<Option<User>>;

    async fn update_avatar(&self, id: Uuid, avatar: MediaRef) -> Result<Option<User>>;

    async fn update_cover_image(&self, id: Uuid, cover_image: MediaRef) -> Result<Option<User>>;

    async fn push_watch_history(&self, id: Uuid, video_id: Uuid) -> Result<()>;
}

/// Videos, comments and tweets.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn create_video(&self, video: NewVideo) -> Result<Video>;
    async fn find_video(&self, id: Uuid) -> Result<Option<Video>>;
    async fn find_videos(&self, ids: &[Uuid]) -> Result<Vec<Video>>;
    async fn list_videos(&self, filter: VideoFilter, page: PageRequest) -> Result<Page<Video>>;
    async fn update_video(&self, id: Uuid, update: VideoUpdate) -> Result<Option<Video>>;
    async fn set_video_published(&self, id: Uuid, published: bool) -> Result<Option<Video>>;
    async fn increment_video_views(&self, id: Uuid) -> Result<()>;
    /// Also removes the video's comments and likes.
    async fn delete_video(&self, id: Uuid) -> Result<bool>;

    async fn create_comment(&self, video_id: Uuid, owner_id: Uuid, content: &str) -> Result<Comment>;
    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>>;
    async fn list_comments(&self, video_id: Uuid, page: PageRequest) -> Result<Page<Comment>>;
    async fn update_comment(&self, id: Uuid, content: &str) -> Result<Option<Comment>>;
    async fn delete_comment(&self, id: Uuid) -> Result<bool>;

    async fn create_tweet(&self, owner_id: Uuid, content: &str) -> Result<Tweet>;
    async fn find_tweet(&self, id: Uuid) -> Result<Option<Tweet>>;
    /// Newest first.
    async fn list_tweets_by_owner(&self, owner_id: Uuid) -> Result<Vec<Tweet>>;
    async fn update_tweet(&self, id: Uuid, content: &str) -> Result<Option<Tweet>>;
    async fn delete_tweet(&self, id: Uuid) -> Result<bool>;
}

/// Likes and subscriptions.
#[async_trait]
pub trait EngagementStore: Send + Sync {
    /// Returns the new like, or `None` when an existing like was removed.
    async fn toggle_like(&self, liked_by: Uuid, target: LikeTarget) -> Result<Option<Like>>;
    /// Video likes of a principal, newest first.
    async fn liked_videos(&self, liked_by: Uuid) -> Result<Vec<Like>>;

    /// Returns `true` when the call subscribed, `false` when it unsubscribed.
    async fn toggle_subscription(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<bool>;
    async fn subscribers_of(&self, channel_id: Uuid) -> Result<Vec<Subscription>>;
    async fn subscriptions_of(&self, subscriber_id: Uuid) -> Result<Vec<Subscription>>;
}

pub trait Store: UserStore + ContentStore + EngagementStore {}

impl<T> Store for T where T: UserStore + ContentStore + EngagementStore {}
