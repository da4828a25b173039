use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::models::{
    AccountUpdate, Comment, Like, LikeTarget, MediaRef, NewUser, NewVideo, Page, PageRequest,
    Subscription, Tweet, User, Video, VideoFilter, VideoUpdate,
};
use crate::db::store::{ContentStore, EngagementStore, UserStore};
use crate::error::DatabaseError;
use crate::Result;

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    videos: HashMap<Uuid, Video>,
    comments: HashMap<Uuid, Comment>,
    tweets: HashMap<Uuid, Tweet>,
    likes: Vec<Like>,
    subscriptions: Vec<Subscription>,
}

/// In-process store with the same uniqueness rules as the Postgres schema.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T: Clone>(items: &[T], page: PageRequest) -> Page<T> {
    let docs = items
        .iter()
        .skip(page.offset() as usize)
        .take(page.limit as usize)
        .cloned()
        .collect();
    Page::new(docs, items.len() as u64, page)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(DatabaseError::Duplicate("users_username_key".into()).into());
        }
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(DatabaseError::Duplicate("users_email_key".into()).into());
        }
        let user = user.into_user();
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_identity(&self, identity: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == identity || u.email == identity)
            .cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.users.get(id).cloned()).collect())
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<()> {
        if let Some(user) = self.tables.write().await.users.get_mut(&id) {
            user.refresh_token = token.map(str::to_owned);
        }
        Ok(())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        let user = tables.users.get_mut(&id).ok_or(DatabaseError::NotFound)?;
        user.password_hash = password_hash.to_owned();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_account(&self, id: Uuid, update: AccountUpdate) -> Result<Option<User>> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &update.email {
            if tables
                .users
                .values()
                .any(|u| u.id != id && (&u.email == email || &u.username == email))
            {
                return Err(DatabaseError::Duplicate("users_email_key".into()).into());
            }
        }
        Ok(tables.users.get_mut(&id).map(|user| {
            if let Some(full_name) = update.full_name {
                user.full_name = full_name;
            }
            if let Some(email) = update.email {
                user.email = email;
            }
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn update_avatar(&self, id: Uuid, avatar: MediaRef) -> Result<Option<User>> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&id).map(|user| {
            user.avatar_url = avatar.url;
            user.avatar_public_id = avatar.public_id;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn update_cover_image(&self, id: Uuid, cover_image: MediaRef) -> Result<Option<User>> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&id).map(|user| {
            user.cover_image_url = Some(cover_image.url);
            user.cover_image_public_id = Some(cover_image.public_id);
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn push_watch_history(&self, id: Uuid, video_id: Uuid) -> Result<()> {
        if let Some(user) = self.tables.write().await.users.get_mut(&id) {
            user.watch_history.push(video_id);
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn create_video(&self, video: NewVideo) -> Result<Video> {
        let video = video.into_video();
        self.tables.write().await.videos.insert(video.id, video.clone());
        Ok(video)
    }

    async fn find_video(&self, id: Uuid) -> Result<Option<Video>> {
        Ok(self.tables.read().await.videos.get(&id).cloned())
    }

    async fn find_videos(&self, ids: &[Uuid]) -> Result<Vec<Video>> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.videos.get(id).cloned()).collect())
    }

    async fn list_videos(&self, filter: VideoFilter, page: PageRequest) -> Result<Page<Video>> {
        let tables = self.tables.read().await;
        let mut videos: Vec<Video> = tables
            .videos
            .values()
            .filter(|v| filter.owner_id.map_or(true, |owner| v.owner_id == owner))
            .filter(|v| !filter.published_only || v.is_published)
            .cloned()
            .collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(&videos, page))
    }

    async fn update_video(&self, id: Uuid, update: VideoUpdate) -> Result<Option<Video>> {
        let mut tables = self.tables.write().await;
        Ok(tables.videos.get_mut(&id).map(|video| {
            if let Some(title) = update.title {
                video.title = title;
            }
            if let Some(description) = update.description {
                video.description = description;
            }
            if let Some(thumbnail) = update.thumbnail {
                video.thumbnail_url = thumbnail.url;
                video.thumbnail_public_id = thumbnail.public_id;
            }
            video.updated_at = Utc::now();
            video.clone()
        }))
    }

    async fn set_video_published(&self, id: Uuid, published: bool) -> Result<Option<Video>> {
        let mut tables = self.tables.write().await;
        Ok(tables.videos.get_mut(&id).map(|video| {
            video.is_published = published;
            video.updated_at = Utc::now();
            video.clone()
        }))
    }

    async fn increment_video_views(&self, id: Uuid) -> Result<()> {
        if let Some(video) = self.tables.write().await.videos.get_mut(&id) {
            video.views += 1;
        }
        Ok(())
    }

    async fn delete_video(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let removed = tables.videos.remove(&id).is_some();
        if removed {
            let orphaned: Vec<Uuid> = tables
                .comments
                .values()
                .filter(|c| c.video_id == id)
                .map(|c| c.id)
                .collect();
            for comment_id in &orphaned {
                tables.comments.remove(comment_id);
            }
            tables.likes.retain(|like| {
                like.video_id != Some(id)
                    && like.comment_id.map_or(true, |c| !orphaned.contains(&c))
            });
        }
        Ok(removed)
    }

    async fn create_comment(&self, video_id: Uuid, owner_id: Uuid, content: &str) -> Result<Comment> {
        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            content: content.to_owned(),
            video_id,
            owner_id,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn list_comments(&self, video_id: Uuid, page: PageRequest) -> Result<Page<Comment>> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.video_id == video_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(paginate(&comments, page))
    }

    async fn update_comment(&self, id: Uuid, content: &str) -> Result<Option<Comment>> {
        let mut tables = self.tables.write().await;
        Ok(tables.comments.get_mut(&id).map(|comment| {
            comment.content = content.to_owned();
            comment.updated_at = Utc::now();
            comment.clone()
        }))
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let removed = tables.comments.remove(&id).is_some();
        tables.likes.retain(|like| like.comment_id != Some(id));
        Ok(removed)
    }

    async fn create_tweet(&self, owner_id: Uuid, content: &str) -> Result<Tweet> {
        let now = Utc::now();
        let tweet = Tweet {
            id: Uuid::new_v4(),
            content: content.to_owned(),
            owner_id,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.tweets.insert(tweet.id, tweet.clone());
        Ok(tweet)
    }

    async fn find_tweet(&self, id: Uuid) -> Result<Option<Tweet>> {
        Ok(self.tables.read().await.tweets.get(&id).cloned())
    }

    async fn list_tweets_by_owner(&self, owner_id: Uuid) -> Result<Vec<Tweet>> {
        let tables = self.tables.read().await;
        let mut tweets: Vec<Tweet> = tables
            .tweets
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        tweets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tweets)
    }

    async fn update_tweet(&self, id: Uuid, content: &str) -> Result<Option<Tweet>> {
        let mut tables = self.tables.write().await;
        Ok(tables.tweets.get_mut(&id).map(|tweet| {
            tweet.content = content.to_owned();
            tweet.updated_at = Utc::now();
            tweet.clone()
        }))
    }

    async fn delete_tweet(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let removed = tables.tweets.remove(&id).is_some();
        tables.likes.retain(|like| like.tweet_id != Some(id));
        Ok(removed)
    }
}

#[async_trait]
impl EngagementStore for MemoryStore {
    async fn toggle_like(&self, liked_by: Uuid, target: LikeTarget) -> Result<Option<Like>> {
        let mut tables = self.tables.write().await;
        let existing = tables
            .likes
            .iter()
            .position(|like| like.liked_by == liked_by && like.target() == Some(target));
        match existing {
            Some(index) => {
                tables.likes.remove(index);
                Ok(None)
            }
            None => {
                let like = Like::new(liked_by, target);
                tables.likes.push(like.clone());
                Ok(Some(like))
            }
        }
    }

    async fn liked_videos(&self, liked_by: Uuid) -> Result<Vec<Like>> {
        let tables = self.tables.read().await;
        let mut likes: Vec<Like> = tables
            .likes
            .iter()
            .filter(|like| like.liked_by == liked_by && like.video_id.is_some())
            .cloned()
            .collect();
        likes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(likes)
    }

    async fn toggle_subscription(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let existing = tables
            .subscriptions
            .iter()
            .position(|s| s.subscriber_id == subscriber_id && s.channel_id == channel_id);
        match existing {
            Some(index) => {
                tables.subscriptions.remove(index);
                Ok(false)
            }
            None => {
                tables.subscriptions.push(Subscription {
                    id: Uuid::new_v4(),
                    subscriber_id,
                    channel_id,
                    created_at: Utc::now(),
                });
                Ok(true)
            }
        }
    }

    async fn subscribers_of(&self, channel_id: Uuid) -> Result<Vec<Subscription>> {
        let tables = self.tables.read().await;
        Ok(tables
            .subscriptions
            .iter()
            .filter(|s| s.channel_id == channel_id)
            .cloned()
            .collect())
    }

    async fn subscriptions_of(&self, subscriber_id: Uuid) -> Result<Vec<Subscription>> {
        let tables = self.tables.read().await;
        Ok(tables
            .subscriptions
            .iter()
            .filter(|s| s.subscriber_id == subscriber_id)
            .cloned()
            .collect())
    }
}
