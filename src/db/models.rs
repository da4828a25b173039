use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A file held by the media store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    pub url: String,
    pub public_id: String,
}

/// Stored principal. Carries the password hash and the live refresh token,
/// so it never leaves the process as-is; see [`PublicUser`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub avatar_url: String,
    pub avatar_public_id: String,
    pub cover_image_url: Option<String>,
    pub cover_image_public_id: Option<String>,
    pub refresh_token: Option<String>,
    pub watch_history: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn avatar(&self) -> MediaRef {
        MediaRef {
            url: self.avatar_url.clone(),
            public_id: self.avatar_public_id.clone(),
        }
    }

    pub fn cover_image(&self) -> Option<MediaRef> {
        match (&self.cover_image_url, &self.cover_image_public_id) {
            (Some(url), Some(public_id)) => Some(MediaRef {
                url: url.clone(),
                public_id: public_id.clone(),
            }),
            _ => None,
        }
    }

    pub fn to_public(&self) -> PublicUser {
        PublicUser::from(self)
    }

    pub fn summary(&self) -> OwnerSummary {
        OwnerSummary {
            id: self.id,
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// Outward-facing profile: no password hash, no refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: MediaRef,
    pub cover_image: Option<MediaRef>,
    pub watch_history: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            avatar: user.avatar(),
            cover_image: user.cover_image(),
            watch_history: user.watch_history.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub avatar: MediaRef,
    pub cover_image: Option<MediaRef>,
}

impl NewUser {
    pub fn into_user(self) -> User {
        let now = Utc::now();
        let (cover_image_url, cover_image_public_id) = match self.cover_image {
            Some(cover) => (Some(cover.url), Some(cover.public_id)),
            None => (None, None),
        };
        User {
            id: Uuid::new_v4(),
            username: self.username,
            email: self.email,
            full_name: self.full_name,
            password_hash: self.password_hash,
            avatar_url: self.avatar.url,
            avatar_public_id: self.avatar.public_id,
            cover_image_url,
            cover_image_public_id,
            refresh_token: None,
            watch_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub video_url: String,
    #[serde(skip_serializing)]
    pub video_public_id: String,
    pub thumbnail_url: String,
    #[serde(skip_serializing)]
    pub thumbnail_public_id: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewVideo {
    pub video_file: MediaRef,
    pub thumbnail: MediaRef,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub owner_id: Uuid,
}

impl NewVideo {
    pub fn into_video(self) -> Video {
        let now = Utc::now();
        Video {
            id: Uuid::new_v4(),
            video_url: self.video_file.url,
            video_public_id: self.video_file.public_id,
            thumbnail_url: self.thumbnail.url,
            thumbnail_public_id: self.thumbnail.public_id,
            title: self.title,
            description: self.description,
            duration: self.duration,
            views: 0,
            is_published: true,
            owner_id: self.owner_id,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VideoUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<MediaRef>,
}

#[derive(Debug, Clone, Default)]
pub struct VideoFilter {
    pub owner_id: Option<Uuid>,
    pub published_only: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoWithOwner {
    #[serde(flatten)]
    pub video: Video,
    pub owner: Option<OwnerSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub video_id: Uuid,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub commented_by: Option<OwnerSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    pub id: Uuid,
    pub content: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Video(Uuid),
    Comment(Uuid),
    Tweet(Uuid),
}

impl LikeTarget {
    pub fn label(&self) -> &'static str {
        match self {
            LikeTarget::Video(_) => "Video",
            LikeTarget::Comment(_) => "Comment",
            LikeTarget::Tweet(_) => "Tweet",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: Uuid,
    pub liked_by: Uuid,
    pub video_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
    pub tweet_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Like {
    pub fn new(liked_by: Uuid, target: LikeTarget) -> Self {
        let (video_id, comment_id, tweet_id) = match target {
            LikeTarget::Video(id) => (Some(id), None, None),
            LikeTarget::Comment(id) => (None, Some(id), None),
            LikeTarget::Tweet(id) => (None, None, Some(id)),
        };
        Self {
            id: Uuid::new_v4(),
            liked_by,
            video_id,
            comment_id,
            tweet_id,
            created_at: Utc::now(),
        }
    }

    pub fn target(&self) -> Option<LikeTarget> {
        match (self.video_id, self.comment_id, self.tweet_id) {
            (Some(id), None, None) => Some(LikeTarget::Video(id)),
            (None, Some(id), None) => Some(LikeTarget::Comment(id)),
            (None, None, Some(id)) => Some(LikeTarget::Tweet(id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub subscriber_id: Uuid,
    pub channel_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub avatar: MediaRef,
    pub cover_image: Option<MediaRef>,
    pub subscribers_count: usize,
    pub channels_subscribed_to_count: usize,
    pub is_subscribed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    /// Clamps page to >= 1 and limit to 1..=MAX_LIMIT.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub docs: Vec<T>,
    pub total_docs: u64,
    pub limit: u32,
    pub page: u32,
    pub total_pages: u64,
    pub has_prev_page: bool,
    pub has_next_page: bool,
}

impl<T> Page<T> {
    pub fn new(docs: Vec<T>, total_docs: u64, request: PageRequest) -> Self {
        let limit = u64::from(request.limit);
        let total_pages = total_docs.div_ceil(limit).max(1);
        Self {
            docs,
            total_docs,
            limit: request.limit,
            page: request.page,
            total_pages,
            has_prev_page: request.page > 1,
            has_next_page: u64::from(request.page) < total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            docs: self.docs.into_iter().map(f).collect(),
            total_docs: self.total_docs,
            limit: self.limit,
            page: self.page,
            total_pages: self.total_pages,
            has_prev_page: self.has_prev_page,
            has_next_page: self.has_next_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user() -> NewUser {
        NewUser {
            username: "ana".into(),
            email: "ana@x.com".into(),
            full_name: "Ana".into(),
            password_hash: "$argon2id$stub".into(),
            avatar: MediaRef { url: "https://cdn/a.png".into(), public_id: "a".into() },
            cover_image: None,
        }
    }

    #[test]
    fn test_public_user_hides_secrets() {
        let mut user = new_user().into_user();
        user.refresh_token = Some("secret-refresh".into());

        let json = serde_json::to_value(user.to_public()).unwrap();
        let object = json.as_object().unwrap();
        assert!(!object.contains_key("passwordHash"));
        assert!(!object.contains_key("password"));
        assert!(!object.contains_key("refreshToken"));
        assert_eq!(json["username"], "ana");
        assert_eq!(json["avatar"]["publicId"], "a");
    }

    #[test]
    fn test_cover_image_requires_both_parts() {
        let mut user = new_user().into_user();
        assert!(user.cover_image().is_none());
        user.cover_image_url = Some("https://cdn/c.png".into());
        assert!(user.cover_image().is_none());
        user.cover_image_public_id = Some("c".into());
        assert_eq!(user.cover_image().unwrap().public_id, "c");
    }

    #[test]
    fn test_page_request_clamps() {
        let req = PageRequest::new(Some(0), Some(1000));
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, PageRequest::MAX_LIMIT);
        assert_eq!(PageRequest::new(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn test_page_metadata() {
        let page = Page::new(vec![1, 2], 12, PageRequest::new(Some(2), Some(5)));
        assert_eq!(page.total_pages, 3);
        assert!(page.has_prev_page);
        assert!(page.has_next_page);

        let empty: Page<u8> = Page::new(vec![], 0, PageRequest::default());
        assert_eq!(empty.total_pages, 1);
        assert!(!empty.has_next_page);
    }

    #[test]
    fn test_like_target_round_trips() {
        let id = Uuid::new_v4();
        let like = Like::new(Uuid::new_v4(), LikeTarget::Comment(id));
        assert_eq!(like.target(), Some(LikeTarget::Comment(id)));
        assert!(like.video_id.is_none());
    }
}
