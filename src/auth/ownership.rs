use uuid::Uuid;

use crate::db::models::{Comment, Tweet, Video};
use crate::error::AuthError;
use crate::Result;

/// A record whose mutations are restricted to the principal that created it.
pub trait Owned {
    const KIND: &'static str;

    fn owner_id(&self) -> Uuid;
}

impl Owned for Comment {
    const KIND: &'static str = "comment";

    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl Owned for Tweet {
    const KIND: &'static str = "tweet";

    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl Owned for Video {
    const KIND: &'static str = "video";

    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

/// Call immediately before an update or delete. Reads never go through here.
pub fn assert_owner<R: Owned>(resource: &R, principal_id: Uuid) -> Result<()> {
    if resource.owner_id() != principal_id {
        tracing::warn!(
            kind = R::KIND,
            owner = %resource.owner_id(),
            principal = %principal_id,
            "rejected mutation by non-owner"
        );
        return Err(AuthError::NotOwner(R::KIND).into());
    }
    Ok(())
}
