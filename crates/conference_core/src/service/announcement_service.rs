//! Announcement read path.
//!
//! The announcement is produced elsewhere and written to the cache; this
//! service only reads it.

use crate::cache::CacheClient;
use crate::model::announcement::{Announcement, RECENT_ANNOUNCEMENTS_KEY};

/// Reads the current announcement from an injected cache client.
pub struct AnnouncementService<C: CacheClient> {
    cache: C,
}

impl<C: CacheClient> AnnouncementService<C> {
    pub fn new(cache: C) -> Self {
        Self { cache }
    }

    /// Returns the cached announcement, or `None` when unset or expired.
    pub fn get(&self) -> Option<Announcement> {
        self.cache
            .get(RECENT_ANNOUNCEMENTS_KEY)
            .map(Announcement::new)
    }
}
