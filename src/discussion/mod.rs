//! Course discussion boards
//!
//! A board holds top-level posts, each with a flat list of replies.
//! Replies cannot themselves be replied to.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};

/// A reply to a discussion post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionReply {
    /// Reply id (`reply-<post>.<n>`)
    pub id: String,
    pub author: String,
    pub content: String,
    /// Unix timestamp of creation
    pub created_at: i64,
}

/// A top-level discussion post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionPost {
    /// Post id (`post-<n>`)
    pub id: String,
    pub author: String,
    pub content: String,
    /// Unix timestamp of creation
    pub created_at: i64,
    /// Replies in the order they were written
    #[serde(default)]
    pub replies: Vec<DiscussionReply>,
}

/// All discussion for one course
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionBoard {
    /// Posts in the order they were written
    pub posts: Vec<DiscussionPost>,
    /// Counter backing post ids
    #[serde(default)]
    next_post: u32,
}

impl DiscussionBoard {
    /// Add a top-level post
    pub fn post(&mut self, author: &str, content: &str, created_at: i64) -> Result<&DiscussionPost> {
        let content = normalize(content)?;
        // Boards written without a counter start after the highest existing post
        self.next_post = self.next_post.max(self.posts.len() as u32) + 1;
        self.posts.push(DiscussionPost {
            id: format!("post-{}", self.next_post),
            author: author.trim().to_string(),
            content,
            created_at,
            replies: Vec::new(),
        });
        Ok(&self.posts[self.posts.len() - 1])
    }

    /// Reply to an existing post
    pub fn reply(
        &mut self,
        post_id: &str,
        author: &str,
        content: &str,
        created_at: i64,
    ) -> Result<&DiscussionReply> {
        let content = normalize(content)?;
        let post = self
            .posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| TrackerError::UnknownPost(post_id.to_string()))?;

        let number = post.replies.len() + 1;
        let id = format!("reply-{}.{}", post.id.trim_start_matches("post-"), number);
        post.replies.push(DiscussionReply {
            id,
            author: author.trim().to_string(),
            content,
            created_at,
        });
        Ok(&post.replies[post.replies.len() - 1])
    }

    /// Find a post by id
    pub fn find(&self, post_id: &str) -> Option<&DiscussionPost> {
        self.posts.iter().find(|p| p.id == post_id)
    }

    /// Number of posts plus replies
    pub fn message_count(&self) -> usize {
        self.posts.iter().map(|p| 1 + p.replies.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

fn normalize(content: &str) -> Result<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() { Err(TrackerError::EmptyPost) } else { Ok(trimmed.to_string()) }
}

/// Current unix timestamp in seconds
pub fn now_timestamp() -> i64 {
    SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).map_or(0, |d| d.as_secs() as i64)
}
