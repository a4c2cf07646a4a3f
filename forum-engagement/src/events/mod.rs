pub mod dispatcher;

use crate::models::{VoteChange, VoteSubject, VoteValue};

/// A new comment, with everything the audience rules need to address it.
#[derive(Debug, Clone)]
pub struct CommentCreated {
    pub post_id: i32,
    pub post_author_id: i32,
    pub post_title: String,
    pub comment_id: i32,
    pub commenter_id: i32,
    pub commenter_name: String,
    /// Author of the comment being replied to, if any.
    pub parent_author_id: Option<i32>,
}

/// A vote that went through the ledger.
#[derive(Debug, Clone)]
pub struct VoteCast {
    pub subject: VoteSubject,
    pub value: VoteValue,
    pub change: VoteChange,
    pub voter_id: i32,
    pub voter_name: String,
    /// Author of the post or comment that was voted on.
    pub author_id: i32,
    pub post_id: i32,
    pub post_title: String,
}

#[derive(Debug, Clone)]
pub enum EngagementEvent {
    CommentCreated(CommentCreated),
    VoteCast(VoteCast),
}

impl EngagementEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EngagementEvent::CommentCreated(_) => "comment.created",
            EngagementEvent::VoteCast(_) => "vote.cast",
        }
    }
}
