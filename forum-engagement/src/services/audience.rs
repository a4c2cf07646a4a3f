//! Who hears about what.
//!
//! Every notification producer goes through [`AudienceRule`], so the
//! self-action and vote-removal suppressions live in exactly one place.

use crate::models::{NotificationKind, VoteChange, VoteValue};
use crate::services::notification_service::NotificationDraft;

/// Post titles are cut to this many characters inside messages.
pub const TITLE_PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudienceRule {
    /// New comment, delivered to the post author.
    PostComment,
    /// New comment, delivered to earlier commenters watching the post.
    FollowupComment,
    /// Direct reply, delivered to the parent comment's author.
    CommentReply,
    /// Like or dislike on a post, delivered to the post author.
    PostVote(VoteValue),
    /// Like or dislike on a comment, delivered to the comment author.
    CommentVote(VoteValue),
}

/// Facts about the triggering action shared by every recipient of it.
#[derive(Debug, Clone)]
pub struct EventContext<'a> {
    pub actor_id: i32,
    pub actor_name: &'a str,
    pub post_id: i32,
    pub post_title: &'a str,
    /// The new comment for comment events, the voted comment for comment votes.
    pub comment_id: Option<i32>,
}

impl AudienceRule {
    pub fn kind(self) -> NotificationKind {
        match self {
            // Replies share the comment kind so the dedup guard collapses a
            // watcher's follow-up into the reply they already received.
            AudienceRule::PostComment | AudienceRule::FollowupComment | AudienceRule::CommentReply => {
                NotificationKind::Comment
            }
            AudienceRule::PostVote(VoteValue::Like) | AudienceRule::CommentVote(VoteValue::Like) => {
                NotificationKind::Like
            }
            AudienceRule::PostVote(VoteValue::Dislike) | AudienceRule::CommentVote(VoteValue::Dislike) => {
                NotificationKind::Dislike
            }
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            AudienceRule::PostComment => "New Comment!",
            AudienceRule::FollowupComment => "New activity on a post you commented",
            AudienceRule::CommentReply => "New reply to your comment",
            AudienceRule::PostVote(VoteValue::Like) => "New Like!",
            AudienceRule::PostVote(VoteValue::Dislike) => "Someone disagreed with your post",
            AudienceRule::CommentVote(VoteValue::Like) => "Your comment got a like!",
            AudienceRule::CommentVote(VoteValue::Dislike) => "Someone disagreed with your comment",
        }
    }

    pub fn message(self, actor_name: &str, post_title: &str) -> String {
        let post = truncate_title(post_title);
        match self {
            AudienceRule::PostComment => format!("{actor_name} commented on your post '{post}'"),
            AudienceRule::FollowupComment => format!("{actor_name} also commented on '{post}'"),
            AudienceRule::CommentReply => format!("{actor_name} replied to your comment on '{post}'"),
            AudienceRule::PostVote(VoteValue::Like) => format!("{actor_name} liked your post '{post}'"),
            AudienceRule::PostVote(VoteValue::Dislike) => format!("{actor_name} disliked your post '{post}'"),
            AudienceRule::CommentVote(VoteValue::Like) => {
                format!("{actor_name} liked your comment on '{post}'")
            }
            AudienceRule::CommentVote(VoteValue::Dislike) => {
                format!("{actor_name} disliked your comment on '{post}'")
            }
        }
    }

    /// Whether `recipient` should hear about `actor`'s action.
    ///
    /// `change` is the ledger outcome for vote rules and `None` otherwise.
    pub fn permits(self, actor_id: i32, recipient_id: i32, change: Option<VoteChange>) -> bool {
        if recipient_id <= 0 || actor_id == recipient_id {
            return false;
        }
        match self {
            AudienceRule::PostVote(_) | AudienceRule::CommentVote(_) => {
                change.is_some_and(VoteChange::is_new_vote)
            }
            _ => true,
        }
    }

    pub fn draft(self, ctx: &EventContext<'_>, recipient_id: i32) -> NotificationDraft {
        let related_comment_id = match self {
            AudienceRule::PostVote(_) => None,
            _ => ctx.comment_id,
        };
        NotificationDraft {
            recipient_id,
            kind: self.kind(),
            title: self.title().to_string(),
            message: self.message(ctx.actor_name, ctx.post_title),
            related_post_id: Some(ctx.post_id),
            related_comment_id,
            related_user_id: Some(ctx.actor_id),
        }
    }
}

pub fn truncate_title(title: &str) -> String {
    match title.char_indices().nth(TITLE_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &title[..cut]),
        None => title.to_string(),
    }
}
