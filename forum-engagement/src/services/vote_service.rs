//! The vote ledger: one current vote per user and subject, toggled in place.

use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::SqliteConnection;
use metrics::counter;
use serde::Serialize;

use forum_shared::errors::AppResult;

use crate::events::dispatcher;
use crate::events::{EngagementEvent, VoteCast};
use crate::models::{NewCommentVote, NewPostVote, VoteChange, VoteStats, VoteSubject, VoteValue};
use crate::schema::{comment_likes, comments, likes_dislikes, posts};
use crate::services::notification_service::NotificationPolicy;
use crate::services::retry::RetryPolicy;
use crate::services::users;

/// Who owns the voted subject and which post it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteTarget {
    pub author_id: i32,
    pub post_id: i32,
    pub post_title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoteReceipt {
    pub subject: VoteSubject,
    pub change: VoteChange,
    pub value: VoteValue,
    pub stats: VoteStats,
    #[serde(skip)]
    pub target: VoteTarget,
}

/// Resolve the subject's author and parent post, or `None` if it does not exist.
pub fn find_target(conn: &mut SqliteConnection, subject: VoteSubject) -> QueryResult<Option<VoteTarget>> {
    match subject {
        VoteSubject::Post(post_id) => posts::table
            .find(post_id)
            .select((posts::user_id, posts::title))
            .first::<(i32, String)>(conn)
            .optional()
            .map(|row| {
                row.map(|(author_id, post_title)| VoteTarget { author_id, post_id, post_title })
            }),
        VoteSubject::Comment(comment_id) => comments::table
            .inner_join(posts::table)
            .filter(comments::comment_id.eq(comment_id))
            .select((comments::user_id, comments::post_id, posts::title))
            .first::<(i32, i32, String)>(conn)
            .optional()
            .map(|row| {
                row.map(|(author_id, post_id, post_title)| VoteTarget { author_id, post_id, post_title })
            }),
    }
}

/// Apply a vote to the ledger.
///
/// No existing vote inserts one, the same value again removes it, and the
/// opposite value flips it. The decision runs in a write-locking transaction;
/// if a concurrent insert wins the unique constraint, the decision is made
/// once more against the row it left behind.
pub fn cast_vote(
    conn: &mut SqliteConnection,
    retry: &RetryPolicy,
    subject: VoteSubject,
    user_id: i32,
    raw_value: i32,
) -> AppResult<VoteReceipt> {
    let value = VoteValue::try_from(raw_value)?;
    let target = find_target(conn, subject)?.ok_or_else(|| subject.not_found())?;

    let change = retry.run("cast vote", || match toggle(conn, subject, user_id, value) {
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            tracing::debug!(subject = subject.as_str(), subject_id = subject.id(), user_id, "lost vote race, deciding again");
            toggle(conn, subject, user_id, value)
        }
        other => other,
    })?;

    counter!("votes_cast_total", "subject" => subject.as_str(), "change" => change.as_str()).increment(1);
    tracing::debug!(
        subject = subject.as_str(),
        subject_id = subject.id(),
        user_id,
        vote = value.as_i32(),
        change = change.as_str(),
        "vote recorded"
    );

    let stats = vote_stats(conn, subject, Some(user_id))?;
    Ok(VoteReceipt { subject, change, value, stats, target })
}

fn toggle(
    conn: &mut SqliteConnection,
    subject: VoteSubject,
    user_id: i32,
    value: VoteValue,
) -> QueryResult<VoteChange> {
    let now = Utc::now().naive_utc();

    conn.immediate_transaction(|conn| match subject {
        VoteSubject::Post(post_id) => {
            let existing = likes_dislikes::table
                .filter(likes_dislikes::post_id.eq(post_id))
                .filter(likes_dislikes::user_id.eq(user_id))
                .select((likes_dislikes::like_id, likes_dislikes::vote))
                .first::<(i32, VoteValue)>(conn)
                .optional()?;

            match existing {
                None => {
                    diesel::insert_into(likes_dislikes::table)
                        .values(&NewPostVote { post_id, user_id, vote: value, creation_date: now })
                        .execute(conn)?;
                    Ok(VoteChange::Added)
                }
                Some((id, current)) if current == value => {
                    diesel::delete(likes_dislikes::table.find(id)).execute(conn)?;
                    Ok(VoteChange::Removed)
                }
                Some((id, _)) => {
                    diesel::update(likes_dislikes::table.find(id))
                        .set((likes_dislikes::vote.eq(value), likes_dislikes::creation_date.eq(now)))
                        .execute(conn)?;
                    Ok(VoteChange::Changed)
                }
            }
        }
        VoteSubject::Comment(comment_id) => {
            let existing = comment_likes::table
                .filter(comment_likes::comment_id.eq(comment_id))
                .filter(comment_likes::user_id.eq(user_id))
                .select((comment_likes::comment_like_id, comment_likes::vote))
                .first::<(i32, VoteValue)>(conn)
                .optional()?;

            match existing {
                None => {
                    diesel::insert_into(comment_likes::table)
                        .values(&NewCommentVote { comment_id, user_id, vote: value, creation_date: now })
                        .execute(conn)?;
                    Ok(VoteChange::Added)
                }
                Some((id, current)) if current == value => {
                    diesel::delete(comment_likes::table.find(id)).execute(conn)?;
                    Ok(VoteChange::Removed)
                }
                Some((id, _)) => {
                    diesel::update(comment_likes::table.find(id))
                        .set((comment_likes::vote.eq(value), comment_likes::creation_date.eq(now)))
                        .execute(conn)?;
                    Ok(VoteChange::Changed)
                }
            }
        }
    })
}

/// Like and dislike counts for a subject plus the viewer's own vote (0 if none).
pub fn vote_stats(
    conn: &mut SqliteConnection,
    subject: VoteSubject,
    viewer_id: Option<i32>,
) -> AppResult<VoteStats> {
    let viewer_id = viewer_id.unwrap_or(0);

    let (like_count, dislike_count, user_vote) = match subject {
        VoteSubject::Post(post_id) => {
            let votes = likes_dislikes::table.filter(likes_dislikes::post_id.eq(post_id));
            let likes: i64 = votes.filter(likes_dislikes::vote.eq(VoteValue::Like)).count().get_result(conn)?;
            let dislikes: i64 = votes
                .filter(likes_dislikes::vote.eq(VoteValue::Dislike))
                .count()
                .get_result(conn)?;
            let mine = votes
                .filter(likes_dislikes::user_id.eq(viewer_id))
                .select(likes_dislikes::vote)
                .first::<VoteValue>(conn)
                .optional()?;
            (likes, dislikes, mine)
        }
        VoteSubject::Comment(comment_id) => {
            let votes = comment_likes::table.filter(comment_likes::comment_id.eq(comment_id));
            let likes: i64 = votes.filter(comment_likes::vote.eq(VoteValue::Like)).count().get_result(conn)?;
            let dislikes: i64 = votes
                .filter(comment_likes::vote.eq(VoteValue::Dislike))
                .count()
                .get_result(conn)?;
            let mine = votes
                .filter(comment_likes::user_id.eq(viewer_id))
                .select(comment_likes::vote)
                .first::<VoteValue>(conn)
                .optional()?;
            (likes, dislikes, mine)
        }
    };

    Ok(VoteStats {
        like_count,
        dislike_count,
        user_vote: user_vote.map_or(0, VoteValue::as_i32),
    })
}

/// Stats for a subject that must exist.
pub fn subject_stats(
    conn: &mut SqliteConnection,
    subject: VoteSubject,
    viewer_id: Option<i32>,
) -> AppResult<VoteStats> {
    find_target(conn, subject)?.ok_or_else(|| subject.not_found())?;
    vote_stats(conn, subject, viewer_id)
}

/// Cast a vote and tell the subject's author about it.
///
/// Notification problems never undo the vote.
pub fn record_vote(
    conn: &mut SqliteConnection,
    policy: &NotificationPolicy,
    subject: VoteSubject,
    user_id: i32,
    raw_value: i32,
) -> AppResult<VoteReceipt> {
    let receipt = cast_vote(conn, &policy.retry, subject, user_id, raw_value)?;

    if receipt.change.is_new_vote() && receipt.target.author_id != user_id {
        let event = EngagementEvent::VoteCast(VoteCast {
            subject,
            value: receipt.value,
            change: receipt.change,
            voter_id: user_id,
            voter_name: users::display_name(conn, user_id),
            author_id: receipt.target.author_id,
            post_id: receipt.target.post_id,
            post_title: receipt.target.post_title.clone(),
        });
        dispatcher::dispatch(conn, policy, &event);
    }

    Ok(receipt)
}
