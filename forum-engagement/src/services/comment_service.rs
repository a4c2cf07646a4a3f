use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use forum_shared::errors::{AppError, AppResult, ErrorCode};

use crate::events::dispatcher;
use crate::events::{CommentCreated, EngagementEvent};
use crate::models::{Comment, NewComment};
use crate::schema::{comment_likes, comments, posts};
use crate::services::notification_service::NotificationPolicy;
use crate::services::retry::RetryPolicy;
use crate::services::users;

/// Insert a comment, then notify the post author, the parent author and the
/// thread's earlier commenters.
pub fn create_comment(
    conn: &mut SqliteConnection,
    policy: &NotificationPolicy,
    post_id: i32,
    user_id: i32,
    content: &str,
    parent_comment_id: Option<i32>,
) -> AppResult<Comment> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::new(ErrorCode::EmptyComment, "comment cannot be empty"));
    }

    let (post_author_id, post_title) = posts::table
        .find(post_id)
        .select((posts::user_id, posts::title))
        .first::<(i32, String)>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::PostNotFound, "post not found"))?;

    // A reply must point at a comment on the same post.
    let parent_author_id = match parent_comment_id {
        Some(parent_id) => Some(
            comments::table
                .filter(comments::comment_id.eq(parent_id))
                .filter(comments::post_id.eq(post_id))
                .select(comments::user_id)
                .first::<i32>(conn)
                .optional()?
                .ok_or_else(|| AppError::new(ErrorCode::CommentNotFound, "parent comment not found"))?,
        ),
        None => None,
    };

    let row = NewComment {
        post_id,
        user_id,
        content,
        parent_comment_id,
        creation_date: Utc::now().naive_utc(),
    };

    let comment = policy.retry.run("insert comment", || {
        diesel::insert_into(comments::table)
            .values(&row)
            .returning(Comment::as_returning())
            .get_result(conn)
    })?;

    tracing::info!(
        comment_id = comment.comment_id,
        post_id,
        user_id,
        parent_comment_id = ?parent_comment_id,
        "comment created"
    );

    let event = EngagementEvent::CommentCreated(CommentCreated {
        post_id,
        post_author_id,
        post_title,
        comment_id: comment.comment_id,
        commenter_id: user_id,
        commenter_name: users::display_name(conn, user_id),
        parent_author_id,
    });
    dispatcher::dispatch(conn, policy, &event);

    Ok(comment)
}

/// Delete a comment and its votes. Only the author may do this.
///
/// Replies stay and lose their parent link. Notifications that point at the
/// comment are left in place.
pub fn delete_comment(
    conn: &mut SqliteConnection,
    retry: &RetryPolicy,
    comment_id: i32,
    user_id: i32,
) -> AppResult<()> {
    let author_id = comments::table
        .find(comment_id)
        .select(comments::user_id)
        .first::<i32>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::CommentNotFound, "comment not found"))?;

    if author_id != user_id {
        return Err(AppError::new(ErrorCode::NotContentAuthor, "only the author can delete this comment"));
    }

    let votes = retry.run("delete comment", || {
        conn.transaction(|conn| {
            let votes = diesel::delete(comment_likes::table.filter(comment_likes::comment_id.eq(comment_id)))
                .execute(conn)?;
            diesel::update(comments::table.filter(comments::parent_comment_id.eq(comment_id)))
                .set(comments::parent_comment_id.eq(None::<i32>))
                .execute(conn)?;
            diesel::delete(comments::table.find(comment_id)).execute(conn)?;
            Ok(votes)
        })
    })?;

    tracing::info!(comment_id, user_id, votes, "comment deleted");
    Ok(())
}
