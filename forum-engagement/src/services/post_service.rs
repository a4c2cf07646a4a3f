use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Serialize;

use forum_shared::errors::{AppError, AppResult, ErrorCode};

use crate::schema::{comment_likes, comments, likes_dislikes, notifications, post_categories, posts};
use crate::services::retry::RetryPolicy;

/// Rows removed along with a post.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PostDeletion {
    pub post_votes: usize,
    pub comment_votes: usize,
    pub comments: usize,
    pub notifications: usize,
}

/// Delete a post and everything hanging off it, in one transaction.
pub fn delete_post(
    conn: &mut SqliteConnection,
    retry: &RetryPolicy,
    post_id: i32,
    user_id: i32,
) -> AppResult<PostDeletion> {
    let author_id = posts::table
        .find(post_id)
        .select(posts::user_id)
        .first::<i32>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::PostNotFound, "post not found"))?;

    if author_id != user_id {
        return Err(AppError::new(ErrorCode::NotContentAuthor, "only the author can delete this post"));
    }

    let deletion = retry.run("delete post", || {
        conn.transaction(|conn| {
            let post_comments = comments::table
                .filter(comments::post_id.eq(post_id))
                .select(comments::comment_id);

            let post_votes = diesel::delete(likes_dislikes::table.filter(likes_dislikes::post_id.eq(post_id)))
                .execute(conn)?;
            let comment_votes =
                diesel::delete(comment_likes::table.filter(comment_likes::comment_id.eq_any(post_comments)))
                    .execute(conn)?;
            let comments = diesel::delete(comments::table.filter(comments::post_id.eq(post_id))).execute(conn)?;
            diesel::delete(post_categories::table.filter(post_categories::post_id.eq(post_id))).execute(conn)?;
            let notifications =
                diesel::delete(notifications::table.filter(notifications::related_post_id.eq(post_id)))
                    .execute(conn)?;
            diesel::delete(posts::table.find(post_id)).execute(conn)?;

            Ok(PostDeletion { post_votes, comment_votes, comments, notifications })
        })
    })?;

    tracing::info!(
        post_id,
        user_id,
        post_votes = deletion.post_votes,
        comment_votes = deletion.comment_votes,
        comments = deletion.comments,
        notifications = deletion.notifications,
        "post deleted"
    );
    Ok(deletion)
}
