use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::{Integer, Text};
use diesel::sqlite::{Sqlite, SqliteValue};
use serde::{Deserialize, Serialize};

use forum_shared::errors::{AppError, ErrorCode};

use crate::schema::{comment_likes, comments, likes_dislikes, notifications};

// ---------------------------------------------------------------------------
// Votes
// ---------------------------------------------------------------------------

/// A single user's vote on a post or comment. Stored as +1 / -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow)]
#[diesel(sql_type = Integer)]
pub enum VoteValue {
    Like,
    Dislike,
}

impl VoteValue {
    pub fn as_i32(self) -> i32 {
        match self {
            VoteValue::Like => 1,
            VoteValue::Dislike => -1,
        }
    }
}

impl TryFrom<i32> for VoteValue {
    type Error = AppError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteValue::Like),
            -1 => Ok(VoteValue::Dislike),
            other => Err(AppError::new(
                ErrorCode::InvalidVote,
                format!("vote must be 1 or -1, got {other}"),
            )),
        }
    }
}

impl Serialize for VoteValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.as_i32())
    }
}

impl ToSql<Integer, Sqlite> for VoteValue {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_i32());
        Ok(IsNull::No)
    }
}

impl FromSql<Integer, Sqlite> for VoteValue {
    fn from_sql(bytes: SqliteValue<'_, '_, '_>) -> deserialize::Result<Self> {
        let raw = <i32 as FromSql<Integer, Sqlite>>::from_sql(bytes)?;
        VoteValue::try_from(raw).map_err(|e| e.to_string().into())
    }
}

/// What a vote is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum VoteSubject {
    Post(i32),
    Comment(i32),
}

impl VoteSubject {
    pub fn id(self) -> i32 {
        match self {
            VoteSubject::Post(id) | VoteSubject::Comment(id) => id,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VoteSubject::Post(_) => "post",
            VoteSubject::Comment(_) => "comment",
        }
    }

    pub fn not_found(self) -> AppError {
        match self {
            VoteSubject::Post(_) => AppError::new(ErrorCode::PostNotFound, "post not found"),
            VoteSubject::Comment(_) => AppError::new(ErrorCode::CommentNotFound, "comment not found"),
        }
    }
}

/// Outcome of the toggle state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChange {
    Added,
    Removed,
    Changed,
}

impl VoteChange {
    /// Added and changed votes may notify; a removal never does.
    pub fn is_new_vote(self) -> bool {
        !matches!(self, VoteChange::Removed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VoteChange::Added => "added",
            VoteChange::Removed => "removed",
            VoteChange::Changed => "changed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteStats {
    pub like_count: i64,
    pub dislike_count: i64,
    /// 1, -1, or 0 when the caller has not voted.
    pub user_vote: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = likes_dislikes)]
pub struct NewPostVote {
    pub post_id: i32,
    pub user_id: i32,
    pub vote: VoteValue,
    pub creation_date: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = comment_likes)]
pub struct NewCommentVote {
    pub comment_id: i32,
    pub user_id: i32,
    pub vote: VoteValue,
    pub creation_date: NaiveDateTime,
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(Sqlite))]
pub struct Comment {
    pub comment_id: i32,
    pub post_id: i32,
    pub user_id: i32,
    pub content: String,
    pub parent_comment_id: Option<i32>,
    pub creation_date: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = comments)]
pub struct NewComment<'a> {
    pub post_id: i32,
    pub user_id: i32,
    pub content: &'a str,
    pub parent_comment_id: Option<i32>,
    pub creation_date: NaiveDateTime,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Comment,
    Reply,
    Like,
    Dislike,
    System,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Comment => "comment",
            NotificationKind::Reply => "reply",
            NotificationKind::Like => "like",
            NotificationKind::Dislike => "dislike",
            NotificationKind::System => "system",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "comment" => Ok(NotificationKind::Comment),
            "reply" => Ok(NotificationKind::Reply),
            "like" => Ok(NotificationKind::Like),
            "dislike" => Ok(NotificationKind::Dislike),
            "system" => Ok(NotificationKind::System),
            _ => Err(format!("unknown notification kind: {s}")),
        }
    }
}

impl ToSql<Text, Sqlite> for NotificationKind {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Sqlite> for NotificationKind {
    fn from_sql(bytes: SqliteValue<'_, '_, '_>) -> deserialize::Result<Self> {
        let raw = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
        raw.parse().map_err(Into::into)
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = notifications, primary_key(notification_id))]
#[diesel(check_for_backend(Sqlite))]
pub struct Notification {
    pub notification_id: i32,
    pub user_id: i32,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related_post_id: Option<i32>,
    pub related_comment_id: Option<i32>,
    pub related_user_id: Option<i32>,
    pub is_read: bool,
    pub creation_date: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotification<'a> {
    pub user_id: i32,
    pub kind: NotificationKind,
    pub title: &'a str,
    pub message: &'a str,
    pub related_post_id: Option<i32>,
    pub related_comment_id: Option<i32>,
    pub related_user_id: Option<i32>,
    pub is_read: bool,
    pub creation_date: NaiveDateTime,
}

/// Notification as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationView {
    pub id: i32,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_post_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_comment_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_user_id: Option<i32>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub time_ago: String,
}

impl NotificationView {
    pub fn new(notification: Notification, now: NaiveDateTime) -> Self {
        Self {
            id: notification.notification_id,
            kind: notification.kind,
            title: notification.title,
            message: notification.message,
            related_post_id: notification.related_post_id,
            related_comment_id: notification.related_comment_id,
            related_user_id: notification.related_user_id,
            is_read: notification.is_read,
            created_at: Utc.from_utc_datetime(&notification.creation_date),
            time_ago: format_time_ago(notification.creation_date, now),
        }
    }
}

/// Unread and read notifications, paginated independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationFeed {
    pub unread: Vec<NotificationView>,
    pub read: Vec<NotificationView>,
    pub page: i64,
    pub limit: i64,
}

pub fn format_time_ago(then: NaiveDateTime, now: NaiveDateTime) -> String {
    let elapsed = now.signed_duration_since(then);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "just now".to_string()
    } else if hours < 1 {
        format!("{minutes} minutes ago")
    } else if days < 1 {
        format!("{hours} hours ago")
    } else if days < 30 {
        format!("{days} days ago")
    } else if days < 360 {
        format!("{} months ago", days / 30)
    } else {
        format!("{} years ago", days / 365)
    }
}
