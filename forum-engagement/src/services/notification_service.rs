use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use metrics::counter;

use forum_shared::errors::{AppError, AppResult, ErrorCode};
use forum_shared::types::pagination::PaginationParams;

use crate::models::{NewNotification, Notification, NotificationFeed, NotificationKind, NotificationView, VoteChange};
use crate::schema::{comments, notifications, posts};
use crate::services::audience::{AudienceRule, EventContext};
use crate::services::retry::RetryPolicy;

/// Tunables for the notification engine.
#[derive(Debug, Clone, Copy)]
pub struct NotificationPolicy {
    /// Identical notifications inside this window are dropped.
    pub dedup_window: chrono::Duration,
    /// Read notifications older than this are swept.
    pub retention: chrono::Duration,
    pub retry: RetryPolicy,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self {
            dedup_window: chrono::Duration::hours(1),
            retention: chrono::Duration::days(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// Everything needed to write one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub recipient_id: i32,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related_post_id: Option<i32>,
    pub related_comment_id: Option<i32>,
    pub related_user_id: Option<i32>,
}

/// What `create_notification` did. Suppressions are successes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Created,
    SkippedSelf,
    SkippedDuplicate,
}

impl Delivery {
    pub fn is_created(self) -> bool {
        matches!(self, Delivery::Created)
    }

    fn reason(self) -> &'static str {
        match self {
            Delivery::Created => "created",
            Delivery::SkippedSelf => "self_action",
            Delivery::SkippedDuplicate => "duplicate",
        }
    }
}

/// Outcome of a fan-out across several recipients.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanoutReport {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Create a notification unless it targets the actor or duplicates a recent one.
pub fn create_notification(
    conn: &mut SqliteConnection,
    policy: &NotificationPolicy,
    draft: &NotificationDraft,
) -> AppResult<Delivery> {
    if draft.recipient_id <= 0 || draft.related_user_id == Some(draft.recipient_id) {
        return Ok(suppressed(draft, Delivery::SkippedSelf));
    }

    let now = Utc::now().naive_utc();
    if has_recent_duplicate(conn, draft, now - policy.dedup_window)? {
        return Ok(suppressed(draft, Delivery::SkippedDuplicate));
    }

    let row = NewNotification {
        user_id: draft.recipient_id,
        kind: draft.kind,
        title: &draft.title,
        message: &draft.message,
        related_post_id: draft.related_post_id,
        related_comment_id: draft.related_comment_id,
        related_user_id: draft.related_user_id,
        is_read: false,
        creation_date: now,
    };

    policy.retry.run("insert notification", || {
        diesel::insert_into(notifications::table)
            .values(&row)
            .execute(conn)
    })?;

    counter!("notifications_created_total", "kind" => draft.kind.as_str()).increment(1);
    tracing::debug!(
        user_id = draft.recipient_id,
        kind = %draft.kind,
        related_post_id = ?draft.related_post_id,
        related_comment_id = ?draft.related_comment_id,
        related_user_id = ?draft.related_user_id,
        "notification created"
    );

    Ok(Delivery::Created)
}

fn suppressed(draft: &NotificationDraft, delivery: Delivery) -> Delivery {
    counter!("notifications_suppressed_total", "reason" => delivery.reason()).increment(1);
    tracing::trace!(user_id = draft.recipient_id, kind = %draft.kind, reason = delivery.reason(), "notification suppressed");
    delivery
}

fn has_recent_duplicate(
    conn: &mut SqliteConnection,
    draft: &NotificationDraft,
    since: NaiveDateTime,
) -> QueryResult<bool> {
    let mut query = notifications::table
        .filter(notifications::user_id.eq(draft.recipient_id))
        .filter(notifications::kind.eq(draft.kind))
        .filter(notifications::creation_date.gt(since))
        .into_boxed();

    // A missing reference only matches another missing reference.
    query = match draft.related_post_id {
        Some(id) => query.filter(notifications::related_post_id.eq(id)),
        None => query.filter(notifications::related_post_id.is_null()),
    };
    query = match draft.related_comment_id {
        Some(id) => query.filter(notifications::related_comment_id.eq(id)),
        None => query.filter(notifications::related_comment_id.is_null()),
    };
    query = match draft.related_user_id {
        Some(id) => query.filter(notifications::related_user_id.eq(id)),
        None => query.filter(notifications::related_user_id.is_null()),
    };

    let count: i64 = query.count().get_result(conn)?;
    Ok(count > 0)
}

/// Apply an audience rule for one recipient and write the result.
pub fn notify(
    conn: &mut SqliteConnection,
    policy: &NotificationPolicy,
    rule: AudienceRule,
    ctx: &EventContext<'_>,
    recipient_id: i32,
    change: Option<VoteChange>,
) -> AppResult<Delivery> {
    if !rule.permits(ctx.actor_id, recipient_id, change) {
        return Ok(Delivery::SkippedSelf);
    }
    create_notification(conn, policy, &rule.draft(ctx, recipient_id))
}

/// Notify everyone who already commented on `post_id`, except the new
/// commenter and the post author (who gets a separate notification).
///
/// Recipients are independent: one failure is logged and the rest proceed.
pub fn create_followup_comment_notifications(
    conn: &mut SqliteConnection,
    policy: &NotificationPolicy,
    post_id: i32,
    new_comment_id: i32,
    commenter_id: i32,
    commenter_name: &str,
    post_title: &str,
) -> AppResult<FanoutReport> {
    let post_author_id: i32 = posts::table
        .find(post_id)
        .select(posts::user_id)
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::PostNotFound, "post not found"))?;

    let watchers: Vec<i32> = comments::table
        .filter(comments::post_id.eq(post_id))
        .filter(comments::user_id.ne(commenter_id))
        .filter(comments::user_id.ne(post_author_id))
        .select(comments::user_id)
        .distinct()
        .load(conn)?;

    let ctx = EventContext {
        actor_id: commenter_id,
        actor_name: commenter_name,
        post_id,
        post_title,
        comment_id: Some(new_comment_id),
    };

    let mut report = FanoutReport::default();
    for watcher_id in watchers {
        match notify(conn, policy, AudienceRule::FollowupComment, &ctx, watcher_id, None) {
            Ok(Delivery::Created) => report.created += 1,
            Ok(_) => report.skipped += 1,
            Err(e) => {
                report.failed += 1;
                tracing::error!(
                    post_id,
                    new_comment_id,
                    watcher_id,
                    error = %e,
                    "failed to notify watcher"
                );
            }
        }
    }

    tracing::debug!(
        post_id,
        new_comment_id,
        created = report.created,
        skipped = report.skipped,
        failed = report.failed,
        "follow-up fan-out finished"
    );

    Ok(report)
}

/// Unread and read notifications for a user, each paginated with the same page.
pub fn list_notifications(
    conn: &mut SqliteConnection,
    user_id: i32,
    params: &PaginationParams,
) -> AppResult<NotificationFeed> {
    let now = Utc::now().naive_utc();
    let unread = load_page(conn, user_id, false, params)?;
    let read = load_page(conn, user_id, true, params)?;

    Ok(NotificationFeed {
        unread: unread.into_iter().map(|n| NotificationView::new(n, now)).collect(),
        read: read.into_iter().map(|n| NotificationView::new(n, now)).collect(),
        page: params.page.max(1),
        limit: params.limit(),
    })
}

fn load_page(
    conn: &mut SqliteConnection,
    user_id: i32,
    is_read: bool,
    params: &PaginationParams,
) -> QueryResult<Vec<Notification>> {
    notifications::table
        .filter(notifications::user_id.eq(user_id))
        .filter(notifications::is_read.eq(is_read))
        .order((notifications::creation_date.desc(), notifications::notification_id.desc()))
        .limit(params.limit())
        .offset(params.offset())
        .select(Notification::as_select())
        .load(conn)
}

/// Count unread notifications for a user.
pub fn count_unread(conn: &mut SqliteConnection, user_id: i32) -> AppResult<i64> {
    let count = notifications::table
        .filter(notifications::user_id.eq(user_id))
        .filter(notifications::is_read.eq(false))
        .count()
        .get_result(conn)?;

    Ok(count)
}

/// Mark a single notification as read. Marking it again is a no-op.
pub fn mark_read(
    conn: &mut SqliteConnection,
    policy: &NotificationPolicy,
    notification_id: i32,
    user_id: i32,
) -> AppResult<NotificationView> {
    let mut notification = notifications::table
        .find(notification_id)
        .select(Notification::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::NotificationNotFound, "notification not found"))?;

    if notification.user_id != user_id {
        return Err(AppError::new(
            ErrorCode::NotNotificationOwner,
            "notification belongs to another user",
        ));
    }

    if !notification.is_read {
        policy.retry.run("mark notification read", || {
            diesel::update(notifications::table.find(notification_id))
                .set(notifications::is_read.eq(true))
                .execute(conn)
        })?;
        notification.is_read = true;
    }

    Ok(NotificationView::new(notification, Utc::now().naive_utc()))
}

/// Mark every unread notification of a user as read in one statement.
pub fn mark_all_read(conn: &mut SqliteConnection, policy: &NotificationPolicy, user_id: i32) -> AppResult<usize> {
    let updated = policy.retry.run("mark all notifications read", || {
        diesel::update(
            notifications::table
                .filter(notifications::user_id.eq(user_id))
                .filter(notifications::is_read.eq(false)),
        )
        .set(notifications::is_read.eq(true))
        .execute(conn)
    })?;

    tracing::debug!(user_id, updated, "notifications marked read");
    Ok(updated)
}

/// Delete read notifications older than the retention period. Unread ones are kept.
pub fn retire_old(conn: &mut SqliteConnection, policy: &NotificationPolicy) -> AppResult<usize> {
    let cutoff = Utc::now().naive_utc() - policy.retention;

    let deleted = policy.retry.run("retire notifications", || {
        diesel::delete(
            notifications::table
                .filter(notifications::is_read.eq(true))
                .filter(notifications::creation_date.lt(cutoff)),
        )
        .execute(conn)
    })?;

    tracing::info!(deleted, cutoff = %cutoff, "retired old notifications");
    Ok(deleted)
}

/// Send the same system notification to several users, all or nothing.
pub fn system_notification(
    conn: &mut SqliteConnection,
    policy: &NotificationPolicy,
    user_ids: &[i32],
    title: &str,
    message: &str,
) -> AppResult<usize> {
    let now = Utc::now().naive_utc();
    let rows: Vec<NewNotification<'_>> = user_ids
        .iter()
        .filter(|id| **id > 0)
        .map(|&user_id| NewNotification {
            user_id,
            kind: NotificationKind::System,
            title,
            message,
            related_post_id: None,
            related_comment_id: None,
            related_user_id: None,
            is_read: false,
            creation_date: now,
        })
        .collect();

    let inserted = policy.retry.run("broadcast system notification", || {
        conn.transaction(|conn| {
            rows.iter().try_fold(0, |total, row| {
                diesel::insert_into(notifications::table)
                    .values(row)
                    .execute(conn)
                    .map(|n| total + n)
            })
        })
    })?;

    counter!("notifications_created_total", "kind" => NotificationKind::System.as_str())
        .increment(inserted as u64);
    tracing::info!(recipients = inserted, "system notification sent");
    Ok(inserted)
}
