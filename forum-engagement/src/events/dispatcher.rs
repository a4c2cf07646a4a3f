use diesel::sqlite::SqliteConnection;

use crate::events::{CommentCreated, EngagementEvent, VoteCast};
use crate::models::{VoteChange, VoteSubject};
use crate::services::audience::{AudienceRule, EventContext};
use crate::services::notification_service::{self, Delivery, FanoutReport, NotificationPolicy};

/// Fan an engagement event out to its audience.
///
/// Never fails: the action that produced the event has already been
/// committed, so delivery problems are logged and counted in the report.
pub fn dispatch(conn: &mut SqliteConnection, policy: &NotificationPolicy, event: &EngagementEvent) -> FanoutReport {
    tracing::debug!(event = event.name(), "dispatching engagement event");

    match event {
        EngagementEvent::CommentCreated(data) => on_comment_created(conn, policy, data),
        EngagementEvent::VoteCast(data) => on_vote_cast(conn, policy, data),
    }
}

fn on_comment_created(conn: &mut SqliteConnection, policy: &NotificationPolicy, data: &CommentCreated) -> FanoutReport {
    tracing::info!(
        post_id = data.post_id,
        comment_id = data.comment_id,
        commenter_id = data.commenter_id,
        "received comment.created event"
    );

    let ctx = EventContext {
        actor_id: data.commenter_id,
        actor_name: &data.commenter_name,
        post_id: data.post_id,
        post_title: &data.post_title,
        comment_id: Some(data.comment_id),
    };

    let mut report = FanoutReport::default();
    deliver(conn, policy, AudienceRule::PostComment, &ctx, data.post_author_id, None, &mut report);

    // The reply goes out before the follow-ups so a watcher who is also the
    // parent author keeps the reply and the follow-up is deduplicated away.
    if let Some(parent_author_id) = data.parent_author_id {
        deliver(conn, policy, AudienceRule::CommentReply, &ctx, parent_author_id, None, &mut report);
    }

    match notification_service::create_followup_comment_notifications(
        conn,
        policy,
        data.post_id,
        data.comment_id,
        data.commenter_id,
        &data.commenter_name,
        &data.post_title,
    ) {
        Ok(followups) => {
            report.created += followups.created;
            report.skipped += followups.skipped;
            report.failed += followups.failed;
        }
        Err(e) => {
            report.failed += 1;
            tracing::error!(post_id = data.post_id, error = %e, "failed to fan out follow-up notifications");
        }
    }

    report
}

fn on_vote_cast(conn: &mut SqliteConnection, policy: &NotificationPolicy, data: &VoteCast) -> FanoutReport {
    tracing::info!(
        subject = data.subject.as_str(),
        subject_id = data.subject.id(),
        voter_id = data.voter_id,
        change = data.change.as_str(),
        "received vote.cast event"
    );

    let (rule, comment_id) = match data.subject {
        VoteSubject::Post(_) => (AudienceRule::PostVote(data.value), None),
        VoteSubject::Comment(id) => (AudienceRule::CommentVote(data.value), Some(id)),
    };

    let ctx = EventContext {
        actor_id: data.voter_id,
        actor_name: &data.voter_name,
        post_id: data.post_id,
        post_title: &data.post_title,
        comment_id,
    };

    let mut report = FanoutReport::default();
    deliver(conn, policy, rule, &ctx, data.author_id, Some(data.change), &mut report);
    report
}

fn deliver(
    conn: &mut SqliteConnection,
    policy: &NotificationPolicy,
    rule: AudienceRule,
    ctx: &EventContext<'_>,
    recipient_id: i32,
    change: Option<VoteChange>,
    report: &mut FanoutReport,
) {
    match notification_service::notify(conn, policy, rule, ctx, recipient_id, change) {
        Ok(Delivery::Created) => report.created += 1,
        Ok(_) => report.skipped += 1,
        Err(e) => {
            report.failed += 1;
            tracing::error!(
                recipient_id,
                post_id = ctx.post_id,
                rule = ?rule,
                error = %e,
                "failed to create notification"
            );
        }
    }
}
