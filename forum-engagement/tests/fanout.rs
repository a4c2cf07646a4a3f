mod common;

use diesel::prelude::*;

use forum_engagement::models::{NotificationKind, VoteSubject};
use forum_engagement::schema::{comment_likes, comments, likes_dislikes, notifications, posts};
use forum_engagement::services::comment_service::{create_comment, delete_comment};
use forum_engagement::services::notification_service::create_followup_comment_notifications;
use forum_engagement::services::post_service::delete_post;
use forum_engagement::services::vote_service::record_vote;
use forum_shared::errors::ErrorCode;

#[test]
fn commenting_notifies_author_then_watchers_once_each() {
    let mut conn = common::connection();
    common::forum(&mut conn);
    let policy = common::policy();

    let first = create_comment(&mut conn, &policy, 100, 2, "Feed it daily", None).unwrap();

    let ana = common::notifications_for(&mut conn, 1);
    assert_eq!(ana.len(), 1);
    assert_eq!(ana[0].kind, NotificationKind::Comment);
    assert_eq!(ana[0].related_user_id, Some(2));
    assert_eq!(ana[0].related_comment_id, Some(first.comment_id));
    assert_eq!(ana[0].title, "New Comment!");
    assert_eq!(ana[0].message, "ben commented on your post 'Sourdough starter tips'");

    let second = create_comment(&mut conn, &policy, 100, 3, "Rye flour helps", None).unwrap();

    let ben = common::notifications_for(&mut conn, 2);
    assert_eq!(ben.len(), 1);
    assert_eq!(ben[0].related_user_id, Some(3));
    assert_eq!(ben[0].related_comment_id, Some(second.comment_id));
    assert_eq!(ben[0].message, "cy also commented on 'Sourdough starter tips'");

    // Ana hears about cy's comment as the author, never twice about ben's.
    let ana: Vec<_> = common::notifications_for(&mut conn, 1)
        .into_iter()
        .map(|n| n.related_user_id)
        .collect();
    assert_eq!(ana, vec![Some(2), Some(3)]);
    assert!(common::notifications_for(&mut conn, 3).is_empty());
}

#[test]
fn authors_commenting_on_their_own_post_only_reach_watchers() {
    let mut conn = common::connection();
    common::forum(&mut conn);
    common::add_comment(&mut conn, 200, 100, 2);
    common::add_comment(&mut conn, 201, 100, 2);
    let policy = common::policy();

    create_comment(&mut conn, &policy, 100, 1, "Thanks all", None).unwrap();

    assert!(common::notifications_for(&mut conn, 1).is_empty());
    assert_eq!(common::notifications_for(&mut conn, 2).len(), 1);
}

#[test]
fn reply_reaches_parent_author_exactly_once() {
    let mut conn = common::connection();
    common::forum(&mut conn);
    common::add_comment(&mut conn, 200, 100, 2);
    let policy = common::policy();

    let reply = create_comment(&mut conn, &policy, 100, 3, "Agreed", Some(200)).unwrap();
    assert_eq!(reply.parent_comment_id, Some(200));

    let ben = common::notifications_for(&mut conn, 2);
    assert_eq!(ben.len(), 1);
    assert_eq!(ben[0].title, "New reply to your comment");
    assert_eq!(ben[0].message, "cy replied to your comment on 'Sourdough starter tips'");
}

#[test]
fn followup_fanout_reports_each_watcher() {
    let mut conn = common::connection();
    common::forum(&mut conn);
    common::add_user(&mut conn, 4, "dee");
    common::add_comment(&mut conn, 200, 100, 2);
    common::add_comment(&mut conn, 201, 100, 4);
    common::add_comment(&mut conn, 202, 100, 4);
    common::add_comment(&mut conn, 203, 100, 1);
    common::add_comment(&mut conn, 204, 100, 3);
    let policy = common::policy();

    let report =
        create_followup_comment_notifications(&mut conn, &policy, 100, 204, 3, "cy", "Sourdough starter tips").unwrap();
    assert_eq!(report.created, 2);
    assert_eq!(report.failed, 0);

    let again =
        create_followup_comment_notifications(&mut conn, &policy, 100, 204, 3, "cy", "Sourdough starter tips").unwrap();
    assert_eq!(again.created, 0);
    assert_eq!(again.skipped, 2);

    let err = create_followup_comment_notifications(&mut conn, &policy, 999, 1, 3, "cy", "gone").unwrap_err();
    assert_eq!(err.code(), ErrorCode::PostNotFound);
}

#[test]
fn one_failing_watcher_does_not_stop_the_others() {
    let mut conn = common::connection();
    common::forum(&mut conn);
    common::add_user(&mut conn, 4, "dee");
    common::add_comment(&mut conn, 200, 100, 2);
    common::add_comment(&mut conn, 201, 100, 4);
    common::add_comment(&mut conn, 204, 100, 3);
    common::reject_notifications_for(&mut conn, 2);
    let policy = common::policy();

    let report =
        create_followup_comment_notifications(&mut conn, &policy, 100, 204, 3, "cy", "Sourdough starter tips").unwrap();
    assert_eq!((report.created, report.failed), (1, 1));

    assert!(common::notifications_for(&mut conn, 2).is_empty());
    let dee = common::notifications_for(&mut conn, 4);
    assert_eq!(dee.len(), 1);
    assert_eq!(dee[0].related_comment_id, Some(204));
}

#[test]
fn comment_survives_a_failed_notification() {
    let mut conn = common::connection();
    common::forum(&mut conn);
    common::add_user(&mut conn, 4, "dee");
    common::add_comment(&mut conn, 200, 100, 2);
    common::add_comment(&mut conn, 201, 100, 4);
    common::reject_notifications_for(&mut conn, 2);
    let policy = common::policy();

    let comment = create_comment(&mut conn, &policy, 100, 3, "Try a warmer spot", None).unwrap();

    let stored: i64 = comments::table
        .filter(comments::comment_id.eq(comment.comment_id))
        .count()
        .get_result(&mut conn)
        .unwrap();
    assert_eq!(stored, 1);
    assert!(common::notifications_for(&mut conn, 2).is_empty());
    assert_eq!(common::notifications_for(&mut conn, 1).len(), 1);
    let dee = common::notifications_for(&mut conn, 4);
    assert_eq!(dee.len(), 1);
    assert_eq!(dee[0].message, "cy also commented on 'Sourdough starter tips'");
}

#[test]
fn comment_input_is_checked() {
    let mut conn = common::connection();
    common::forum(&mut conn);
    common::add_post(&mut conn, 101, 2, "Another post");
    common::add_comment(&mut conn, 300, 101, 2);
    let policy = common::policy();

    let err = create_comment(&mut conn, &policy, 100, 2, "   \n", None).unwrap_err();
    assert_eq!(err.code(), ErrorCode::EmptyComment);

    let err = create_comment(&mut conn, &policy, 999, 2, "hello", None).unwrap_err();
    assert_eq!(err.code(), ErrorCode::PostNotFound);

    let err = create_comment(&mut conn, &policy, 100, 2, "hello", Some(300)).unwrap_err();
    assert_eq!(err.code(), ErrorCode::CommentNotFound);

    let stored = create_comment(&mut conn, &policy, 100, 2, "  trimmed  ", None).unwrap();
    assert_eq!(stored.content, "trimmed");
}

#[test]
fn deleting_a_post_removes_everything_attached() {
    let mut conn = common::connection();
    common::forum(&mut conn);
    common::add_post(&mut conn, 101, 1, "Keeper");
    let policy = common::policy();

    let comment = create_comment(&mut conn, &policy, 100, 2, "nice", None).unwrap();
    record_vote(&mut conn, &policy, VoteSubject::Post(100), 3, 1).unwrap();
    record_vote(&mut conn, &policy, VoteSubject::Comment(comment.comment_id), 3, -1).unwrap();
    record_vote(&mut conn, &policy, VoteSubject::Post(101), 2, 1).unwrap();

    let err = delete_post(&mut conn, &policy.retry, 100, 2).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotContentAuthor);

    let deletion = delete_post(&mut conn, &policy.retry, 100, 1).unwrap();
    assert_eq!(deletion.post_votes, 1);
    assert_eq!(deletion.comment_votes, 1);
    assert_eq!(deletion.comments, 1);
    assert_eq!(deletion.notifications, 3);

    let remaining_posts: i64 = posts::table.count().get_result(&mut conn).unwrap();
    let remaining_comments: i64 = comments::table.count().get_result(&mut conn).unwrap();
    let remaining_post_votes: i64 = likes_dislikes::table.count().get_result(&mut conn).unwrap();
    let remaining_comment_votes: i64 = comment_likes::table.count().get_result(&mut conn).unwrap();
    let remaining_notifications: Vec<Option<i32>> = notifications::table
        .select(notifications::related_post_id)
        .load(&mut conn)
        .unwrap();

    assert_eq!(remaining_posts, 1);
    assert_eq!(remaining_comments, 0);
    assert_eq!(remaining_post_votes, 1);
    assert_eq!(remaining_comment_votes, 0);
    assert_eq!(remaining_notifications, vec![Some(101)]);

    let err = delete_post(&mut conn, &policy.retry, 100, 1).unwrap_err();
    assert_eq!(err.code(), ErrorCode::PostNotFound);
}

#[test]
fn only_the_author_deletes_a_comment() {
    let mut conn = common::connection();
    common::forum(&mut conn);
    common::add_comment(&mut conn, 200, 100, 2);
    let policy = common::policy();
    let reply = create_comment(&mut conn, &policy, 100, 3, "reply", Some(200)).unwrap();
    record_vote(&mut conn, &policy, VoteSubject::Comment(200), 3, 1).unwrap();

    let err = delete_comment(&mut conn, &policy.retry, 200, 3).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotContentAuthor);

    delete_comment(&mut conn, &policy.retry, 200, 2).unwrap();

    let votes: i64 = comment_likes::table.count().get_result(&mut conn).unwrap();
    assert_eq!(votes, 0);
    let parent: Option<i32> = comments::table
        .find(reply.comment_id)
        .select(comments::parent_comment_id)
        .first(&mut conn)
        .unwrap();
    assert_eq!(parent, None);

    let err = delete_comment(&mut conn, &policy.retry, 200, 2).unwrap_err();
    assert_eq!(err.code(), ErrorCode::CommentNotFound);
}
