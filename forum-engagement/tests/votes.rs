mod common;

use forum_engagement::models::{NotificationKind, VoteChange, VoteStats, VoteSubject};
use forum_engagement::services::retry::RetryPolicy;
use forum_engagement::services::vote_service::{cast_vote, record_vote, subject_stats, vote_stats};
use forum_shared::errors::ErrorCode;

#[test]
fn single_vote_is_reported_back() {
    let mut conn = common::connection();
    common::forum(&mut conn);

    let receipt = cast_vote(&mut conn, &RetryPolicy::default(), VoteSubject::Post(100), 2, -1).unwrap();
    assert_eq!(receipt.change, VoteChange::Added);

    let stats = vote_stats(&mut conn, VoteSubject::Post(100), Some(2)).unwrap();
    assert_eq!(stats, VoteStats { like_count: 0, dislike_count: 1, user_vote: -1 });
}

#[test]
fn same_vote_twice_toggles_off() {
    let mut conn = common::connection();
    common::forum(&mut conn);
    let retry = RetryPolicy::default();

    cast_vote(&mut conn, &retry, VoteSubject::Post(100), 3, 1).unwrap();
    let before = vote_stats(&mut conn, VoteSubject::Post(100), Some(2)).unwrap();

    cast_vote(&mut conn, &retry, VoteSubject::Post(100), 2, 1).unwrap();
    let receipt = cast_vote(&mut conn, &retry, VoteSubject::Post(100), 2, 1).unwrap();

    assert_eq!(receipt.change, VoteChange::Removed);
    assert_eq!(receipt.stats.user_vote, 0);
    assert_eq!(receipt.stats.like_count, before.like_count);
}

#[test]
fn opposite_vote_flips_the_row() {
    let mut conn = common::connection();
    common::forum(&mut conn);
    common::add_comment(&mut conn, 200, 100, 1);
    let retry = RetryPolicy::default();

    cast_vote(&mut conn, &retry, VoteSubject::Comment(200), 2, 1).unwrap();
    let receipt = cast_vote(&mut conn, &retry, VoteSubject::Comment(200), 2, -1).unwrap();

    assert_eq!(receipt.change, VoteChange::Changed);
    assert_eq!(receipt.stats, VoteStats { like_count: 0, dislike_count: 1, user_vote: -1 });
}

#[test]
fn like_unlike_relike_ends_liked_with_one_notification() {
    let mut conn = common::connection();
    common::forum(&mut conn);
    let policy = common::policy();

    let changes: Vec<_> = (0..3)
        .map(|_| record_vote(&mut conn, &policy, VoteSubject::Post(100), 2, 1).unwrap().change)
        .collect();
    assert_eq!(changes, vec![VoteChange::Added, VoteChange::Removed, VoteChange::Added]);

    let stats = vote_stats(&mut conn, VoteSubject::Post(100), Some(2)).unwrap();
    assert_eq!(stats, VoteStats { like_count: 1, dislike_count: 0, user_vote: 1 });

    let inbox = common::notifications_for(&mut conn, 1);
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationKind::Like);
    assert_eq!(inbox[0].related_user_id, Some(2));
    assert_eq!(inbox[0].related_comment_id, None);
    assert_eq!(inbox[0].message, "ben liked your post 'Sourdough starter tips'");
}

#[test]
fn changing_a_vote_notifies_with_the_new_kind() {
    let mut conn = common::connection();
    common::forum(&mut conn);
    common::add_comment(&mut conn, 200, 100, 3);
    let policy = common::policy();

    record_vote(&mut conn, &policy, VoteSubject::Comment(200), 2, 1).unwrap();
    record_vote(&mut conn, &policy, VoteSubject::Comment(200), 2, -1).unwrap();

    let kinds: Vec<_> = common::notifications_for(&mut conn, 3).into_iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NotificationKind::Like, NotificationKind::Dislike]);
    assert!(common::notifications_for(&mut conn, 1).is_empty());
}

#[test]
fn voting_on_own_content_is_silent() {
    let mut conn = common::connection();
    common::forum(&mut conn);
    let policy = common::policy();

    let receipt = record_vote(&mut conn, &policy, VoteSubject::Post(100), 1, 1).unwrap();
    assert_eq!(receipt.change, VoteChange::Added);
    assert!(common::notifications_for(&mut conn, 1).is_empty());
}

#[test]
fn invalid_values_are_rejected_before_touching_the_ledger() {
    let mut conn = common::connection();
    common::forum(&mut conn);

    for raw in [0, 2, -2] {
        let err = cast_vote(&mut conn, &RetryPolicy::default(), VoteSubject::Post(100), 2, raw).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidVote);
    }
    let stats = vote_stats(&mut conn, VoteSubject::Post(100), None).unwrap();
    assert_eq!(stats, VoteStats { like_count: 0, dislike_count: 0, user_vote: 0 });
}

#[test]
fn missing_subjects_are_not_found() {
    let mut conn = common::connection();
    common::forum(&mut conn);
    let retry = RetryPolicy::default();

    let err = cast_vote(&mut conn, &retry, VoteSubject::Post(999), 2, 1).unwrap_err();
    assert_eq!(err.code(), ErrorCode::PostNotFound);

    let err = cast_vote(&mut conn, &retry, VoteSubject::Comment(999), 2, 1).unwrap_err();
    assert_eq!(err.code(), ErrorCode::CommentNotFound);

    let err = subject_stats(&mut conn, VoteSubject::Comment(999), None).unwrap_err();
    assert_eq!(err.code(), ErrorCode::CommentNotFound);
}

#[test]
fn counts_aggregate_across_voters() {
    let mut conn = common::connection();
    common::forum(&mut conn);
    let retry = RetryPolicy::default();

    cast_vote(&mut conn, &retry, VoteSubject::Post(100), 1, 1).unwrap();
    cast_vote(&mut conn, &retry, VoteSubject::Post(100), 2, 1).unwrap();
    cast_vote(&mut conn, &retry, VoteSubject::Post(100), 3, -1).unwrap();

    let stats = vote_stats(&mut conn, VoteSubject::Post(100), Some(3)).unwrap();
    assert_eq!(stats, VoteStats { like_count: 2, dislike_count: 1, user_vote: -1 });

    let anonymous = vote_stats(&mut conn, VoteSubject::Post(100), None).unwrap();
    assert_eq!(anonymous.user_vote, 0);
}
