#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::sqlite::SqliteConnection;

use forum_engagement::config::AppConfig;
use forum_engagement::models::{Notification, NotificationKind};
use forum_engagement::schema::notifications;
use forum_engagement::services::notification_service::NotificationPolicy;
use forum_engagement::services::retry::RetryPolicy;
use forum_engagement::sessions::DbSessionResolver;
use forum_engagement::AppState;
use forum_shared::clients::db::{ConnectionOptions, DbPool};

const SCHEMA: &str = include_str!("../../migrations/2025-01-01-000000_create_forum/up.sql");

fn in_memory_options() -> ConnectionOptions {
    ConnectionOptions {
        busy_timeout: Duration::from_millis(100),
        enable_wal: false,
    }
}

/// A fresh in-memory database with the forum schema.
pub fn connection() -> SqliteConnection {
    let mut conn = SqliteConnection::establish(":memory:").expect("open in-memory sqlite");
    in_memory_options().apply(&mut conn).expect("apply pragmas");
    conn.batch_execute(SCHEMA).expect("create schema");
    conn
}

/// Default policy with retry delays short enough for tests.
pub fn policy() -> NotificationPolicy {
    NotificationPolicy {
        retry: RetryPolicy {
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            max_attempts: 5,
        },
        ..NotificationPolicy::default()
    }
}

pub fn add_user(conn: &mut SqliteConnection, id: i32, name: &str) {
    conn.batch_execute(&format!(
        "INSERT INTO users (user_id, username, email, password_hash) VALUES ({id}, '{name}', '{name}@example.com', 'x')"
    ))
    .expect("insert user");
}

pub fn add_post(conn: &mut SqliteConnection, id: i32, author: i32, title: &str) {
    conn.batch_execute(&format!(
        "INSERT INTO posts (post_id, user_id, title, content) VALUES ({id}, {author}, '{title}', 'body')"
    ))
    .expect("insert post");
}

pub fn add_comment(conn: &mut SqliteConnection, id: i32, post: i32, author: i32) {
    conn.batch_execute(&format!(
        "INSERT INTO comments (comment_id, post_id, user_id, content) VALUES ({id}, {post}, {author}, 'seeded')"
    ))
    .expect("insert comment");
}

pub fn add_session(conn: &mut SqliteConnection, user: i32, token: &str) {
    conn.batch_execute(&format!(
        "INSERT INTO sessions (user_id, cookie_value, expiration_date) VALUES ({user}, '{token}', '2999-01-01 00:00:00')"
    ))
    .expect("insert session");
}

/// Insert a notification row directly, bypassing the engine's guards.
pub fn add_raw_notification(
    conn: &mut SqliteConnection,
    user: i32,
    kind: NotificationKind,
    is_read: bool,
    created: NaiveDateTime,
) -> i32 {
    diesel::insert_into(notifications::table)
        .values((
            notifications::user_id.eq(user),
            notifications::kind.eq(kind),
            notifications::title.eq("seeded"),
            notifications::message.eq("seeded"),
            notifications::is_read.eq(is_read),
            notifications::creation_date.eq(created),
        ))
        .returning(notifications::notification_id)
        .get_result(conn)
        .expect("insert notification")
}

/// Make every notification insert for `user` fail with a non-busy error.
pub fn reject_notifications_for(conn: &mut SqliteConnection, user: i32) {
    conn.batch_execute(&format!(
        "CREATE TRIGGER reject_user_{user} BEFORE INSERT ON notifications WHEN NEW.user_id = {user} \
         BEGIN SELECT RAISE(ABORT, 'notification rejected'); END"
    ))
    .expect("install trigger");
}

pub fn days_ago(days: i64) -> NaiveDateTime {
    Utc::now().naive_utc() - chrono::Duration::days(days)
}

pub fn notifications_for(conn: &mut SqliteConnection, user: i32) -> Vec<Notification> {
    notifications::table
        .filter(notifications::user_id.eq(user))
        .order(notifications::notification_id.asc())
        .select(Notification::as_select())
        .load(conn)
        .expect("load notifications")
}

/// Users 1..=3 named ana, ben and cy; ana owns post 100 "Sourdough starter tips".
pub fn forum(conn: &mut SqliteConnection) {
    add_user(conn, 1, "ana");
    add_user(conn, 2, "ben");
    add_user(conn, 3, "cy");
    add_post(conn, 100, 1, "Sourdough starter tips");
}

#[derive(Debug)]
struct SchemaOnAcquire;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SchemaOnAcquire {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        in_memory_options().apply(conn).map_err(diesel::r2d2::Error::QueryError)?;
        conn.batch_execute(SCHEMA).map_err(diesel::r2d2::Error::QueryError)
    }
}

/// A single-connection pool so every checkout sees the same in-memory database.
pub fn pool() -> DbPool {
    Pool::builder()
        .max_size(1)
        .min_idle(Some(1))
        .idle_timeout(None)
        .max_lifetime(None)
        .connection_customizer(Box::new(SchemaOnAcquire))
        .build(ConnectionManager::<SqliteConnection>::new(":memory:"))
        .expect("build pool")
}

pub fn state() -> Arc<AppState> {
    let pool = pool();
    let config: AppConfig = serde_json::from_str("{}").expect("default config");
    let sessions = Arc::new(DbSessionResolver::new(pool.clone()));
    let mut state = AppState::new(pool, config, sessions);
    state.policy = policy();
    Arc::new(state)
}
