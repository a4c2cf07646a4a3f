pub mod audience;
pub mod comment_service;
pub mod notification_service;
pub mod post_service;
pub mod retry;
pub mod users;
pub mod vote_service;
