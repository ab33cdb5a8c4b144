//! Refresh-session rotation against a real database.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use storyverse_db::models::session::NewRefreshSession;
use storyverse_db::models::user::CreateUser;
use storyverse_db::repositories::{SessionRepo, UserRepo};

async fn new_user(pool: &PgPool) -> i64 {
    UserRepo::create(
        pool,
        &CreateUser {
            username: "reader".to_string(),
            email: "reader@example.com".to_string(),
            password_hash: "not-a-real-hash".to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

fn session(user_id: i64, hash: &str, expires_in: Duration) -> NewRefreshSession {
    NewRefreshSession {
        user_id,
        token_hash: hash.to_string(),
        expires_at: Utc::now() + expires_in,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn rotation_is_single_use(pool: PgPool) {
    let user = new_user(&pool).await;
    SessionRepo::open(&pool, &session(user, "first", Duration::days(7)))
        .await
        .unwrap();

    let expires_at = Utc::now() + Duration::days(7);
    let second = SessionRepo::rotate(&pool, "first", "second", expires_at)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.user_id, user);
    assert!(second.is_live(Utc::now()));

    let first = SessionRepo::find_by_token_hash(&pool, "first")
        .await
        .unwrap()
        .unwrap();
    assert!(first.revoked_at.is_some());

    // Replaying the old token writes nothing.
    let replay = SessionRepo::rotate(&pool, "first", "third", expires_at)
        .await
        .unwrap();
    assert!(replay.is_none());
    assert!(SessionRepo::find_by_token_hash(&pool, "third")
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn expired_sessions_cannot_rotate(pool: PgPool) {
    let user = new_user(&pool).await;
    SessionRepo::open(&pool, &session(user, "stale", Duration::minutes(-1)))
        .await
        .unwrap();

    let rotated = SessionRepo::rotate(&pool, "stale", "fresh", Utc::now() + Duration::days(7))
        .await
        .unwrap();
    assert!(rotated.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn logout_revokes_every_open_session(pool: PgPool) {
    let user = new_user(&pool).await;
    for hash in ["laptop", "phone"] {
        SessionRepo::open(&pool, &session(user, hash, Duration::days(7)))
            .await
            .unwrap();
    }

    assert_eq!(SessionRepo::revoke_all_for_user(&pool, user).await.unwrap(), 2);
    assert_eq!(SessionRepo::revoke_all_for_user(&pool, user).await.unwrap(), 0);

    let phone = SessionRepo::find_by_token_hash(&pool, "phone")
        .await
        .unwrap()
        .unwrap();
    assert!(!phone.is_live(Utc::now()));
}
