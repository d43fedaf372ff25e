use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "sessionid";
pub const SESSION_AGE_DAYS: i64 = 14;

pub const PASSWORD_ALGORITHM: &str = "pbkdf2_sha256";
pub const PASSWORD_ITERATIONS: u32 = 390_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// Encodes as `pbkdf2_sha256$<iterations>$<hex digest>` so the work factor
/// can be raised without invalidating stored passwords.
pub fn hash_password(salt: &str, password: &str, iterations: u32) -> String {
    let mut digest = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut digest);
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}${}${}", PASSWORD_ALGORITHM, iterations, hex)
}

pub fn verify_password(salt: &str, password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(algorithm), Some(iterations)) = (parts.next(), parts.next()) else {
        return false;
    };
    if algorithm != PASSWORD_ALGORITHM {
        return false;
    }
    let iterations = match iterations.parse::<u32>() {
        Ok(n) if n > 0 => n,
        _ => return false,
    };
    let candidate = hash_password(salt, password, iterations);
    candidate.as_bytes().ct_eq(stored.as_bytes()).into()
}

fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn username_taken(conn: &Connection, username: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT 1 FROM users WHERE username = ?",
        [username],
        |r| r.get::<_, i64>(0),
    )
    .optional()
    .map(|v| v.is_some())
}

pub fn create_user(
    conn: &Connection,
    username: &str,
    email: &str,
    password: &str,
) -> rusqlite::Result<User> {
    let salt = Uuid::new_v4().to_string();
    let hash = hash_password(&salt, password, PASSWORD_ITERATIONS);
    conn.execute(
        "INSERT INTO users(username, email, password_hash, salt, created_at)
         VALUES(?, ?, ?, ?, ?)",
        (username, email, &hash, &salt, Utc::now().to_rfc3339()),
    )?;
    Ok(User {
        id: conn.last_insert_rowid(),
        username: username.to_string(),
        email: email.to_string(),
    })
}

/// Returns the user when the password matches. Unknown usernames and wrong
/// passwords are indistinguishable to the caller.
pub fn authenticate(
    conn: &Connection,
    username: &str,
    password: &str,
) -> rusqlite::Result<Option<User>> {
    let row: Option<(i64, String, String, String, String)> = conn
        .query_row(
            "SELECT id, username, email, password_hash, salt FROM users WHERE username = ?",
            [username],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )
        .optional()?;
    let Some((id, username, email, hash, salt)) = row else {
        // Same work as a real check.
        hash_password("", password, PASSWORD_ITERATIONS);
        return Ok(None);
    };
    Ok(verify_password(&salt, password, &hash).then_some(User {
        id,
        username,
        email,
    }))
}

/// Opens a session lasting `SESSION_AGE_DAYS`. Expired sessions are purged
/// on the way.
pub fn start_session(conn: &Connection, user_id: i64) -> rusqlite::Result<String> {
    let now = Utc::now();
    let purged = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?",
        [timestamp(now)],
    )?;
    if purged > 0 {
        log::debug!("purged {} expired sessions", purged);
    }
    let token = Uuid::new_v4().simple().to_string();
    conn.execute(
        "INSERT INTO sessions(token, user_id, created_at, expires_at) VALUES(?, ?, ?, ?)",
        (
            &token,
            user_id,
            timestamp(now),
            timestamp(now + Duration::days(SESSION_AGE_DAYS)),
        ),
    )?;
    Ok(token)
}

pub fn session_user(conn: &Connection, token: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT u.id, u.username, u.email
         FROM sessions s
         JOIN users u ON u.id = s.user_id
         WHERE s.token = ? AND s.expires_at > ?",
        (token, timestamp(Utc::now())),
        |r| {
            Ok(User {
                id: r.get(0)?,
                username: r.get(1)?,
                email: r.get(2)?,
            })
        },
    )
    .optional()
}

pub fn end_session(conn: &Connection, token: &str) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM sessions WHERE token = ?", [token])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_db;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_conn(prefix: &str) -> Connection {
        let ws = std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        open_db(&ws).expect("open db")
    }

    #[test]
    fn hash_depends_on_salt_and_records_iterations() {
        let a = hash_password("salt-a", "password", 1_000);
        let b = hash_password("salt-b", "password", 1_000);
        assert_ne!(a, b);
        assert!(a.starts_with("pbkdf2_sha256$1000$"));
        assert_eq!(a.rsplit('$').next().expect("digest").len(), 64);
        assert_eq!(a, hash_password("salt-a", "password", 1_000));
        assert_ne!(a, hash_password("salt-a", "password", 2_000));
    }

    #[test]
    fn verify_uses_stored_iteration_count() {
        let stored = hash_password("pepper", "s3cret-pass", 1_000);
        assert!(verify_password("pepper", "s3cret-pass", &stored));
        assert!(!verify_password("pepper", "s3cret-pasS", &stored));
        assert!(!verify_password("salt", "s3cret-pass", &stored));
        assert!(!verify_password("pepper", "s3cret-pass", "md5$1000$abc"));
        assert!(!verify_password("pepper", "s3cret-pass", "pbkdf2_sha256$0$abc"));
        assert!(!verify_password("pepper", "s3cret-pass", "garbage"));
    }

    #[test]
    fn expired_sessions_are_rejected_and_purged() {
        let conn = temp_conn("recordbook-auth-expiry");
        let user = create_user(&conn, "curator", "c@school.org", "quiet-library").expect("create");
        let past = Utc::now() - Duration::days(SESSION_AGE_DAYS + 1);
        conn.execute(
            "INSERT INTO sessions(token, user_id, created_at, expires_at) VALUES('stale', ?, ?, ?)",
            (user.id, timestamp(past), timestamp(past + Duration::days(SESSION_AGE_DAYS))),
        )
        .expect("stale session");
        assert_eq!(session_user(&conn, "stale").expect("lookup"), None);

        let fresh = start_session(&conn, user.id).expect("session");
        assert_eq!(session_user(&conn, &fresh).expect("lookup"), Some(user));
        let left: i64 = conn
            .query_row("SELECT COUNT(*) FROM sessions WHERE token = 'stale'", [], |r| r.get(0))
            .expect("count");
        assert_eq!(left, 0);
        let expires: String = conn
            .query_row("SELECT expires_at FROM sessions WHERE token = ?", [&fresh], |r| r.get(0))
            .expect("expires");
        let expires = DateTime::parse_from_rfc3339(&expires).expect("timestamp");
        assert!(expires.with_timezone(&Utc) > Utc::now() + Duration::days(SESSION_AGE_DAYS - 1));
    }

    #[test]
    fn authenticate_and_session_lifecycle() {
        let conn = temp_conn("recordbook-auth");
        let user = create_user(&conn, "teacher", "t@school.org", "s3cret-pass").expect("create");
        assert!(username_taken(&conn, "teacher").expect("taken"));

        assert_eq!(
            authenticate(&conn, "teacher", "wrong-pass").expect("auth"),
            None
        );
        assert_eq!(authenticate(&conn, "nobody", "s3cret-pass").expect("auth"), None);
        let found = authenticate(&conn, "teacher", "s3cret-pass")
            .expect("auth")
            .expect("user");
        assert_eq!(found, user);

        let token = start_session(&conn, user.id).expect("session");
        assert_eq!(session_user(&conn, &token).expect("lookup"), Some(user));
        end_session(&conn, &token).expect("end");
        assert_eq!(session_user(&conn, &token).expect("lookup"), None);
    }
}
