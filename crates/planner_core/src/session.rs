use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::storage::kv::{KeyValueStore, SESSION_KEY, USERS_KEY};

/// The admitted identity. The username is only a partition key for the
/// task store; nothing else about the account is consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
}

// Demo-grade local credentials, stored as-is under the users key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CredentialRecord {
    username: String,
    password: String,
}

pub fn sign_up(
    kv: &dyn KeyValueStore,
    username: &str,
    password: &str,
) -> Result<Session, AppError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::invalid_input("username is required"));
    }
    if password.is_empty() {
        return Err(AppError::invalid_input("password is required"));
    }

    let mut users = read_users(kv);
    if users.iter().any(|user| user.username == username) {
        return Err(AppError::invalid_input("username already exists"));
    }

    users.push(CredentialRecord {
        username: username.to_string(),
        password: password.to_string(),
    });
    write_users(kv, &users)?;
    persist_session(kv, username)
}

pub fn log_in(
    kv: &dyn KeyValueStore,
    username: &str,
    password: &str,
) -> Result<Session, AppError> {
    let username = username.trim();
    let known = read_users(kv)
        .into_iter()
        .any(|user| user.username == username && user.password == password);
    if !known {
        return Err(AppError::invalid_input("invalid username or password"));
    }

    persist_session(kv, username)
}

pub fn log_out(kv: &dyn KeyValueStore) -> Result<(), AppError> {
    kv.remove(SESSION_KEY)
}

/// Absent or unreadable session state is treated as signed out.
pub fn current_session(kv: &dyn KeyValueStore) -> Option<Session> {
    let payload = kv.get(SESSION_KEY).ok()??;
    serde_json::from_str(&payload).ok()
}

fn persist_session(kv: &dyn KeyValueStore, username: &str) -> Result<Session, AppError> {
    let session = Session {
        username: username.to_string(),
    };
    let payload =
        serde_json::to_string(&session).map_err(|err| AppError::invalid_data(err.to_string()))?;
    kv.set(SESSION_KEY, &payload)?;
    Ok(session)
}

// A corrupt registry degrades to empty rather than locking everyone out.
fn read_users(kv: &dyn KeyValueStore) -> Vec<CredentialRecord> {
    let Ok(Some(payload)) = kv.get(USERS_KEY) else {
        return Vec::new();
    };
    serde_json::from_str(&payload).unwrap_or_default()
}

fn write_users(kv: &dyn KeyValueStore, users: &[CredentialRecord]) -> Result<(), AppError> {
    let payload =
        serde_json::to_string(users).map_err(|err| AppError::invalid_data(err.to_string()))?;
    kv.set(USERS_KEY, &payload)
}

#[cfg(test)]
mod tests {
    use super::{current_session, log_in, log_out, sign_up};
    use crate::storage::kv::{KeyValueStore, MemoryKvStore, USERS_KEY};

    #[test]
    fn sign_up_registers_and_admits_the_identity() {
        let kv = MemoryKvStore::new();

        let session = sign_up(&kv, "ada", "secret").unwrap();
        assert_eq!(session.username, "ada");
        assert_eq!(current_session(&kv), Some(session));

        let users = kv.get(USERS_KEY).unwrap().unwrap();
        assert!(users.contains("ada"));
    }

    #[test]
    fn sign_up_rejects_duplicate_usernames() {
        let kv = MemoryKvStore::new();
        sign_up(&kv, "ada", "secret").unwrap();

        let err = sign_up(&kv, "ada", "other").unwrap_err();
        assert_eq!(err.code(), "invalid_input");
        assert!(err.message().contains("already exists"));
    }

    #[test]
    fn sign_up_rejects_blank_credentials() {
        let kv = MemoryKvStore::new();

        assert!(sign_up(&kv, "  ", "secret").is_err());
        assert!(sign_up(&kv, "ada", "").is_err());
        assert_eq!(current_session(&kv), None);
    }

    #[test]
    fn log_in_requires_matching_credentials() {
        let kv = MemoryKvStore::new();
        sign_up(&kv, "ada", "secret").unwrap();
        log_out(&kv).unwrap();

        let err = log_in(&kv, "ada", "wrong").unwrap_err();
        assert!(err.message().contains("invalid username or password"));
        assert_eq!(current_session(&kv), None);

        let session = log_in(&kv, "ada", "secret").unwrap();
        assert_eq!(session.username, "ada");
        assert_eq!(current_session(&kv), Some(session));
    }

    #[test]
    fn log_out_clears_the_session() {
        let kv = MemoryKvStore::new();
        sign_up(&kv, "ada", "secret").unwrap();

        log_out(&kv).unwrap();
        assert_eq!(current_session(&kv), None);
        // Logging out twice is harmless.
        log_out(&kv).unwrap();
    }

    #[test]
    fn corrupt_user_registry_degrades_to_empty() {
        let kv = MemoryKvStore::new();
        kv.set(USERS_KEY, "{ not json ").unwrap();

        let err = log_in(&kv, "ada", "secret").unwrap_err();
        assert!(err.message().contains("invalid username or password"));

        // Registration still works and replaces the corrupt registry.
        let session = sign_up(&kv, "ada", "secret").unwrap();
        assert_eq!(session.username, "ada");
    }

    #[test]
    fn corrupt_session_payload_reads_as_signed_out() {
        let kv = MemoryKvStore::new();
        kv.set(super::SESSION_KEY, "garbage").unwrap();
        assert_eq!(current_session(&kv), None);
    }
}
