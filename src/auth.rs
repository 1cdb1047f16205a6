//! Access gate: credential checks for the configured admin and for stored
//! operators, plus the [`Session`] value that carries the authenticated
//! identity into every mutating ledger call.

use crate::db::{fetch_operators, fetch_password_hash, insert_operator, Store};
use crate::error::{require, TrackerError, TrackerResult};
use crate::models::Operator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Operator,
}

/// Identity of whoever is logged in. Only the gate can mint one, so holding a
/// `Session` means the credentials were checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    username: String,
    role: Role,
}

impl Session {
    fn new(username: &str, role: Role) -> Self {
        Self {
            username: username.to_string(),
            role,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Name recorded in `rework_done_by`.
    pub fn performer(&self) -> &str {
        if self.username.trim().is_empty() {
            "unknown"
        } else {
            &self.username
        }
    }

    /// Fail with `Forbidden` unless this is an admin session.
    pub fn require_admin(&self, action: &'static str) -> TrackerResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(TrackerError::Forbidden(action))
        }
    }
}

/// The configured admin login. The password is only ever held as a bcrypt
/// hash; with no hash configured admin login is refused.
#[derive(Debug, Clone)]
pub struct AdminCredential {
    pub username: String,
    pub password_hash: Option<String>,
}

impl AdminCredential {
    pub fn is_configured(&self) -> bool {
        self.password_hash
            .as_deref()
            .map(|hash| !hash.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Salted bcrypt hash of `password` at the given cost.
pub fn hash_password(password: &str, cost: u32) -> TrackerResult<String> {
    Ok(bcrypt::hash(password, cost)?)
}

/// Constant-time check of `password` against a stored bcrypt hash. A
/// malformed hash counts as a mismatch rather than a fault.
fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(matches) => matches,
        Err(err) => {
            log::warn!("stored password hash could not be verified: {err}");
            false
        }
    }
}

pub struct AccessGate {
    store: Store,
    admin: AdminCredential,
    cost: u32,
}

impl AccessGate {
    pub fn new(store: Store, admin: AdminCredential, cost: u32) -> Self {
        Self { store, admin, cost }
    }

    pub fn admin_username(&self) -> &str {
        &self.admin.username
    }

    pub fn admin_configured(&self) -> bool {
        self.admin.is_configured()
    }

    /// Replace the admin credential after first-run setup.
    pub fn set_admin_credential(&mut self, admin: AdminCredential) {
        self.admin = admin;
    }

    pub fn authenticate_admin(&self, username: &str, password: &str) -> bool {
        let Some(hash) = self.admin.password_hash.as_deref() else {
            log::warn!("admin login attempted but no admin credential is configured");
            return false;
        };
        let password_ok = verify_password(password, hash);
        username == self.admin.username && password_ok
    }

    pub fn authenticate_operator(&self, username: &str, password: &str) -> TrackerResult<bool> {
        let stored = self
            .store
            .read(|conn| fetch_password_hash(conn, username))?;
        match stored {
            Some(hash) => Ok(verify_password(password, &hash)),
            None => {
                self.spend_hash_work(password);
                Ok(false)
            }
        }
    }

    /// Hash `password` at the configured cost and discard the result, so a
    /// lookup miss costs as much as a real verify.
    fn spend_hash_work(&self, password: &str) -> bool {
        bcrypt::hash(password, self.cost).is_ok()
    }

    pub fn login_admin(&self, username: &str, password: &str) -> Option<Session> {
        let username = username.trim();
        if self.authenticate_admin(username, password) {
            log::info!("admin {username} logged in");
            Some(Session::new(username, Role::Admin))
        } else {
            log::warn!("failed admin login for {username}");
            None
        }
    }

    pub fn login_operator(&self, username: &str, password: &str) -> TrackerResult<Option<Session>> {
        let username = username.trim();
        if self.authenticate_operator(username, password)? {
            log::info!("operator {username} logged in");
            Ok(Some(Session::new(username, Role::Operator)))
        } else {
            log::warn!("failed operator login for {username}");
            Ok(None)
        }
    }

    /// Re-check the admin password before sensitive views.
    pub fn verify_admin_password(&self, password: &str) -> bool {
        self.authenticate_admin(&self.admin.username, password)
    }

    pub fn register_operator(
        &self,
        session: &Session,
        username: &str,
        password: &str,
    ) -> TrackerResult<Operator> {
        session.require_admin("Adding an operator")?;
        let username = require("Username", username)?;
        let password = require("Password", password)?;
        if username == self.admin.username {
            return Err(TrackerError::DuplicateUsername(username.to_string()));
        }

        let hash = hash_password(password, self.cost)?;
        let operator = self
            .store
            .write(|tx| insert_operator(tx, username, &hash))?;
        log::info!("operator {} registered by {}", operator.username, session.username());
        Ok(operator)
    }

    pub fn list_operators(&self, session: &Session) -> TrackerResult<Vec<Operator>> {
        session.require_admin("Viewing operators")?;
        self.store.read(fetch_operators)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use tempfile::TempDir;

    use super::*;

    pub(crate) const TEST_COST: u32 = 4;

    pub(crate) fn admin_session() -> Session {
        Session::new("admin", Role::Admin)
    }

    pub(crate) fn operator_session(name: &str) -> Session {
        Session::new(name, Role::Operator)
    }

    fn gate(dir: &TempDir) -> AccessGate {
        let store = Store::new(dir.path().join("rework_data.db"));
        store.initialize().unwrap();
        let admin = AdminCredential {
            username: "admin".into(),
            password_hash: Some(hash_password("admin-secret", TEST_COST).unwrap()),
        };
        AccessGate::new(store, admin, TEST_COST)
    }

    #[test]
    fn operator_register_and_authenticate() {
        let dir = TempDir::new().unwrap();
        let gate = gate(&dir);
        let admin = admin_session();

        gate.register_operator(&admin, "op1", "secret").unwrap();
        assert!(gate.authenticate_operator("op1", "secret").unwrap());
        assert!(!gate.authenticate_operator("op1", "wrong").unwrap());
        assert!(!gate.authenticate_operator("nobody", "secret").unwrap());

        let err = gate.register_operator(&admin, "op1", "other").unwrap_err();
        assert!(matches!(err, TrackerError::DuplicateUsername(ref name) if name == "op1"));
    }

    #[test]
    fn unknown_operator_runs_the_same_hash_work() {
        let dir = TempDir::new().unwrap();
        let gate = gate(&dir);

        assert!(gate.spend_hash_work("secret"));
        assert!(!gate.authenticate_operator("nobody", "secret").unwrap());
        assert!(gate.login_operator("nobody", "secret").unwrap().is_none());

        let slow = AccessGate::new(gate.store.clone(), gate.admin.clone(), 99);
        assert!(!slow.spend_hash_work("secret"));
    }

    #[test]
    fn operator_password_is_not_stored_in_clear() {
        let dir = TempDir::new().unwrap();
        let gate = gate(&dir);
        gate.register_operator(&admin_session(), "op1", "secret").unwrap();

        let stored = gate
            .store
            .read(|conn| fetch_password_hash(conn, "op1"))
            .unwrap()
            .unwrap();
        assert_ne!(stored, "secret");
        assert!(stored.starts_with("$2"));
    }

    #[test]
    fn admin_login_uses_configured_hash() {
        let dir = TempDir::new().unwrap();
        let gate = gate(&dir);

        assert!(gate.authenticate_admin("admin", "admin-secret"));
        assert!(!gate.authenticate_admin("admin", "admin@123"));
        assert!(!gate.authenticate_admin("root", "admin-secret"));
        assert!(gate.verify_admin_password("admin-secret"));

        let session = gate.login_admin("admin", "admin-secret").unwrap();
        assert!(session.is_admin());
        assert_eq!(session.performer(), "admin");
    }

    #[test]
    fn unconfigured_admin_cannot_log_in() {
        let dir = TempDir::new().unwrap();
        let mut gate = gate(&dir);
        gate.set_admin_credential(AdminCredential {
            username: "admin".into(),
            password_hash: None,
        });
        assert!(!gate.admin_configured());
        assert!(gate.login_admin("admin", "").is_none());
    }

    #[test]
    fn operators_cannot_manage_operators() {
        let dir = TempDir::new().unwrap();
        let gate = gate(&dir);
        let op = operator_session("op1");

        let err = gate.register_operator(&op, "op2", "pw").unwrap_err();
        assert!(matches!(err, TrackerError::Forbidden(_)));
        assert!(matches!(
            gate.list_operators(&op).unwrap_err(),
            TrackerError::Forbidden(_)
        ));
    }

    #[test]
    fn operator_named_like_admin_is_rejected() {
        let dir = TempDir::new().unwrap();
        let gate = gate(&dir);
        let err = gate
            .register_operator(&admin_session(), "admin", "pw")
            .unwrap_err();
        assert!(err.is_duplicate());
    }

    #[test]
    fn list_operators_returns_names_only() {
        let dir = TempDir::new().unwrap();
        let gate = gate(&dir);
        let admin = admin_session();
        gate.register_operator(&admin, "zed", "pw").unwrap();
        gate.register_operator(&admin, "amy", "pw").unwrap();

        let names: Vec<String> = gate
            .list_operators(&admin)
            .unwrap()
            .into_iter()
            .map(|op| op.username)
            .collect();
        assert_eq!(names, vec!["amy", "zed"]);
    }
}
