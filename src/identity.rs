use crate::error::{DashboardError, Result};
use crate::session::UserHandle;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File, create_dir_all};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 6;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// External service that checks email/password credentials
///
/// Implementations return the provider's own error text in
/// `DashboardError::Auth`; the gate shows it to the user verbatim.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account and sign it in
    async fn sign_up(&self, email: &str, password: &str) -> Result<UserHandle>;

    /// Verify existing credentials
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserHandle>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// User data structure representing a registered dashboard user
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    /// Email address (unique identifier for the user)
    pub email: String,

    /// Argon2 hash of the user's password
    pub password_hash: String,

    /// When the account was created
    pub created_at: SystemTime,
}

/// Identity provider backed by a JSON file of argon2-hashed users
///
/// The file maps email to `User`. It is created on first use.
/// Hashing and file access run on the blocking thread pool.
#[derive(Clone)]
pub struct LocalIdentityProvider {
    users_path: PathBuf,
    // serialises read-modify-write of the users file, shared by clones
    lock: Arc<Mutex<()>>,
}

impl LocalIdentityProvider {
    pub fn new(users_path: impl Into<PathBuf>) -> Self {
        Self {
            users_path: users_path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Create the users file and its directory if they don't exist
    pub fn init_database(&self) -> std::io::Result<()> {
        if let Some(dir) = self.users_path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                create_dir_all(dir)?;
            }
        }

        if !self.users_path.exists() {
            let mut file = File::create(&self.users_path)?;
            file.write_all(b"{}")?;
        }

        Ok(())
    }

    /// Get all registered users
    ///
    /// # Errors
    /// * Returns an error if the users file cannot be opened, read, or parsed
    pub fn get_users(&self) -> std::result::Result<HashMap<String, User>, String> {
        if !self.users_path.exists() {
            return Ok(HashMap::new());
        }

        let mut file = match File::open(&self.users_path) {
            Ok(file) => file,
            Err(_) => return Err("Failed to open users file".to_string()),
        };

        let mut contents = String::new();
        if file.read_to_string(&mut contents).is_err() {
            return Err("Failed to read users file".to_string());
        }

        match serde_json::from_str(&contents) {
            Ok(users) => Ok(users),
            Err(_) => Err("Failed to parse users data".to_string()),
        }
    }

    fn save_users(&self, users: &HashMap<String, User>) -> std::result::Result<(), String> {
        let json = match serde_json::to_string_pretty(users) {
            Ok(json) => json,
            Err(_) => return Err("Failed to serialize users data".to_string()),
        };

        if self.init_database().is_err() {
            return Err("Failed to create users file".to_string());
        }

        // write to a sibling file first so a crash never truncates the store
        let tmp = self.users_path.with_extension("json.tmp");
        if fs::write(&tmp, json).is_err() {
            return Err("Failed to write users data".to_string());
        }
        if fs::rename(&tmp, &self.users_path).is_err() {
            return Err("Failed to write users data".to_string());
        }

        Ok(())
    }

    pub fn users_path(&self) -> &Path {
        &self.users_path
    }

    fn register(&self, email: &str, password: &str) -> Result<UserHandle> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(DashboardError::Auth("Email and password cannot be empty".to_string()));
        }
        if !EMAIL_RE.is_match(email) {
            return Err(DashboardError::Auth("Email address is badly formatted".to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DashboardError::Auth(format!(
                "Password should be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let key = email.to_ascii_lowercase();
        let mut users = self.get_users().map_err(DashboardError::Auth)?;
        if users.contains_key(&key) {
            return Err(DashboardError::Auth("Email address is already registered".to_string()));
        }

        let password_hash = hash_password(password).map_err(DashboardError::Auth)?;
        users.insert(
            key,
            User {
                email: email.to_string(),
                password_hash,
                created_at: SystemTime::now(),
            },
        );
        self.save_users(&users).map_err(DashboardError::Auth)?;

        Ok(issue_handle(email))
    }

    fn verify(&self, email: &str, password: &str) -> Result<UserHandle> {
        let email = email.trim();
        let users = self.get_users().map_err(DashboardError::Auth)?;

        match users.get(&email.to_ascii_lowercase()) {
            Some(user) => match verify_password(password, &user.password_hash) {
                Ok(true) => Ok(issue_handle(&user.email)),
                Ok(false) => Err(DashboardError::Auth("Invalid credentials".to_string())),
                Err(e) => Err(DashboardError::Auth(e)),
            },
            None => Err(DashboardError::Auth("Invalid credentials".to_string())),
        }
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<UserHandle> {
        let provider = self.clone();
        let (email, password) = (email.to_string(), password.to_string());
        blocking(move || provider.register(&email, &password)).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserHandle> {
        let provider = self.clone();
        let (email, password) = (email.to_string(), password.to_string());
        blocking(move || provider.verify(&email, &password)).await
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

/// Run argon2 and file work off the async workers
#[cfg(feature = "web")]
async fn blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| DashboardError::Auth(format!("Sign-in task failed: {}", e)))?
}

#[cfg(not(feature = "web"))]
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    work()
}

fn issue_handle(email: &str) -> UserHandle {
    UserHandle {
        email: email.to_string(),
        token: Uuid::new_v4().to_string(),
    }
}

/// Hash a password using Argon2
fn hash_password(password: &str) -> std::result::Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    match argon2.hash_password(password.as_bytes(), &salt) {
        Ok(hash) => Ok(hash.to_string()),
        Err(_) => Err("Password hashing failed".to_string()),
    }
}

/// Verify a password against a stored hash
fn verify_password(password: &str, hash: &str) -> std::result::Result<bool, String> {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(hash) => hash,
        Err(_) => return Err("Invalid password hash format".to_string()),
    };

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(_) => Ok(false), // Password didn't match
    }
}

#[cfg(feature = "web")]
pub use firebase::FirebaseIdentityProvider;

#[cfg(feature = "web")]
mod firebase {
    use super::IdentityProvider;
    use crate::error::{DashboardError, Result};
    use crate::session::UserHandle;
    use async_trait::async_trait;
    use serde_json::{Value, json};

    pub const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

    /// Email/password accounts through the Firebase Identity Toolkit REST API
    pub struct FirebaseIdentityProvider {
        client: reqwest::Client,
        api_key: String,
        base_url: String,
    }

    impl FirebaseIdentityProvider {
        pub fn new(api_key: impl Into<String>) -> Self {
            Self::with_base_url(api_key, IDENTITY_TOOLKIT_URL)
        }

        /// Point the provider at another endpoint (emulator or test server)
        pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
            Self {
                client: reqwest::Client::new(),
                api_key: api_key.into(),
                base_url: base_url.into().trim_end_matches('/').to_string(),
            }
        }

        async fn call(&self, method: &str, email: &str, password: &str) -> Result<UserHandle> {
            let url = format!("{}/accounts:{}?key={}", self.base_url, method, self.api_key);
            let response = self
                .client
                .post(&url)
                .json(&json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }))
                .send()
                .await
                .map_err(|e| DashboardError::Auth(e.to_string()))?;

            let status = response.status();
            let body: Value = response
                .json()
                .await
                .map_err(|e| DashboardError::Auth(e.to_string()))?;

            if !status.is_success() {
                let message = body["error"]["message"]
                    .as_str()
                    .unwrap_or("Authentication failed");
                return Err(DashboardError::Auth(message.to_string()));
            }

            let token = body["idToken"]
                .as_str()
                .ok_or_else(|| DashboardError::Auth("Identity provider returned no token".to_string()))?;

            Ok(UserHandle {
                email: body["email"].as_str().unwrap_or(email).to_string(),
                token: token.to_string(),
            })
        }
    }

    #[async_trait]
    impl IdentityProvider for FirebaseIdentityProvider {
        async fn sign_up(&self, email: &str, password: &str) -> Result<UserHandle> {
            self.call("signUp", email, password).await
        }

        async fn sign_in(&self, email: &str, password: &str) -> Result<UserHandle> {
            self.call("signInWithPassword", email, password).await
        }

        fn name(&self) -> &'static str {
            "firebase"
        }
    }
}
