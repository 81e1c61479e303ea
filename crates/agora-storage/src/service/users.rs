use crate::documents::{DocumentStore, Transaction};
use crate::domain::collections::Collection;
use crate::domain::errors::{ServiceError, StoreError};
use crate::domain::password::{hash_password, verify_password};
use crate::ports::inbound::UserApi;
use crate::ports::outbound::TimeSource;
use agora_types::{DocumentId, GoogleCredentials, NewUser, SafeUser, User, UserUpdate};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info};

/// Attempts at a free username when creating an account from a Google login.
const MAX_USERNAME_ATTEMPTS: usize = 10;

/// Exclusive upper bound of the numeric suffix added to taken usernames.
const USERNAME_SUFFIX_RANGE: u32 = 10_000;

pub struct UserService {
    store: Arc<DocumentStore>,
    clock: Arc<dyn TimeSource>,
}

impl UserService {
    pub fn new(store: Arc<DocumentStore>, clock: Arc<dyn TimeSource>) -> Self {
        Self { store, clock }
    }

    fn find_user<P>(&self, predicate: P) -> Result<User, ServiceError>
    where
        P: Fn(&User) -> bool,
    {
        self.store
            .scan::<User>(Collection::User)?
            .into_iter()
            .find(|u| predicate(u))
            .ok_or(ServiceError::UserNotFound)
    }

    fn build_user(&self, new: NewUser) -> Result<User, ServiceError> {
        if new.username.trim().is_empty() {
            return Err(ServiceError::InvalidUser("Username is required".into()));
        }
        let password = new.password.filter(|p| !p.is_empty());
        if password.is_none() && new.google_id.is_none() {
            return Err(ServiceError::InvalidUser(
                "A password or a Google account is required".into(),
            ));
        }

        Ok(User {
            id: DocumentId::new(),
            username: new.username,
            password_hash: password.as_deref().map(hash_password),
            date_joined: self.clock.now(),
            biography: new.biography.unwrap_or_default(),
            google_id: new.google_id,
            email: new.email,
            avatar_url: new.avatar_url,
            socket_id: None,
        })
    }
}

/// Insert a user, enforcing unique username and Google id.
fn insert_user(tx: &mut Transaction<'_>, user: &User) -> Result<(), ServiceError> {
    if let Some(google_id) = &user.google_id {
        ensure_google_id_free(tx, google_id, &user.username)?;
    }
    tx.insert(Collection::User, &user.username, user)
        .map_err(|e| match e {
            StoreError::Conflict { .. } => ServiceError::UsernameTaken(user.username.clone()),
            other => other.into(),
        })
}

fn ensure_google_id_free(
    tx: &Transaction<'_>,
    google_id: &str,
    owner: &str,
) -> Result<(), ServiceError> {
    let taken = tx
        .scan::<User>(Collection::User)?
        .iter()
        .any(|u| u.google_id.as_deref() == Some(google_id) && u.username != owner);
    if taken {
        Err(ServiceError::GoogleIdTaken)
    } else {
        Ok(())
    }
}

/// Username derived from an email: the local part with anything that is not
/// ASCII alphanumeric stripped.
fn username_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let name: String = local.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    if name.is_empty() {
        "user".to_string()
    } else {
        name
    }
}

impl UserApi for UserService {
    fn save_user(&self, new: NewUser) -> Result<SafeUser, ServiceError> {
        let user = self.build_user(new)?;
        self.store.transaction(|tx| insert_user(tx, &user))?;
        info!(username = %user.username, "User created");
        Ok(user.to_safe())
    }

    fn get_user_by_username(&self, username: &str) -> Result<SafeUser, ServiceError> {
        self.store
            .get::<User>(Collection::User, username)?
            .map(SafeUser::from)
            .ok_or(ServiceError::UserNotFound)
    }

    fn get_user_by_google_id(&self, google_id: &str) -> Result<SafeUser, ServiceError> {
        self.find_user(|u| u.google_id.as_deref() == Some(google_id))
            .map(SafeUser::from)
    }

    fn get_user_by_email(&self, email: &str) -> Result<SafeUser, ServiceError> {
        self.find_user(|u| u.email.as_deref() == Some(email))
            .map(SafeUser::from)
    }

    fn get_users_list(&self) -> Result<Vec<SafeUser>, ServiceError> {
        let mut users = self.store.scan::<User>(Collection::User)?;
        users.sort_by(|a, b| {
            a.date_joined
                .cmp(&b.date_joined)
                .then_with(|| a.username.cmp(&b.username))
        });
        Ok(users.into_iter().map(SafeUser::from).collect())
    }

    fn login_user(&self, username: &str, password: &str) -> Result<SafeUser, ServiceError> {
        let user = self
            .store
            .get::<User>(Collection::User, username)?
            .ok_or(ServiceError::AuthenticationFailed)?;
        let hash = user
            .password_hash
            .as_ref()
            .ok_or(ServiceError::AuthenticationFailed)?;
        if !verify_password(password, hash) {
            debug!(username = %username, "Password mismatch");
            return Err(ServiceError::AuthenticationFailed);
        }
        Ok(user.to_safe())
    }

    fn delete_user_by_username(&self, username: &str) -> Result<SafeUser, ServiceError> {
        let user = self
            .store
            .remove::<User>(Collection::User, username)?
            .ok_or(ServiceError::UserNotFound)?;
        info!(username = %username, "User deleted");
        Ok(user.to_safe())
    }

    fn update_user(&self, username: &str, update: UserUpdate) -> Result<SafeUser, ServiceError> {
        let password_hash = update.password.as_deref().map(hash_password);

        self.store.transaction(|tx| {
            let mut user = tx
                .get::<User>(Collection::User, username)?
                .ok_or(ServiceError::UserNotFound)?;

            if let Some(google_id) = &update.google_id {
                ensure_google_id_free(tx, google_id, username)?;
                user.google_id = Some(google_id.clone());
            }
            if let Some(hash) = password_hash {
                user.password_hash = Some(hash);
            }
            if let Some(biography) = update.biography {
                user.biography = biography;
            }
            if let Some(avatar_url) = update.avatar_url {
                user.avatar_url = Some(avatar_url);
            }
            if let Some(socket_id) = update.socket_id {
                user.socket_id = Some(socket_id);
            }

            tx.upsert(Collection::User, username, &user)?;
            debug!(username = %username, "User updated");
            Ok(user.to_safe())
        })
    }

    fn login_with_google(&self, credentials: GoogleCredentials) -> Result<SafeUser, ServiceError> {
        let now = self.clock.now();

        self.store.transaction(|tx| {
            let users = tx.scan::<User>(Collection::User)?;

            if let Some(user) = users
                .iter()
                .find(|u| u.google_id.as_deref() == Some(credentials.google_id.as_str()))
            {
                return Ok(user.to_safe());
            }

            if let Some(existing) = users
                .iter()
                .find(|u| u.email.as_deref() == Some(credentials.email.as_str()))
            {
                let mut user = existing.clone();
                user.google_id = Some(credentials.google_id.clone());
                user.avatar_url = credentials.picture.clone().or(user.avatar_url);
                tx.upsert(Collection::User, &user.username, &user)?;
                info!(username = %user.username, "Linked Google account to existing user");
                return Ok(user.to_safe());
            }

            let base = username_from_email(&credentials.email);
            let mut rng = rand::thread_rng();
            for attempt in 0..MAX_USERNAME_ATTEMPTS {
                let candidate = if attempt == 0 {
                    base.clone()
                } else {
                    format!("{base}{}", rng.gen_range(0..USERNAME_SUFFIX_RANGE))
                };
                if tx.exists(Collection::User, &candidate)? {
                    continue;
                }

                let user = User {
                    id: DocumentId::new(),
                    username: candidate,
                    password_hash: None,
                    date_joined: now,
                    biography: String::new(),
                    google_id: Some(credentials.google_id.clone()),
                    email: Some(credentials.email.clone()),
                    avatar_url: credentials.picture.clone(),
                    socket_id: None,
                };
                insert_user(tx, &user)?;
                info!(username = %user.username, "User created from Google login");
                return Ok(user.to_safe());
            }

            Err(ServiceError::UsernameTaken(base))
        })
    }

    fn remove_socket_by_socket_id(&self, socket_id: &str) -> Result<SafeUser, ServiceError> {
        self.store.transaction(|tx| {
            let mut user = tx
                .scan::<User>(Collection::User)?
                .into_iter()
                .find(|u| u.socket_id.as_deref() == Some(socket_id))
                .ok_or(ServiceError::UserNotFound)?;
            user.socket_id = None;
            tx.upsert(Collection::User, &user.username, &user)?;
            debug!(username = %user.username, socket_id = %socket_id, "Cleared socket id");
            Ok(user.to_safe())
        })
    }
}
