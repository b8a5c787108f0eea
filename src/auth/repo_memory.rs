use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::repo::{DirectoryError, UserDirectory};
use crate::auth::repo_types::{NewUser, ProfileUpdate, User};

/// In-process directory for router tests.
#[derive(Default)]
pub struct MemoryUserDirectory {
    users: RwLock<HashMap<Uuid, User>>,
    down: AtomicBool,
    degraded: AtomicBool,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails as if storage were unreachable.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::Relaxed);
    }

    /// Answers normally but reports itself as non-authoritative.
    pub fn set_degraded(&self, degraded: bool) {
        self.degraded.store(degraded, Ordering::Relaxed);
    }

    fn check_up(&self) -> Result<(), DirectoryError> {
        if self.down.load(Ordering::Relaxed) {
            return Err(DirectoryError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

fn apply(changes: &ProfileUpdate, user: &mut User) {
    if let Some(v) = &changes.name {
        user.name = v.clone();
    }
    if let Some(v) = &changes.email {
        user.email = Some(v.clone());
    }
    if let Some(v) = &changes.state {
        user.state = Some(v.clone());
    }
    if let Some(v) = &changes.district {
        user.district = Some(v.clone());
    }
    if let Some(v) = &changes.village {
        user.village = Some(v.clone());
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_mobile(&self, mobile: &str) -> Result<Option<User>, DirectoryError> {
        self.check_up()?;
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.mobile == mobile).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DirectoryError> {
        self.check_up()?;
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create(&self, u: NewUser) -> Result<User, DirectoryError> {
        self.check_up()?;
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.mobile == u.mobile) {
            return Err(DirectoryError::Conflict);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            mobile: u.mobile,
            password_hash: u.password_hash,
            role: u.role,
            name: u.name,
            email: u.email,
            age: u.age,
            alternate_phone: u.alternate_phone,
            aadhar_number: u.aadhar_number,
            state: u.state,
            district: u.district,
            village: u.village,
            pincode: u.pincode,
            farm: u.farm,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: ProfileUpdate,
    ) -> Result<Option<User>, DirectoryError> {
        self.check_up()?;
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|user| {
            apply(&changes, user);
            user.updated_at = OffsetDateTime::now_utc();
            user.clone()
        }))
    }

    fn is_authoritative(&self) -> bool {
        !self.degraded.load(Ordering::Relaxed)
    }
}
