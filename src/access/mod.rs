//! Account gate: session, license and device registration against the
//! hosted auth/database service.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod device;
mod gate;
mod license;
mod supabase;

pub use device::DeviceIdentity;
pub use gate::{guard_active_session, sign_in, sign_up, validate_device_access, AccessDenied};
pub use supabase::SupabaseAccess;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: AuthUser,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub id: String,
    pub max_devices: u32,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub device_name: String,
    pub device_fingerprint: String,
    pub last_seen: Option<DateTime<Utc>>,
    pub active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Row inserted when a device is registered against a license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewDevice {
    pub user_id: String,
    pub license_id: String,
    pub device_fingerprint: String,
    pub device_name: String,
    pub active: bool,
    pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradePlan {
    pub max_devices: u32,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Remote operations the gate relies on.
#[async_trait]
pub trait AccessService: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser>;
    async fn current_session(&self) -> Result<Option<Session>>;
    async fn sign_out(&self) -> Result<()>;

    /// Create the basic profile row if the user has none yet.
    async fn ensure_profile(&self, user_id: &str) -> Result<()>;

    /// Newest first.
    async fn list_devices(&self, user_id: &str) -> Result<Vec<Device>>;
    async fn find_active_device(&self, user_id: &str, fingerprint: &str) -> Result<Option<Device>>;
    async fn deactivate_device(&self, user_id: &str, device_id: &str) -> Result<()>;
    async fn count_active_devices(&self, user_id: &str) -> Result<u64>;
    async fn register_device(&self, device: &NewDevice) -> Result<()>;
    /// Bump `last_seen` to now.
    async fn touch_device(&self, device_id: &str) -> Result<()>;

    async fn active_license(&self, user_id: &str) -> Result<Option<License>>;
    /// Server-side check of active devices against the license limit.
    async fn can_register_device(&self, user_id: &str) -> Result<bool>;
    async fn upgrade_license(&self, user_id: &str, plan: &UpgradePlan) -> Result<()>;
}
