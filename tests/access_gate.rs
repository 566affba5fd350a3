//! Device and license admission against an in-memory account service.

use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};

use lumina::access::{
    guard_active_session, sign_in, validate_device_access, AccessDenied, AccessService, AuthUser,
    Device, DeviceIdentity, License, NewDevice, Session, UpgradePlan,
};

#[derive(Default)]
struct Accounts {
    session: Option<Session>,
    license: Option<License>,
    devices: Vec<(String, Device)>,
    profiles: Vec<String>,
    touched: Vec<String>,
}

#[derive(Default)]
struct FakeAccess {
    inner: Mutex<Accounts>,
}

impl FakeAccess {
    fn with_license(max_devices: u32, active: bool, expires_in_days: Option<i64>) -> Self {
        let fake = Self::default();
        fake.inner.lock().unwrap().license = Some(License {
            id: "lic-1".into(),
            max_devices,
            active,
            expires_at: expires_in_days.map(|d| Utc::now() + Duration::days(d)),
            created_at: None,
        });
        fake
    }

    fn add_device(&self, user_id: &str, fingerprint: &str) {
        let mut inner = self.inner.lock().unwrap();
        let id = format!("dev-{}", inner.devices.len() + 1);
        inner.devices.push((
            user_id.to_string(),
            Device {
                id,
                device_name: "outro".into(),
                device_fingerprint: fingerprint.into(),
                last_seen: None,
                active: true,
                created_at: None,
            },
        ));
    }

    fn active_count(&self, user_id: &str) -> u64 {
        let inner = self.inner.lock().unwrap();
        inner
            .devices
            .iter()
            .filter(|(u, d)| u == user_id && d.active)
            .count() as u64
    }
}

#[async_trait]
impl AccessService for FakeAccess {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser> {
        self.sign_in(email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        if password != "segredo" {
            return Err(anyhow!("Invalid login credentials"));
        }
        let user = AuthUser {
            id: "user-1".into(),
            email: Some(email.into()),
        };
        self.inner.lock().unwrap().session = Some(Session {
            access_token: "token".into(),
            refresh_token: None,
            user: user.clone(),
        });
        Ok(user)
    }

    async fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.inner.lock().unwrap().session.clone())
    }

    async fn sign_out(&self) -> Result<()> {
        self.inner.lock().unwrap().session = None;
        Ok(())
    }

    async fn ensure_profile(&self, user_id: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.profiles.iter().any(|p| p == user_id) {
            inner.profiles.push(user_id.to_string());
        }
        Ok(())
    }

    async fn list_devices(&self, user_id: &str) -> Result<Vec<Device>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .devices
            .iter()
            .rev()
            .filter(|(u, _)| u == user_id)
            .map(|(_, d)| d.clone())
            .collect())
    }

    async fn find_active_device(&self, user_id: &str, fingerprint: &str) -> Result<Option<Device>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .devices
            .iter()
            .find(|(u, d)| u == user_id && d.active && d.device_fingerprint == fingerprint)
            .map(|(_, d)| d.clone()))
    }

    async fn deactivate_device(&self, user_id: &str, device_id: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        for (u, d) in inner.devices.iter_mut() {
            if u == user_id && d.id == device_id {
                d.active = false;
            }
        }
        Ok(())
    }

    async fn count_active_devices(&self, user_id: &str) -> Result<u64> {
        Ok(self.active_count(user_id))
    }

    async fn register_device(&self, device: &NewDevice) -> Result<()> {
        self.add_device(&device.user_id, &device.device_fingerprint);
        Ok(())
    }

    async fn touch_device(&self, device_id: &str) -> Result<()> {
        self.inner.lock().unwrap().touched.push(device_id.to_string());
        Ok(())
    }

    async fn active_license(&self, _user_id: &str) -> Result<Option<License>> {
        Ok(self.inner.lock().unwrap().license.clone().filter(|l| l.active))
    }

    async fn can_register_device(&self, user_id: &str) -> Result<bool> {
        let limit = match &self.inner.lock().unwrap().license {
            Some(l) => l.max_devices as u64,
            None => return Ok(false),
        };
        Ok(self.active_count(user_id) < limit)
    }

    async fn upgrade_license(&self, _user_id: &str, plan: &UpgradePlan) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(l) = inner.license.as_mut() {
            l.max_devices = plan.max_devices;
            l.expires_at = plan.expires_at;
        }
        Ok(())
    }
}

fn device(fingerprint: &str) -> DeviceIdentity {
    DeviceIdentity {
        fingerprint: fingerprint.into(),
        name: "Linux x86_64".into(),
    }
}

fn denial(err: &anyhow::Error) -> Option<&AccessDenied> {
    err.downcast_ref::<AccessDenied>()
}

#[tokio::test]
async fn test_known_device_is_touched_without_license_check() {
    let svc = FakeAccess::default();
    svc.add_device("user-1", "fp-a");
    validate_device_access(&svc, "user-1", &device("fp-a")).await.unwrap();
    assert_eq!(svc.inner.lock().unwrap().touched, vec!["dev-1".to_string()]);
}

#[tokio::test]
async fn test_new_device_without_license_is_denied() {
    let svc = FakeAccess::default();
    let err = validate_device_access(&svc, "user-1", &device("fp-a"))
        .await
        .unwrap_err();
    assert_eq!(denial(&err), Some(&AccessDenied::NoActiveLicense));
    assert_eq!(err.to_string(), "Nenhuma licença ativa encontrada.");
}

#[tokio::test]
async fn test_expired_license_counts_as_missing() {
    let svc = FakeAccess::with_license(2, true, Some(-1));
    let err = validate_device_access(&svc, "user-1", &device("fp-a"))
        .await
        .unwrap_err();
    assert_eq!(denial(&err), Some(&AccessDenied::NoActiveLicense));
}

#[tokio::test]
async fn test_device_limit_reached() {
    let svc = FakeAccess::with_license(1, true, None);
    svc.add_device("user-1", "fp-old");
    let err = validate_device_access(&svc, "user-1", &device("fp-new"))
        .await
        .unwrap_err();
    assert_eq!(denial(&err), Some(&AccessDenied::DeviceLimitReached));
    assert_eq!(svc.active_count("user-1"), 1);
}

#[tokio::test]
async fn test_new_device_registered_within_limit() {
    let svc = FakeAccess::with_license(2, true, Some(30));
    svc.add_device("user-1", "fp-old");
    validate_device_access(&svc, "user-1", &device("fp-new")).await.unwrap();
    assert_eq!(svc.active_count("user-1"), 2);

    // the second visit is a touch, not another registration
    validate_device_access(&svc, "user-1", &device("fp-new")).await.unwrap();
    assert_eq!(svc.active_count("user-1"), 2);
}

#[tokio::test]
async fn test_deactivated_device_frees_a_seat() {
    let svc = FakeAccess::with_license(1, true, None);
    svc.add_device("user-1", "fp-old");
    svc.deactivate_device("user-1", "dev-1").await.unwrap();
    validate_device_access(&svc, "user-1", &device("fp-new")).await.unwrap();
    let devices = svc.list_devices("user-1").await.unwrap();
    assert_eq!(devices[0].device_fingerprint, "fp-new");
    assert!(!devices[1].active);
}

#[tokio::test]
async fn test_sign_in_creates_profile_and_admits() {
    let svc = FakeAccess::with_license(3, true, None);
    let user = sign_in(&svc, &device("fp-a"), "ana@example.com", "segredo")
        .await
        .unwrap();
    assert_eq!(user.id, "user-1");
    assert_eq!(svc.inner.lock().unwrap().profiles, vec!["user-1".to_string()]);
    assert_eq!(svc.active_count("user-1"), 1);
}

#[tokio::test]
async fn test_sign_in_with_bad_password_fails_before_gate() {
    let svc = FakeAccess::with_license(3, true, None);
    let err = sign_in(&svc, &device("fp-a"), "ana@example.com", "errada")
        .await
        .unwrap_err();
    assert!(denial(&err).is_none());
    assert!(svc.inner.lock().unwrap().profiles.is_empty());
}

#[tokio::test]
async fn test_guard_without_session() {
    let svc = FakeAccess::with_license(3, true, None);
    let err = guard_active_session(&svc).await.unwrap_err();
    assert_eq!(denial(&err), Some(&AccessDenied::InvalidSession));
}

#[tokio::test]
async fn test_guard_with_inactive_license() {
    let svc = FakeAccess::with_license(3, false, None);
    svc.sign_in("ana@example.com", "segredo").await.unwrap();
    let err = guard_active_session(&svc).await.unwrap_err();
    assert_eq!(denial(&err), Some(&AccessDenied::InactiveLicense));
}

#[tokio::test]
async fn test_guard_after_upgrade() {
    let svc = FakeAccess::with_license(1, true, Some(-3));
    svc.sign_in("ana@example.com", "segredo").await.unwrap();
    assert!(guard_active_session(&svc).await.is_err());

    let plan = UpgradePlan {
        max_devices: 3,
        expires_at: Some(Utc::now() + Duration::days(365)),
    };
    svc.upgrade_license("user-1", &plan).await.unwrap();
    let session = guard_active_session(&svc).await.unwrap();
    assert_eq!(session.user.id, "user-1");
}
