use anyhow::Result;
use chrono::Utc;

use crate::logging::log_access;

use super::{AccessService, AuthUser, DeviceIdentity, NewDevice, Session};

/// Conditions that stop a user before the board. Messages are shown as-is.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AccessDenied {
    #[error("Sessão inválida.")]
    InvalidSession,
    #[error("Nenhuma licença ativa encontrada.")]
    NoActiveLicense,
    #[error("Licença inativa ou expirada.")]
    InactiveLicense,
    #[error("Limite de dispositivos atingido para esta licença.")]
    DeviceLimitReached,
}

pub async fn sign_up(
    svc: &dyn AccessService,
    device: &DeviceIdentity,
    email: &str,
    password: &str,
) -> Result<AuthUser> {
    let user = svc.sign_up(email, password).await?;
    admit(svc, device, &user, "sign_up").await?;
    Ok(user)
}

pub async fn sign_in(
    svc: &dyn AccessService,
    device: &DeviceIdentity,
    email: &str,
    password: &str,
) -> Result<AuthUser> {
    let user = svc.sign_in(email, password).await?;
    admit(svc, device, &user, "sign_in").await?;
    Ok(user)
}

async fn admit(svc: &dyn AccessService, device: &DeviceIdentity, user: &AuthUser, step: &str) -> Result<()> {
    svc.ensure_profile(&user.id).await?;
    match validate_device_access(svc, &user.id, device).await {
        Ok(()) => {
            log_access(step, &user.id, "ok");
            Ok(())
        }
        Err(err) => {
            log_access(step, &user.id, &err.to_string());
            Err(err)
        }
    }
}

/// Let the device in if it is already registered; otherwise register it
/// when the license allows one more.
pub async fn validate_device_access(
    svc: &dyn AccessService,
    user_id: &str,
    device: &DeviceIdentity,
) -> Result<()> {
    if let Some(existing) = svc.find_active_device(user_id, &device.fingerprint).await? {
        svc.touch_device(&existing.id).await?;
        return Ok(());
    }

    let now = Utc::now();
    let license = svc
        .active_license(user_id)
        .await?
        .filter(|l| l.is_valid_at(now))
        .ok_or(AccessDenied::NoActiveLicense)?;

    if !svc.can_register_device(user_id).await? {
        return Err(AccessDenied::DeviceLimitReached.into());
    }

    svc.register_device(&NewDevice {
        user_id: user_id.to_string(),
        license_id: license.id,
        device_fingerprint: device.fingerprint.clone(),
        device_name: device.name.clone(),
        active: true,
        last_seen: now,
    })
    .await
}

/// The current session must exist and its user must still hold a valid
/// license.
pub async fn guard_active_session(svc: &dyn AccessService) -> Result<Session> {
    let session = svc
        .current_session()
        .await?
        .ok_or(AccessDenied::InvalidSession)?;

    let now = Utc::now();
    svc.active_license(&session.user.id)
        .await?
        .filter(|l| l.is_valid_at(now))
        .ok_or(AccessDenied::InactiveLicense)?;

    Ok(session)
}
