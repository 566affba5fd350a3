use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use uuid::Uuid;

/// Stable identity of this installation, registered against a license.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub fingerprint: String,
    pub name: String,
}

impl DeviceIdentity {
    /// Reuse the fingerprint stored at `path`, or generate one and store it.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let stored = match fs::read_to_string(path) {
            Ok(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => return Err(err).with_context(|| format!("reading {}", path.display())),
        };

        let fingerprint = match stored {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("creating {}", parent.display()))?;
                }
                fs::write(path, &id).with_context(|| format!("writing {}", path.display()))?;
                id
            }
        };

        Ok(Self {
            fingerprint,
            name: device_name(),
        })
    }
}

fn device_name() -> String {
    match std::env::consts::OS {
        "android" => "Android Device".to_string(),
        "ios" => "iOS Device".to_string(),
        os => format!("CLI - {}", os),
    }
}
