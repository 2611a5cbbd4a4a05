use std::{fs, io, path::Path};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::device::{decode_key, encode_key, KeyPair, LinkedDevice};
use crate::session::SessionError;
use crate::types::JID;

/// Persisted authentication data that lets a restart skip QR pairing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionArtifact {
    /// Phone account the device was linked to.
    pub jid: JID,
    /// Human-readable device name shown on the phone.
    pub device_name: String,
    pub noise_key: String,
    pub identity_key: String,
    pub adv_secret_key: String,
    pub registration_id: u32,
    pub linked_at: DateTime<Utc>,
}

impl SessionArtifact {
    /// Capture the credentials of a freshly linked device.
    pub fn new(jid: JID, device_name: impl Into<String>, device: &LinkedDevice) -> Self {
        Self {
            jid,
            device_name: device_name.into(),
            noise_key: encode_key(&device.noise_key.private),
            identity_key: encode_key(&device.identity_key.private),
            adv_secret_key: encode_key(&device.adv_secret_key),
            registration_id: device.registration_id,
            linked_at: Utc::now(),
        }
    }

    /// Rebuild the device credentials stored in this artifact.
    pub fn device(&self) -> Result<LinkedDevice, SessionError> {
        Ok(LinkedDevice {
            noise_key: KeyPair::from_private_key(decode_key("noise_key", &self.noise_key)?),
            identity_key: KeyPair::from_private_key(decode_key("identity_key", &self.identity_key)?),
            adv_secret_key: decode_key("adv_secret_key", &self.adv_secret_key)?,
            registration_id: self.registration_id,
        })
    }

    /// Read an artifact, returning `None` when no file exists yet.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>, SessionError> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist the artifact to disk in JSON format.
    pub fn store(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)?;
        Ok(())
    }

    /// Delete a stored artifact. Missing files are not an error.
    pub fn remove(path: impl AsRef<Path>) -> Result<(), SessionError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
