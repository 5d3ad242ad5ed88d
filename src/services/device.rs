use chrono::Utc;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::constants::{DEVICE_ID_KEY, DEVICE_SCOPE, GUEST_ID_KEY, LAST_SEEN_DEVICE_KEY};
use crate::db::repository::LocalEntryRepository;
use crate::models::{DeviceId, GuestId};

/// `<prefix>_<random>_<unix millis>`
pub fn generate_install_id(prefix: &str) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}", prefix, &random[..9], Utc::now().timestamp_millis())
}

/// Per-install identity: the device id, the guest subject id and the
/// last-seen device cache, all persisted in the local store's device scope.
#[derive(Debug)]
pub struct DeviceRegistry {
    local: Arc<dyn LocalEntryRepository>,
    device_id: OnceCell<DeviceId>,
    guest_id: OnceCell<GuestId>,
}

impl DeviceRegistry {
    pub fn new(local: Arc<dyn LocalEntryRepository>) -> Self {
        Self {
            local,
            device_id: OnceCell::new(),
            guest_id: OnceCell::new(),
        }
    }

    /// This install's device id, generated and persisted on first use
    pub async fn device_id(&self) -> DeviceId {
        self.device_id
            .get_or_init(|| async { DeviceId::new(self.load_or_create(DEVICE_ID_KEY, "device").await) })
            .await
            .clone()
    }

    /// Stable guest subject id for this install
    pub async fn guest_id(&self) -> GuestId {
        self.guest_id
            .get_or_init(|| async { GuestId::new(self.load_or_create(GUEST_ID_KEY, "guest").await) })
            .await
            .clone()
    }

    /// Device that produced the most recently synced record, if cached
    pub async fn last_seen_device_id(&self) -> Option<DeviceId> {
        match self.local.get(DEVICE_SCOPE, LAST_SEEN_DEVICE_KEY).await {
            Ok(entry) => entry
                .map(|e| DeviceId::new(e.value))
                .filter(|id| !id.is_empty()),
            Err(e) => {
                debug!("Last-seen device cache unavailable: {:#}", e);
                None
            }
        }
    }

    pub async fn remember_last_seen(&self, device_id: &DeviceId) {
        if let Err(e) = self
            .local
            .put(
                DEVICE_SCOPE,
                LAST_SEEN_DEVICE_KEY,
                device_id.as_str(),
                Utc::now().naive_utc(),
            )
            .await
        {
            debug!("Could not cache last-seen device: {:#}", e);
        }
    }

    /// Cache-only "new device?" check; false when nothing is cached
    pub async fn last_seen_differs(&self, current: &DeviceId) -> bool {
        self.last_seen_device_id()
            .await
            .is_some_and(|last| &last != current)
    }

    async fn load_or_create(&self, key: &str, prefix: &str) -> String {
        match self.local.get(DEVICE_SCOPE, key).await {
            Ok(Some(entry)) if !entry.value.trim().is_empty() => return entry.value,
            Ok(_) => {}
            Err(e) => warn!("Could not read {} from local storage: {:#}", key, e),
        }

        let id = generate_install_id(prefix);
        match self
            .local
            .put(DEVICE_SCOPE, key, &id, Utc::now().naive_utc())
            .await
        {
            Ok(()) => debug!("Generated {} {}", key, id),
            // Still usable for this process; a new one is minted after restart
            Err(e) => warn!("Could not persist {}: {:#}", key, e),
        }
        id
    }
}
