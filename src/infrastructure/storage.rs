use std::cell::RefCell;
use std::rc::Rc;

use web_sys::Storage;

use crate::domain::errors::ChartError;
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{Resolution, ResolutionPreference};
use crate::{log_debug, log_warn};

/// Documented session-storage key for the chosen price resolution.
pub const RESOLUTION_STORAGE_KEY: &str = "sentiment-chart.price-resolution";

/// Resolution preference in `window.sessionStorage`.
///
/// Storage being unavailable (private mode, sandboxed iframe) degrades to
/// "no preference"; failures are logged and never surfaced.
#[derive(Debug, Clone)]
pub struct SessionPreferenceStore {
    key: String,
}

impl Default for SessionPreferenceStore {
    fn default() -> Self {
        Self::new(RESOLUTION_STORAGE_KEY)
    }
}

impl SessionPreferenceStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn storage() -> Result<Storage, ChartError> {
        web_sys::window()
            .ok_or_else(|| ChartError::Storage("window not available".to_string()))?
            .session_storage()
            .map_err(|e| ChartError::Storage(format!("{:?}", e)))?
            .ok_or_else(|| ChartError::Storage("sessionStorage not available".to_string()))
    }

    fn read_raw(&self) -> Result<Option<String>, ChartError> {
        Self::storage()?.get_item(&self.key).map_err(|e| ChartError::Storage(format!("{:?}", e)))
    }
}

impl ResolutionPreference for SessionPreferenceStore {
    fn load(&self) -> Option<Resolution> {
        let raw = match self.read_raw() {
            Ok(raw) => raw?,
            Err(e) => {
                log_warn!(LogComponent::Infrastructure("SessionPreferenceStore"), "load failed: {}", e);
                return None;
            }
        };
        let parsed = Resolution::parse_stored(&raw);
        if parsed.is_none() {
            log_debug!(
                LogComponent::Infrastructure("SessionPreferenceStore"),
                "ignoring unrecognized stored resolution {:?}",
                raw
            );
        }
        parsed
    }

    fn save(&self, resolution: Resolution) {
        let result = Self::storage().and_then(|storage| {
            storage
                .set_item(&self.key, resolution.as_ref())
                .map_err(|e| ChartError::Storage(format!("{:?}", e)))
        });
        if let Err(e) = result {
            log_warn!(LogComponent::Infrastructure("SessionPreferenceStore"), "save failed: {}", e);
        }
    }
}

/// In-memory preference holding the raw stored string, so tests can seed
/// malformed values. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    raw: Rc<RefCell<Option<String>>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self { raw: Rc::new(RefCell::new(Some(raw.into()))) }
    }

    pub fn raw(&self) -> Option<String> {
        self.raw.borrow().clone()
    }
}

impl ResolutionPreference for MemoryPreferenceStore {
    fn load(&self) -> Option<Resolution> {
        self.raw.borrow().as_deref().and_then(Resolution::parse_stored)
    }

    fn save(&self, resolution: Resolution) {
        *self.raw.borrow_mut() = Some(resolution.as_ref().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips_known_values() {
        let store = MemoryPreferenceStore::new();
        assert_eq!(store.load(), None);
        store.save(Resolution::FifteenMinutes);
        assert_eq!(store.raw().as_deref(), Some("15m"));
        assert_eq!(store.load(), Some(Resolution::FifteenMinutes));
    }

    #[test]
    fn malformed_values_read_as_absent() {
        for raw in ["", "2m", "hourly", "{\"r\":1}"] {
            assert_eq!(MemoryPreferenceStore::with_raw(raw).load(), None, "{raw:?}");
        }
    }
}
