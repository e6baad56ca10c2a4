//! Capacity-based log rotation
//!
//! A full store is retired under `{prefix}_{yyyy-MM-dd}`, moved to the
//! archive container when that differs from the live one, and replaced by a
//! fresh store under the original name. Rotation is decided once, when the
//! store is opened, never in the middle of a batch.

use super::store::{StoreHandle, TabularStore};
use crate::adapters::sheet::StoredFile;
use crate::config::StoreConfig;
use crate::domain::{Result, SyncError};

/// Where the live store lives and where retired stores go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationTarget {
    pub live_container: String,
    pub archive_container: String,
    pub store_name: String,
    pub archive_prefix: String,
    pub template: Option<String>,
}

impl From<&StoreConfig> for RotationTarget {
    fn from(config: &StoreConfig) -> Self {
        Self {
            live_container: config.directory.clone(),
            archive_container: config.archive_directory().to_string(),
            store_name: config.store_name.clone(),
            archive_prefix: config.archive_prefix().to_string(),
            template: config.template_path.clone(),
        }
    }
}

/// Store returned by [`LogRotator::open_or_rotate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedStore {
    pub handle: StoreHandle,

    /// Archive the previous store was retired to, if rotation happened
    pub rotated_to: Option<StoredFile>,

    /// True when the live store did not exist and was provisioned
    pub created: bool,
}

/// Pure capacity decision
pub fn needs_rotation(last_row: u32, capacity_threshold: u32) -> bool {
    last_row >= capacity_threshold
}

/// Dated archive name, with `_2`, `_3`, ... appended for the n-th rotation of a day
pub fn archive_name(prefix: &str, date: &str, attempt: u32) -> String {
    if attempt <= 1 {
        format!("{prefix}_{date}")
    } else {
        format!("{prefix}_{date}_{attempt}")
    }
}

/// Opens the live store, rotating it first when it is full
pub struct LogRotator<'a> {
    store: &'a TabularStore,
    target: RotationTarget,
}

impl<'a> LogRotator<'a> {
    pub fn new(store: &'a TabularStore, target: RotationTarget) -> Self {
        Self { store, target }
    }

    pub fn target(&self) -> &RotationTarget {
        &self.target
    }

    /// Looks up the live store without side effects
    pub fn find_live(&self) -> Result<Option<StoreHandle>> {
        self.store
            .find(&self.target.live_container, &self.target.store_name)
    }

    /// Returns the store to reconcile into
    ///
    /// `existing` is the result of [`find_live`](Self::find_live); `date` is
    /// the archive date stamp of the day the rotation runs.
    ///
    /// # Errors
    ///
    /// Storage errors while provisioning a missing store; [`SyncError::Rotation`]
    /// for any failure once a rotation has started.
    pub fn open_or_rotate(&self, existing: Option<StoreHandle>, date: &str) -> Result<OpenedStore> {
        let Some(handle) = existing else {
            let handle = self.store.create(
                &self.target.live_container,
                &self.target.store_name,
                self.target.template.as_deref(),
            )?;
            return Ok(OpenedStore {
                handle,
                rotated_to: None,
                created: true,
            });
        };

        let last_row = self.store.last_row(&handle)?;
        if !needs_rotation(last_row, self.store.layout().capacity_threshold) {
            return Ok(OpenedStore {
                handle,
                rotated_to: None,
                created: false,
            });
        }

        tracing::info!(
            store = %handle.file,
            last_row = last_row,
            capacity_threshold = self.store.layout().capacity_threshold,
            "Store reached capacity, rotating"
        );

        let (handle, archived) = self.rotate(&handle, date)?;
        Ok(OpenedStore {
            handle,
            rotated_to: Some(archived),
            created: true,
        })
    }

    /// Retires `handle` and provisions a fresh store under the live name
    pub fn rotate(&self, handle: &StoreHandle, date: &str) -> Result<(StoreHandle, StoredFile)> {
        let name = self.free_archive_name(date)?;

        let renamed = self
            .store
            .rename(handle, &name)
            .map_err(|e| rotation_error(format!("rename {} to {name}", handle.file), e))?;

        let archived = if self.target.archive_container != self.target.live_container {
            self.store
                .relocate(&renamed, &self.target.archive_container)
                .map_err(|e| {
                    rotation_error(
                        format!("move {} to {}", renamed.file, self.target.archive_container),
                        e,
                    )
                })?
        } else {
            renamed
        };

        let fresh = self
            .store
            .create(
                &self.target.live_container,
                &self.target.store_name,
                self.target.template.as_deref(),
            )
            .map_err(|e| rotation_error(format!("provision {}", self.target.store_name), e))?;

        tracing::info!(
            archived = %archived.file,
            live = %fresh.file,
            "Rotated store"
        );

        Ok((fresh, archived.file))
    }

    /// First dated name unused in both the live and the archive container
    fn free_archive_name(&self, date: &str) -> Result<String> {
        let backend = self.store.backend();
        let mut containers = vec![self.target.live_container.as_str()];
        if self.target.archive_container != self.target.live_container {
            containers.push(self.target.archive_container.as_str());
        }

        for attempt in 1..=u32::MAX {
            let name = archive_name(&self.target.archive_prefix, date, attempt);
            let mut taken = false;
            for container in &containers {
                let found = backend
                    .find_file(container, &name)
                    .map_err(|e| rotation_error(format!("check archive name {name}"), e))?;
                taken |= found.is_some();
            }
            if !taken {
                return Ok(name);
            }
        }

        Err(SyncError::Rotation(format!(
            "no free archive name for {} on {date}",
            self.target.archive_prefix
        )))
    }
}

fn rotation_error(step: String, cause: SyncError) -> SyncError {
    tracing::error!(step = %step, error = %cause, "Rotation step failed");
    SyncError::Rotation(format!("{step}: {cause}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_rotation_boundary() {
        assert!(!needs_rotation(99_999, 100_000));
        assert!(needs_rotation(100_000, 100_000));
        assert!(needs_rotation(100_001, 100_000));
    }

    #[test]
    fn test_archive_name() {
        assert_eq!(archive_name("schedule", "2024-05-02", 1), "schedule_2024-05-02");
        assert_eq!(archive_name("schedule", "2024-05-02", 3), "schedule_2024-05-02_3");
    }

    #[test]
    fn test_target_defaults_follow_store_config() {
        let target = RotationTarget::from(&StoreConfig::default());
        assert_eq!(target.archive_prefix, "schedule_latest");
        assert_eq!(target.archive_container, target.live_container);
        assert!(target.template.is_none());
    }
}
