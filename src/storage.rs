//! Persistent storage for the pet's settings.
//!
//! Uses the nRF52840's internal flash via `sequential-storage` crate to
//! keep one [`Settings`] record across power cycles.
//!
//! Storage layout:
//!   - A single key-value map entry holds the encoded `Settings` record.
//!   - Records are appended sequentially; the flash pages are managed
//!     by `sequential-storage` which handles wear levelling and GC.
//!
//! Any flash error is logged and never fatal: loading falls back to the
//! defaults, saving keeps the dirty flag so the next tick retries.

use defmt::{debug, error, info};
use deskpet::config::{STORAGE_FLASH_PAGE_COUNT, STORAGE_FLASH_PAGE_START};
use deskpet::settings::{Settings, RECORD_MAX_LEN};
use embedded_storage_async::nor_flash::NorFlash;
use sequential_storage::cache::NoCache;

/// Flash page size for nRF52840 (4 KB).
const FLASH_PAGE_SIZE: u32 = 4096;

/// Start address of our storage region.
const STORAGE_START: u32 = STORAGE_FLASH_PAGE_START * FLASH_PAGE_SIZE;

/// End address (exclusive) of our storage region.
const STORAGE_END: u32 = (STORAGE_FLASH_PAGE_START + STORAGE_FLASH_PAGE_COUNT) * FLASH_PAGE_SIZE;

/// Key for the settings record in the map storage.
const KEY_SETTINGS: u8 = 0x01;

/// Scratch buffer: the record plus the key and item header.
const BUFFER_LEN: usize = RECORD_MAX_LEN + 16;

/// Load the settings from flash, or the defaults if there are none.
pub async fn load(flash: &mut impl NorFlash) -> Settings {
    let mut buf = [0u8; BUFFER_LEN];

    match sequential_storage::map::fetch_item::<u8, &[u8], _>(
        flash,
        STORAGE_START..STORAGE_END,
        &mut NoCache::new(),
        &mut buf,
        &KEY_SETTINGS,
    )
    .await
    {
        Ok(Some(data)) => {
            let settings = Settings::decode_or_default(data);
            info!("Loaded settings ({} networks)", settings.networks().len());
            settings
        }
        Ok(None) => {
            info!("No settings in flash, using defaults");
            Settings::new()
        }
        Err(e) => {
            error!("Flash read error: {:?}", defmt::Debug2Format(&e));
            Settings::new()
        }
    }
}

/// Persist `settings` if it has unsaved changes.
pub async fn save(flash: &mut impl NorFlash, settings: &mut Settings) {
    if !settings.is_dirty() {
        debug!("Settings: no changes to save");
        return;
    }

    let mut record = [0u8; RECORD_MAX_LEN];
    let len = match settings.encode(&mut record) {
        Ok(len) => len,
        Err(e) => {
            error!("Settings encode failed: {:?}", e);
            return;
        }
    };
    let mut buf = [0u8; BUFFER_LEN];

    match sequential_storage::map::store_item::<u8, &[u8], _>(
        flash,
        STORAGE_START..STORAGE_END,
        &mut NoCache::new(),
        &mut buf,
        &KEY_SETTINGS,
        &&record[..len],
    )
    .await
    {
        Ok(_) => {
            info!("Saved settings ({} bytes)", len);
            settings.mark_clean();
        }
        Err(e) => {
            error!("Flash write error: {:?}", defmt::Debug2Format(&e));
        }
    }
}
