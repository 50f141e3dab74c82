//! Persisted user settings.
//!
//! Two named booleans (`bluetooth`, `wifi`) plus an ordered list of network
//! credentials.  The in-memory copy tracks a dirty flag; the firmware's
//! flash store writes it back only when something changed.
//!
//! Record layout (all lengths are single bytes):
//!
//! ```text
//! [magic][version][flags][count] { [ssid_len][ssid..][pass_len][pass..] } * count
//! ```

use heapless::{String, Vec};

use crate::config::MAX_NETWORKS;
use crate::error::Error;

/// Longest stored SSID (802.11 limit).
pub const SSID_MAX_LEN: usize = 32;
/// Longest stored passphrase (WPA2 limit).
pub const PASSWORD_MAX_LEN: usize = 64;

/// Upper bound of an encoded [`Settings`] record.
pub const RECORD_MAX_LEN: usize = 4 + MAX_NETWORKS * (2 + SSID_MAX_LEN + PASSWORD_MAX_LEN);

const RECORD_MAGIC: u8 = 0xD5;
const RECORD_VERSION: u8 = 1;

const FLAG_BLUETOOTH: u8 = 1 << 0;
const FLAG_WIFI: u8 = 1 << 1;

/// Named boolean settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Flag {
    Bluetooth,
    Wifi,
}

/// One stored network credential.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Network {
    pub ssid: String<SSID_MAX_LEN>,
    pub password: String<PASSWORD_MAX_LEN>,
}

impl Network {
    /// Build a credential, truncating over-long fields on a char boundary.
    pub fn new(ssid: &str, password: &str) -> Self {
        Self {
            ssid: truncated(ssid),
            password: truncated(password),
        }
    }
}

/// In-memory settings, synced with flash by the firmware.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    bluetooth: bool,
    wifi: bool,
    networks: Vec<Network, MAX_NETWORKS>,
    /// True if the cache differs from what was last loaded or saved.
    dirty: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl Settings {
    /// Factory defaults: Bluetooth on, WiFi off, no networks.
    pub const fn new() -> Self {
        Self {
            bluetooth: true,
            wifi: false,
            networks: Vec::new(),
            dirty: false,
        }
    }

    pub fn flag(&self, flag: Flag) -> bool {
        match flag {
            Flag::Bluetooth => self.bluetooth,
            Flag::Wifi => self.wifi,
        }
    }

    pub fn set_flag(&mut self, flag: Flag, value: bool) {
        let slot = match flag {
            Flag::Bluetooth => &mut self.bluetooth,
            Flag::Wifi => &mut self.wifi,
        };
        if *slot != value {
            *slot = value;
            self.dirty = true;
            info!("Settings: {} = {}", flag, value);
        }
    }

    /// Store a credential.  An existing entry with the same SSID is updated
    /// in place; otherwise the credential is appended.
    pub fn add_network(&mut self, ssid: &str, password: &str) -> Result<(), Error> {
        let network = Network::new(ssid, password);

        if let Some(existing) = self.networks.iter_mut().find(|n| n.ssid == network.ssid) {
            existing.password = network.password;
            self.dirty = true;
            info!("Settings: updated existing network");
            return Ok(());
        }

        self.networks.push(network).map_err(|_| {
            warn!("Settings: network list full");
            Error::StorageFull
        })?;
        self.dirty = true;
        info!("Settings: saved network #{}", self.networks.len());
        Ok(())
    }

    /// Remove the credential at `index`; later entries move down by one.
    pub fn remove_network(&mut self, index: usize) -> Option<Network> {
        if index >= self.networks.len() {
            return None;
        }
        self.dirty = true;
        Some(self.networks.remove(index))
    }

    pub fn network(&self, index: usize) -> Option<&Network> {
        self.networks.get(index)
    }

    pub fn networks(&self) -> &[Network] {
        &self.networks
    }

    pub fn clear_networks(&mut self) {
        if !self.networks.is_empty() {
            self.networks.clear();
            self.dirty = true;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the cache as in sync with flash.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Serialize into `buf`, returning the number of bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, Error> {
        let mut w = Writer { buf, pos: 0 };

        let mut flags = 0;
        if self.bluetooth {
            flags |= FLAG_BLUETOOTH;
        }
        if self.wifi {
            flags |= FLAG_WIFI;
        }

        w.byte(RECORD_MAGIC)?;
        w.byte(RECORD_VERSION)?;
        w.byte(flags)?;
        w.byte(self.networks.len() as u8)?;
        for network in &self.networks {
            w.field(network.ssid.as_bytes())?;
            w.field(network.password.as_bytes())?;
        }

        Ok(w.pos)
    }

    /// Parse a record produced by [`Settings::encode`].
    pub fn decode(data: &[u8]) -> Result<Self, Error> {
        let mut r = Reader { data, pos: 0 };

        if r.byte()? != RECORD_MAGIC || r.byte()? != RECORD_VERSION {
            return Err(Error::Storage);
        }
        let flags = r.byte()?;
        let count = r.byte()? as usize;
        if count > MAX_NETWORKS {
            return Err(Error::Storage);
        }

        let mut settings = Self {
            bluetooth: flags & FLAG_BLUETOOTH != 0,
            wifi: flags & FLAG_WIFI != 0,
            networks: Vec::new(),
            dirty: false,
        };
        for _ in 0..count {
            let ssid = r.text()?;
            let password = r.text()?;
            settings
                .networks
                .push(Network::new(ssid, password))
                .map_err(|_| Error::Storage)?;
        }

        Ok(settings)
    }

    /// Like [`Settings::decode`] but falls back to defaults on any error.
    pub fn decode_or_default(data: &[u8]) -> Self {
        Self::decode(data).unwrap_or_else(|e| {
            warn!("Settings record unreadable ({:?}), using defaults", e);
            Self::new()
        })
    }
}

fn truncated<const N: usize>(text: &str) -> String<N> {
    let mut out = String::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl Writer<'_> {
    fn byte(&mut self, b: u8) -> Result<(), Error> {
        let slot = self.buf.get_mut(self.pos).ok_or(Error::BufferOverflow)?;
        *slot = b;
        self.pos += 1;
        Ok(())
    }

    fn field(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.byte(bytes.len() as u8)?;
        let end = self.pos + bytes.len();
        self.buf
            .get_mut(self.pos..end)
            .ok_or(Error::BufferOverflow)?
            .copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn byte(&mut self) -> Result<u8, Error> {
        let b = *self.data.get(self.pos).ok_or(Error::Storage)?;
        self.pos += 1;
        Ok(b)
    }

    fn text(&mut self) -> Result<&'a str, Error> {
        let len = self.byte()? as usize;
        let end = self.pos + len;
        let bytes = self.data.get(self.pos..end).ok_or(Error::Storage)?;
        self.pos = end;
        core::str::from_utf8(bytes).map_err(|_| Error::Storage)
    }
}
