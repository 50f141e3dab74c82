//! SoftDevice peripheral: advertising, the message characteristic and the
//! bridge between radio callbacks and the main loop.
//!
//! Writes from the app and connection changes are pushed into [`INBOX`]
//! through [`LinkListener`]; the main loop drains it once per tick.  Text
//! for the app travels the other way through [`OUTGOING`] and is sent as a
//! notification by the connection task.

use core::cell::RefCell;
use core::mem;
use core::sync::atomic::{AtomicBool, Ordering};

use defmt::{info, unwrap, warn};
use deskpet::ble::{LinkEvent, LinkInbox, LinkListener};
use deskpet::board::LinkControl;
use deskpet::config::{BLE_DEVICE_NAME, MAX_MESSAGE_LEN};
use deskpet::{Error, LinkError};
use embassy_futures::select::{select, select3, Either, Either3};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use heapless::{String, Vec};
use nrf_softdevice::ble::advertisement_builder::{
    Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload, ServiceList,
};
use nrf_softdevice::ble::{gatt_server, peripheral, Connection};
use nrf_softdevice::{raw, Softdevice};

/// Longest text sent to the app in one notification.
pub const OUTGOING_LEN: usize = 32;

type Message = Vec<u8, MAX_MESSAGE_LEN>;

/// Companion service.  UUIDs match `config::BLE_SERVICE_UUID` and
/// `config::BLE_MESSAGE_UUID`.
#[nrf_softdevice::gatt_service(uuid = "1b5dccd3-ef4d-4df0-94b2-7f411f1e0844")]
pub struct PetService {
    #[characteristic(uuid = "1999eae0-d5ad-4909-aff3-4a8875149db5", read, write, notify)]
    pub message: Message,
}

#[nrf_softdevice::gatt_server]
pub struct Server {
    pub pet: PetService,
}

/// Link events waiting for the main loop.
pub static INBOX: Mutex<CriticalSectionRawMutex, RefCell<LinkInbox>> =
    Mutex::new(RefCell::new(LinkInbox::new()));

/// Text queued for the connected app.
pub static OUTGOING: Channel<CriticalSectionRawMutex, String<OUTGOING_LEN>, 2> = Channel::new();

/// Radio on/off requests from the menu.
static ENABLE: Signal<CriticalSectionRawMutex, bool> = Signal::new();

static CONNECTED: AtomicBool = AtomicBool::new(false);

const SERVICE_UUID_LE: [u8; 16] = 0x1b5dccd3_ef4d_4df0_94b2_7f411f1e0844u128.to_le_bytes();

static ADV_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
    .full_name(BLE_DEVICE_NAME)
    .build();

static SCAN_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .services_128(ServiceList::Complete, &[SERVICE_UUID_LE])
    .build();

/// Forwards transport callbacks into [`INBOX`].
struct InboxListener;

impl LinkListener for InboxListener {
    fn on_connect(&mut self) {
        CONNECTED.store(true, Ordering::Release);
        INBOX.lock(|inbox| inbox.borrow_mut().on_connect());
    }

    fn on_disconnect(&mut self) {
        CONNECTED.store(false, Ordering::Release);
        INBOX.lock(|inbox| inbox.borrow_mut().on_disconnect());
    }

    fn on_receive(&mut self, data: &[u8]) {
        INBOX.lock(|inbox| inbox.borrow_mut().on_receive(data));
    }
}

/// Take the oldest pending link event.
pub fn next_event() -> Option<LinkEvent> {
    INBOX.lock(|inbox| inbox.borrow_mut().pop())
}

/// [`LinkControl`] handle held by the behaviour core.
pub struct BleLink;

impl LinkControl for BleLink {
    fn send(&mut self, text: &str) -> Result<(), Error> {
        if !CONNECTED.load(Ordering::Acquire) {
            return Err(LinkError::NotConnected.into());
        }
        let text = String::try_from(text).map_err(|_| Error::BufferOverflow)?;
        OUTGOING
            .try_send(text)
            .map_err(|_| LinkError::NotifyFailed.into())
    }

    fn set_enabled(&mut self, enabled: bool) {
        ENABLE.signal(enabled);
    }
}

/// Bring up the SoftDevice with a single peripheral link.
pub fn enable_softdevice() -> &'static mut Softdevice {
    let name_len = BLE_DEVICE_NAME.len() as u16;
    let config = nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 256 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: BLE_DEVICE_NAME.as_ptr() as _,
            current_len: name_len,
            max_len: name_len,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(raw::BLE_GATTS_VLOC_STACK as u8),
        }),
        ..Default::default()
    };
    Softdevice::enable(&config)
}

#[embassy_executor::task]
pub async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

/// Advertise, serve one connection at a time, and honour on/off requests.
#[embassy_executor::task]
pub async fn link_task(sd: &'static Softdevice, server: &'static Server) -> ! {
    let mut listener = InboxListener;
    let mut enabled = ENABLE.wait().await;

    loop {
        if !enabled {
            info!("Link: radio off");
            enabled = ENABLE.wait().await;
            continue;
        }

        info!("Link: advertising as {=str}", BLE_DEVICE_NAME);
        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &ADV_DATA,
            scan_data: &SCAN_DATA,
        };
        let config = peripheral::Config::default();

        let conn = match select(peripheral::advertise_connectable(sd, adv, &config), ENABLE.wait()).await {
            Either::First(Ok(conn)) => conn,
            Either::First(Err(e)) => {
                warn!("Link: {:?}: {:?}", LinkError::AdvertiseFailed, e);
                embassy_time::Timer::after_millis(1_000).await;
                continue;
            }
            Either::Second(value) => {
                enabled = value;
                continue;
            }
        };

        listener.on_connect();
        let served = select3(
            gatt_server::run(&conn, server, |event| match event {
                ServerEvent::Pet(PetServiceEvent::MessageWrite(data)) => InboxListener.on_receive(&data),
                ServerEvent::Pet(PetServiceEvent::MessageCccdWrite { notifications }) => {
                    info!("Link: notifications {}", notifications);
                }
            }),
            forward_outgoing(server, &conn),
            ENABLE.wait(),
        )
        .await;

        if let Either3::Third(value) = served {
            enabled = value;
            if !enabled {
                let _ = conn.disconnect();
            }
        }
        listener.on_disconnect();
        OUTGOING.clear();
    }
}

async fn forward_outgoing(server: &Server, conn: &Connection) {
    loop {
        let text = OUTGOING.receive().await;
        let mut value = Message::new();
        let _ = value.extend_from_slice(text.as_bytes());
        if let Err(e) = server.pet.message_notify(conn, &value) {
            warn!("Link: notify failed: {:?}", e);
        }
    }
}

/// Spawn the SoftDevice and link tasks.
pub fn start(spawner: &embassy_executor::Spawner, sd: &'static Softdevice, server: &'static Server) {
    unwrap!(spawner.spawn(softdevice_task(sd)));
    unwrap!(spawner.spawn(link_task(sd, server)));
}
