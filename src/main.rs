//! deskpet firmware entry point (nRF52840 + SoftDevice S140).
//!
//! Brings up the SoftDevice, the OLED, the motors and the buzzer, then runs
//! the cooperative main loop: every tick the coordinator updates the active
//! mode, the button is sampled and pending link events are drained.

#![no_std]
#![no_main]

#[path = "ui/buttons.rs"]
mod buttons;
#[path = "ui/display.rs"]
mod display;
mod hw;
#[path = "ble/peripheral.rs"]
mod peripheral;
mod storage;

use defmt::{error, info, unwrap};
use deskpet::board::{Board, Devices};
use deskpet::clock::{has_elapsed, Millis};
use deskpet::config::TICK_MS;
use deskpet::ui::debounce::Debouncer;
use deskpet::Coordinator;
use embassy_executor::Spawner;
use embassy_nrf::gpio::Pin;
use embassy_nrf::interrupt::Priority;
use embassy_nrf::peripherals::TWISPI0;
use embassy_nrf::pwm::SimplePwm;
use embassy_nrf::twim::{self, Twim};
use embassy_nrf::{bind_interrupts, peripherals};
use embassy_time::{Delay, Duration, Instant, Ticker};
use nanorand::WyRand;
use nrf_softdevice::Softdevice;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use buttons::Button;
use display::Oled;
use hw::{GpioMotor, PwmBuzzer};
use peripheral::{BleLink, Server};

bind_interrupts!(struct Irqs {
    SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

/// Minimum time between two flash writes of the settings record (ms).
const SAVE_INTERVAL_MS: Millis = 1_000;

/// The real hardware.
struct DeskPet;

impl Board for DeskPet {
    type Display = Oled<Twim<'static, TWISPI0>>;
    type Motor = GpioMotor;
    type Buzzer = PwmBuzzer;
    type Delay = Delay;
    type Link = BleLink;
    type Rng = WyRand;
}

static SERVER: StaticCell<Server> = StaticCell::new();

fn clock_ms() -> Millis {
    Instant::now().as_millis() as Millis
}

/// Park the core after an unrecoverable fault.
fn halt() -> ! {
    loop {
        cortex_m::asm::wfe();
    }
}

fn seed(sd: &Softdevice) -> u64 {
    let mut bytes = [0u8; 8];
    match nrf_softdevice::random_bytes(sd, &mut bytes) {
        Ok(()) => u64::from_le_bytes(bytes),
        Err(_) => Instant::now().as_ticks(),
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("deskpet starting...");

    // SoftDevice reserves interrupt priorities 0, 1 and 4.
    let mut config = embassy_nrf::config::Config::default();
    config.gpiote_interrupt_priority = Priority::P2;
    config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(config);

    let sd = peripheral::enable_softdevice();
    let server = match Server::new(sd) {
        Ok(server) => SERVER.init(server),
        Err(e) => {
            error!("GATT server registration failed: {:?}", e);
            halt();
        }
    };
    let sd: &'static Softdevice = sd;
    peripheral::start(&spawner, sd, server);

    let mut flash = nrf_softdevice::Flash::take(sd);
    let settings = storage::load(&mut flash).await;

    let i2c = Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, twim::Config::default());
    let oled = match Oled::init(i2c) {
        Ok(oled) => oled,
        Err(e) => {
            error!("Display init failed: {:?}", e);
            halt();
        }
    };

    let pwm = SimplePwm::new_1ch(p.PWM0, p.P0_13);
    unwrap!(spawner.spawn(hw::buzzer_task(pwm)));

    let motor = GpioMotor::new(
        p.P0_03.degrade(),
        p.P0_04.degrade(),
        p.P0_28.degrade(),
        p.P0_29.degrade(),
    );
    let button = Button::new(p.P0_11.degrade());

    let mut dev: Devices<DeskPet> =
        Devices::new(oled, motor, PwmBuzzer, Delay, BleLink, WyRand::new_seed(seed(sd)));
    let mut coordinator = Coordinator::new(settings);
    let mut debouncer = Debouncer::new();
    let mut last_save = clock_ms();

    coordinator.start(&mut dev, clock_ms());
    info!("Main loop running");

    let mut ticker = Ticker::every(Duration::from_millis(TICK_MS));
    loop {
        let now = clock_ms();

        coordinator.update(&mut dev, now);

        if let Some(event) = debouncer.update(button.is_pressed(), now) {
            info!("Button: {}", event);
            coordinator.handle_button(&mut dev, event, now);
        }

        while let Some(event) = peripheral::next_event() {
            coordinator.handle_link(&mut dev, event, now);
        }

        if coordinator.settings().is_dirty() && has_elapsed(now, last_save, SAVE_INTERVAL_MS) {
            last_save = now;
            storage::save(&mut flash, coordinator.settings_mut()).await;
        }

        ticker.next().await;
    }
}
