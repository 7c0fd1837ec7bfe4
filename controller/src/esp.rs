use std::{
    collections::HashMap,
    io::BufRead,
    sync::mpsc::{self, Receiver, RecvTimeoutError},
    thread,
    time::Duration,
};

use anyhow::Context;
use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_svc::{log::EspLogger, sys::EspError};
use log::{info, warn};
use relay_interlock::{
    Channel, Clock, PinLevel, RelayDriver, RelayInterlock, RuntimeConfig, SystemClock,
};

use crate::{
    app::{RelayApp, Reply},
    command::Command,
};

const CONTROL_TICK_MS: u64 = 1_000;

#[derive(Default)]
struct EspRelayDriver {
    pins: HashMap<u8, PinDriver<'static, AnyOutputPin, Output>>,
}

impl RelayDriver for EspRelayDriver {
    type Error = EspError;

    fn configure_output(&mut self, pin: u8, initial: PinLevel) -> Result<(), EspError> {
        let gpio = i32::from(pin);
        // Latch the output register before the output stage is enabled.
        esp_idf_sys::esp!(unsafe {
            esp_idf_sys::gpio_set_level(gpio, u32::from(initial.is_high()))
        })?;

        let mut driver = unsafe { PinDriver::output(AnyOutputPin::new(gpio)) }?;
        apply_level(&mut driver, initial)?;
        self.pins.insert(pin, driver);
        Ok(())
    }

    fn write(&mut self, pin: u8, level: PinLevel) -> Result<(), EspError> {
        let Some(driver) = self.pins.get_mut(&pin) else {
            return Err(EspError::from_infallible::<
                { esp_idf_sys::ESP_ERR_INVALID_STATE as esp_idf_sys::esp_err_t },
            >());
        };
        apply_level(driver, level)
    }
}

fn apply_level(
    driver: &mut PinDriver<'static, AnyOutputPin, Output>,
    level: PinLevel,
) -> Result<(), EspError> {
    match level {
        PinLevel::High => driver.set_high(),
        PinLevel::Low => driver.set_low(),
    }
}

pub fn run() -> anyhow::Result<()> {
    esp_idf_svc::sys::link_patches();
    EspLogger::initialize_default();

    let mut runtime = RuntimeConfig::default();
    runtime.sanitize();

    let mut interlock = RelayInterlock::new(
        runtime.interlock.clone(),
        EspRelayDriver::default(),
        SystemClock::new(),
    )
    .context("failed to configure relay outputs")?;
    interlock.set_debug_logging(runtime.debug_logging);

    let pins = interlock.config().pins;
    info!(
        "relays on GPIO{} (heat) / GPIO{} (ac) / GPIO{} (fan), startup wait {}s",
        pins.pin(Channel::Heat),
        pins.pin(Channel::Ac),
        pins.pin(Channel::Fan),
        interlock.waiting_secs_left(),
    );

    let mut app = RelayApp::new(interlock);
    let commands = spawn_console_reader();
    let mut last_status_ms = 0_u64;

    loop {
        match commands.recv_timeout(Duration::from_millis(CONTROL_TICK_MS)) {
            Ok(line) if line.trim().is_empty() => {}
            Ok(line) => match line.parse::<Command>() {
                Ok(command) => match app.apply(command) {
                    Reply::Ack => {}
                    Reply::Deferred(channel) => info!("{channel} deferred, retrying every tick"),
                    Reply::Status { status, demand } => match serde_json::to_string(&status) {
                        Ok(body) => info!("relay status: {body}, demand: {demand:?}"),
                        Err(err) => warn!("relay status serialization failed: {err}"),
                    },
                    Reply::Quit => break,
                },
                Err(err) => warn!("{err}"),
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(Duration::from_millis(CONTROL_TICK_MS));
            }
        }

        app.tick();

        let now_ms = app.interlock().clock().now_ms();
        if now_ms.saturating_sub(last_status_ms) >= runtime.status_interval_ms {
            last_status_ms = now_ms;
            match serde_json::to_string(&app.interlock().status()) {
                Ok(body) => info!("relay status: {body}"),
                Err(err) => warn!("relay status serialization failed: {err}"),
            }
        }
    }

    app.shutdown();
    info!("all relays released");
    Ok(())
}

fn spawn_console_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        return;
                    }
                }
                Err(err) => {
                    warn!("console read failed: {err}");
                    thread::sleep(Duration::from_secs(1));
                }
            }
        }
    });
    rx
}
