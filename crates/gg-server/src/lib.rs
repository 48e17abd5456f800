//! Wiring for the `gadgets` binary
//!
//! Turns a [`SystemConfig`] into the set of actors that share one bus, and
//! drives them until shutdown.

use anyhow::{Context, Result};
use futures::future::join_all;
use gg_bus::{spawn, Actor, Bus};
use gg_config::{DeviceConfig, GadgetConfig, SystemConfig, ThermostatModeConfig};
use gg_core::{commands, Message};
use gg_cron::Cron;
use gg_gadget::devices::{Heater, LogDriver, Thermostat, ThermostatMode};
use gg_gadget::{Gadget, OutputDevice};
use gg_runner::Runner;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Build every configured gadget plus the runner and the cron scheduler
///
/// The configuration is validated again, since it may not come from
/// [`SystemConfig::load`].
pub fn build_actors(config: &SystemConfig) -> Result<Vec<Box<dyn Actor>>> {
    config.validate().context("invalid configuration")?;
    let mut actors: Vec<Box<dyn Actor>> = Vec::with_capacity(config.gadgets.len() + 2);

    for gadget in &config.gadgets {
        actors.push(Box::new(build_gadget(gadget)));
    }

    if config.runner.enabled {
        actors.push(Box::new(Runner::new(config.runner.uid.clone())));
    }

    let cron = Cron::new(&config.cron.jobs)
        .context("invalid cron job")?
        .with_sleep(Duration::from_millis(config.cron.sleep_ms));
    actors.push(Box::new(cron));

    Ok(actors)
}

fn build_gadget(config: &GadgetConfig) -> Gadget {
    let uid = config.uid();
    let mut builder = Gadget::builder(&config.location, &config.name)
        .uid(uid.clone())
        .on_command(config.on_command())
        .off_command(config.off_command())
        .units(&config.units)
        .filter_messages(config.filter_messages);
    if let Some(initial) = &config.initial_value {
        builder = builder.initial_value(initial);
    }
    if let Some(operator) = config.operator {
        builder = builder.operator(operator);
    }
    builder.output(build_device(&uid, &config.device))
}

fn build_device(uid: &str, device: &DeviceConfig) -> Box<dyn OutputDevice> {
    let driver: Box<dyn OutputDevice> = Box::new(LogDriver::new(uid));
    match device {
        DeviceConfig::Log => driver,
        DeviceConfig::Heater { pwm } => Box::new(Heater::new(driver, *pwm)),
        DeviceConfig::Thermostat {
            sensor,
            low,
            high,
            mode,
            min_interval_secs,
        } => {
            let mode = match mode {
                ThermostatModeConfig::Heater => ThermostatMode::Heater,
                ThermostatModeConfig::Cooler => ThermostatMode::Cooler,
            };
            Box::new(
                Thermostat::new(driver, sensor.clone(), *low, *high, mode)
                    .with_min_interval(Duration::from_secs(*min_interval_secs)),
            )
        }
    }
}

/// A bus with its actors running
pub struct System {
    bus: Arc<Bus>,
    bus_task: JoinHandle<()>,
    actors: Vec<JoinHandle<()>>,
}

impl System {
    /// Subscribe and spawn every actor, then start the bus
    pub fn start(capacity: usize, actors: Vec<Box<dyn Actor>>) -> Self {
        let bus = Arc::new(Bus::with_capacity(capacity));
        let handles = actors.into_iter().map(|actor| spawn(actor, &bus)).collect();

        let runner = Arc::clone(&bus);
        let bus_task = tokio::spawn(async move { runner.run().await });

        info!(actors = bus.subscriber_count(), "System started");
        Self {
            bus,
            bus_task,
            actors: handles,
        }
    }

    pub fn bus(&self) -> &Arc<Bus> {
        &self.bus
    }

    /// Send `shutdown` to every actor and wait for all of them to stop
    pub async fn shutdown(self) {
        info!("Shutting down actors");
        self.bus
            .dispatch(&Message::command("gadgets", commands::SHUTDOWN));

        let stopped = join_all(self.actors).await;
        debug!(actors = stopped.len(), "All actors stopped");
        self.bus_task.abort();
    }
}
