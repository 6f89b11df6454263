//! # Dashboard Demo
//!
//! Consumes three simulated telemetry properties through the three
//! consumption idioms at once:
//! - vehicle speed via an async stream (conflating, latest-wins)
//! - fuel level via the callback map
//! - current gear via a live value with change dedup
//!
//! ## Run
//! ```bash
//! cargo run --example dashboard
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use propcast::{
    Freshness, HubConfig, PropertyHub, PropertyKey, PropertyValue, Transport, TransportError,
};

const SPEED: PropertyKey = PropertyKey::new(0x0207);
const FUEL: PropertyKey = PropertyKey::new(0x0101);
const GEAR: PropertyKey = PropertyKey::new(0x0A04);

/// Stand-in for the real head-unit link: just logs what is asked of it.
struct SimulatedLink;

impl Transport for SimulatedLink {
    fn subscribe(&self, key: PropertyKey, freshness: Freshness) -> Result<(), TransportError> {
        println!(" ├─► link: subscribe {key} @ {freshness}");
        Ok(())
    }

    fn unsubscribe(&self, key: PropertyKey) -> Result<(), TransportError> {
        println!(" ├─► link: unsubscribe {key}");
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    let hub = PropertyHub::new(HubConfig::default());
    hub.install_transport(Some(Arc::new(SimulatedLink)));

    // Callback idiom: fuel gauge.
    hub.callbacks().set(
        FUEL,
        Some(Arc::new(|_key, value: &PropertyValue| {
            println!(" ├─► fuel gauge: {value:?}");
        })),
    );

    // Live-value idiom: gear indicator (dedups repeats).
    let gear = hub.live_values().get(GEAR);
    let mut gear_observer = gear.observe();
    let gear_task = tokio::spawn(async move {
        while let Some(value) = gear_observer.changed().await {
            println!(" ├─► gear indicator: {value:?}");
        }
    });

    // Stream idiom: speedometer.
    let mut speed = hub.streams().get(SPEED);
    let speed_task = tokio::spawn(async move {
        while let Some(value) = speed.next().await {
            println!(" ├─► speedometer: {value:?}");
        }
    });

    // Simulated decode glue feeding the hub.
    let feeder_hub = hub.clone();
    let feeder = tokio::spawn(async move {
        for tick in 0..5i32 {
            feeder_hub.on_update(SPEED, PropertyValue::Int32(80 + tick * 3));
            feeder_hub.on_update(FUEL, PropertyValue::Float(0.62 - tick as f32 * 0.01));
            // Gear stays in "D" the whole time: one notification only.
            feeder_hub.on_update(GEAR, PropertyValue::text("D"));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    });

    feeder.await.ok();
    tokio::time::sleep(Duration::from_millis(50)).await;

    println!(" └─► last known speed: {:?}", hub.current_value(SPEED));

    hub.callbacks().set(FUEL, None);
    speed_task.abort();
    gear_task.abort();
}
