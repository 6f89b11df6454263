//! # Reconnect Demo
//!
//! Shows the resilient wrapper riding through a transport swap: consumers
//! attach once, the link disappears, a fresh link is installed, and every
//! still-wanted subscription is replayed at its tightest requested cadence
//! without any consumer re-attaching.
//!
//! ## Run
//! ```bash
//! cargo run --example reconnect
//! ```

use std::sync::Arc;

use propcast::{
    Freshness, FnHandler, HandlerRef, HubConfig, PropertyHub, PropertyKey, PropertyValue,
    Transport, TransportError,
};

const SPEED: PropertyKey = PropertyKey::new(0x0207);
const ODO: PropertyKey = PropertyKey::new(0x0209);

struct NamedLink(&'static str);

impl Transport for NamedLink {
    fn subscribe(&self, key: PropertyKey, freshness: Freshness) -> Result<(), TransportError> {
        println!(" ├─► [{}] subscribe {key} @ {freshness}", self.0);
        Ok(())
    }

    fn unsubscribe(&self, key: PropertyKey) -> Result<(), TransportError> {
        println!(" ├─► [{}] unsubscribe {key}", self.0);
        Ok(())
    }
}

fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    let hub = PropertyHub::new(HubConfig::default());

    println!("session start: link A installed");
    hub.install_transport(Some(Arc::new(NamedLink("link-a"))));

    let speed_sink: HandlerRef = FnHandler::arc("speed", |_k, v: &PropertyValue| {
        println!(" ├─► speed update: {v:?}");
    });
    hub.add_handler(SPEED, Freshness::millis(200), speed_sink.clone());
    hub.add_handler(ODO, Freshness::millis(2000), speed_sink.clone());

    hub.on_update(SPEED, PropertyValue::Int32(97));

    println!("link lost: updates stop, last known value stays readable");
    hub.install_transport(None);
    println!(" ├─► cached speed: {:?}", hub.current_value(SPEED));

    // Requests made while offline only tighten the remembered table.
    hub.add_handler(SPEED, Freshness::millis(100), speed_sink.clone());

    println!("link B installed: wanted table replays automatically");
    hub.install_transport(Some(Arc::new(NamedLink("link-b"))));

    println!(" └─► done");
}
