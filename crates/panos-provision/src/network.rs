//! Network provisioning: interfaces, zones, a virtual router, the default
//! route.

use crate::create;
use crate::objects::{EthernetInterface, Mode, VirtualRouter, Zone};
use panos_core::Result;
use panos_xapi::DeviceSession;
use tracing::info;

/// Push the network configuration in dependency order: three layer-3
/// interfaces, one zone per interface, a virtual router over all three,
/// then a default route attached to that router.
///
/// # Errors
///
/// The first failed create propagates unchanged; nothing after it is
/// submitted and nothing already applied is undone.
pub async fn configure<S: DeviceSession>(session: &S) -> Result<()> {
    info!("configuring network");

    let interfaces = [
        EthernetInterface::new("ethernet1/1", Mode::Layer3).with_ip("192.168.55.20/24"),
        EthernetInterface::new("ethernet1/2", Mode::Layer3).with_ip("192.168.45.20/24"),
        EthernetInterface::new("ethernet1/3", Mode::Layer3).with_ip("192.168.35.20/24"),
    ];
    for interface in &interfaces {
        create(session, interface).await?;
    }

    let zones = [
        Zone::new("untrust", Mode::Layer3, ["ethernet1/1"]),
        Zone::new("web", Mode::Layer3, ["ethernet1/2"]),
        Zone::new("db", Mode::Layer3, ["ethernet1/3"]),
    ];
    for zone in &zones {
        create(session, zone).await?;
    }

    let router = VirtualRouter::new("default", ["ethernet1/1", "ethernet1/2", "ethernet1/3"]);
    create(session, &router).await?;

    let default_route = router.static_route("default", "0.0.0.0/0", "192.168.55.2");
    create(session, &default_route).await?;

    Ok(())
}
