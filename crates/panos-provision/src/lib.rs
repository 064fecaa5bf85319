//! One-shot provisioning of a PAN-OS firewall.
//!
//! A fixed set of network records (interfaces, zones, a virtual router, a
//! default route) and policy records (address/service objects, security and
//! NAT rules) is pushed over a single XML API session in a strict order,
//! then committed synchronously. The first failure anywhere aborts the
//! remainder; already-applied records are left on the device.

pub mod cli;
pub mod network;
pub mod objects;
pub mod policy;

use objects::PanObject;
use panos_core::Result;
use panos_xapi::DeviceSession;
use tracing::debug;

/// Run both provisioning steps and commit synchronously.
///
/// # Errors
///
/// Propagates the first device error unchanged; no later call is made and
/// no cleanup is attempted.
pub async fn provision<S: DeviceSession>(session: &S) -> Result<()> {
    network::configure(session).await?;
    policy::configure(session).await?;
    session.commit(true).await
}

/// Submit one record through the session.
pub(crate) async fn create<S: DeviceSession>(session: &S, object: &dyn PanObject) -> Result<()> {
    debug!(name = object.name(), "create");
    session.create(&object.xpath(), &object.element()).await
}
