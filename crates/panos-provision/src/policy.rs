//! Policy provisioning: address and service objects, security rules, NAT
//! rules.

use crate::create;
use crate::objects::{AddressObject, NatRule, Protocol, Rulebase, SecurityRule, ServiceObject};
use panos_core::Result;
use panos_xapi::DeviceSession;
use tracing::info;

/// Push the policy configuration, assuming the network step's zones and
/// interfaces are already present: address objects, service objects, then
/// every rulebase entry in evaluation order.
///
/// # Errors
///
/// The first failed create propagates unchanged; nothing after it is
/// submitted and nothing already applied is undone.
pub async fn configure<S: DeviceSession>(session: &S) -> Result<()> {
    info!("configuring policy");

    let addresses = [
        AddressObject::new("web-srv", "192.168.45.5"),
        AddressObject::new("db-srv", "192.168.35.5"),
    ];
    for address in &addresses {
        create(session, address).await?;
    }

    let services = [
        ServiceObject::new("service-tcp-221", Protocol::Tcp, "221"),
        ServiceObject::new("service-tcp-222", Protocol::Tcp, "222"),
    ];
    for service in &services {
        create(session, service).await?;
    }

    // Rules reference the objects above by name, so they go last.
    for rule in &rulebase() {
        create(session, rule).await?;
    }

    Ok(())
}

/// The fixed rulebase, in evaluation order.
///
/// Order is part of the policy: evaluation is first-match, and the later
/// rules are broader, relying on the earlier, more specific rules taking
/// precedence.
fn rulebase() -> Rulebase {
    let mut rulebase = Rulebase::new();

    rulebase.add_security(
        SecurityRule::new("Allow ping")
            .from_zones(["any"])
            .sources(["any"])
            .to_zones(["any"])
            .destinations(["any"])
            .applications(["ping"])
            .services(["application-default"]),
    );
    rulebase.add_security(
        SecurityRule::new("SSH inbound")
            .from_zones(["untrust"])
            .sources(["any"])
            .to_zones(["web", "db"])
            .destinations(["any"])
            .applications(["ping", "ssh"])
            .services(["service-tcp-221", "service-tcp-222"]),
    );
    rulebase.add_security(
        SecurityRule::new("Web inbound")
            .from_zones(["untrust"])
            .sources(["any"])
            .to_zones(["web"])
            .destinations(["any"])
            .applications(["any"])
            .services(["service-http"]),
    );
    rulebase.add_security(
        SecurityRule::new("Web to DB")
            .from_zones(["any"])
            .sources(["web-srv"])
            .to_zones(["any"])
            .destinations(["db-srv"])
            .applications(["mysql"])
            .services(["application-default"]),
    );
    rulebase.add_security(
        SecurityRule::new("Allow outbound")
            .from_zones(["web", "db"])
            .sources(["any"])
            .to_zones(["untrust"])
            .destinations(["any"])
            .applications(["any"])
            .services(["application-default"]),
    );

    rulebase.add_nat(
        NatRule::new("Web SSH")
            .from_zones(["untrust"])
            .sources(["any"])
            .to_zones(["untrust"])
            .destinations(["192.168.55.20"])
            .service("service-tcp-221")
            .source_translation_interface("ethernet1/2")
            .destination_translated_address("web-srv")
            .destination_translated_port(22),
    );
    rulebase.add_nat(
        NatRule::new("DB SSH")
            .from_zones(["untrust"])
            .sources(["any"])
            .to_zones(["untrust"])
            .destinations(["192.168.55.20"])
            .service("service-tcp-222")
            .source_translation_interface("ethernet1/3")
            .destination_translated_address("db-srv")
            .destination_translated_port(22),
    );
    rulebase.add_nat(
        NatRule::new("WordPress NAT")
            .from_zones(["untrust"])
            .sources(["any"])
            .to_zones(["untrust"])
            .destinations(["192.168.55.20"])
            .service("service-http")
            .source_translation_interface("ethernet1/2")
            .destination_translated_address("web-srv"),
    );
    rulebase.add_nat(
        NatRule::new("Outgoing traffic")
            .from_zones(["web", "db"])
            .sources(["any"])
            .to_zones(["untrust"])
            .destinations(["any"])
            .source_translation_interface("ethernet1/1"),
    );

    rulebase
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::PanObject;

    #[test]
    fn rulebase_lists_security_rules_before_nat_rules_in_policy_order() {
        let names: Vec<_> = rulebase().iter().map(PanObject::name).map(String::from).collect();
        assert_eq!(
            names,
            [
                "Allow ping",
                "SSH inbound",
                "Web inbound",
                "Web to DB",
                "Allow outbound",
                "Web SSH",
                "DB SSH",
                "WordPress NAT",
                "Outgoing traffic",
            ]
        );
    }
}
