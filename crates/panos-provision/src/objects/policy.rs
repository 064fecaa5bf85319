//! Policy records: address and service objects, security and NAT rules.

use super::{members, names, xml_escape, PanObject, VSYS_XPATH};

/// A named alias for an IP address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressObject {
    name: String,
    value: String,
}

impl AddressObject {
    /// Create an address object for an IP or CIDR value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl PanObject for AddressObject {
    fn name(&self) -> &str {
        &self.name
    }

    fn xpath(&self) -> String {
        format!("{VSYS_XPATH}/address/entry[@name='{}']", self.name)
    }

    fn element(&self) -> String {
        format!("<ip-netmask>{}</ip-netmask>", xml_escape(&self.value))
    }
}

/// Transport protocol of a service object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// TCP
    Tcp,
    /// UDP
    Udp,
}

impl Protocol {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

/// A named alias for a protocol and destination port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceObject {
    name: String,
    protocol: Protocol,
    destination_port: String,
}

impl ServiceObject {
    /// Create a service object. The port may be a single port or a range.
    pub fn new(
        name: impl Into<String>,
        protocol: Protocol,
        destination_port: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            protocol,
            destination_port: destination_port.into(),
        }
    }
}

impl PanObject for ServiceObject {
    fn name(&self) -> &str {
        &self.name
    }

    fn xpath(&self) -> String {
        format!("{VSYS_XPATH}/service/entry[@name='{}']", self.name)
    }

    fn element(&self) -> String {
        let protocol = self.protocol.as_str();
        format!(
            "<protocol><{protocol}><port>{}</port></{protocol}></protocol>",
            xml_escape(&self.destination_port)
        )
    }
}

/// Verdict of a security rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    /// Permit matching traffic
    Allow,
    /// Reject with the protocol's refusal
    Deny,
    /// Silently discard
    Drop,
}

impl RuleAction {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
            Self::Drop => "drop",
        }
    }
}

/// One security policy rule.
///
/// A new rule matches anything (`any` zones, sources, destinations and
/// applications on their default service) and allows it, mirroring the
/// device defaults; builder calls narrow it down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityRule {
    name: String,
    from_zones: Vec<String>,
    to_zones: Vec<String>,
    sources: Vec<String>,
    destinations: Vec<String>,
    applications: Vec<String>,
    services: Vec<String>,
    action: RuleAction,
}

impl SecurityRule {
    /// Create a rule with device-default match fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            from_zones: vec!["any".to_string()],
            to_zones: vec!["any".to_string()],
            sources: vec!["any".to_string()],
            destinations: vec!["any".to_string()],
            applications: vec!["any".to_string()],
            services: vec!["application-default".to_string()],
            action: RuleAction::Allow,
        }
    }

    /// Set the zones traffic must arrive from.
    #[must_use]
    pub fn from_zones(mut self, zones: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.from_zones = names(zones);
        self
    }

    /// Set the zones traffic must be heading to.
    #[must_use]
    pub fn to_zones(mut self, zones: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.to_zones = names(zones);
        self
    }

    /// Set the source addresses (literals or address object names).
    #[must_use]
    pub fn sources(mut self, sources: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.sources = names(sources);
        self
    }

    /// Set the destination addresses (literals or address object names).
    #[must_use]
    pub fn destinations(mut self, destinations: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.destinations = names(destinations);
        self
    }

    /// Set the applications to match.
    #[must_use]
    pub fn applications(mut self, applications: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.applications = names(applications);
        self
    }

    /// Set the services to match (service object names or
    /// `application-default`).
    #[must_use]
    pub fn services(mut self, services: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.services = names(services);
        self
    }

    /// Set the rule action.
    #[must_use]
    pub const fn action(mut self, action: RuleAction) -> Self {
        self.action = action;
        self
    }
}

impl PanObject for SecurityRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn xpath(&self) -> String {
        format!(
            "{VSYS_XPATH}/rulebase/security/rules/entry[@name='{}']",
            self.name
        )
    }

    fn element(&self) -> String {
        format!(
            "<from>{}</from><source>{}</source><to>{}</to><destination>{}</destination><application>{}</application><service>{}</service><action>{}</action>",
            members(&self.from_zones),
            members(&self.sources),
            members(&self.to_zones),
            members(&self.destinations),
            members(&self.applications),
            members(&self.services),
            self.action.as_str()
        )
    }
}

/// One address translation rule.
///
/// Source translation is always dynamic-ip-and-port via an egress
/// interface address; destination translation rewrites the destination
/// address and optionally the port. Both are optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NatRule {
    name: String,
    from_zones: Vec<String>,
    to_zones: Vec<String>,
    sources: Vec<String>,
    destinations: Vec<String>,
    service: Option<String>,
    source_translation_interface: Option<String>,
    destination_translated_address: Option<String>,
    destination_translated_port: Option<u16>,
}

impl NatRule {
    /// Create a rule matching any zones, sources, destinations and service.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            from_zones: vec!["any".to_string()],
            to_zones: vec!["any".to_string()],
            sources: vec!["any".to_string()],
            destinations: vec!["any".to_string()],
            service: None,
            source_translation_interface: None,
            destination_translated_address: None,
            destination_translated_port: None,
        }
    }

    /// Set the zones traffic must arrive from.
    #[must_use]
    pub fn from_zones(mut self, zones: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.from_zones = names(zones);
        self
    }

    /// Set the zones traffic must be heading to.
    #[must_use]
    pub fn to_zones(mut self, zones: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.to_zones = names(zones);
        self
    }

    /// Set the source addresses to match.
    #[must_use]
    pub fn sources(mut self, sources: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.sources = names(sources);
        self
    }

    /// Set the destination addresses to match.
    #[must_use]
    pub fn destinations(mut self, destinations: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.destinations = names(destinations);
        self
    }

    /// Match one service object by name.
    #[must_use]
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Translate the source to the address of the given egress interface
    /// (dynamic-ip-and-port).
    #[must_use]
    pub fn source_translation_interface(mut self, interface: impl Into<String>) -> Self {
        self.source_translation_interface = Some(interface.into());
        self
    }

    /// Rewrite the destination to the given address or address object.
    #[must_use]
    pub fn destination_translated_address(mut self, address: impl Into<String>) -> Self {
        self.destination_translated_address = Some(address.into());
        self
    }

    /// Rewrite the destination port. Only rendered together with a
    /// translated address.
    #[must_use]
    pub const fn destination_translated_port(mut self, port: u16) -> Self {
        self.destination_translated_port = Some(port);
        self
    }
}

impl PanObject for NatRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn xpath(&self) -> String {
        format!("{VSYS_XPATH}/rulebase/nat/rules/entry[@name='{}']", self.name)
    }

    fn element(&self) -> String {
        let mut element = format!(
            "<from>{}</from><source>{}</source><to>{}</to><destination>{}</destination><service>{}</service>",
            members(&self.from_zones),
            members(&self.sources),
            members(&self.to_zones),
            members(&self.destinations),
            xml_escape(self.service.as_deref().unwrap_or("any"))
        );
        if let Some(interface) = &self.source_translation_interface {
            element.push_str(&format!(
                "<source-translation><dynamic-ip-and-port><interface-address><interface>{}</interface></interface-address></dynamic-ip-and-port></source-translation>",
                xml_escape(interface)
            ));
        }
        if let Some(address) = &self.destination_translated_address {
            let port = self
                .destination_translated_port
                .map(|port| format!("<translated-port>{port}</translated-port>"))
                .unwrap_or_default();
            element.push_str(&format!(
                "<destination-translation><translated-address>{}</translated-address>{port}</destination-translation>",
                xml_escape(address)
            ));
        }
        element
    }
}

/// One rulebase entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleEntry {
    /// A security policy rule
    Security(SecurityRule),
    /// An address translation rule
    Nat(NatRule),
}

impl PanObject for RuleEntry {
    fn name(&self) -> &str {
        match self {
            Self::Security(rule) => rule.name(),
            Self::Nat(rule) => rule.name(),
        }
    }

    fn xpath(&self) -> String {
        match self {
            Self::Security(rule) => rule.xpath(),
            Self::Nat(rule) => rule.xpath(),
        }
    }

    fn element(&self) -> String {
        match self {
            Self::Security(rule) => rule.element(),
            Self::Nat(rule) => rule.element(),
        }
    }
}

/// Ordered container of security and NAT rules.
///
/// Evaluation on the device is first-match, so insertion order is part of
/// the policy's meaning and iteration yields entries exactly as inserted.
/// The container itself is local bookkeeping; only its rules are submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rulebase {
    rules: Vec<RuleEntry>,
}

impl Rulebase {
    /// Create an empty rulebase.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a security rule.
    pub fn add_security(&mut self, rule: SecurityRule) {
        self.rules.push(RuleEntry::Security(rule));
    }

    /// Append a NAT rule.
    pub fn add_nat(&mut self, rule: NatRule) {
        self.rules.push(RuleEntry::Nat(rule));
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, RuleEntry> {
        self.rules.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the rulebase holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a Rulebase {
    type Item = &'a RuleEntry;
    type IntoIter = std::slice::Iter<'a, RuleEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_object_renders_ip_netmask() {
        let address = AddressObject::new("web-srv", "192.168.45.5");
        assert_eq!(
            address.xpath(),
            "/config/devices/entry[@name='localhost.localdomain']/vsys/entry[@name='vsys1']/address/entry[@name='web-srv']"
        );
        assert_eq!(address.element(), "<ip-netmask>192.168.45.5</ip-netmask>");
    }

    #[test]
    fn service_object_renders_protocol_and_port() {
        let service = ServiceObject::new("service-tcp-221", Protocol::Tcp, "221");
        assert_eq!(
            service.xpath(),
            "/config/devices/entry[@name='localhost.localdomain']/vsys/entry[@name='vsys1']/service/entry[@name='service-tcp-221']"
        );
        assert_eq!(
            service.element(),
            "<protocol><tcp><port>221</port></tcp></protocol>"
        );
    }

    #[test]
    fn security_rule_defaults_match_anything() {
        let rule = SecurityRule::new("open");
        assert_eq!(
            rule.element(),
            "<from><member>any</member></from><source><member>any</member></source><to><member>any</member></to><destination><member>any</member></destination><application><member>any</member></application><service><member>application-default</member></service><action>allow</action>"
        );
    }

    #[test]
    fn security_rule_renders_narrowed_fields() {
        let rule = SecurityRule::new("SSH inbound")
            .from_zones(["untrust"])
            .sources(["any"])
            .to_zones(["web", "db"])
            .destinations(["any"])
            .applications(["ping", "ssh"])
            .services(["service-tcp-221", "service-tcp-222"])
            .action(RuleAction::Allow);
        assert_eq!(
            rule.xpath(),
            "/config/devices/entry[@name='localhost.localdomain']/vsys/entry[@name='vsys1']/rulebase/security/rules/entry[@name='SSH inbound']"
        );
        assert_eq!(
            rule.element(),
            "<from><member>untrust</member></from><source><member>any</member></source><to><member>web</member><member>db</member></to><destination><member>any</member></destination><application><member>ping</member><member>ssh</member></application><service><member>service-tcp-221</member><member>service-tcp-222</member></service><action>allow</action>"
        );
    }

    #[test]
    fn security_rule_deny_action() {
        let rule = SecurityRule::new("block").action(RuleAction::Deny);
        assert!(rule.element().ends_with("<action>deny</action>"));
    }

    #[test]
    fn nat_rule_without_translations_defaults_service_to_any() {
        let rule = NatRule::new("passthrough");
        assert_eq!(
            rule.element(),
            "<from><member>any</member></from><source><member>any</member></source><to><member>any</member></to><destination><member>any</member></destination><service>any</service>"
        );
    }

    #[test]
    fn nat_rule_renders_both_translations() {
        let rule = NatRule::new("Web SSH")
            .from_zones(["untrust"])
            .sources(["any"])
            .to_zones(["untrust"])
            .destinations(["192.168.55.20"])
            .service("service-tcp-221")
            .source_translation_interface("ethernet1/2")
            .destination_translated_address("web-srv")
            .destination_translated_port(22);
        assert_eq!(
            rule.xpath(),
            "/config/devices/entry[@name='localhost.localdomain']/vsys/entry[@name='vsys1']/rulebase/nat/rules/entry[@name='Web SSH']"
        );
        assert_eq!(
            rule.element(),
            "<from><member>untrust</member></from><source><member>any</member></source><to><member>untrust</member></to><destination><member>192.168.55.20</member></destination><service>service-tcp-221</service><source-translation><dynamic-ip-and-port><interface-address><interface>ethernet1/2</interface></interface-address></dynamic-ip-and-port></source-translation><destination-translation><translated-address>web-srv</translated-address><translated-port>22</translated-port></destination-translation>"
        );
    }

    #[test]
    fn nat_rule_omits_port_when_only_address_is_translated() {
        let rule = NatRule::new("WordPress NAT")
            .destinations(["192.168.55.20"])
            .service("service-http")
            .destination_translated_address("web-srv");
        let element = rule.element();
        assert!(element.contains("<translated-address>web-srv</translated-address>"));
        assert!(!element.contains("translated-port"));
    }

    #[test]
    fn nat_rule_source_only_masquerade() {
        let rule = NatRule::new("Outgoing traffic")
            .from_zones(["web", "db"])
            .to_zones(["untrust"])
            .source_translation_interface("ethernet1/1");
        let element = rule.element();
        assert!(element.contains(
            "<source-translation><dynamic-ip-and-port><interface-address><interface>ethernet1/1</interface>"
        ));
        assert!(!element.contains("destination-translation"));
    }

    #[test]
    fn rulebase_preserves_insertion_order_across_kinds() {
        let mut rulebase = Rulebase::new();
        rulebase.add_security(SecurityRule::new("first"));
        rulebase.add_security(SecurityRule::new("second"));
        rulebase.add_nat(NatRule::new("third"));

        let order: Vec<_> = rulebase.iter().map(PanObject::name).collect();
        assert_eq!(order, ["first", "second", "third"]);
        assert_eq!(rulebase.len(), 3);
        assert!(!rulebase.is_empty());
    }
}
