//! Network records: interfaces, zones, virtual routers, static routes.

use super::{members, names, xml_escape, PanObject, DEVICE_XPATH, VSYS_XPATH};

/// Operating mode of an interface, shared with the zones grouping it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Routed, carries IP addresses
    Layer3,
    /// Switched
    Layer2,
    /// Passive traffic monitoring
    Tap,
}

impl Mode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Layer3 => "layer3",
            Self::Layer2 => "layer2",
            Self::Tap => "tap",
        }
    }
}

/// A physical ethernet port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetInterface {
    name: String,
    mode: Mode,
    ip: Vec<String>,
}

impl EthernetInterface {
    /// Create an interface with no addresses.
    pub fn new(name: impl Into<String>, mode: Mode) -> Self {
        Self {
            name: name.into(),
            mode,
            ip: Vec::new(),
        }
    }

    /// Add an address in CIDR notation.
    #[must_use]
    pub fn with_ip(mut self, address: impl Into<String>) -> Self {
        self.ip.push(address.into());
        self
    }
}

impl PanObject for EthernetInterface {
    fn name(&self) -> &str {
        &self.name
    }

    fn xpath(&self) -> String {
        format!(
            "{DEVICE_XPATH}/network/interface/ethernet/entry[@name='{}']",
            self.name
        )
    }

    fn element(&self) -> String {
        let mode = self.mode.as_str();
        if self.ip.is_empty() {
            return format!("<{mode}/>");
        }
        let entries: String = self
            .ip
            .iter()
            .map(|ip| format!(r#"<entry name="{}"/>"#, xml_escape(ip)))
            .collect();
        format!("<{mode}><ip>{entries}</ip></{mode}>")
    }
}

/// A named grouping of interfaces, the unit of policy matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    name: String,
    mode: Mode,
    interfaces: Vec<String>,
}

impl Zone {
    /// Create a zone over the given member interfaces.
    pub fn new(
        name: impl Into<String>,
        mode: Mode,
        interfaces: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            mode,
            interfaces: names(interfaces),
        }
    }
}

impl PanObject for Zone {
    fn name(&self) -> &str {
        &self.name
    }

    fn xpath(&self) -> String {
        format!("{VSYS_XPATH}/zone/entry[@name='{}']", self.name)
    }

    fn element(&self) -> String {
        let mode = self.mode.as_str();
        format!(
            "<network><{mode}>{}</{mode}></network>",
            members(&self.interfaces)
        )
    }
}

/// A named routing domain owning interfaces and routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualRouter {
    name: String,
    interfaces: Vec<String>,
}

impl VirtualRouter {
    /// Create a router over the given member interfaces.
    pub fn new(
        name: impl Into<String>,
        interfaces: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            interfaces: names(interfaces),
        }
    }

    /// A static route owned by this router. Routes only exist nested under
    /// a router's entry, so this is the only way to construct one.
    pub fn static_route(
        &self,
        name: impl Into<String>,
        destination: impl Into<String>,
        nexthop: impl Into<String>,
    ) -> StaticRoute {
        StaticRoute {
            router: self.name.clone(),
            name: name.into(),
            destination: destination.into(),
            nexthop: nexthop.into(),
        }
    }
}

impl PanObject for VirtualRouter {
    fn name(&self) -> &str {
        &self.name
    }

    fn xpath(&self) -> String {
        format!(
            "{DEVICE_XPATH}/network/virtual-router/entry[@name='{}']",
            self.name
        )
    }

    fn element(&self) -> String {
        if self.interfaces.is_empty() {
            return "<interface/>".to_string();
        }
        format!("<interface>{}</interface>", members(&self.interfaces))
    }
}

/// A static route, nested under its owning router's entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticRoute {
    router: String,
    name: String,
    destination: String,
    nexthop: String,
}

impl PanObject for StaticRoute {
    fn name(&self) -> &str {
        &self.name
    }

    fn xpath(&self) -> String {
        format!(
            "{DEVICE_XPATH}/network/virtual-router/entry[@name='{}']/routing-table/ip/static-route/entry[@name='{}']",
            self.router, self.name
        )
    }

    fn element(&self) -> String {
        format!(
            "<destination>{}</destination><nexthop><ip-address>{}</ip-address></nexthop>",
            xml_escape(&self.destination),
            xml_escape(&self.nexthop)
        )
    }
}
