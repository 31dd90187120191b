// ── Endpoint registry ──
//
// Static catalog mapping logical report types to firewall API paths. Built
// once per process; the set of report types is the registry key space and
// lookups for anything else fail with `UnknownReportType`.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Serialize, Serializer};
use strum::IntoEnumIterator;

use crate::error::CoreError;

/// Report type probed by the connectivity check.
pub const PROBE_REPORT_TYPE: &str = "systemInfo";

/// Presentation grouping for report types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::EnumIter)]
pub enum Category {
    Objects,
    #[strum(serialize = "Security Profiles")]
    SecurityProfiles,
    Policies,
    Network,
    GlobalProtect,
    Logs,
    System,
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EndpointDescriptor {
    pub report_type: &'static str,
    pub label: &'static str,
    pub category: Category,
    pub path: &'static str,
}

const fn ep(
    report_type: &'static str,
    label: &'static str,
    category: Category,
    path: &'static str,
) -> EndpointDescriptor {
    EndpointDescriptor {
        report_type,
        label,
        category,
        path,
    }
}

use Category::{GlobalProtect, Logs, Network, Objects, Policies, SecurityProfiles, System};

static CATALOG: &[EndpointDescriptor] = &[
    // Objects
    ep("applications", "Applications", Objects, "/restapi/v11.0/Objects/Applications"),
    ep("appGroups", "Application Groups", Objects, "/restapi/v11.0/Objects/ApplicationGroups"),
    ep("appFilters", "Application Filters", Objects, "/restapi/v11.0/Objects/ApplicationFilters"),
    ep("services", "Services", Objects, "/restapi/v11.0/Objects/Services"),
    ep("serviceGroups", "Service Groups", Objects, "/restapi/v11.0/Objects/ServiceGroups"),
    ep("tags", "Tags", Objects, "/restapi/v11.0/Objects/Tags"),
    ep("hipObjects", "GlobalProtect HIP Objects", Objects, "/restapi/v11.0/Objects/GlobalProtectHIPObjects"),
    ep("hipProfiles", "GlobalProtect HIP Profiles", Objects, "/restapi/v11.0/Objects/GlobalProtectHIPProfiles"),
    ep("edl", "External Dynamic Lists", Objects, "/restapi/v11.0/Objects/ExternalDynamicLists"),
    ep("dataPatterns", "Custom Data Patterns", Objects, "/restapi/v11.0/Objects/CustomDataPatterns"),
    ep("spywareSigs", "Custom Spyware Signatures", Objects, "/restapi/v11.0/Objects/CustomSpywareSignatures"),
    ep("vulnSigs", "Custom Vulnerability Signatures", Objects, "/restapi/v11.0/Objects/CustomVulnerabilitySignatures"),
    ep("urlCategories", "Custom URL Categories", Objects, "/restapi/v11.0/Objects/CustomURLCategories"),
    // Security profiles
    ep("antivirusProfiles", "Antivirus Profiles", SecurityProfiles, "/restapi/v11.0/Objects/AntivirusSecurityProfiles"),
    ep("antispywareProfiles", "Anti-Spyware Profiles", SecurityProfiles, "/restapi/v11.0/Objects/AntiSpywareSecurityProfiles"),
    ep("vulnProtectionProfiles", "Vulnerability Protection Profiles", SecurityProfiles, "/restapi/v11.0/Objects/VulnerabilityProtectionSecurityProfiles"),
    ep("urlFilteringProfiles", "URL Filtering Profiles", SecurityProfiles, "/restapi/v11.0/Objects/URLFilteringSecurityProfiles"),
    ep("fileBlockingProfiles", "File Blocking Profiles", SecurityProfiles, "/restapi/v11.0/Objects/FileBlockingSecurityProfiles"),
    ep("wildfireProfiles", "WildFire Analysis Profiles", SecurityProfiles, "/restapi/v11.0/Objects/WildFireAnalysisSecurityProfiles"),
    ep("dataFilteringProfiles", "Data Filtering Profiles", SecurityProfiles, "/restapi/v11.0/Objects/DataFilteringSecurityProfiles"),
    ep("dosProtectionProfiles", "DoS Protection Profiles", SecurityProfiles, "/restapi/v11.0/Objects/DoSProtectionSecurityProfiles"),
    ep("securityProfileGroups", "Security Profile Groups", SecurityProfiles, "/restapi/v11.0/Objects/SecurityProfileGroups"),
    // Policies
    ep("securityRules", "Security Rules", Policies, "/restapi/v11.0/Policies/SecurityRules"),
    ep("natRules", "NAT Rules", Policies, "/restapi/v11.0/Policies/NATRules"),
    ep("qosRules", "QoS Rules", Policies, "/restapi/v11.0/Policies/QoSRules"),
    ep("pbfRules", "Policy Based Forwarding Rules", Policies, "/restapi/v11.0/Policies/PolicyBasedForwardingRules"),
    ep("decryptionRules", "Decryption Rules", Policies, "/restapi/v11.0/Policies/DecryptionRules"),
    ep("packetBrokerRules", "Network Packet Broker Rules", Policies, "/restapi/v11.0/Policies/NetworkPacketBrokerRules"),
    ep("tunnelInspectionRules", "Tunnel Inspection Rules", Policies, "/restapi/v11.0/Policies/TunnelInspectionRules"),
    ep("appOverrideRules", "Application Override Rules", Policies, "/restapi/v11.0/Policies/ApplicationOverrideRules"),
    ep("authRules", "Authentication Rules", Policies, "/restapi/v11.0/Policies/AuthenticationRules"),
    ep("dosRules", "DoS Rules", Policies, "/restapi/v11.0/Policies/DoSRules"),
    ep("sdwanRules", "SD-WAN Rules", Policies, "/restapi/v11.0/Policies/SDWANRules"),
    // Network
    ep("ethernetInterfaces", "Ethernet Interfaces", Network, "/restapi/v11.0/Network/EthernetInterfaces"),
    ep("aeInterfaces", "Aggregate Ethernet Interfaces", Network, "/restapi/v11.0/Network/AggregateEthernetInterfaces"),
    ep("vlanInterfaces", "VLAN Interfaces", Network, "/restapi/v11.0/Network/VLANInterfaces"),
    ep("loopbackInterfaces", "Loopback Interfaces", Network, "/restapi/v11.0/Network/LoopbackInterfaces"),
    ep("tunnelInterfaces", "Tunnel Interfaces", Network, "/restapi/v11.0/Network/TunnelInterfaces"),
    ep("sdwanInterfaces", "SD-WAN Interfaces", Network, "/restapi/v11.0/Network/SDWANInterfaces"),
    ep("zones", "Zones", Network, "/restapi/v11.0/Network/Zones"),
    ep("vlans", "VLANs", Network, "/restapi/v11.0/Network/VLANs"),
    ep("virtualWires", "Virtual Wires", Network, "/restapi/v11.0/Network/VirtualWires"),
    ep("virtualRouters", "Virtual Routers", Network, "/restapi/v11.0/Network/VirtualRouters"),
    // GlobalProtect
    ep("gpPortals", "GlobalProtect Portals", GlobalProtect, "/restapi/v11.0/Network/GlobalProtectPortals"),
    ep("gpGateways", "GlobalProtect Gateways", GlobalProtect, "/restapi/v11.0/Network/GlobalProtectGateways"),
    ep("gpAgentTunnels", "GlobalProtect Agent Tunnels", GlobalProtect, "/restapi/v11.0/Network/GlobalProtectGatewayAgentTunnels"),
    ep("gpSatelliteTunnels", "GlobalProtect Satellite Tunnels", GlobalProtect, "/restapi/v11.0/Network/GlobalProtectGatewaySatelliteTunnels"),
    ep("gpMdmServers", "GlobalProtect MDM Servers", GlobalProtect, "/restapi/v11.0/Network/GlobalProtectGatewayMDMServers"),
    ep("gpClientlessApps", "GlobalProtect Clientless Apps", GlobalProtect, "/restapi/v11.0/Network/GlobalProtectClientlessApps"),
    ep("gpClientlessAppGroups", "GlobalProtect Clientless App Groups", GlobalProtect, "/restapi/v11.0/Network/GlobalProtectClientlessAppGroups"),
    // Logs
    ep("traffic", "Traffic Logs", Logs, "/restapi/v11.0/Objects/TrafficLogs"),
    ep("threat", "Threat Logs", Logs, "/restapi/v11.0/Objects/ThreatLogs"),
    ep("url", "URL Filtering Logs", Logs, "/restapi/v11.0/Objects/URLFilteringLogs"),
    ep("data", "Data Filtering Logs", Logs, "/restapi/v11.0/Objects/DataFilteringLogs"),
    ep("wildfire", "WildFire Logs", Logs, "/restapi/v11.0/Objects/WildFireLogs"),
    ep("auth", "Authentication Logs", Logs, "/restapi/v11.0/Objects/AuthenticationLogs"),
    ep("system", "System Logs", Logs, "/restapi/v11.0/Objects/SystemLogs"),
    ep("config", "Configuration Logs", Logs, "/restapi/v11.0/Objects/ConfigLogs"),
    ep("correlation", "Correlation Logs", Logs, "/restapi/v11.0/Objects/CorrelationLogs"),
    // System (legacy operational commands)
    ep("systemInfo", "System Information", System, "/api/?type=op&cmd=<show><system><info></info></system></show>"),
    ep("interfaceInfo", "Interface Information", System, "/api/?type=op&cmd=<show><interface>all</interface></show>"),
    ep("systemResources", "System Resources", System, "/api/?type=op&cmd=<show><system><resources></resources></system></show>"),
    ep("gpUsers", "GlobalProtect Users", System, "/api/?type=op&cmd=<show><global-protect-gateway><current-user></current-user></global-protect-gateway></show>"),
    ep("activeSessions", "Active Sessions", System, "/api/?type=op&cmd=<show><session><all></all></session></show>"),
    ep("softwareVersion", "Software Version", System, "/api/?type=op&cmd=<show><system><software></software></system></show>"),
];

static BUILTIN: LazyLock<EndpointRegistry> = LazyLock::new(|| EndpointRegistry::new(CATALOG));

/// Immutable lookup table over a catalog.
#[derive(Debug)]
pub struct EndpointRegistry {
    entries: &'static [EndpointDescriptor],
    index: HashMap<&'static str, usize>,
}

impl EndpointRegistry {
    pub fn new(entries: &'static [EndpointDescriptor]) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.report_type, i))
            .collect();
        Self { entries, index }
    }

    /// The firewall report catalog shipped with panreport.
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    pub fn get(&self, report_type: &str) -> Option<&'static EndpointDescriptor> {
        let entries = self.entries;
        self.index.get(report_type).map(|&i| &entries[i])
    }

    /// Resolve a report type to its API path.
    pub fn resolve(&self, report_type: &str) -> Result<&'static str, CoreError> {
        self.get(report_type)
            .map(|entry| entry.path)
            .ok_or_else(|| CoreError::UnknownReportType {
                report_type: report_type.to_owned(),
            })
    }

    pub fn contains(&self, report_type: &str) -> bool {
        self.index.contains_key(report_type)
    }

    /// All entries in presentation order.
    pub fn entries(&self) -> &'static [EndpointDescriptor] {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Categories in presentation order.
    pub fn categories(&self) -> Vec<Category> {
        Category::iter().collect()
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &'static EndpointDescriptor> {
        self.entries.iter().filter(move |entry| entry.category == category)
    }
}
