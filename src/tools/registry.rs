//! Capability registry - which tools a run is allowed to use

use super::{Capability, SandboxOp};

/// Which optional collaborators were reachable when the conversation started
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Availability {
    /// Gateway URL and access token were both resolved
    pub gateway: bool,
}

/// Ordered capability set for a run.
///
/// Sandbox operations first, then the gateway wildcard when the gateway is
/// reachable, then delegation.
pub fn enabled_capabilities(availability: &Availability) -> Vec<Capability> {
    let mut capabilities: Vec<Capability> = SandboxOp::ALL
        .iter()
        .copied()
        .map(Capability::Sandbox)
        .collect();

    if availability.gateway {
        capabilities.push(Capability::GatewayWildcard);
    }

    capabilities.push(Capability::Delegation);
    capabilities
}
