use serde::Serialize;

/// Static description of a connection type, used by file browsers to present it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerConnectionProperties {
    pub display_name: &'static str,
    pub default_port: u16,
    pub allows_custom_port: bool,
    /// DNS-SD service type the server advertises, if any
    pub service_type: Option<&'static str>,
}
