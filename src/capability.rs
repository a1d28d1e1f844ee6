//! Capability identifiers and availability reports

use serde::Serialize;

/// The platform capabilities exposed by the façade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Speech,
    Geolocation,
    Notification,
    Battery,
    Clipboard,
    Vibration,
    Orientation,
}

impl Capability {
    /// Every capability, in page order
    pub const ALL: [Capability; 7] = [
        Capability::Speech,
        Capability::Geolocation,
        Capability::Notification,
        Capability::Battery,
        Capability::Clipboard,
        Capability::Vibration,
        Capability::Orientation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Speech => "speech",
            Capability::Geolocation => "geolocation",
            Capability::Notification => "notification",
            Capability::Battery => "battery",
            Capability::Clipboard => "clipboard",
            Capability::Vibration => "vibration",
            Capability::Orientation => "orientation",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Availability of one capability and the backend that would serve it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeEntry {
    pub capability: Capability,
    pub available: bool,
    pub backend: &'static str,
}

/// Result of probing every capability without invoking any of them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CapabilityReport {
    pub entries: Vec<ProbeEntry>,
}

impl CapabilityReport {
    pub fn is_available(&self, capability: Capability) -> bool {
        self.entries
            .iter()
            .any(|e| e.capability == capability && e.available)
    }
}

impl std::fmt::Display for ProbeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mark = if self.available { "yes" } else { "no" };
        write!(f, "{:<12} {:<4} ({})", self.capability.as_str(), mark, self.backend)
    }
}

impl std::fmt::Display for CapabilityReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_lookup() {
        let report = CapabilityReport {
            entries: vec![
                ProbeEntry {
                    capability: Capability::Speech,
                    available: true,
                    backend: "spd-say",
                },
                ProbeEntry {
                    capability: Capability::Vibration,
                    available: false,
                    backend: "timed_output",
                },
            ],
        };
        assert!(report.is_available(Capability::Speech));
        assert!(!report.is_available(Capability::Vibration));
        assert!(!report.is_available(Capability::Battery));

        let text = report.to_string();
        assert!(text.contains("speech"));
        assert!(text.contains("(timed_output)"));
    }
}
