// registry.rs — Port-type and block-role knowledge
//
// Holds the domain tables the lowering passes consult: which block classes
// are passive connectors, the ordered connector adaptation rules, and the
// well-known bus patterns that need an implicit support block. A built-in
// table is always available; a JSON file can replace any part of it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ── Roles ───────────────────────────────────────────────────────────────────

/// Shared-bus protocols with implicit support-block inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusKind {
    I2c,
}

impl BusKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BusKind::I2c => "i2c",
        }
    }
}

/// Special role of a node, computed once when the graph is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Generic multi-pin adapter whose pin types are inferred from neighbors.
    PassiveConnector,
    /// Support block (e.g. pull-ups) for the given bus.
    BusSupport(BusKind),
    Plain,
}

// ── Tables ──────────────────────────────────────────────────────────────────

/// One row of the connector adaptation table: a pin whose incoming port
/// types all fall within `accepts` is exposed as `exposes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptRule {
    pub accepts: Vec<String>,
    pub exposes: String,
}

impl AdaptRule {
    fn new(accepts: &[&str], exposes: &str) -> Self {
        Self {
            accepts: accepts.iter().map(|s| s.to_string()).collect(),
            exposes: exposes.to_string(),
        }
    }

    /// True if `incoming` is non-empty and a subset of `accepts`.
    pub fn matches(&self, incoming: &BTreeSet<&str>) -> bool {
        !incoming.is_empty()
            && incoming
                .iter()
                .all(|ty| self.accepts.iter().any(|a| a == ty))
    }
}

/// A bus that needs a support block whenever a controller is wired up
/// without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusRule {
    pub kind: BusKind,
    pub controller_types: Vec<String>,
    pub target_types: Vec<String>,
    /// Block class of the support component.
    pub support_class: String,
    pub support_bus_port: String,
    pub support_power_port: String,
    /// Power port names tried on the controller node, in preference order.
    pub controller_power_ports: Vec<String>,
    /// Synthetic block name is this prefix followed by the connection name.
    pub implicit_name_prefix: String,
}

impl BusRule {
    fn i2c() -> Self {
        Self {
            kind: BusKind::I2c,
            controller_types: vec!["I2cController".to_string()],
            target_types: vec!["I2cTarget".to_string()],
            support_class: "I2cPullup".to_string(),
            support_bus_port: "i2c".to_string(),
            support_power_port: "pwr".to_string(),
            controller_power_ports: vec!["pwr".to_string(), "pwr_out".to_string()],
            implicit_name_prefix: "_implicit_i2c_pullup_".to_string(),
        }
    }

    pub fn is_controller(&self, port_type: &str) -> bool {
        self.controller_types.iter().any(|t| t == port_type)
    }

    pub fn is_target(&self, port_type: &str) -> bool {
        self.target_types.iter().any(|t| t == port_type)
    }
}

// ── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("{}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid registry: {0}")]
    Invalid(String),
}

// ── Registry ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Registry {
    /// Type or superclass names that mark a node as a passive connector.
    pub connector_classes: Vec<String>,
    /// Ordered, first match wins.
    pub adapt_rules: Vec<AdaptRule>,
    pub buses: Vec<BusRule>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Registry {
    /// The built-in tables.
    pub fn builtin() -> Self {
        Self {
            connector_classes: vec!["PassiveConnector".to_string()],
            adapt_rules: vec![
                AdaptRule::new(&["VoltageSink"], "VoltageSource"),
                AdaptRule::new(&["VoltageSource", "VoltageSink"], "VoltageSink"),
                AdaptRule::new(
                    &["DigitalSource", "DigitalSink", "DigitalBidir"],
                    "DigitalBidir",
                ),
                AdaptRule::new(&["AnalogSink"], "AnalogSource"),
                AdaptRule::new(&["AnalogSource", "AnalogSink"], "AnalogSink"),
                AdaptRule::new(&["Ground", "GroundReference"], "Ground"),
            ],
            buses: vec![BusRule::i2c()],
        }
    }

    /// Parse a registry from JSON text. Missing top-level fields keep their
    /// built-in values.
    pub fn from_json_str(text: &str) -> Result<Self, RegistryError> {
        let registry: Registry = serde_json::from_str(text).map_err(|source| {
            RegistryError::Parse {
                path: PathBuf::from("<inline>"),
                source,
            }
        })?;
        registry.validate()?;
        Ok(registry)
    }

    pub fn load_json(path: &Path) -> Result<Self, RegistryError> {
        let text = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let registry: Registry =
            serde_json::from_str(&text).map_err(|source| RegistryError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        registry.validate()?;
        Ok(registry)
    }

    fn validate(&self) -> Result<(), RegistryError> {
        for (i, rule) in self.adapt_rules.iter().enumerate() {
            if rule.accepts.is_empty() {
                return Err(RegistryError::Invalid(format!(
                    "adapt rule {} accepts no types",
                    i
                )));
            }
            if rule.exposes.is_empty() {
                return Err(RegistryError::Invalid(format!(
                    "adapt rule {} exposes no type",
                    i
                )));
            }
        }
        for bus in &self.buses {
            if bus.implicit_name_prefix.is_empty() {
                return Err(RegistryError::Invalid(format!(
                    "bus '{}' has an empty implicit name prefix",
                    bus.kind.as_str()
                )));
            }
        }
        Ok(())
    }

    /// Classify a node from its own type and its superclasses.
    pub fn classify(&self, type_name: &str, super_classes: &[String]) -> Role {
        let is_a = |class: &str| type_name == class || super_classes.iter().any(|s| s == class);

        if self.connector_classes.iter().any(|c| is_a(c.as_str())) {
            return Role::PassiveConnector;
        }
        for bus in &self.buses {
            if is_a(bus.support_class.as_str()) {
                return Role::BusSupport(bus.kind);
            }
        }
        Role::Plain
    }

    /// First adapt rule matching the incoming type set.
    pub fn resolve_adapter(&self, incoming: &BTreeSet<&str>) -> Option<&AdaptRule> {
        self.adapt_rules.iter().find(|rule| rule.matches(incoming))
    }

    /// Stable compact serialization, used for provenance fingerprints.
    pub fn canonical_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
