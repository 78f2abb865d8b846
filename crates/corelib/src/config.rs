//! Topology configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default number of virtual nodes per physical node.
pub const DEFAULT_VIRTUAL_NODES: u32 = 32;

/// Settings for a [`Topology`](crate::Topology).
///
/// Missing JSON fields take their defaults:
///
/// ```
/// use corelib::TopologyConfig;
///
/// let config = TopologyConfig::from_json(r#"{ "virtual_nodes": 256 }"#).unwrap();
/// assert_eq!(config.virtual_nodes, 256);
/// assert!(!config.parallel_gossip);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Tokens assigned to each joining node.
    pub virtual_nodes: u32,
    /// Deliver each broadcast phase to all recipients concurrently.
    pub parallel_gossip: bool,
    /// Seed for choosing the metadata seed member; entropy when unset.
    pub seed: Option<u64>,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            virtual_nodes: DEFAULT_VIRTUAL_NODES,
            parallel_gossip: false,
            seed: None,
        }
    }
}

impl TopologyConfig {
    pub fn new(virtual_nodes: u32) -> Self {
        Self {
            virtual_nodes,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_vnodes(mut self, virtual_nodes: u32) -> Self {
        self.virtual_nodes = virtual_nodes;
        self
    }

    pub fn with_parallel_gossip(mut self, parallel: bool) -> Self {
        self.parallel_gossip = parallel;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.virtual_nodes == 0 {
            return Err(Error::InvalidConfig(
                "virtual_nodes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TopologyConfig::default();
        assert_eq!(config.virtual_nodes, 32);
        assert!(!config.parallel_gossip);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_from_json() {
        let config = TopologyConfig::from_json(
            r#"{ "virtual_nodes": 8, "parallel_gossip": true, "seed": 7 }"#,
        )
        .unwrap();
        assert_eq!(
            config,
            TopologyConfig::new(8).with_parallel_gossip(true).with_seed(7)
        );
    }

    #[test]
    fn test_rejects_zero_vnodes() {
        assert!(matches!(
            TopologyConfig::from_json(r#"{ "virtual_nodes": 0 }"#),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            TopologyConfig::from_json("not json"),
            Err(Error::InvalidConfig(_))
        ));
    }
}
