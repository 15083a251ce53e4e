use std::collections::BTreeMap;

use helper::quantity::Quantity;
use serde::{Deserialize, Serialize};

/// Capacity advertised by a node of the cluster: a mapping from
/// resource dimension name to quantity, in the shape found in the node
/// status of the cluster API.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CapacityDescriptor(BTreeMap<String, Quantity>);

impl CapacityDescriptor {
    pub fn new() -> Self { Self(BTreeMap::new()) }

    pub fn with(
        mut self,
        name: impl Into<String>,
        quantity: Quantity,
    ) -> Self {
        self.0.insert(name.into(), quantity);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Quantity> { self.0.get(name) }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Quantity)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;

    #[test]
    fn test_deserialize_node_status_shape() -> Result<()> {
        let descriptor: CapacityDescriptor = serde_json::from_str(
            r#"{"cpu": "2", "memory": "4Gi", "nvidia.com/gpu": "1"}"#,
        )?;
        assert_eq!(descriptor.get("cpu"), Some(&Quantity::new(2.0)));
        assert_eq!(
            descriptor.get("memory"),
            Some(&Quantity::new(4_294_967_296.0))
        );
        assert_eq!(descriptor.get("nvidia.com/gpu"), Some(&Quantity::new(1.0)));
        assert_eq!(descriptor.get("ephemeral-storage"), None);
        Ok(())
    }
}
