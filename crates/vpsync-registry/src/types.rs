//! Typed snapshot records decoded from registry responses.

use crate::client::RegistryError;
use crate::xmlrpc::Value;

/// One node as listed by the registry.
///
/// `GetNodes` returns a much wider struct; only the fields the reconciler
/// consumes are kept. Ephemeral — rebuilt from scratch every pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteNode {
    /// Registry-assigned numeric id, unique within the registry.
    pub node_id: i64,
    pub hostname: String,
    /// Ids of the slices this node is currently a member of.
    pub slice_ids: Vec<i64>,
}

impl RemoteNode {
    pub(crate) fn from_value(value: &Value) -> Result<Self, RegistryError> {
        let node_id = value
            .get("node_id")
            .and_then(Value::as_i64)
            .ok_or_else(|| RegistryError::Decode("node entry without node_id".into()))?;
        let hostname = value
            .get("hostname")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                RegistryError::Decode(format!("node {node_id} without hostname"))
            })?
            .to_string();
        let slice_ids = match value.get("slice_ids") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_i64().ok_or_else(|| {
                        RegistryError::Decode(format!("node {node_id} has a non-integer slice id"))
                    })
                })
                .collect::<Result<_, _>>()?,
            // Nodes outside every slice come back without the member.
            _ => Vec::new(),
        };

        Ok(Self {
            node_id,
            hostname,
            slice_ids,
        })
    }
}

/// One per-node tag row from `GetSliceTags`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceTag {
    pub node_id: i64,
    /// Raw tag value; for the address tag this is a comma-separated list
    /// with the first entry authoritative.
    pub value: String,
}

impl SliceTag {
    pub(crate) fn from_value(value: &Value) -> Result<Self, RegistryError> {
        let node_id = value
            .get("node_id")
            .and_then(Value::as_i64)
            .ok_or_else(|| RegistryError::Decode("tag entry without node_id".into()))?;
        let raw = value
            .get("value")
            .and_then(Value::as_str)
            .ok_or_else(|| RegistryError::Decode(format!("tag for node {node_id} without value")))?
            .to_string();

        Ok(Self {
            node_id,
            value: raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn node_value(node_id: i64, hostname: &str, slice_ids: &[i64]) -> Value {
        let mut members = BTreeMap::new();
        members.insert("node_id".to_string(), Value::Int(node_id));
        members.insert("hostname".to_string(), Value::string(hostname));
        members.insert(
            "slice_ids".to_string(),
            Value::Array(slice_ids.iter().copied().map(Value::Int).collect()),
        );
        // Extra registry fields the reconciler ignores.
        members.insert("boot_state".to_string(), Value::string("boot"));
        Value::Struct(members)
    }

    #[test]
    fn test_remote_node_from_value() {
        let node = RemoteNode::from_value(&node_value(14, "pl1.example.edu", &[22129, 7])).unwrap();
        assert_eq!(node.node_id, 14);
        assert_eq!(node.hostname, "pl1.example.edu");
        assert_eq!(node.slice_ids, vec![22129, 7]);
    }

    #[test]
    fn test_remote_node_missing_slice_ids_is_empty() {
        let mut members = BTreeMap::new();
        members.insert("node_id".to_string(), Value::Int(3));
        members.insert("hostname".to_string(), Value::string("pl2.example.edu"));
        let node = RemoteNode::from_value(&Value::Struct(members)).unwrap();
        assert!(node.slice_ids.is_empty());
    }

    #[test]
    fn test_remote_node_missing_hostname_fails() {
        let mut members = BTreeMap::new();
        members.insert("node_id".to_string(), Value::Int(3));
        assert!(RemoteNode::from_value(&Value::Struct(members)).is_err());
    }

    #[test]
    fn test_slice_tag_from_value() {
        let mut members = BTreeMap::new();
        members.insert("node_id".to_string(), Value::Int(9));
        members.insert("value".to_string(), Value::string("10.0.0.2,10.0.0.3"));
        let tag = SliceTag::from_value(&Value::Struct(members)).unwrap();
        assert_eq!(tag.node_id, 9);
        assert_eq!(tag.value, "10.0.0.2,10.0.0.3");
    }
}
