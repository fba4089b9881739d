//! DeviceId - Cheap-to-clone device identifier
//!
//! Every synced stream, report and reference track carries the id of the device
//! it came from, so the id is shared by `Arc<str>` rather than re-allocated.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Device identifier (`"TX0"`, `"RX1"`, ...) with O(1) clone.
///
/// # Examples
/// ```
/// use contracts::DeviceId;
///
/// let id: DeviceId = "RX1".into();
/// let id2 = id.clone();
/// assert_eq!(id, id2);
/// assert_eq!(id.channel_name(2), "RX1-x2");
/// ```
#[derive(Clone, Default)]
pub struct DeviceId(Arc<str>);

impl DeviceId {
    /// Create a new DeviceId from a string slice.
    #[inline]
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Get the underlying string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the `n`-th analog channel of this device (1-based), e.g. `RX1-x3`.
    pub fn channel_name(&self, n: usize) -> String {
        format!("{}-x{}", self.0, n)
    }

    /// Names of the first `count` channels.
    pub fn channel_names(&self, count: usize) -> Vec<String> {
        (1..=count).map(|n| self.channel_name(n)).collect()
    }
}

impl Deref for DeviceId {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for DeviceId {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for DeviceId {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeviceId {
    #[inline]
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for DeviceId {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<&String> for DeviceId {
    #[inline]
    fn from(s: &String) -> Self {
        Self(Arc::from(s.as_str()))
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({:?})", self.0)
    }
}

impl PartialEq for DeviceId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for DeviceId {}

impl PartialEq<str> for DeviceId {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for DeviceId {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl PartialEq<String> for DeviceId {
    #[inline]
    fn eq(&self, other: &String) -> bool {
        self.0.as_ref() == other
    }
}

impl Hash for DeviceId {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl Serialize for DeviceId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DeviceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_clone_shares_storage() {
        let id1: DeviceId = "RX1".into();
        let id2 = id1.clone();
        assert_eq!(id1.as_str().as_ptr(), id2.as_str().as_ptr());
    }

    #[test]
    fn test_equality() {
        let id: DeviceId = "TX0".into();
        assert_eq!(id, "TX0");
        assert_eq!(id, String::from("TX0"));
        assert_eq!(id, DeviceId::from("TX0"));
    }

    #[test]
    fn test_hashmap_lookup_by_str() {
        let mut map: HashMap<DeviceId, usize> = HashMap::new();
        map.insert("RX1".into(), 1);
        map.insert("RX2".into(), 2);
        assert_eq!(map.get("RX2"), Some(&2));
    }

    #[test]
    fn test_channel_names_are_one_based() {
        let id: DeviceId = "TX0".into();
        assert_eq!(id.channel_names(3), vec!["TX0-x1", "TX0-x2", "TX0-x3"]);
        assert!(id.channel_names(0).is_empty());
    }

    #[test]
    fn test_serde() {
        let id: DeviceId = "RX2".into();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"RX2\"");
        let parsed: DeviceId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
