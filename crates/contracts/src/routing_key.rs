//! RoutingKey - non-empty, cheap-to-clone destination selector
//!
//! Uses Arc<str> internally so clones handed to every keyed destination are O(1).

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use crate::ContractError;

/// Key selecting one keyed destination (a server, tenant or job name).
///
/// A routing key is never empty: an empty selector value means "no key" and
/// the record belongs to the aggregate stream. Whitespace is a real key.
///
/// # Examples
/// ```
/// use contracts::RoutingKey;
///
/// let key = RoutingKey::new("server1").unwrap();
/// assert_eq!(key.as_str(), "server1");
/// assert!(RoutingKey::new("").is_none());
/// ```
#[derive(Clone)]
pub struct RoutingKey(Arc<str>);

impl RoutingKey {
    /// Create a key, or `None` when `s` is empty.
    pub fn new(s: &str) -> Option<Self> {
        if s.is_empty() {
            None
        } else {
            Some(Self(Arc::from(s)))
        }
    }

    /// Get the underlying string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for RoutingKey {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for RoutingKey {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RoutingKey {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for RoutingKey {
    type Error = ContractError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s).ok_or_else(|| ContractError::invalid_routing_key(s))
    }
}

impl TryFrom<String> for RoutingKey {
    type Error = ContractError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::try_from(s.as_str())
    }
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoutingKey({:?})", self.0)
    }
}

impl PartialEq for RoutingKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for RoutingKey {}

impl PartialEq<str> for RoutingKey {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for RoutingKey {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

// Must hash like str so `&str` lookups work against RoutingKey-keyed maps.
impl Hash for RoutingKey {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl PartialOrd for RoutingKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RoutingKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl Serialize for RoutingKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RoutingKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::try_from(s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_rejects_empty() {
        assert!(RoutingKey::new("").is_none());
        assert_eq!(RoutingKey::new("   ").unwrap().as_str(), "   ");
        assert!(matches!(
            RoutingKey::try_from(""),
            Err(ContractError::InvalidRoutingKey { .. })
        ));
    }

    #[test]
    fn test_clone_shares_storage() {
        let k1 = RoutingKey::new("server1").unwrap();
        let k2 = k1.clone();
        assert_eq!(k1.as_str().as_ptr(), k2.as_str().as_ptr());
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_lookup_by_str() {
        let mut map: HashMap<RoutingKey, u32> = HashMap::new();
        map.insert(RoutingKey::new("server1").unwrap(), 1);
        assert_eq!(map.get("server1"), Some(&1));
        assert_eq!(map.get("server2"), None);
    }

    #[test]
    fn test_serde() {
        let key = RoutingKey::new("tenant-a").unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"tenant-a\"");

        let back: RoutingKey = serde_json::from_str("\"tenant-a\"").unwrap();
        assert_eq!(back, key);

        assert!(serde_json::from_str::<RoutingKey>("\"\"").is_err());
    }
}
