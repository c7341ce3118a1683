// JSON helpers shared by the snapshot store and the CLI
use crate::error::{BlockchainError, Result};
use serde::{Deserialize, Serialize};

/// Serialize data as pretty-printed JSON
pub fn to_json<T: Serialize>(data: &T) -> Result<String> {
    serde_json::to_string_pretty(data)
        .map_err(|e| BlockchainError::Serialization(format!("Serialization failed: {e}")))
}

/// Deserialize data from a JSON string
pub fn from_json<T>(text: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_str(text)
        .map_err(|e| BlockchainError::Serialization(format!("Deserialization failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_integer_keyed_map_survives_json() {
        let mut balances: BTreeMap<i64, u64> = BTreeMap::new();
        balances.insert(0, 5);
        balances.insert(7, 12);

        let text = to_json(&balances).expect("Serialization should work");
        let restored: BTreeMap<i64, u64> = from_json(&text).expect("Deserialization should work");

        assert_eq!(balances, restored);
    }

    #[test]
    fn test_deserialize_invalid_data() {
        let result: Result<Vec<u64>> = from_json("{not json");
        assert!(matches!(result, Err(BlockchainError::Serialization(_))));
    }
}
