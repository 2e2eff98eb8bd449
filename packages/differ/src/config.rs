use serde::{Deserialize, Serialize};

/// Diff engine tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiffConfig {
    /// Row-count delta above which a table is replaced wholesale
    pub table_row_replace_threshold: usize,

    /// Nesting limit; deeper trees fail with [`crate::DiffError::DepthExceeded`]
    pub max_depth: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            table_row_replace_threshold: 2,
            max_depth: 512,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DiffConfig =
            serde_json::from_str(r#"{ "tableRowReplaceThreshold": 5 }"#).unwrap();
        assert_eq!(config.table_row_replace_threshold, 5);
        assert_eq!(config.max_depth, 512);
    }
}
