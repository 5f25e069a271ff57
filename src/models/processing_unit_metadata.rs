use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq)]
#[serde(tag = "unit_name")]
#[serde(rename_all = "snake_case")]
pub enum ProcessingUnitMetadata {
    LogRegDaiClassifier,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize() {
        let data = r#"{
                        "unit_name": "log_reg_dai_classifier"
                      }"#;
        let metadata: ProcessingUnitMetadata = serde_json::from_str(data).unwrap();
        assert_eq!(ProcessingUnitMetadata::LogRegDaiClassifier, metadata);
    }

    #[test]
    fn test_serialize() {
        let data = serde_json::to_string(&ProcessingUnitMetadata::LogRegDaiClassifier).unwrap();
        assert_eq!(r#"{"unit_name":"log_reg_dai_classifier"}"#, data);
    }
}
