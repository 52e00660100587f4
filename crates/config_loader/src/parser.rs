//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{ContractError, DispatcherBlueprint};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<DispatcherBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<DispatcherBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<DispatcherBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[primary]
name = "mongo-a"

[secondary]
name = "mongo-b"
latency_ms = 5
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.primary.name, "mongo-a");
        assert_eq!(bp.secondary.latency_ms, 5);
        // Missing [failover] table falls back to defaults
        assert_eq!(bp.failover.primary_timeout_ms, 700);
        assert_eq!(bp.failover.cooldowns_ms, vec![20_000, 60_000, 120_000]);
    }

    #[test]
    fn test_parse_toml_failover_section() {
        let content = r#"
[failover]
primary_timeout_ms = 20
secondary_timeout_ms = 1000
failover_medium = true
cooldowns_ms = [1000, 2000]

[primary]
name = "a"

[secondary]
name = "b"
"#;
        let bp = parse_toml(content).unwrap();
        assert_eq!(bp.failover.primary_timeout_ms, 20);
        assert_eq!(bp.failover.secondary_timeout_ms, Some(1000));
        assert!(bp.failover.failover_medium);
        assert!(!bp.failover.failover_dangerous);
        assert_eq!(bp.failover.cooldowns_ms.len(), 2);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "failover": { "primary_timeout_ms": 50 },
            "primary": { "name": "a", "latency_ms": 1 },
            "secondary": { "name": "b", "failure_rate": 0.25 }
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.failover.primary_timeout_ms, 50);
        assert_eq!(bp.secondary.failure_rate, 0.25);
    }

    #[test]
    fn test_parse_missing_endpoint() {
        let content = r#"
[primary]
name = "a"
"#;
        let err = parse_toml(content).unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
