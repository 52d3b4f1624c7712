//! 配置校验模块
//!
//! 校验规则：
//! - name 非空，且不含路径分隔符 (用作文件名前缀)
//! - selector 非空
//! - pattern 格式下 pattern 非空
//! - file sink 的 base_path 非空

use contracts::{ContractError, FormatKind, RouterConfig, SinkType};

/// 校验 RouterConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &RouterConfig) -> Result<(), ContractError> {
    validate_name(config)?;
    validate_selector(config)?;
    validate_format(config)?;
    validate_sink(config)?;
    Ok(())
}

/// 校验 logger 名称
fn validate_name(config: &RouterConfig) -> Result<(), ContractError> {
    if config.name.trim().is_empty() {
        return Err(ContractError::config_validation(
            "name",
            "name cannot be empty",
        ));
    }
    if config.name.contains(['/', '\\']) {
        return Err(ContractError::config_validation(
            "name",
            format!("name '{}' must not contain path separators", config.name),
        ));
    }
    Ok(())
}

/// 校验 selector 属性名
fn validate_selector(config: &RouterConfig) -> Result<(), ContractError> {
    if config.selector.trim().is_empty() {
        return Err(ContractError::config_validation(
            "selector",
            "selector attribute name cannot be empty",
        ));
    }
    Ok(())
}

/// 校验格式配置
fn validate_format(config: &RouterConfig) -> Result<(), ContractError> {
    if config.format.kind == FormatKind::Pattern && config.format.pattern.is_empty() {
        return Err(ContractError::config_validation(
            "format.pattern",
            "pattern cannot be empty",
        ));
    }
    Ok(())
}

/// 校验 sink 配置
fn validate_sink(config: &RouterConfig) -> Result<(), ContractError> {
    if config.sink.sink_type == SinkType::File && config.sink.base_path.as_os_str().is_empty() {
        return Err(ContractError::config_validation(
            "sink.base_path",
            "file sink requires a base_path",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn minimal_config() -> RouterConfig {
        RouterConfig::named("my.company")
    }

    fn field_of(err: ContractError) -> String {
        match err {
            ContractError::ConfigValidation { field, .. } => field,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&minimal_config()).is_ok());
    }

    #[test]
    fn test_empty_name() {
        let mut config = minimal_config();
        config.name = "  ".into();
        assert_eq!(field_of(validate(&config).unwrap_err()), "name");
    }

    #[test]
    fn test_name_with_separator() {
        let mut config = minimal_config();
        config.name = "../escape".into();
        assert_eq!(field_of(validate(&config).unwrap_err()), "name");
    }

    #[test]
    fn test_empty_selector() {
        let mut config = minimal_config();
        config.selector = String::new();
        assert_eq!(field_of(validate(&config).unwrap_err()), "selector");
    }

    #[test]
    fn test_empty_pattern() {
        let mut config = minimal_config();
        config.format.pattern = String::new();
        assert_eq!(field_of(validate(&config).unwrap_err()), "format.pattern");

        // JSON output ignores the pattern
        config.format.kind = FormatKind::Json;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_file_sink_needs_base_path() {
        let mut config = minimal_config();
        config.sink.base_path = PathBuf::new();
        assert_eq!(field_of(validate(&config).unwrap_err()), "sink.base_path");

        config.sink.sink_type = SinkType::Log;
        assert!(validate(&config).is_ok());
    }
}
