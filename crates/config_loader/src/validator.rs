//! 配置校验模块
//!
//! 校验规则：
//! - 字段范围 (由 `validator` 派生规则检查)
//! - 主备端点名称不同
//! - 冷却时间 > 0
//! - stable_reset_ms 不小于最长冷却时间

use contracts::{ContractError, DispatcherBlueprint};
use ::validator::Validate;

/// 校验 DispatcherBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &DispatcherBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_endpoint_names(blueprint)?;
    validate_cooldowns(blueprint)?;
    validate_stable_reset(blueprint)?;
    Ok(())
}

/// 派生规则校验
fn validate_fields(blueprint: &DispatcherBlueprint) -> Result<(), ContractError> {
    blueprint
        .validate()
        .map_err(|e| ContractError::config_validation("blueprint", e.to_string()))
}

/// 校验端点名称唯一
fn validate_endpoint_names(blueprint: &DispatcherBlueprint) -> Result<(), ContractError> {
    if blueprint.primary.name == blueprint.secondary.name {
        return Err(ContractError::config_validation(
            "secondary.name",
            format!(
                "duplicate endpoint name '{}': primary and secondary must differ",
                blueprint.secondary.name
            ),
        ));
    }
    Ok(())
}

/// 校验冷却时间
fn validate_cooldowns(blueprint: &DispatcherBlueprint) -> Result<(), ContractError> {
    for (idx, cooldown) in blueprint.failover.cooldowns_ms.iter().enumerate() {
        if *cooldown == 0 {
            return Err(ContractError::config_validation(
                format!("failover.cooldowns_ms[{}]", idx),
                "cooldown must be > 0",
            ));
        }
    }
    Ok(())
}

/// 计数器重置窗口短于冷却时间时，每次切回后都会立即重置
fn validate_stable_reset(blueprint: &DispatcherBlueprint) -> Result<(), ContractError> {
    let failover = &blueprint.failover;
    let (Some(reset), Some(longest)) = (
        failover.stable_reset_ms,
        failover.cooldowns_ms.iter().max(),
    ) else {
        return Ok(());
    };

    if reset < *longest {
        return Err(ContractError::config_validation(
            "failover.stable_reset_ms",
            format!(
                "stable_reset_ms ({}) must be >= longest cooldown ({})",
                reset, longest
            ),
        ));
    }
    Ok(())
}
