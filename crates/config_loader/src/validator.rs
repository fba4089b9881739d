//! 配置校验模块
//!
//! 校验规则：
//! - derive 规则 (id 非空, num_sensors >= 1, d_clock >= 1, max_drift_ratio ∈ (0, 1])
//! - 设备 id 全局唯一 (transmitter / receivers / standalone)
//! - 至少一个接收端，且每个接收端都有同步日志
//! - 独立设备不带同步日志
//! - sink 名称非空且唯一

use std::collections::HashSet;

use ::validator::{Validate, ValidationErrors, ValidationErrorsKind};
use contracts::{ContractError, SessionBlueprint};

/// 校验 SessionBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    validate_derived_rules(blueprint)?;
    validate_device_ids(blueprint)?;
    validate_receivers(blueprint)?;
    validate_standalone(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

/// 执行 `#[validate]` 标注的字段规则
fn validate_derived_rules(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    let Err(errors) = blueprint.validate() else {
        return Ok(());
    };

    let mut flat = Vec::new();
    flatten_errors("", &errors, &mut flat);
    flat.sort();

    let (field, message) = flat
        .into_iter()
        .next()
        .unwrap_or_else(|| (String::from("<root>"), errors.to_string()));
    Err(ContractError::config_validation(field, message))
}

/// 展开嵌套错误为 (路径, 消息)
fn flatten_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<(String, String)>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for err in list {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| err.code.to_string());
                    out.push((path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    flatten_errors(&format!("{path}[{idx}]"), inner, out);
                }
            }
        }
    }
}

/// 校验设备 id 唯一性 (全局)
fn validate_device_ids(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (id, role) in blueprint.devices() {
        if !seen.insert(id) {
            return Err(ContractError::config_validation(
                format!("devices[id={id}]"),
                format!("duplicate device_id ({role:?})"),
            ));
        }
    }
    Ok(())
}

/// 校验接收端
fn validate_receivers(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    if blueprint.receivers.is_empty() {
        return Err(ContractError::config_validation(
            "receivers",
            "at least one receiver is required",
        ));
    }
    for receiver in &blueprint.receivers {
        if receiver.sync_log.is_none() {
            return Err(ContractError::config_validation(
                format!("receivers[{}].sync_log", receiver.id),
                "receiver needs a sync log, list it under [[standalone]] otherwise",
            ));
        }
    }
    Ok(())
}

/// 校验独立设备
fn validate_standalone(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    for device in &blueprint.standalone {
        if device.sync_log.is_some() {
            return Err(ContractError::config_validation(
                format!("standalone[{}].sync_log", device.id),
                "standalone devices are never synchronized, list it under [[receivers]] instead",
            ));
        }
    }
    Ok(())
}

/// 校验 sink 配置
fn validate_sinks(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("sinks[{}].queue_capacity", sink.name),
                "queue_capacity must be > 0",
            ));
        }
    }
    Ok(())
}
