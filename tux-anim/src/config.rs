//! # Config 模块
//!
//! 动画默认参数。
//!
//! ## 配置优先级
//!
//! 1. 构建器上显式设置的值（最高）
//! 2. 配置文件 (animation.json)
//! 3. 默认值（最低）

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::animation::EasingFunction;
use crate::error::ConfigError;

/// 动画默认参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// 默认时长
    #[serde(default = "default_duration")]
    pub default_duration: f64,

    /// 默认缓动曲线
    #[serde(default)]
    pub default_transition: EasingFunction,

    /// 写入前是否取整
    ///
    /// 目标为矩形时无论此项如何都会取整。
    #[serde(default)]
    pub round_values: bool,
}

fn default_duration() -> f64 {
    1000.0
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            default_duration: default_duration(),
            default_transition: EasingFunction::default(),
            round_values: false,
        }
    }
}

impl AnimationConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = ?path, "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    info!(path = ?path, "配置文件加载成功");
                    config
                }
                Err(e) => {
                    warn!(error = %e, "配置文件解析失败，使用默认配置");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(error = %e, "配置文件读取失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.default_duration.is_finite() || self.default_duration < 0.0 {
            return Err(ConfigError::ValidationFailed(format!(
                "默认时长必须是非负有限数: {}",
                self.default_duration
            )));
        }

        Ok(())
    }
}
