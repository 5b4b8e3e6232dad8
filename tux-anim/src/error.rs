//! # Error 模块
//!
//! 定义 tux-anim 中使用的错误类型。
//!
//! 所有错误都是调用方的编程错误，在违规处立即返回，内部不会重试。
//! 对已结束实例重复调用 `abort()` / `finish()` 不属于错误。

use thiserror::Error;

use crate::schedule::TriggerPoint;

/// 回调时机错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("无效的回调时机 '{when}'，可选: {valid}")]
pub struct TriggerError {
    /// 请求的时机
    pub when: TriggerPoint,
    /// 当前类型允许的时机列表（用于提示）
    pub valid: String,
}

/// Task 错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskError {
    /// 未提供主回调
    #[error("Task 必须提供一个可调用的回调")]
    InvalidCallback,

    /// 间隔为负数或不是有限数
    #[error("无效的间隔 {interval}：必须为非负数")]
    InvalidInterval { interval: f64 },

    /// 循环次数为 0 或小于 -1
    #[error("无效的循环次数 {times}：-1 表示无限循环，否则必须为正整数")]
    InvalidLoopCount { times: i64 },

    /// 试图把 Task 链接到无限循环的 Task 上
    #[error("不能把 Task 链接到无限循环的 Task 上")]
    ChainOnInfiniteTask,

    /// 对已结束的 Task 调用 update
    #[error("无法更新已结束的 Task")]
    InvalidState,

    /// 回调时机无效
    #[error(transparent)]
    InvalidTrigger(#[from] TriggerError),
}

/// Animation 错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// 重复调用 start
    #[error("Animation 已经启动过")]
    AlreadyStarted,

    /// 没有任何需要动画的属性
    #[error("Animation 至少需要一个属性")]
    EmptyAnimation,

    /// 初始值或目标值不是有限数值
    #[error("属性 '{property}' 的值不是数字: {value}")]
    NotANumber { property: String, value: f64 },

    /// 缓动函数名不在目录中
    #[error("未知的缓动函数 '{name}'")]
    UnknownEasing { name: String },

    /// 回调时机无效
    #[error(transparent)]
    InvalidTrigger(#[from] TriggerError),
}

/// tux-anim 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// Task 错误
    #[error("Task 错误: {0}")]
    Task(#[from] TaskError),

    /// Animation 错误
    #[error("Animation 错误: {0}")]
    Animation(#[from] AnimationError),
}

/// Result 类型别名
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),

    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    IoError(String),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}
