//! # Schedule 模块
//!
//! Task 和 Animation 共用的回调注册与执行机制。
//!
//! 每种类型声明自己允许的回调时机（[`TriggerPoint`]），
//! 回调按注册顺序执行，注册后不可单独移除。

use std::collections::HashMap;
use std::fmt;

use crate::error::TriggerError;

/// 回调时机
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerPoint {
    /// 每次更新
    OnUpdate,
    /// 正常结束
    OnFinish,
    /// 被中止
    OnAbort,
    /// 每个间隔（仅 Task）
    OnInterval,
}

impl TriggerPoint {
    /// 获取时机的描述字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnUpdate => "on update",
            Self::OnFinish => "on finish",
            Self::OnAbort => "on abort",
            Self::OnInterval => "on interval",
        }
    }
}

impl fmt::Display for TriggerPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 生命周期状态
///
/// Task 只会处于 `Running` / `Finished`。
/// Animation 的延迟阶段表示为 `Running` 且尚未解析初始值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationState {
    /// 尚未启动
    #[default]
    NotStarted,
    /// 运行中
    Running,
    /// 已结束（正常结束或被中止）
    Finished,
}

impl AnimationState {
    /// 是否为活跃状态（需要更新）
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

/// 回调函数
///
/// 需要绑定参数时由闭包捕获。
pub type Callback = Box<dyn FnMut()>;

/// 回调注册表
pub struct CallbackRegistry {
    /// 允许的回调时机，第一个为默认时机
    valid: &'static [TriggerPoint],
    callbacks: HashMap<TriggerPoint, Vec<Callback>>,
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<_> = self
            .callbacks
            .iter()
            .map(|(when, list)| (when.as_str(), list.len()))
            .collect();
        counts.sort();
        f.debug_struct("CallbackRegistry")
            .field("valid", &self.valid)
            .field("callbacks", &counts)
            .finish()
    }
}

impl CallbackRegistry {
    /// 创建空的注册表
    ///
    /// `valid` 不能为空。
    pub fn new(valid: &'static [TriggerPoint]) -> Self {
        debug_assert!(!valid.is_empty());
        Self {
            valid,
            callbacks: HashMap::new(),
        }
    }

    /// 允许的回调时机
    pub fn valid_triggers(&self) -> &'static [TriggerPoint] {
        self.valid
    }

    /// 注册回调
    ///
    /// `when` 为 `None` 时使用第一个允许的时机。
    pub fn schedule<F>(&mut self, callback: F, when: Option<TriggerPoint>) -> Result<(), TriggerError>
    where
        F: FnMut() + 'static,
    {
        let when = when.unwrap_or(self.valid[0]);
        if !self.valid.contains(&when) {
            let valid = self
                .valid
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(TriggerError { when, valid });
        }
        self.push(when, Box::new(callback));
        Ok(())
    }

    /// 注册回调（不检查时机）
    ///
    /// 供内部回调槽使用，例如 Animation 的 update 回调。
    pub(crate) fn push(&mut self, when: TriggerPoint, callback: Callback) {
        self.callbacks.entry(when).or_default().push(callback);
    }

    /// 按注册顺序执行某个时机的所有回调
    ///
    /// 回调中的 panic 不会被捕获。
    pub fn execute(&mut self, when: TriggerPoint) {
        if let Some(list) = self.callbacks.get_mut(&when) {
            for callback in list.iter_mut() {
                callback();
            }
        }
    }

    /// 某个时机已注册的回调数量
    pub fn len(&self, when: TriggerPoint) -> usize {
        self.callbacks.get(&when).map_or(0, Vec::len)
    }

    /// 是否没有任何回调
    pub fn is_empty(&self) -> bool {
        self.callbacks.values().all(Vec::is_empty)
    }
}
