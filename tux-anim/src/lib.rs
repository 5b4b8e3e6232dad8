//! # Tux Anim
//!
//! 帧驱动的任务与属性动画调度核心。
//!
//! ## 架构概述
//!
//! `tux-anim` 不依赖渲染、输入或真实时钟。宿主每帧传入经过的时间 `dt`，
//! 由 [`ScheduleGroup`] 驱动其中的 [`Task`] 和 [`Animation`]：
//!
//! ```text
//! Host                          ScheduleGroup
//!   │                              │
//!   │──── update(dt) ────────────►│ Task::update / Animation::update
//!   │                              │ 移除已结束的实例，接收链式任务
//!   │◄─── 回调 / 属性写入 ─────────│
//!   │                              │
//! ```
//!
//! ## 核心类型
//!
//! - [`Task`]：延迟 / 重复执行的回调，可链式衔接后续任务
//! - [`Animation`]：在时长内插值目标的数值属性
//! - [`EasingFunction`]：缓动曲线目录
//! - [`Animatable`]：可动画对象接口
//! - [`ScheduleGroup`]：持有并驱动实例的容器
//!
//! ## 使用示例
//!
//! ```ignore
//! use tux_anim::{Animation, EasingFunction, Rect, ScheduleGroup};
//!
//! let rect = Rc::new(Rect::new(0, 0, 32, 32));
//! let mut group = ScheduleGroup::new();
//!
//! group.animate(
//!     Animation::builder()
//!         .property("x", 64.0)
//!         .relative(true)
//!         .duration(300.0)
//!         .transition(EasingFunction::OutQuad),
//!     [&rect],
//! )?;
//! group.task(|| println!("到达"), 300.0, 1)?;
//!
//! loop {
//!     group.update(dt)?;
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`schedule`]：回调时机与注册表
//! - [`task`]：Task 定义
//! - [`animation`]：Animation、缓动曲线和目标
//! - [`group`]：容器
//! - [`config`]：动画默认参数
//! - [`error`]：错误类型定义

pub mod animation;
pub mod config;
pub mod error;
pub mod group;
pub mod schedule;
pub mod task;

// 重导出核心类型
pub use animation::{
    Animatable, Animation, AnimationBuilder, EasingFunction, InitialValue, IntoTarget,
    PropertyAccessor, PropertyBag, PropertyBinding, Rect, TargetRef, Transition,
};
pub use config::AnimationConfig;
pub use error::{
    AnimationError, ConfigError, ScheduleError, ScheduleResult, TaskError, TriggerError,
};
pub use group::{ScheduleGroup, ScheduleId, Scheduled};
pub use schedule::{AnimationState, Callback, CallbackRegistry, TriggerPoint};
pub use task::{LoopCount, Task, TaskBuilder};

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_public_api_accessible() {
        // 验证所有公共类型都可以正常使用
        let _task = Task::new(|| {}, 100.0, 1).unwrap();
        let _builder = Task::builder().callback(|| {}).forever();

        let rect = Rc::new(Rect::new(0, 0, 10, 10));
        let _animation = Animation::builder()
            .property("x", 1.0)
            .transition(EasingFunction::InOutBack)
            .start([&rect])
            .unwrap();

        let _group = ScheduleGroup::new();
        let _config = AnimationConfig::default();
        let _loops = LoopCount::Infinite;
        let _state = AnimationState::NotStarted;
    }
}
