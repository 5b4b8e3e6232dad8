//! # Animation 模块
//!
//! 属性插值动画与缓动曲线。
//!
//! ## 核心设计理念
//!
//! 动画只负责 **时间轴管理**：
//! - 知道某个属性从 A 到 B 需要在 duration 内变化
//! - 通过 [`Animatable`] 读写目标的命名属性
//! - **不持有目标**，目标释放后对应的写入被跳过
//!
//! ## 核心概念
//!
//! - `Animation`: 单个动画实例，可同时驱动多个目标的多个属性
//! - `AnimationBuilder`: 属性、时长、延迟、曲线等参数
//! - `EasingFunction`: 缓动曲线目录
//! - `Transition`: 目录曲线或自定义函数
//! - `PropertyBag` / `Rect`: 内置的可动画对象
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let rect = Rc::new(Rect::new(0, 0, 32, 32));
//!
//! let mut ani = Animation::builder()
//!     .property("x", 100.0)
//!     .duration(250.0)
//!     .transition(EasingFunction::OutQuad)
//!     .start([&rect])?;
//!
//! while !ani.is_finished() {
//!     ani.update(16.0)?;
//! }
//! ```

#[allow(clippy::module_inception)]
mod animation;
mod easing;
mod target;

// 核心类型
pub use animation::{Animation, AnimationBuilder, InitialValue, PropertyBinding};
pub use easing::{EasingFunction, Transition};

// 目标
pub use target::{Animatable, IntoTarget, PropertyAccessor, PropertyBag, Rect, TargetRef};
