//! # Animation 模块
//!
//! 属性插值动画。
//!
//! 核心设计：动画只关注数值属性的时间轴变化，不假设对象类型。
//! 目标在 `start` 时传入，初始值在延迟结束后才读取。
//!
//! ```rust,ignore
//! let mut ani = Animation::builder()
//!     .property("x", 100.0)
//!     .property("y", 100.0)
//!     .duration(1000.0)
//!     .build()?;
//! ani.start([&sprite])?;
//!
//! // 相对值：在当前位置基础上移动
//! let ani = Animation::builder()
//!     .property("x", 50.0)
//!     .relative(true)
//!     .start([&sprite])?;
//! ```

use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use super::easing::Transition;
use super::target::{Animatable, IntoTarget, TargetRef, points_to};
use crate::config::AnimationConfig;
use crate::error::AnimationError;
use crate::schedule::{AnimationState, Callback, CallbackRegistry, TriggerPoint};

/// 初始值覆盖
pub enum InitialValue {
    /// 固定值
    Fixed(f64),
    /// 每次解析时调用
    Computed(Box<dyn Fn() -> f64>),
}

impl InitialValue {
    fn resolve(&self) -> f64 {
        match self {
            Self::Fixed(value) => *value,
            Self::Computed(f) => f(),
        }
    }
}

impl std::fmt::Debug for InitialValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// 单个属性的起止值
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyBinding {
    pub initial: f64,
    pub final_value: f64,
}

impl PropertyBinding {
    /// 按缓动后的进度插值
    pub fn interpolate(&self, t: f64) -> f64 {
        self.initial * (1.0 - t) + self.final_value * t
    }
}

/// 单个目标的绑定
#[derive(Debug)]
struct TargetBinding {
    target: TargetRef,
    properties: Vec<(String, PropertyBinding)>,
}

/// 属性插值动画
///
/// 在 `duration` 内把一个或多个目标的命名属性从初始值插值到目标值。
#[derive(Debug)]
pub struct Animation {
    /// 属性名 -> 目标值
    props: BTreeMap<String, f64>,
    /// start 传入的目标
    targets: Vec<TargetRef>,
    /// 解析后的起止值
    bindings: Vec<TargetBinding>,
    delay: f64,
    duration: f64,
    elapsed: f64,
    transition: Transition,
    relative: bool,
    round_values: bool,
    initial: Option<InitialValue>,
    state: AnimationState,
    callbacks: CallbackRegistry,
}

impl Animation {
    /// 公开 `schedule` 允许的回调时机
    pub const VALID_TRIGGERS: &'static [TriggerPoint] = &[TriggerPoint::OnFinish];

    /// 创建构建器（使用默认配置）
    pub fn builder() -> AnimationBuilder {
        AnimationBuilder::new()
    }

    /// 注册结束回调
    ///
    /// 正常结束和中止都会触发，且最多触发一次。
    pub fn schedule<F>(&mut self, callback: F, when: Option<TriggerPoint>) -> Result<(), AnimationError>
    where
        F: FnMut() + 'static,
    {
        self.callbacks.schedule(callback, when)?;
        Ok(())
    }

    /// 注册每次更新后的回调
    pub fn on_update<F>(&mut self, callback: F)
    where
        F: FnMut() + 'static,
    {
        self.callbacks.push(TriggerPoint::OnUpdate, Box::new(callback));
    }

    /// 在目标上启动动画
    ///
    /// 没有延迟时立即读取初始值并执行一次 `update(0)`，
    /// 时长为 0 的动画会在这里直接完成。
    pub fn start<I>(&mut self, targets: I) -> Result<(), AnimationError>
    where
        I: IntoIterator,
        I::Item: IntoTarget,
    {
        if self.state != AnimationState::NotStarted {
            return Err(AnimationError::AlreadyStarted);
        }

        self.targets = targets.into_iter().map(IntoTarget::into_target).collect();

        // 解析失败时保持 NotStarted，可以修正目标后重新 start
        if self.delay == 0.0 {
            self.gather_initial_values()?;
        }

        self.state = AnimationState::Running;
        debug!(
            targets = self.targets.len(),
            delay = self.delay,
            duration = self.duration,
            "Animation 启动"
        );

        if self.delay == 0.0 {
            self.update(0.0)?;
        }
        Ok(())
    }

    /// 读取初始值并计算每个属性的起止值
    fn gather_initial_values(&mut self) -> Result<(), AnimationError> {
        let mut bindings = Vec::with_capacity(self.targets.len());
        let mut integer_target = false;

        for target_ref in &self.targets {
            let Some(target) = target_ref.upgrade() else {
                debug!("Animation 目标已释放，跳过");
                continue;
            };

            integer_target |= target.integer_coordinates();

            let mut properties = Vec::with_capacity(self.props.len());
            for (name, &value) in &self.props {
                let initial = match &self.initial {
                    Some(initial) => initial.resolve(),
                    None => match target.get_property(name) {
                        Some(current) => current,
                        None => {
                            warn!(property = %name, "Animation 目标没有该属性，跳过");
                            continue;
                        }
                    },
                };
                let initial = check_number(name, initial)?;
                let final_value = if self.relative { value + initial } else { value };
                let final_value = check_number(name, final_value)?;

                properties.push((
                    name.clone(),
                    PropertyBinding {
                        initial,
                        final_value,
                    },
                ));
            }

            if !properties.is_empty() {
                bindings.push(TargetBinding {
                    target: target_ref.clone(),
                    properties,
                });
            }
        }

        if integer_target {
            self.round_values = true;
        }
        self.bindings = bindings;

        for binding in &self.bindings {
            if let Some(target) = binding.target.upgrade() {
                for (name, prop) in &binding.properties {
                    self.set_value(target.as_ref(), name, prop.initial);
                }
            }
        }
        Ok(())
    }

    fn set_value(&self, target: &dyn Animatable, name: &str, value: f64) {
        let value = if self.round_values {
            value.round_ties_even()
        } else {
            value
        };
        if !target.set_property(name, value) {
            trace!(property = %name, "Animation 写入属性失败");
        }
    }

    /// 更新动画
    ///
    /// 已结束或未启动时忽略。延迟阶段的调用只推进时间，不修改目标。
    pub fn update(&mut self, dt: f64) -> Result<(), AnimationError> {
        if self.state != AnimationState::Running {
            return Ok(());
        }

        self.elapsed += dt;

        if self.delay > 0.0 {
            if self.elapsed >= self.delay {
                // 解析成功后才扣除延迟
                self.gather_initial_values()?;
                self.elapsed -= self.delay;
                self.delay = 0.0;
            }
            return Ok(());
        }

        let p = self.progress();
        let t = self.transition.apply(p);

        for binding in &self.bindings {
            let Some(target) = binding.target.upgrade() else {
                continue;
            };
            for (name, prop) in &binding.properties {
                self.set_value(target.as_ref(), name, prop.interpolate(t));
            }
        }

        self.callbacks.execute(TriggerPoint::OnUpdate);

        if p >= 1.0 {
            self.finish()?;
        }
        Ok(())
    }

    /// 线性进度（未应用缓动）
    ///
    /// 时长为 0 视为立即完成。
    pub fn progress(&self) -> f64 {
        if self.delay > 0.0 {
            return 0.0;
        }
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).min(1.0)
    }

    /// 立即完成：写入精确的目标值，然后执行结束流程
    ///
    /// 未启动或已结束时忽略。仍在延迟阶段时先读取初始值。
    pub fn finish(&mut self) -> Result<(), AnimationError> {
        if self.state != AnimationState::Running {
            debug!(state = ?self.state, "Animation 未在运行，忽略 finish");
            return Ok(());
        }

        if self.is_delayed() {
            self.gather_initial_values()?;
            self.delay = 0.0;
        }

        for binding in &self.bindings {
            let Some(target) = binding.target.upgrade() else {
                continue;
            };
            for (name, prop) in &binding.properties {
                self.set_value(target.as_ref(), name, prop.final_value);
            }
        }

        self.callbacks.execute(TriggerPoint::OnUpdate);
        self.abort();
        Ok(())
    }

    /// 中止：不再写入任何值，清理绑定并执行结束回调
    pub fn abort(&mut self) {
        if self.state == AnimationState::Finished {
            debug!("Animation 已结束，忽略 abort");
            return;
        }

        self.state = AnimationState::Finished;
        self.bindings.clear();
        self.callbacks.execute(TriggerPoint::OnFinish);
    }

    /// 是否在驱动给定对象
    pub fn targets_object<T: ?Sized>(&self, object: &Rc<T>) -> bool {
        self.targets.iter().any(|target| points_to(target, object))
    }

    /// 当前状态
    pub fn state(&self) -> AnimationState {
        self.state
    }

    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// 是否处于延迟阶段（已启动、尚未读取初始值）
    pub fn is_delayed(&self) -> bool {
        self.state == AnimationState::Running && self.delay > 0.0
    }

    /// 已经过的时间（延迟结束后从余量开始计）
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// 剩余延迟
    pub fn delay(&self) -> f64 {
        self.delay
    }

    pub fn is_relative(&self) -> bool {
        self.relative
    }

    /// 写入前是否取整
    pub fn rounds_values(&self) -> bool {
        self.round_values
    }

    /// 属性名 -> 目标值
    pub fn properties(&self) -> &BTreeMap<String, f64> {
        &self.props
    }

    /// 第 `target_index` 个目标上某个属性的起止值
    pub fn binding(&self, target_index: usize, name: &str) -> Option<PropertyBinding> {
        self.bindings
            .get(target_index)?
            .properties
            .iter()
            .find(|(prop, _)| prop == name)
            .map(|(_, binding)| *binding)
    }
}

fn check_number(name: &str, value: f64) -> Result<f64, AnimationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AnimationError::NotANumber {
            property: name.to_string(),
            value,
        })
    }
}

/// Animation 构建器
pub struct AnimationBuilder {
    props: BTreeMap<String, f64>,
    delay: f64,
    duration: f64,
    transition: Transition,
    transition_name: Option<String>,
    relative: bool,
    round_values: bool,
    initial: Option<InitialValue>,
    on_finish: Vec<Callback>,
    on_update: Vec<Callback>,
}

impl Default for AnimationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationBuilder {
    /// 使用默认配置创建
    pub fn new() -> Self {
        Self::with_config(&AnimationConfig::default())
    }

    /// 使用给定配置的默认值创建
    pub fn with_config(config: &AnimationConfig) -> Self {
        Self {
            props: BTreeMap::new(),
            delay: 0.0,
            duration: config.default_duration,
            transition: Transition::Curve(config.default_transition),
            transition_name: None,
            relative: false,
            round_values: config.round_values,
            initial: None,
            on_finish: Vec::new(),
            on_update: Vec::new(),
        }
    }

    /// 添加需要动画的属性及其目标值
    pub fn property(mut self, name: impl Into<String>, value: f64) -> Self {
        self.props.insert(name.into(), value);
        self
    }

    /// 延迟启动
    pub fn delay(mut self, delay: f64) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    /// 动画时长
    pub fn duration(mut self, duration: f64) -> Self {
        self.duration = duration.max(0.0);
        self
    }

    /// 设置插值曲线（目录曲线或自定义函数）
    pub fn transition(mut self, transition: impl Into<Transition>) -> Self {
        self.transition = transition.into();
        self.transition_name = None;
        self
    }

    /// 按目录名称设置插值曲线，名称在 `build` 时验证
    pub fn transition_name(mut self, name: impl Into<String>) -> Self {
        self.transition_name = Some(name.into());
        self
    }

    /// 目标值是否相对于初始值
    pub fn relative(mut self, relative: bool) -> Self {
        self.relative = relative;
        self
    }

    /// 写入前是否取整
    pub fn round_values(mut self, round_values: bool) -> Self {
        self.round_values = round_values;
        self
    }

    /// 固定的初始值（应用于所有属性）
    pub fn initial(mut self, initial: f64) -> Self {
        self.initial = Some(InitialValue::Fixed(initial));
        self
    }

    /// 计算得到的初始值（应用于所有属性）
    pub fn initial_with<F>(mut self, initial: F) -> Self
    where
        F: Fn() -> f64 + 'static,
    {
        self.initial = Some(InitialValue::Computed(Box::new(initial)));
        self
    }

    /// 结束回调
    pub fn on_finish<F>(mut self, callback: F) -> Self
    where
        F: FnMut() + 'static,
    {
        self.on_finish.push(Box::new(callback));
        self
    }

    /// 每次更新后的回调
    pub fn on_update<F>(mut self, callback: F) -> Self
    where
        F: FnMut() + 'static,
    {
        self.on_update.push(Box::new(callback));
        self
    }

    /// 验证参数并创建 Animation
    pub fn build(self) -> Result<Animation, AnimationError> {
        if self.props.is_empty() {
            return Err(AnimationError::EmptyAnimation);
        }
        for (name, &value) in &self.props {
            check_number(name, value)?;
        }

        let transition = match &self.transition_name {
            Some(name) => Transition::from_name(name)?,
            None => self.transition,
        };

        let mut callbacks = CallbackRegistry::new(Animation::VALID_TRIGGERS);
        for callback in self.on_finish {
            callbacks.push(TriggerPoint::OnFinish, callback);
        }
        for callback in self.on_update {
            callbacks.push(TriggerPoint::OnUpdate, callback);
        }

        Ok(Animation {
            props: self.props,
            targets: Vec::new(),
            bindings: Vec::new(),
            delay: self.delay,
            duration: self.duration,
            elapsed: 0.0,
            transition,
            relative: self.relative,
            round_values: self.round_values,
            initial: self.initial,
            state: AnimationState::NotStarted,
            callbacks,
        })
    }

    /// 创建并立即在目标上启动
    pub fn start<I>(self, targets: I) -> Result<Animation, AnimationError>
    where
        I: IntoIterator,
        I::Item: IntoTarget,
    {
        let mut animation = self.build()?;
        animation.start(targets)?;
        Ok(animation)
    }
}
