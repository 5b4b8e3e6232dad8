//! # Task 模块
//!
//! 延迟 / 循环回调调度。
//!
//! Task 不依赖任何时钟，时间完全由调用方通过 `update(dt)` 推进，
//! 单位由调用方自行约定（保持一致即可）。
//!
//! ```rust,ignore
//! // 1000 个时间单位后执行一次
//! let task = Task::new(call_later, 1000.0, 1)?;
//!
//! // 每 2500 执行一次，永不结束
//! let task = Task::new(tick, 2500.0, -1)?;
//!
//! // 结束后启动另一个 Task
//! let mut task = Task::new(fade_out, 500.0, 1)?;
//! task.chain(fade_in, 500.0, 1)?;
//! ```
//!
//! 链接的 Task 不要再单独加入容器，父 Task 正常结束时由容器接管。

use tracing::{debug, trace};

use crate::error::TaskError;
use crate::schedule::{AnimationState, Callback, CallbackRegistry, TriggerPoint};

/// 循环次数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCount {
    /// 剩余有限次数
    ///
    /// 构造时至少为 1；0 仅作为刚递减到终点的瞬时值出现。
    Finite(u64),
    /// 无限循环
    Infinite,
}

impl Default for LoopCount {
    fn default() -> Self {
        Self::Finite(1)
    }
}

impl LoopCount {
    /// 从次数参数转换：`-1` 表示无限，其余必须为正整数
    pub fn from_times(times: i64) -> Result<Self, TaskError> {
        match times {
            -1 => Ok(Self::Infinite),
            n if n >= 1 => Ok(Self::Finite(n as u64)),
            _ => Err(TaskError::InvalidLoopCount { times }),
        }
    }

    /// 是否无限循环
    pub fn is_infinite(&self) -> bool {
        matches!(self, Self::Infinite)
    }
}

/// 延迟 / 循环回调
///
/// 主回调注册在 [`TriggerPoint::OnInterval`]，
/// 额外回调可以注册在 `OnInterval`、`OnFinish`、`OnAbort`。
#[derive(Debug)]
pub struct Task {
    interval: f64,
    loops: LoopCount,
    /// 累计时间（越过边界后保留余量）
    elapsed: f64,
    state: AnimationState,
    /// 等待父 Task 结束的链接 Task
    chain: Vec<Task>,
    /// 父 Task 正常结束后释放、等待容器接管的 Task
    released: Vec<Task>,
    callbacks: CallbackRegistry,
}

impl Task {
    /// Task 允许的回调时机，第一个为默认时机
    pub const VALID_TRIGGERS: &'static [TriggerPoint] = &[
        TriggerPoint::OnInterval,
        TriggerPoint::OnFinish,
        TriggerPoint::OnAbort,
    ];

    /// 创建 Task
    ///
    /// # 参数
    /// - `callback`: 每个间隔执行的主回调
    /// - `interval`: 间隔时间，必须非负；为 0 时下一次 update 即触发
    /// - `times`: 间隔次数，`-1` 表示无限
    pub fn new<F>(callback: F, interval: f64, times: i64) -> Result<Self, TaskError>
    where
        F: FnMut() + 'static,
    {
        Self::builder()
            .callback(callback)
            .interval(interval)
            .times(times)
            .build()
    }

    /// 创建 Task 构建器
    pub fn builder() -> TaskBuilder {
        TaskBuilder::new()
    }

    /// 注册额外的回调
    ///
    /// `when` 为 `None` 时注册到 `OnInterval`。
    pub fn schedule<F>(&mut self, callback: F, when: Option<TriggerPoint>) -> Result<(), TaskError>
    where
        F: FnMut() + 'static,
    {
        self.callbacks.schedule(callback, when)?;
        Ok(())
    }

    /// 更新 Task
    ///
    /// 每次调用最多处理一个间隔边界，不会补偿因 `dt` 过大而错过的间隔。
    pub fn update(&mut self, dt: f64) -> Result<(), TaskError> {
        if self.state != AnimationState::Running {
            return Err(TaskError::InvalidState);
        }

        self.elapsed += dt;
        self.callbacks.execute(TriggerPoint::OnUpdate);

        if self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            match self.loops {
                LoopCount::Finite(remaining) => {
                    let remaining = remaining.saturating_sub(1);
                    self.loops = LoopCount::Finite(remaining);
                    if remaining == 0 {
                        self.finish();
                    } else {
                        trace!(remaining, carry = self.elapsed, "Task 间隔触发");
                        self.callbacks.execute(TriggerPoint::OnInterval);
                    }
                }
                LoopCount::Infinite => {
                    trace!(carry = self.elapsed, "Task 间隔触发（无限）");
                    self.callbacks.execute(TriggerPoint::OnInterval);
                }
            }
        }

        Ok(())
    }

    /// 强制结束，并执行最后一次间隔回调和结束回调
    ///
    /// 链接的 Task 被释放，由容器通过 [`Task::take_released_chain`] 接管。
    pub fn finish(&mut self) {
        if self.state != AnimationState::Running {
            debug!("Task 已结束，忽略 finish");
            return;
        }

        self.state = AnimationState::Finished;
        self.callbacks.execute(TriggerPoint::OnInterval);
        self.callbacks.execute(TriggerPoint::OnFinish);

        if !self.chain.is_empty() {
            debug!(chained = self.chain.len(), "Task 结束，释放链接 Task");
        }
        self.released.append(&mut self.chain);
    }

    /// 中止，只执行 `OnAbort` 回调，链接的 Task 被丢弃
    pub fn abort(&mut self) {
        if self.state == AnimationState::Finished {
            return;
        }

        self.state = AnimationState::Finished;
        self.callbacks.execute(TriggerPoint::OnAbort);

        if !self.chain.is_empty() {
            debug!(dropped = self.chain.len(), "Task 被中止，丢弃链接 Task");
        }
        self.chain.clear();
    }

    /// 保证距离下一次触发至少还有 `new_delay`
    ///
    /// 剩余时间已经更长时不做任何修改。
    pub fn reset_delay(&mut self, new_delay: f64) {
        let time_left = self.interval - self.elapsed;
        if new_delay > time_left {
            self.interval = new_delay;
            self.elapsed = 0.0;
        }
    }

    /// 创建一个新 Task，在本 Task 正常结束后启动
    ///
    /// 返回新 Task 的可变引用，便于继续注册回调。
    pub fn chain<F>(&mut self, callback: F, interval: f64, times: i64) -> Result<&mut Task, TaskError>
    where
        F: FnMut() + 'static,
    {
        self.ensure_chainable()?;
        let task = Task::new(callback, interval, times)?;
        let index = self.chain.len();
        self.chain.push(task);
        Ok(&mut self.chain[index])
    }

    /// 链接已有的 Task，在本 Task 正常结束后启动
    pub fn chain_task<I>(&mut self, tasks: I) -> Result<(), TaskError>
    where
        I: IntoIterator<Item = Task>,
    {
        self.ensure_chainable()?;
        self.chain.extend(tasks);
        Ok(())
    }

    fn ensure_chainable(&self) -> Result<(), TaskError> {
        if self.loops.is_infinite() {
            return Err(TaskError::ChainOnInfiniteTask);
        }
        Ok(())
    }

    /// 取出已释放的链接 Task
    pub fn take_released_chain(&mut self) -> Vec<Task> {
        std::mem::take(&mut self.released)
    }

    /// 当前状态
    pub fn state(&self) -> AnimationState {
        self.state
    }

    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// 当前间隔
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// 剩余循环次数
    pub fn loops(&self) -> LoopCount {
        self.loops
    }

    /// 当前累计时间
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// 等待中的链接 Task 数量
    pub fn chain_len(&self) -> usize {
        self.chain.len()
    }
}

/// Task 构建器
pub struct TaskBuilder {
    callback: Option<Callback>,
    interval: f64,
    times: i64,
    extra: Vec<(TriggerPoint, Callback)>,
}

impl Default for TaskBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskBuilder {
    /// 默认：间隔 0，执行 1 次
    pub fn new() -> Self {
        Self {
            callback: None,
            interval: 0.0,
            times: 1,
            extra: Vec::new(),
        }
    }

    /// 设置主回调
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: FnMut() + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// 设置间隔
    pub fn interval(mut self, interval: f64) -> Self {
        self.interval = interval;
        self
    }

    /// 设置次数（`-1` 表示无限）
    pub fn times(mut self, times: i64) -> Self {
        self.times = times;
        self
    }

    /// 无限循环
    pub fn forever(self) -> Self {
        self.times(-1)
    }

    /// 正常结束时的回调
    pub fn on_finish<F>(mut self, callback: F) -> Self
    where
        F: FnMut() + 'static,
    {
        self.extra.push((TriggerPoint::OnFinish, Box::new(callback)));
        self
    }

    /// 被中止时的回调
    pub fn on_abort<F>(mut self, callback: F) -> Self
    where
        F: FnMut() + 'static,
    {
        self.extra.push((TriggerPoint::OnAbort, Box::new(callback)));
        self
    }

    /// 验证参数并创建 Task
    pub fn build(self) -> Result<Task, TaskError> {
        let callback = self.callback.ok_or(TaskError::InvalidCallback)?;

        if !self.interval.is_finite() || self.interval < 0.0 {
            return Err(TaskError::InvalidInterval {
                interval: self.interval,
            });
        }

        let loops = LoopCount::from_times(self.times)?;

        let mut callbacks = CallbackRegistry::new(Task::VALID_TRIGGERS);
        callbacks.push(TriggerPoint::OnInterval, callback);
        for (when, callback) in self.extra {
            callbacks.push(when, callback);
        }

        Ok(Task {
            interval: self.interval,
            loops,
            elapsed: 0.0,
            state: AnimationState::Running,
            chain: Vec::new(),
            released: Vec::new(),
            callbacks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<&'static str>>>;

    fn recorder(log: &Log, label: &'static str) -> impl FnMut() + use<> {
        let log = log.clone();
        move || log.borrow_mut().push(label)
    }

    fn count(log: &Log, label: &str) -> usize {
        log.borrow().iter().filter(|&&l| l == label).count()
    }

    fn logged_task(log: &Log, interval: f64, times: i64) -> Task {
        let mut task = Task::new(recorder(log, "interval"), interval, times).unwrap();
        task.schedule(recorder(log, "finish"), Some(TriggerPoint::OnFinish))
            .unwrap();
        task.schedule(recorder(log, "abort"), Some(TriggerPoint::OnAbort))
            .unwrap();
        task
    }

    #[test]
    fn test_task_creation() {
        let task = Task::new(|| {}, 100.0, 2).unwrap();
        assert_eq!(task.state(), AnimationState::Running);
        assert_eq!(task.interval(), 100.0);
        assert_eq!(task.loops(), LoopCount::Finite(2));
        assert_eq!(task.elapsed(), 0.0);
    }

    #[test]
    fn test_builder_defaults() {
        let task = Task::builder().callback(|| {}).build().unwrap();
        assert_eq!(task.interval(), 0.0);
        assert_eq!(task.loops(), LoopCount::Finite(1));
    }

    #[test]
    fn test_missing_callback() {
        let err = Task::builder().interval(10.0).build().unwrap_err();
        assert_eq!(err, TaskError::InvalidCallback);
    }

    #[test]
    fn test_invalid_interval() {
        assert!(matches!(
            Task::new(|| {}, -1.0, 1),
            Err(TaskError::InvalidInterval { .. })
        ));
        assert!(matches!(
            Task::new(|| {}, f64::NAN, 1),
            Err(TaskError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn test_invalid_loop_count() {
        for times in [0, -2, -100] {
            assert_eq!(
                Task::new(|| {}, 1.0, times).unwrap_err(),
                TaskError::InvalidLoopCount { times }
            );
        }
        assert_eq!(LoopCount::from_times(-1), Ok(LoopCount::Infinite));
        assert_eq!(LoopCount::from_times(5), Ok(LoopCount::Finite(5)));
    }

    #[test]
    fn test_finite_loops_fire_n_times() {
        let log: Log = Rc::default();
        let mut task = logged_task(&log, 100.0, 4);

        for i in 0..4 {
            assert!(!task.is_finished(), "第 {} 次更新前不应结束", i + 1);
            task.update(100.0).unwrap();
        }

        assert!(task.is_finished());
        assert_eq!(count(&log, "interval"), 4);
        assert_eq!(count(&log, "finish"), 1);
        assert_eq!(log.borrow().last(), Some(&"finish"));
        assert_eq!(task.loops(), LoopCount::Finite(0));
    }

    #[test]
    fn test_carry_over_scenario() {
        let log: Log = Rc::default();
        let mut task = logged_task(&log, 1000.0, 3);

        // 400 * 3 = 1200：越过第一个边界，余 200
        for _ in 0..3 {
            task.update(400.0).unwrap();
        }
        assert_eq!(count(&log, "interval"), 1);
        assert_eq!(task.loops(), LoopCount::Finite(2));
        assert_eq!(task.elapsed(), 200.0);

        // 再越过两个边界：200 + 400 * 5 = 2200
        for _ in 0..5 {
            task.update(400.0).unwrap();
        }
        assert!(task.is_finished());
        assert_eq!(count(&log, "interval"), 3);
        assert_eq!(count(&log, "finish"), 1);
    }

    #[test]
    fn test_no_catch_up_for_large_dt() {
        let log: Log = Rc::default();
        let mut task = logged_task(&log, 100.0, 5);

        task.update(1000.0).unwrap();
        assert_eq!(count(&log, "interval"), 1);
        assert_eq!(task.loops(), LoopCount::Finite(4));
        assert_eq!(task.elapsed(), 900.0);
    }

    #[test]
    fn test_infinite_task_never_finishes() {
        let log: Log = Rc::default();
        let mut task = logged_task(&log, 10.0, -1);

        for _ in 0..1000 {
            task.update(10.0).unwrap();
        }
        assert_eq!(task.state(), AnimationState::Running);
        assert_eq!(count(&log, "interval"), 1000);
        assert_eq!(count(&log, "finish"), 0);
    }

    #[test]
    fn test_zero_interval_fires_next_update() {
        let log: Log = Rc::default();
        let mut task = logged_task(&log, 0.0, 1);
        task.update(0.0).unwrap();
        assert!(task.is_finished());
        assert_eq!(*log.borrow(), vec!["interval", "finish"]);
    }

    #[test]
    fn test_update_finished_task_fails() {
        let mut task = Task::new(|| {}, 10.0, 1).unwrap();
        task.update(10.0).unwrap();
        assert_eq!(task.update(1.0), Err(TaskError::InvalidState));
    }

    #[test]
    fn test_finish_fires_interval_then_finish() {
        let log: Log = Rc::default();
        let mut task = logged_task(&log, 1000.0, 3);

        task.finish();
        assert!(task.is_finished());
        assert_eq!(*log.borrow(), vec!["interval", "finish"]);

        // 再次 finish 是无害的
        task.finish();
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_abort_skips_interval_and_finish() {
        let log: Log = Rc::default();
        let mut task = logged_task(&log, 1000.0, 3);
        task.chain(|| {}, 10.0, 1).unwrap();

        task.abort();
        task.abort();
        assert!(task.is_finished());
        assert_eq!(*log.borrow(), vec!["abort"]);
        assert_eq!(task.chain_len(), 0);
        assert!(task.take_released_chain().is_empty());
    }

    #[test]
    fn test_abort_after_finish_is_noop() {
        let log: Log = Rc::default();
        let mut task = logged_task(&log, 10.0, 1);
        task.finish();
        task.abort();
        assert_eq!(count(&log, "abort"), 0);
    }

    #[test]
    fn test_chain_on_infinite_task() {
        let mut task = Task::new(|| {}, 10.0, -1).unwrap();
        assert!(matches!(
            task.chain(|| {}, 10.0, 1),
            Err(TaskError::ChainOnInfiniteTask)
        ));

        let other = Task::new(|| {}, 10.0, 1).unwrap();
        assert_eq!(
            task.chain_task([other]),
            Err(TaskError::ChainOnInfiniteTask)
        );
        assert_eq!(task.chain_len(), 0);
    }

    #[test]
    fn test_chain_released_on_finish() {
        let log: Log = Rc::default();
        let mut task = Task::new(|| {}, 10.0, 1).unwrap();
        task.chain(recorder(&log, "first"), 5.0, 1)
            .unwrap()
            .schedule(recorder(&log, "first done"), Some(TriggerPoint::OnFinish))
            .unwrap();
        task.chain_task([Task::new(recorder(&log, "second"), 5.0, 1).unwrap()])
            .unwrap();
        assert_eq!(task.chain_len(), 2);

        task.update(10.0).unwrap();
        assert!(task.is_finished());
        assert!(log.borrow().is_empty(), "链接的 Task 不应在父 Task 中执行");

        let mut released = task.take_released_chain();
        assert_eq!(released.len(), 2);
        assert_eq!(task.chain_len(), 0);

        for chained in &mut released {
            chained.update(5.0).unwrap();
        }
        assert_eq!(*log.borrow(), vec!["first", "first done", "second"]);
    }

    #[test]
    fn test_reset_delay() {
        let mut task = Task::new(|| {}, 100.0, 1).unwrap();
        task.update(40.0).unwrap();

        // 剩余 60 已经大于 50，不修改
        task.reset_delay(50.0);
        assert_eq!(task.interval(), 100.0);
        assert_eq!(task.elapsed(), 40.0);

        // 80 大于剩余的 60，重置
        task.reset_delay(80.0);
        assert_eq!(task.interval(), 80.0);
        assert_eq!(task.elapsed(), 0.0);
    }

    #[test]
    fn test_schedule_invalid_trigger() {
        let mut task = Task::new(|| {}, 10.0, 1).unwrap();
        let err = task
            .schedule(|| {}, Some(TriggerPoint::OnUpdate))
            .unwrap_err();
        assert!(matches!(err, TaskError::InvalidTrigger(_)));
    }

    #[test]
    fn test_schedule_default_is_interval() {
        let log: Log = Rc::default();
        let mut task = Task::new(recorder(&log, "primary"), 10.0, 2).unwrap();
        task.schedule(recorder(&log, "extra"), None).unwrap();

        task.update(10.0).unwrap();
        assert_eq!(*log.borrow(), vec!["primary", "extra"]);
    }

    #[test]
    fn test_builder_extra_callbacks() {
        let log: Log = Rc::default();
        let mut task = Task::builder()
            .callback(recorder(&log, "interval"))
            .interval(10.0)
            .on_finish(recorder(&log, "finish"))
            .on_abort(recorder(&log, "abort"))
            .build()
            .unwrap();

        task.update(10.0).unwrap();
        assert_eq!(*log.borrow(), vec!["interval", "finish"]);
    }
}
