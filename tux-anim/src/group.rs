//! # Group 模块
//!
//! 持有并驱动 Task / Animation 的容器。
//!
//! Task 和 Animation 不引用所属容器：它们只改变自己的状态，
//! 容器在每次驱动后移除已结束的实例，并接收 Task 结束时释放的链式任务。
//!
//! ```rust,ignore
//! let mut group = ScheduleGroup::new();
//! let id = group.task(|| println!("tick"), 500.0, 3)?;
//! group.task_mut(id).unwrap().chain(|| println!("done"), 0.0, 1)?;
//!
//! loop {
//!     group.update(dt)?;
//! }
//! ```

use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::animation::{Animation, AnimationBuilder, IntoTarget};
use crate::error::{AnimationError, ScheduleResult, TaskError};
use crate::task::Task;

/// 容器内实例的唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScheduleId(u64);

impl ScheduleId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScheduleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 容器内的实例
#[derive(Debug)]
pub enum Scheduled {
    Task(Task),
    Animation(Animation),
}

impl Scheduled {
    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        match self {
            Self::Task(task) => task.is_finished(),
            Self::Animation(animation) => animation.is_finished(),
        }
    }

    fn update(&mut self, dt: f64) -> ScheduleResult<()> {
        match self {
            Self::Task(task) => task.update(dt)?,
            Self::Animation(animation) => animation.update(dt)?,
        }
        Ok(())
    }

    fn finish(&mut self) -> ScheduleResult<()> {
        match self {
            Self::Task(task) => task.finish(),
            Self::Animation(animation) => animation.finish()?,
        }
        Ok(())
    }

    fn abort(&mut self) {
        match self {
            Self::Task(task) => task.abort(),
            Self::Animation(animation) => animation.abort(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Task(_) => "task",
            Self::Animation(_) => "animation",
        }
    }
}

impl From<Task> for Scheduled {
    fn from(task: Task) -> Self {
        Self::Task(task)
    }
}

impl From<Animation> for Scheduled {
    fn from(animation: Animation) -> Self {
        Self::Animation(animation)
    }
}

/// Task / Animation 容器
///
/// 按加入顺序驱动，已结束的实例在每次驱动后移除。
#[derive(Debug)]
pub struct ScheduleGroup {
    entries: Vec<(ScheduleId, Scheduled)>,
    next_id: u64,
}

impl Default for ScheduleGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleGroup {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    fn next_id(&mut self) -> ScheduleId {
        let id = ScheduleId::new(self.next_id);
        self.next_id += 1;
        id
    }

    // ========== 加入 ==========

    /// 加入实例
    ///
    /// 已结束的实例会被立即移除（已释放的链式任务仍会被接收）。
    pub fn add(&mut self, entry: impl Into<Scheduled>) -> ScheduleId {
        let entry = entry.into();
        let id = self.next_id();
        trace!(%id, kind = entry.kind(), "加入容器");
        let finished = entry.is_finished();
        self.entries.push((id, entry));
        if finished {
            self.sweep();
        }
        id
    }

    pub fn add_task(&mut self, task: Task) -> ScheduleId {
        self.add(task)
    }

    pub fn add_animation(&mut self, animation: Animation) -> ScheduleId {
        self.add(animation)
    }

    /// 创建 Task 并加入容器
    pub fn task<F>(&mut self, callback: F, interval: f64, times: i64) -> Result<ScheduleId, TaskError>
    where
        F: FnMut() + 'static,
    {
        let task = Task::new(callback, interval, times)?;
        Ok(self.add_task(task))
    }

    /// 在目标上启动动画并加入容器
    pub fn animate<I>(&mut self, builder: AnimationBuilder, targets: I) -> Result<ScheduleId, AnimationError>
    where
        I: IntoIterator,
        I::Item: IntoTarget,
    {
        let animation = builder.start(targets)?;
        Ok(self.add_animation(animation))
    }

    // ========== 驱动 ==========

    /// 驱动所有实例
    ///
    /// 只访问本次调用开始时已在容器内的实例，按加入顺序。
    /// 链式任务在本次驱动结束后才加入，下一次驱动才会被访问。
    /// 出错时仍会驱动其余实例并完成清理，之后返回第一个错误。
    pub fn update(&mut self, dt: f64) -> ScheduleResult<()> {
        let mut first_error = None;

        for (id, entry) in &mut self.entries {
            if entry.is_finished() {
                continue;
            }
            if let Err(e) = entry.update(dt) {
                warn!(%id, error = %e, "驱动失败");
                first_error.get_or_insert(e);
            }
        }

        self.sweep();

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// 接收释放的链式任务并移除已结束的实例
    fn sweep(&mut self) {
        let mut released = Vec::new();
        for (id, entry) in &mut self.entries {
            if let Scheduled::Task(task) = entry {
                let chain = task.take_released_chain();
                if !chain.is_empty() {
                    debug!(%id, count = chain.len(), "接收链式任务");
                    released.extend(chain);
                }
            }
        }

        self.entries.retain(|(id, entry)| {
            let finished = entry.is_finished();
            if finished {
                trace!(%id, kind = entry.kind(), "移出容器");
            }
            !finished
        });

        for task in released {
            self.add_task(task);
        }
    }

    // ========== 生命周期 ==========

    /// 立即完成某个实例
    ///
    /// 返回实例是否存在。
    pub fn finish(&mut self, id: ScheduleId) -> ScheduleResult<bool> {
        let Some(entry) = self.get_mut(id) else {
            return Ok(false);
        };
        let result = entry.finish();
        self.sweep();
        result.map(|_| true)
    }

    /// 中止某个实例
    ///
    /// 返回实例是否存在。
    pub fn abort(&mut self, id: ScheduleId) -> bool {
        let Some(entry) = self.get_mut(id) else {
            return false;
        };
        entry.abort();
        self.sweep();
        true
    }

    /// 中止所有实例
    pub fn abort_all(&mut self) {
        for (_, entry) in &mut self.entries {
            entry.abort();
        }
        self.sweep();
    }

    /// 移除驱动给定对象的所有动画
    ///
    /// 不执行任何回调。返回移除的数量。
    pub fn remove_animations_of<T: ?Sized>(&mut self, object: &Rc<T>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(_, entry)| match entry {
            Scheduled::Animation(animation) => !animation.targets_object(object),
            Scheduled::Task(_) => true,
        });
        let removed = before - self.entries.len();
        if removed == 0 {
            debug!("没有驱动该对象的动画");
        }
        removed
    }

    // ========== 查询方法 ==========

    fn get_mut(&mut self, id: ScheduleId) -> Option<&mut Scheduled> {
        self.entries
            .iter_mut()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, entry)| entry)
    }

    pub fn get(&self, id: ScheduleId) -> Option<&Scheduled> {
        self.entries
            .iter()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, entry)| entry)
    }

    pub fn contains(&self, id: ScheduleId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn task_mut(&mut self, id: ScheduleId) -> Option<&mut Task> {
        match self.get_mut(id)? {
            Scheduled::Task(task) => Some(task),
            Scheduled::Animation(_) => None,
        }
    }

    pub fn animation_mut(&mut self, id: ScheduleId) -> Option<&mut Animation> {
        match self.get_mut(id)? {
            Scheduled::Animation(animation) => Some(animation),
            Scheduled::Task(_) => None,
        }
    }

    /// 按加入顺序的标识列表
    pub fn ids(&self) -> impl Iterator<Item = ScheduleId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }
}
