//! # Target 模块
//!
//! 动画目标抽象。
//!
//! 动画只通过 [`Animatable`] 读写命名的数值属性，不假设对象类型，
//! 并且只持有目标的弱引用，不延长目标的生命周期。

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

/// 可动画对象接口
///
/// 使用 `&self` 写入，对象自行通过 `Cell` / `RefCell` 实现内部可变性。
///
/// ## 实现示例
///
/// ```rust,ignore
/// struct Sprite {
///     alpha: Cell<f64>,
/// }
///
/// impl Animatable for Sprite {
///     fn get_property(&self, name: &str) -> Option<f64> {
///         match name {
///             "alpha" => Some(self.alpha.get()),
///             _ => None,
///         }
///     }
///
///     fn set_property(&self, name: &str, value: f64) -> bool {
///         match name {
///             "alpha" => { self.alpha.set(value); true }
///             _ => false,
///         }
///     }
/// }
/// ```
pub trait Animatable: 'static {
    /// 获取属性的当前值
    ///
    /// 属性不存在时返回 `None`。
    fn get_property(&self, name: &str) -> Option<f64>;

    /// 设置属性的新值
    ///
    /// 属性不存在或设置失败时返回 `false`。
    fn set_property(&self, name: &str, value: f64) -> bool;

    /// 是否只接受整数坐标（矩形类对象）
    ///
    /// 只要有一个目标返回 `true`，整个动画都会对写入值取整。
    fn integer_coordinates(&self) -> bool {
        false
    }
}

/// 动画持有的目标句柄（弱引用）
pub type TargetRef = Weak<dyn Animatable>;

/// 可以作为动画目标的值
pub trait IntoTarget {
    /// 转换为弱引用句柄
    fn into_target(self) -> TargetRef;
}

impl<T: Animatable> IntoTarget for &Rc<T> {
    fn into_target(self) -> TargetRef {
        let target: Weak<T> = Rc::downgrade(self);
        target
    }
}

impl IntoTarget for TargetRef {
    fn into_target(self) -> TargetRef {
        self
    }
}

/// 句柄是否指向给定对象
pub(crate) fn points_to<T: ?Sized>(target: &TargetRef, object: &Rc<T>) -> bool {
    std::ptr::addr_eq(target.as_ptr(), Rc::as_ptr(object))
}

/// 单个属性的访问方式
pub enum PropertyAccessor {
    /// 存储的字段
    Stored(Cell<f64>),
    /// 访问函数：getter 无参数调用，setter 以新值调用
    Function {
        get: Box<dyn Fn() -> f64>,
        set: Box<dyn Fn(f64)>,
    },
}

impl PropertyAccessor {
    /// 存储的字段
    pub fn stored(value: f64) -> Self {
        Self::Stored(Cell::new(value))
    }

    /// 访问函数
    pub fn function<G, S>(get: G, set: S) -> Self
    where
        G: Fn() -> f64 + 'static,
        S: Fn(f64) + 'static,
    {
        Self::Function {
            get: Box::new(get),
            set: Box::new(set),
        }
    }

    /// 与外部共享的值
    pub fn shared(value: Rc<Cell<f64>>) -> Self {
        let reader = value.clone();
        Self::function(move || reader.get(), move |v| value.set(v))
    }

    /// 获取当前值
    pub fn get(&self) -> f64 {
        match self {
            Self::Stored(cell) => cell.get(),
            Self::Function { get, .. } => get(),
        }
    }

    /// 设置新值
    pub fn set(&self, value: f64) {
        match self {
            Self::Stored(cell) => cell.set(value),
            Self::Function { set, .. } => set(value),
        }
    }
}

impl fmt::Debug for PropertyAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stored(cell) => f.debug_tuple("Stored").field(&cell.get()).finish(),
            Self::Function { .. } => f.write_str("Function(..)"),
        }
    }
}

/// 命名属性集合
///
/// 通用的可动画对象，每个属性可以是存储字段或访问函数。
#[derive(Debug, Default)]
pub struct PropertyBag {
    properties: BTreeMap<String, PropertyAccessor>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加存储字段
    pub fn with_value(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, PropertyAccessor::stored(value));
        self
    }

    /// 添加访问函数
    pub fn with_accessor<G, S>(mut self, name: impl Into<String>, get: G, set: S) -> Self
    where
        G: Fn() -> f64 + 'static,
        S: Fn(f64) + 'static,
    {
        self.insert(name, PropertyAccessor::function(get, set));
        self
    }

    /// 添加或替换属性
    pub fn insert(&mut self, name: impl Into<String>, accessor: PropertyAccessor) {
        self.properties.insert(name.into(), accessor);
    }

    /// 获取属性值
    pub fn value(&self, name: &str) -> Option<f64> {
        self.properties.get(name).map(PropertyAccessor::get)
    }

    /// 属性名列表
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }
}

impl Animatable for PropertyBag {
    fn get_property(&self, name: &str) -> Option<f64> {
        self.value(name)
    }

    fn set_property(&self, name: &str, value: f64) -> bool {
        match self.properties.get(name) {
            Some(accessor) => {
                accessor.set(value);
                true
            }
            None => false,
        }
    }
}

/// 整数矩形
///
/// 除 `x` / `y` / `width` / `height` 外，还支持派生属性
/// `left` / `top` / `right` / `bottom` / `centerx` / `centery` / `w` / `h`。
/// 写入派生的位置属性会移动矩形而不改变尺寸。
///
/// 写入值先取整到偶数，超出 `i32` 范围的值被截断到 `i32::MIN` / `i32::MAX`，
/// NaN 写为 0。
#[derive(Debug, Default)]
pub struct Rect {
    x: Cell<i32>,
    y: Cell<i32>,
    width: Cell<i32>,
    height: Cell<i32>,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x: Cell::new(x),
            y: Cell::new(y),
            width: Cell::new(width),
            height: Cell::new(height),
        }
    }

    pub fn x(&self) -> i32 {
        self.x.get()
    }

    pub fn y(&self) -> i32 {
        self.y.get()
    }

    pub fn width(&self) -> i32 {
        self.width.get()
    }

    pub fn height(&self) -> i32 {
        self.height.get()
    }

    pub fn right(&self) -> i32 {
        self.x() + self.width()
    }

    pub fn bottom(&self) -> i32 {
        self.y() + self.height()
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x() + self.width() / 2, self.y() + self.height() / 2)
    }
}

impl Animatable for Rect {
    fn get_property(&self, name: &str) -> Option<f64> {
        let value = match name {
            "x" | "left" => self.x(),
            "y" | "top" => self.y(),
            "width" | "w" => self.width(),
            "height" | "h" => self.height(),
            "right" => self.right(),
            "bottom" => self.bottom(),
            "centerx" => self.center().0,
            "centery" => self.center().1,
            _ => return None,
        };
        Some(f64::from(value))
    }

    fn set_property(&self, name: &str, value: f64) -> bool {
        let rounded = value.round_ties_even();
        if !(f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&rounded) {
            trace!(property = %name, value, "Rect 坐标超出 i32 范围，已截断");
        }
        let value = rounded as i32;
        match name {
            "x" | "left" => self.x.set(value),
            "y" | "top" => self.y.set(value),
            "width" | "w" => self.width.set(value),
            "height" | "h" => self.height.set(value),
            "right" => self.x.set(value - self.width()),
            "bottom" => self.y.set(value - self.height()),
            "centerx" => self.x.set(value - self.width() / 2),
            "centery" => self.y.set(value - self.height() / 2),
            _ => return false,
        }
        true
    }

    fn integer_coordinates(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_accessor() {
        let accessor = PropertyAccessor::stored(0.5);
        assert_eq!(accessor.get(), 0.5);
        accessor.set(0.8);
        assert_eq!(accessor.get(), 0.8);
    }

    #[test]
    fn test_shared_accessor() {
        let shared = Rc::new(Cell::new(1.0));
        let accessor = PropertyAccessor::shared(shared.clone());

        accessor.set(3.0);
        assert_eq!(shared.get(), 3.0);

        shared.set(4.0);
        assert_eq!(accessor.get(), 4.0);
    }

    #[test]
    fn test_property_bag() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let bag = PropertyBag::new()
            .with_value("alpha", 1.0)
            .with_accessor("volume", || 0.25, move |_| counter.set(counter.get() + 1));

        assert_eq!(bag.get_property("alpha"), Some(1.0));
        assert_eq!(bag.get_property("volume"), Some(0.25));
        assert_eq!(bag.get_property("unknown"), None);

        assert!(bag.set_property("alpha", 0.5));
        assert_eq!(bag.value("alpha"), Some(0.5));

        // setter 被以新值调用
        assert!(bag.set_property("volume", 0.9));
        assert_eq!(calls.get(), 1);

        assert!(!bag.set_property("unknown", 0.0));
        assert_eq!(bag.names().collect::<Vec<_>>(), vec!["alpha", "volume"]);
        assert!(!bag.integer_coordinates());
    }

    #[test]
    fn test_rect_properties() {
        let rect = Rect::new(10, 20, 30, 40);
        assert!(rect.integer_coordinates());
        assert_eq!(rect.get_property("left"), Some(10.0));
        assert_eq!(rect.get_property("right"), Some(40.0));
        assert_eq!(rect.get_property("bottom"), Some(60.0));
        assert_eq!(rect.get_property("centerx"), Some(25.0));
        assert_eq!(rect.get_property("centery"), Some(40.0));
        assert_eq!(rect.get_property("depth"), None);

        assert!(rect.set_property("right", 100.0));
        assert_eq!(rect.x(), 70);
        assert_eq!(rect.width(), 30);

        assert!(rect.set_property("centery", 0.0));
        assert_eq!(rect.y(), -20);

        assert!(!rect.set_property("depth", 1.0));
    }

    #[test]
    fn test_rect_rounds_half_to_even() {
        let rect = Rect::default();
        rect.set_property("x", 2.5);
        assert_eq!(rect.x(), 2);
        rect.set_property("x", 3.5);
        assert_eq!(rect.x(), 4);
        rect.set_property("x", 3.4);
        assert_eq!(rect.x(), 3);
    }

    #[test]
    fn test_rect_clamps_out_of_range() {
        let rect = Rect::default();
        assert!(rect.set_property("x", 1e12));
        assert_eq!(rect.x(), i32::MAX);
        assert!(rect.set_property("y", f64::NEG_INFINITY));
        assert_eq!(rect.y(), i32::MIN);
        assert!(rect.set_property("width", f64::NAN));
        assert_eq!(rect.width(), 0);
    }

    #[test]
    fn test_into_target_from_concrete_rc() {
        let bag = Rc::new(PropertyBag::new().with_value("x", 1.0));
        let target: TargetRef = (&bag).into_target();
        let upgraded = target.upgrade().unwrap();
        assert_eq!(upgraded.get_property("x"), Some(1.0));
        assert!(upgraded.set_property("x", 2.0));
        assert_eq!(bag.value("x"), Some(2.0));
    }

    #[test]
    fn test_into_target() {
        let rect = Rc::new(Rect::default());
        let other = Rc::new(Rect::default());

        let target = (&rect).into_target();
        assert!(points_to(&target, &rect));
        assert!(!points_to(&target, &other));
        assert!(target.upgrade().is_some());

        // 弱引用不延长生命周期
        drop(rect);
        assert!(target.upgrade().is_none());
    }
}
