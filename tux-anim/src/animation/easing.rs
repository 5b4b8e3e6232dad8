//! # Easing 模块
//!
//! 缓动函数库，用于动画的时间插值。
//!
//! 公式采用 Penner 缓动方程，所有函数都是纯函数，
//! 输入为归一化进度 `p ∈ [0, 1]`。elastic / back 在区间内会短暂越界。

use std::f64::consts::PI;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AnimationError;

/// elastic 周期
const ELASTIC_PERIOD: f64 = 0.3;
/// back 超调量
const BACK_OVERSHOOT: f64 = 1.70158;

/// 缓动函数类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingFunction {
    /// 线性（匀速）
    #[default]
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    InQuart,
    OutQuart,
    InOutQuart,
    InQuint,
    OutQuint,
    InOutQuint,
    InSine,
    OutSine,
    InOutSine,
    InExpo,
    OutExpo,
    InOutExpo,
    InCirc,
    OutCirc,
    InOutCirc,
    InElastic,
    OutElastic,
    InOutElastic,
    InBack,
    OutBack,
    InOutBack,
    InBounce,
    OutBounce,
    InOutBounce,
}

impl EasingFunction {
    /// 目录中的全部缓动函数
    pub const ALL: [EasingFunction; 31] = [
        Self::Linear,
        Self::InQuad,
        Self::OutQuad,
        Self::InOutQuad,
        Self::InCubic,
        Self::OutCubic,
        Self::InOutCubic,
        Self::InQuart,
        Self::OutQuart,
        Self::InOutQuart,
        Self::InQuint,
        Self::OutQuint,
        Self::InOutQuint,
        Self::InSine,
        Self::OutSine,
        Self::InOutSine,
        Self::InExpo,
        Self::OutExpo,
        Self::InOutExpo,
        Self::InCirc,
        Self::OutCirc,
        Self::InOutCirc,
        Self::InElastic,
        Self::OutElastic,
        Self::InOutElastic,
        Self::InBack,
        Self::OutBack,
        Self::InOutBack,
        Self::InBounce,
        Self::OutBounce,
        Self::InOutBounce,
    ];

    /// 计算缓动值
    ///
    /// # 参数
    /// - `p`: 时间进度 (0.0 - 1.0)
    ///
    /// # 返回
    /// - 缓动后的进度值
    pub fn apply(&self, p: f64) -> f64 {
        match self {
            Self::Linear => p,
            Self::InQuad => p * p,
            Self::OutQuad => -1.0 * p * (p - 2.0),
            Self::InOutQuad => {
                let p = p * 2.0;
                if p < 1.0 {
                    return 0.5 * p * p;
                }
                let p = p - 1.0;
                -0.5 * (p * (p - 2.0) - 1.0)
            }
            Self::InCubic => p * p * p,
            Self::OutCubic => {
                let p = p - 1.0;
                p * p * p + 1.0
            }
            Self::InOutCubic => {
                let p = p * 2.0;
                if p < 1.0 {
                    return 0.5 * p * p * p;
                }
                let p = p - 2.0;
                0.5 * (p * p * p + 2.0)
            }
            Self::InQuart => p * p * p * p,
            Self::OutQuart => {
                let p = p - 1.0;
                -1.0 * (p * p * p * p - 1.0)
            }
            Self::InOutQuart => {
                let p = p * 2.0;
                if p < 1.0 {
                    return 0.5 * p * p * p * p;
                }
                let p = p - 2.0;
                -0.5 * (p * p * p * p - 2.0)
            }
            Self::InQuint => p * p * p * p * p,
            Self::OutQuint => {
                let p = p - 1.0;
                p * p * p * p * p + 1.0
            }
            Self::InOutQuint => {
                let p = p * 2.0;
                if p < 1.0 {
                    return 0.5 * p * p * p * p * p;
                }
                let p = p - 2.0;
                0.5 * (p * p * p * p * p + 2.0)
            }
            Self::InSine => -1.0 * (p * (PI / 2.0)).cos() + 1.0,
            Self::OutSine => (p * (PI / 2.0)).sin(),
            Self::InOutSine => -0.5 * ((PI * p).cos() - 1.0),
            Self::InExpo => {
                if p == 0.0 {
                    return 0.0;
                }
                2f64.powf(10.0 * (p - 1.0))
            }
            Self::OutExpo => {
                if p == 1.0 {
                    return 1.0;
                }
                -(2f64.powf(-10.0 * p)) + 1.0
            }
            Self::InOutExpo => {
                if p == 0.0 {
                    return 0.0;
                }
                if p == 1.0 {
                    return 1.0;
                }
                let p = p * 2.0;
                if p < 1.0 {
                    return 0.5 * 2f64.powf(10.0 * (p - 1.0));
                }
                let p = p - 1.0;
                0.5 * (-(2f64.powf(-10.0 * p)) + 2.0)
            }
            Self::InCirc => -1.0 * ((1.0 - p * p).sqrt() - 1.0),
            Self::OutCirc => {
                let p = p - 1.0;
                (1.0 - p * p).sqrt()
            }
            Self::InOutCirc => {
                let p = p * 2.0;
                if p < 1.0 {
                    return -0.5 * ((1.0 - p * p).sqrt() - 1.0);
                }
                let p = p - 2.0;
                0.5 * ((1.0 - p * p).sqrt() + 1.0)
            }
            Self::InElastic => in_elastic(p),
            Self::OutElastic => out_elastic(p),
            Self::InOutElastic => in_out_elastic(p),
            Self::InBack => p * p * ((BACK_OVERSHOOT + 1.0) * p - BACK_OVERSHOOT),
            Self::OutBack => {
                let p = p - 1.0;
                p * p * ((BACK_OVERSHOOT + 1.0) * p + BACK_OVERSHOOT) + 1.0
            }
            Self::InOutBack => {
                let p = p * 2.0;
                let s = BACK_OVERSHOOT * 1.525;
                if p < 1.0 {
                    return 0.5 * (p * p * ((s + 1.0) * p - s));
                }
                let p = p - 2.0;
                0.5 * (p * p * ((s + 1.0) * p + s) + 2.0)
            }
            Self::InBounce => in_bounce(p),
            Self::OutBounce => out_bounce(p),
            Self::InOutBounce => {
                let p = p * 2.0;
                if p < 1.0 {
                    return in_bounce(p) * 0.5;
                }
                out_bounce(p - 1.0) * 0.5 + 0.5
            }
        }
    }

    /// 目录中的名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::InQuad => "in_quad",
            Self::OutQuad => "out_quad",
            Self::InOutQuad => "in_out_quad",
            Self::InCubic => "in_cubic",
            Self::OutCubic => "out_cubic",
            Self::InOutCubic => "in_out_cubic",
            Self::InQuart => "in_quart",
            Self::OutQuart => "out_quart",
            Self::InOutQuart => "in_out_quart",
            Self::InQuint => "in_quint",
            Self::OutQuint => "out_quint",
            Self::InOutQuint => "in_out_quint",
            Self::InSine => "in_sine",
            Self::OutSine => "out_sine",
            Self::InOutSine => "in_out_sine",
            Self::InExpo => "in_expo",
            Self::OutExpo => "out_expo",
            Self::InOutExpo => "in_out_expo",
            Self::InCirc => "in_circ",
            Self::OutCirc => "out_circ",
            Self::InOutCirc => "in_out_circ",
            Self::InElastic => "in_elastic",
            Self::OutElastic => "out_elastic",
            Self::InOutElastic => "in_out_elastic",
            Self::InBack => "in_back",
            Self::OutBack => "out_back",
            Self::InOutBack => "in_out_back",
            Self::InBounce => "in_bounce",
            Self::OutBounce => "out_bounce",
            Self::InOutBounce => "in_out_bounce",
        }
    }

    /// 按名称查找
    pub fn from_name(name: &str) -> Result<Self, AnimationError> {
        Self::ALL
            .into_iter()
            .find(|easing| easing.name() == name)
            .ok_or_else(|| AnimationError::UnknownEasing {
                name: name.to_string(),
            })
    }
}

impl fmt::Display for EasingFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EasingFunction {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

fn in_elastic(p: f64) -> f64 {
    let s = ELASTIC_PERIOD / 4.0;
    if p == 1.0 {
        return 1.0;
    }
    let q = p - 1.0;
    -(2f64.powf(10.0 * q) * ((q - s) * (2.0 * PI) / ELASTIC_PERIOD).sin())
}

fn out_elastic(p: f64) -> f64 {
    let s = ELASTIC_PERIOD / 4.0;
    if p == 1.0 {
        return 1.0;
    }
    2f64.powf(-10.0 * p) * ((p - s) * (2.0 * PI) / ELASTIC_PERIOD).sin() + 1.0
}

fn in_out_elastic(p: f64) -> f64 {
    let period = ELASTIC_PERIOD * 1.5;
    let s = period / 4.0;
    let q = p * 2.0;
    if q == 2.0 {
        return 1.0;
    }
    if q < 1.0 {
        let q = q - 1.0;
        return -0.5 * (2f64.powf(10.0 * q) * ((q - s) * (2.0 * PI) / period).sin());
    }
    let q = q - 1.0;
    2f64.powf(-10.0 * q) * ((q - s) * (2.0 * PI) / period).sin() * 0.5 + 1.0
}

/// 弹跳缓出，按 4 段分段
fn out_bounce(p: f64) -> f64 {
    const N: f64 = 7.5625;
    const D: f64 = 2.75;

    if p < 1.0 / D {
        N * p * p
    } else if p < 2.0 / D {
        let p = p - 1.5 / D;
        N * p * p + 0.75
    } else if p < 2.5 / D {
        let p = p - 2.25 / D;
        N * p * p + 0.9375
    } else {
        let p = p - 2.625 / D;
        N * p * p + 0.984375
    }
}

fn in_bounce(p: f64) -> f64 {
    1.0 - out_bounce(1.0 - p)
}

/// 动画使用的插值曲线
///
/// 目录中的曲线或自定义函数。
#[derive(Clone)]
pub enum Transition {
    /// 目录曲线
    Curve(EasingFunction),
    /// 自定义曲线
    Custom(Rc<dyn Fn(f64) -> f64>),
}

impl Transition {
    /// 用自定义函数创建
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + 'static,
    {
        Self::Custom(Rc::new(f))
    }

    /// 按目录名称创建
    pub fn from_name(name: &str) -> Result<Self, AnimationError> {
        EasingFunction::from_name(name).map(Self::Curve)
    }

    /// 计算缓动值
    pub fn apply(&self, p: f64) -> f64 {
        match self {
            Self::Curve(easing) => easing.apply(p),
            Self::Custom(f) => f(p),
        }
    }
}

impl Default for Transition {
    fn default() -> Self {
        Self::Curve(EasingFunction::default())
    }
}

impl From<EasingFunction> for Transition {
    fn from(easing: EasingFunction) -> Self {
        Self::Curve(easing)
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Curve(easing) => write!(f, "Transition::Curve({})", easing),
            Self::Custom(_) => f.write_str("Transition::Custom(..)"),
        }
    }
}
