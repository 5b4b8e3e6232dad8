//! # Host CLI
//!
//! 无界面宿主：不渲染，只按固定帧时长驱动 `tux-anim`。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p host-cli -- list
//! cargo run -p host-cli -- sample out_bounce --steps 20
//! cargo run -p host-cli -- sample in_out_back --steps 8 --json
//! cargo run -p host-cli -- demo --frame-time 16
//! cargo run -p host-cli -- -v demo --config animation.json
//! ```

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{Level, info};
use tux_anim::{
    Animation, AnimationBuilder, AnimationConfig, EasingFunction, PropertyBag, Rect,
    ScheduleGroup, TriggerPoint,
};

/// 演示最多运行的帧数
const MAX_DEMO_FRAMES: usize = 100_000;

#[derive(Parser)]
#[command(name = "tux-anim")]
#[command(about = "任务与属性动画调度核心的无界面宿主")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 输出 debug 级别日志
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 列出所有缓动曲线
    List,

    /// 采样一条缓动曲线
    Sample {
        /// 曲线名称（如 in_out_quad）
        name: String,

        /// 采样段数
        #[arg(short, long, default_value_t = 10)]
        steps: usize,

        /// 以 JSON 输出
        #[arg(long)]
        json: bool,
    },

    /// 运行演示时间轴
    Demo {
        /// 动画配置文件
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// 每帧的时长
        #[arg(short, long, default_value_t = 16.0)]
        frame_time: f64,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::List => {
            list_curves();
            Ok(())
        }
        Commands::Sample { name, steps, json } => sample_curve(&name, steps, json),
        Commands::Demo { config, frame_time } => run_demo(config, frame_time),
    };

    if let Err(e) = result {
        eprintln!("❌ {e:#}");
        std::process::exit(1);
    }
}

/// 列出曲线目录
fn list_curves() {
    for easing in EasingFunction::ALL {
        println!("{}", easing);
    }
}

/// 在 [0, 1] 上等距采样
fn sample_curve(name: &str, steps: usize, as_json: bool) -> anyhow::Result<()> {
    if steps == 0 {
        anyhow::bail!("采样段数必须大于 0");
    }
    let easing = EasingFunction::from_name(name)?;

    let samples: Vec<(f64, f64)> = (0..=steps)
        .map(|i| {
            let p = i as f64 / steps as f64;
            (p, easing.apply(p))
        })
        .collect();

    if as_json {
        let report = json!({
            "name": easing.name(),
            "samples": samples
                .iter()
                .map(|(p, value)| json!({ "p": p, "value": value }))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("📈 {}", easing);
        for (p, value) in samples {
            println!("  {:>6.3}  {:>10.6}", p, value);
        }
    }
    Ok(())
}

/// 演示：矩形延迟后相对滑动、精灵淡入、三次计时器及其后续任务
fn run_demo(config_path: Option<PathBuf>, frame_time: f64) -> anyhow::Result<()> {
    if !frame_time.is_finite() || frame_time <= 0.0 {
        anyhow::bail!("帧时长必须是正数: {}", frame_time);
    }

    let config = match config_path {
        Some(path) => AnimationConfig::load(path),
        None => AnimationConfig::default(),
    };
    config.validate().context("动画配置无效")?;
    info!(
        duration = config.default_duration,
        transition = %config.default_transition,
        "使用动画配置"
    );

    let clock = Rc::new(Cell::new(0.0_f64));
    let announce = |label: &'static str| {
        let clock = clock.clone();
        move || info!(time = clock.get(), "{}", label)
    };

    let rect = Rc::new(Rect::new(0, 0, 32, 32));
    let sprite = Rc::new(PropertyBag::new().with_value("alpha", 0.0));
    let mut group = ScheduleGroup::new();

    group.animate(
        AnimationBuilder::with_config(&config)
            .property("x", 64.0)
            .relative(true)
            .delay(250.0)
            .on_finish(announce("滑动结束")),
        [&rect],
    )?;

    group.animate(
        Animation::builder()
            .property("alpha", 1.0)
            .duration(config.default_duration / 2.0)
            .transition(EasingFunction::InOutSine)
            .on_finish(announce("淡入结束")),
        [&sprite],
    )?;

    let timer_id = group.task(announce("计时"), 300.0, 3)?;
    if let Some(timer) = group.task_mut(timer_id) {
        timer.schedule(announce("计时结束"), Some(TriggerPoint::OnFinish))?;
        timer.chain(announce("后续任务"), 100.0, 1)?;
    }

    let mut frames = 0;
    while !group.is_empty() {
        if frames >= MAX_DEMO_FRAMES {
            anyhow::bail!("演示超过 {} 帧仍未结束", MAX_DEMO_FRAMES);
        }
        frames += 1;
        clock.set(clock.get() + frame_time);
        group.update(frame_time)?;
    }

    println!();
    println!("✅ 演示完成");
    println!("   帧数: {}", frames);
    println!("   时间: {:.1}", clock.get());
    println!(
        "   矩形: ({}, {}) {}x{}",
        rect.x(),
        rect.y(),
        rect.width(),
        rect.height()
    );
    println!("   透明度: {:.3}", sprite.value("alpha").unwrap_or_default());
    Ok(())
}
