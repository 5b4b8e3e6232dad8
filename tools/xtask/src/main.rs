//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-core`: 运行 tux-anim 覆盖率
//! - `cov-workspace`: 运行 workspace 覆盖率
//! - `easing-audit`: 检查缓动曲线端点

use std::process::{Command, ExitCode};

use serde_json::json;
use tux_anim::EasingFunction;

/// 终点允许的误差
const DEFAULT_TOLERANCE: f64 = 1e-9;

/// 起点允许的误差
///
/// elastic 缓入的 Penner 公式在 p = 0 处约为 ±1e-3 量级，不是精确的 0。
const START_TOLERANCE: f64 = 1e-3;

fn run(step: &str, cmd: &mut Command) -> anyhow::Result<()> {
    eprintln!("\n==> {step}");
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("{step} failed with {status}");
    }
    Ok(())
}

fn ensure_cargo_llvm_cov_available() -> anyhow::Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.args(["llvm-cov", "--version"]);
    let status = cmd.status();
    match status {
        Ok(s) if s.success() => Ok(()),
        _ => anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        ),
    }
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());

    match sub.as_str() {
        "check-all" => {
            let mut fmt = Command::new("cargo");
            fmt.args(["fmt", "--all", "--", "--check"]);
            run("cargo fmt --all -- --check", &mut fmt)?;

            let mut clippy = Command::new("cargo");
            clippy.args(["clippy", "--workspace", "--all-targets"]);
            run("cargo clippy --workspace --all-targets", &mut clippy)?;

            let mut test = Command::new("cargo");
            test.args(["test", "--workspace"]);
            run("cargo test --workspace", &mut test)?;
        }
        "cov-core" => {
            ensure_cargo_llvm_cov_available()?;

            let mut cov = Command::new("cargo");
            cov.args(["llvm-cov", "-p", "tux-anim", "--all-features", "--html"]);
            run("cargo llvm-cov -p tux-anim --all-features --html", &mut cov)?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "cov-workspace" => {
            ensure_cargo_llvm_cov_available()?;

            // 排除工具 crate（xtask/host-cli），只观察趋势
            let mut cov = Command::new("cargo");
            cov.args([
                "llvm-cov",
                "--workspace",
                "--exclude",
                "xtask",
                "--exclude",
                "host-cli",
                "--all-features",
                "--html",
            ]);
            run(
                "cargo llvm-cov --workspace --exclude xtask --exclude host-cli --all-features --html",
                &mut cov,
            )?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "easing-audit" => {
            let tolerance = match args.next() {
                Some(t) => t
                    .parse::<f64>()
                    .map_err(|e| anyhow::anyhow!("无效的容差 '{t}': {e}"))?,
                None => DEFAULT_TOLERANCE,
            };
            let report = easing_audit(tolerance);
            println!("{}", serde_json::to_string_pretty(&report.to_json())?);
            report.check()?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       运行 fmt、clippy、test 门禁检查
  cov-core        运行 tux-anim 覆盖率报告
  cov-workspace   运行 workspace 覆盖率报告
  easing-audit    检查缓动曲线端点

EASING-AUDIT:
  cargo xtask easing-audit [tolerance]

  对每条曲线计算 f(0) 与 f(1)，以 JSON 输出偏差。
  终点偏差超过容差（默认 1e-9）或起点偏差超过 1e-3 时返回失败。

ALIASES (in .cargo/config.toml):
  cargo xtask         -> cargo run -p xtask --
  cargo check-all     -> cargo xtask check-all
  cargo cov-core      -> cargo xtask cov-core
  cargo cov-workspace -> cargo xtask cov-workspace
  cargo easing-audit  -> cargo xtask easing-audit
"#
    );
}

//=============================================================================
// easing-audit 命令实现
//=============================================================================

/// 单条曲线的端点偏差
struct EndpointDrift {
    name: &'static str,
    start: f64,
    end: f64,
}

impl EndpointDrift {
    fn measure(easing: EasingFunction) -> Self {
        Self {
            name: easing.name(),
            start: easing.apply(0.0).abs(),
            end: (easing.apply(1.0) - 1.0).abs(),
        }
    }

    fn exceeds(&self, end_tolerance: f64) -> bool {
        self.start > START_TOLERANCE || self.end > end_tolerance
    }
}

/// 曲线目录的端点检查结果
struct AuditReport {
    tolerance: f64,
    drifts: Vec<EndpointDrift>,
}

impl AuditReport {
    /// 超出容差的曲线
    fn failing(&self) -> Vec<&'static str> {
        self.drifts
            .iter()
            .filter(|d| d.exceeds(self.tolerance))
            .map(|d| d.name)
            .collect()
    }

    fn to_json(&self) -> serde_json::Value {
        json!({
            "tolerance": { "start": START_TOLERANCE, "end": self.tolerance },
            "curves": self
                .drifts
                .iter()
                .map(|d| json!({ "name": d.name, "start": d.start, "end": d.end }))
                .collect::<Vec<_>>(),
            "failing": self.failing(),
        })
    }

    fn check(&self) -> anyhow::Result<()> {
        let failing = self.failing();
        if failing.is_empty() {
            eprintln!("✅ {} 条曲线端点检查通过", self.drifts.len());
            Ok(())
        } else {
            anyhow::bail!("{} 条曲线端点超出容差: {}", failing.len(), failing.join(", "))
        }
    }
}

fn easing_audit(tolerance: f64) -> AuditReport {
    AuditReport {
        tolerance,
        drifts: EasingFunction::ALL
            .into_iter()
            .map(EndpointDrift::measure)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_passes_default_audit() {
        let report = easing_audit(DEFAULT_TOLERANCE);
        assert_eq!(report.drifts.len(), EasingFunction::ALL.len());
        assert!(report.failing().is_empty(), "{:?}", report.failing());
        assert!(report.check().is_ok());
    }

    #[test]
    fn test_elastic_start_is_not_exact() {
        let report = easing_audit(DEFAULT_TOLERANCE);
        let elastic = report
            .drifts
            .iter()
            .find(|d| d.name == "in_elastic")
            .unwrap();
        assert!(elastic.start > DEFAULT_TOLERANCE);
        assert!(elastic.start <= START_TOLERANCE);
    }

    #[test]
    fn test_negative_tolerance_fails() {
        let report = easing_audit(-1.0);
        assert_eq!(report.failing().len(), EasingFunction::ALL.len());
        assert!(report.check().is_err());
    }

    #[test]
    fn test_report_json_shape() {
        let value = easing_audit(DEFAULT_TOLERANCE).to_json();
        assert_eq!(value["curves"].as_array().map(Vec::len), Some(31));
        assert_eq!(value["tolerance"]["start"], json!(START_TOLERANCE));
        assert_eq!(value["failing"], json!([]));
    }
}
