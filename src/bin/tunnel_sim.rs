//! 隧道仿真
//!
//! 客户端与网关之间双向注入合成 IP 流量，输出交付与信用统计

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ipoc_rs::demo::run_tunnel;
use ipoc_rs::ipoc::IpocConfig;
use ipoc_rs::sim::SimTime;

#[derive(Debug, Parser)]
#[command(name = "tunnel_sim", about = "IP-over-Interest/Data 隧道仿真：客户端 <-> 网关")]
struct Args {
    /// JSON 配置文件；缺省使用内置默认值
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    /// 仿真运行到多少毫秒
    #[arg(long, default_value_t = 1_000)]
    until_ms: u64,
    #[arg(long)]
    max_credit: Option<u32>,
    #[arg(long)]
    min_pending: Option<usize>,
    #[arg(long)]
    max_pending: Option<usize>,
    #[arg(long)]
    loss_rate: Option<f64>,
    /// 链路随机抖动上限（微秒）
    #[arg(long)]
    jitter_us: Option<u64>,
    #[arg(long)]
    upstream_pkts: Option<u64>,
    #[arg(long)]
    downstream_pkts: Option<u64>,
    /// 统计输出（JSON）
    #[arg(long)]
    stats_json: Option<PathBuf>,
}

impl Args {
    fn apply(&self, cfg: &mut IpocConfig) {
        if let Some(v) = self.seed {
            cfg.seed = v;
        }
        if let Some(v) = self.max_credit {
            cfg.client.max_credit = v;
        }
        if let Some(v) = self.min_pending {
            cfg.gateway.min_pending = v;
        }
        if let Some(v) = self.max_pending {
            cfg.gateway.max_pending = v;
        }
        if let Some(v) = self.loss_rate {
            cfg.link.loss_rate = v;
        }
        if let Some(v) = self.jitter_us {
            cfg.link.jitter_us = v;
        }
        if let Some(v) = self.upstream_pkts {
            cfg.traffic.upstream_pkts = v;
        }
        if let Some(v) = self.downstream_pkts {
            cfg.traffic.downstream_pkts = v;
        }
    }
}

fn main() -> ExitCode {
    // 初始化 tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => match IpocConfig::from_json_file(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                eprintln!("error: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => IpocConfig::default(),
    };
    args.apply(&mut cfg);

    let report = match run_tunnel(&cfg, SimTime::from_millis(args.until_ms)) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    println!(
        "done @ {}ms, upstream={}/{}, downstream={}/{}, interests={}, data={}, credit={}",
        report.now_ms,
        report.upstream.delivered,
        report.upstream.injected,
        report.downstream.delivered,
        report.downstream.injected,
        report.client.interests_sent(),
        report.gateway.data_sent(),
        report.credit,
    );

    if let Some(path) = &args.stats_json {
        let json = match serde_json::to_string_pretty(&report) {
            Ok(json) => json,
            Err(err) => {
                eprintln!("error: failed to serialize stats: {err}");
                return ExitCode::FAILURE;
            }
        };
        if let Err(err) = std::fs::write(path, json) {
            eprintln!("error: failed to write {}: {err}", path.display());
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
