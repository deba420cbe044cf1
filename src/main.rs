//! 把一个 TTML 歌词文件解析成 JSON 输出。
//!
//! ```text
//! ttml_lyrics <文件> [后备时长(毫秒)] [--config <选项.toml>]
//! ```
//!
//! 日志级别由 `RUST_LOG` 控制，默认为 `info`。

use std::{env, path::PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use ttml_lyrics::{LyricsParser, ParsingOptions, TtmlLyricsParser};

struct Args {
    input: PathBuf,
    fallback_duration_ms: u64,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut input = None;
    let mut fallback_duration_ms = None;
    let mut config = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            let path = args.next().context("--config 需要一个文件路径")?;
            config = Some(PathBuf::from(path));
        } else if input.is_none() {
            input = Some(PathBuf::from(arg));
        } else if fallback_duration_ms.is_none() {
            let millis = arg
                .parse()
                .with_context(|| format!("无效的后备时长: '{arg}'"))?;
            fallback_duration_ms = Some(millis);
        } else {
            bail!("多余的参数: '{arg}'");
        }
    }

    let Some(input) = input else {
        bail!("用法: ttml_lyrics <文件> [后备时长(毫秒)] [--config <选项.toml>]");
    };

    Ok(Args {
        input,
        fallback_duration_ms: fallback_duration_ms.unwrap_or(0),
        config,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = parse_args()?;

    let options = match &args.config {
        Some(path) => ParsingOptions::from_toml_file(path)
            .with_context(|| format!("无法加载配置文件 {}", path.display()))?,
        None => ParsingOptions::default(),
    };

    let parser = TtmlLyricsParser::new(options);
    if !parser.handles_path(&args.input) {
        info!("{} 的扩展名不是 .ttml，仍然尝试解析", args.input.display());
    }

    let lyrics = parser
        .parse_file(&args.input, args.fallback_duration_ms)
        .with_context(|| format!("无法解析 {}", args.input.display()))?;

    let Some(lyrics) = lyrics else {
        bail!("{} 中没有任何歌词行", args.input.display());
    };

    info!(
        "解析出 {} 行歌词，时长 {}ms",
        lyrics.lines.len(),
        lyrics.optimal_duration_millis()
    );
    println!("{}", serde_json::to_string_pretty(&lyrics)?);
    Ok(())
}
