//! Command implementations for the `tintgate` binary.

pub mod config;
pub mod convert;
pub mod import;
pub mod serve;
pub mod tint;
pub mod types;

use std::path::{Path, PathBuf};
use tintgate_core::{Color, Config, ImageCodec, PixelBuffer, Render, TintStrategy};

use types::StrategyArg;

/// Resolve a `--tint`/`--colour` argument (label name or hex), falling back
/// to `[tint] default_label`.
pub(crate) fn resolve_colour(arg: Option<&str>, config: &Config) -> anyhow::Result<Color> {
    let spec = arg.unwrap_or(&config.tint.default_label);
    Ok(Color::parse_tint(spec)?)
}

/// CLI strategy if given, else the configured one.
pub(crate) fn resolve_strategy(arg: Option<StrategyArg>, config: &Config) -> TintStrategy {
    arg.map(TintStrategy::from).unwrap_or(config.tint.strategy)
}

/// Encode `image` to `target` on the blocking pool.
pub(crate) async fn render_to(image: PixelBuffer, target: &Path) -> anyhow::Result<()> {
    let target = expand(target);
    let shown = target.clone();
    tokio::task::spawn_blocking(move || ImageCodec::new().render(&image, &target)).await??;
    tracing::info!("Image written to {:?}", shown);
    Ok(())
}

/// Tilde-expand a user path, keeping any `format:` prefix in front.
pub(crate) fn expand(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    match text.split_once(':') {
        Some((prefix, rest))
            if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            PathBuf::from(format!("{prefix}:{}", shellexpand::tilde(rest)))
        }
        _ => PathBuf::from(shellexpand::tilde(&text).into_owned()),
    }
}
