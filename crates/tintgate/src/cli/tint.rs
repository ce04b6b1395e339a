//! The `tintgate tint` command: recolour a trusted local image.

use clap::Args;
use std::path::PathBuf;
use tintgate_core::{Config, Decode, ImageCodec};

use super::types::StrategyArg;
use super::{expand, render_to, resolve_colour, resolve_strategy};

/// Arguments for the `tint` command.
#[derive(Args, Debug)]
pub struct TintArgs {
    /// Source image (trusted)
    pub src: PathBuf,

    /// Destination (an optional `format:` prefix forces the encoding)
    pub dst: PathBuf,

    /// Label name or hex colour (defaults to `[tint] default_label`)
    #[arg(short, long, value_name = "COLOUR")]
    pub colour: Option<String>,

    /// Tint algorithm (defaults to `[tint] strategy`)
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,
}

/// Execute the tint command.
pub async fn execute(args: TintArgs, config: &Config) -> anyhow::Result<()> {
    let colour = resolve_colour(args.colour.as_deref(), config)?;
    let strategy = resolve_strategy(args.strategy, config);

    let src = expand(&args.src);
    let image = tokio::task::spawn_blocking(move || ImageCodec::new().decode(&src)).await??;
    tracing::info!(
        width = image.width(),
        height = image.height(),
        %colour,
        %strategy,
        "Tinting {:?}",
        args.src
    );

    let tinted = strategy.apply(&image, colour);
    render_to(tinted, &args.dst).await
}
