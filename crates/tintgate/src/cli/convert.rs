//! The `tintgate convert` and `tintgate convert-server` commands.
//!
//! `convert` hands an untrusted file to a disposable converter and keeps only
//! the validated RGBA it sends back. `convert-server` is that converter: it
//! reads one request on stdin and answers on stdout.

use clap::Args;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tintgate_core::{
    convert_through_async, serve_conversion_async, Bounds, Config, ConversionRequest, ImageCodec,
    PixelBuffer,
};
use tokio::io::BufReader;
use tokio::process::Command;
use tokio::time::Instant;

use super::types::StrategyArg;
use super::{expand, render_to, resolve_colour, resolve_strategy};

/// Arguments for the `convert` command.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Untrusted file to convert (an optional `format:` prefix names its format)
    pub file: PathBuf,

    /// Where to write the converted image
    #[arg(short, long)]
    pub output: PathBuf,

    /// Tint the result with a label name or hex colour
    #[arg(long, value_name = "COLOUR")]
    pub tint: Option<String>,

    /// Tint algorithm (defaults to `[tint] strategy`)
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Converter command, e.g. one that runs `tintgate convert-server` in a disposable sandbox
    #[arg(long, required = true, num_args = 1.., allow_hyphen_values = true, value_name = "CMD")]
    pub exec: Vec<String>,
}

/// Arguments for the `convert-server` command.
#[derive(Args, Debug, Default)]
pub struct ConvertServerArgs {
    /// Apply icon bounds to the decoded image
    #[arg(long)]
    pub icon: bool,
}

/// Execute the convert command.
pub async fn execute(args: ConvertArgs, config: &Config) -> anyhow::Result<()> {
    let request =
        ConversionRequest::from_path(&expand(&args.file), config.limits.max_input_bytes())?;
    tracing::info!(
        bytes = request.data().len(),
        format = request.format().unwrap_or("-"),
        "Converting {:?}",
        args.file
    );

    let image = convert_with(
        &args.exec,
        &request,
        config.limits.image.bounds(),
        config.producer_timeout(),
    )
    .await?;

    let image = if args.tint.is_some() || args.strategy.is_some() {
        let colour = resolve_colour(args.tint.as_deref(), config)?;
        resolve_strategy(args.strategy, config).apply(&image, colour)
    } else {
        image
    };
    render_to(image, &args.output).await
}

/// Run one conversion through a freshly spawned converter.
async fn convert_with(
    cmd: &[String],
    request: &ConversionRequest,
    bounds: Bounds,
    limit: Duration,
) -> anyhow::Result<PixelBuffer> {
    let Some((program, rest)) = cmd.split_first() else {
        anyhow::bail!("No converter command given");
    };
    let deadline = Instant::now() + limit;

    let mut child = Command::new(program)
        .args(rest)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;
    tracing::debug!(converter = %program, pid = ?child.id(), "Spawned converter");

    let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
        anyhow::bail!("Converter pipes were not captured");
    };
    let image =
        convert_through_async(request, stdin, BufReader::new(stdout), bounds, limit).await?;

    let status = tokio::time::timeout_at(deadline, child.wait())
        .await
        .map_err(|_| anyhow::anyhow!("Converter did not exit within {}ms", limit.as_millis()))??;
    if !status.success() {
        anyhow::bail!("Converter failed after sending an image ({status})");
    }
    Ok(image)
}

/// Execute the convert-server command.
pub async fn serve(args: ConvertServerArgs, config: &Config) -> anyhow::Result<()> {
    let bounds = if args.icon {
        config.limits.icon.bounds()
    } else {
        config.limits.image.bounds()
    };
    let stdin = std::io::BufReader::new(std::io::stdin());
    serve_conversion_async(
        stdin,
        tokio::io::stdout(),
        ImageCodec::with_bounds(bounds),
        bounds,
        config.limits.max_input_bytes(),
        config.decode_timeout(),
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tintgate_core::{ConversionError, ImportError};

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    fn request() -> ConversionRequest {
        ConversionRequest::new(Some("png".to_string()), b"not really a png".to_vec()).unwrap()
    }

    #[tokio::test]
    async fn converter_response_is_validated() {
        let cmd = sh(r"cat >/dev/null; printf '1 1\n\001\002\003\004'");
        let image = convert_with(&cmd, &request(), Bounds::ICON, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(image.data(), &[1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn hostile_converter_header_is_rejected() {
        let cmd = sh(r"cat >/dev/null; printf '99999 99999\n'");
        let err = convert_with(&cmd, &request(), Bounds::ICON, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConversionError>(),
            Some(ConversionError::Import(ImportError::FormatViolation { .. }))
        ));
    }

    #[tokio::test]
    async fn short_converter_response_is_rejected() {
        let cmd = sh(r"cat >/dev/null; printf '2 2\n\001\002'");
        let err = convert_with(&cmd, &request(), Bounds::ICON, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConversionError>(),
            Some(ConversionError::Import(ImportError::LengthViolation {
                actual: 2,
                expected: 16
            }))
        ));
    }
}
