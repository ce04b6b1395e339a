//! The `tintgate import` command: accept a raw image from an untrusted producer.

use clap::Args;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tintgate_core::{AsyncStreamValidator, Bounds, Config, ImportReport, PixelBuffer, ReportWriter};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::time::Instant;

use super::types::StrategyArg;
use super::{render_to, resolve_colour, resolve_strategy};

/// Arguments for the `import` command.
#[derive(Args, Debug, Default)]
pub struct ImportArgs {
    /// Apply icon bounds instead of image bounds
    #[arg(long)]
    pub icon: bool,

    /// Name sent to the producer on its stdin (relative icon names become `xdgicon:NAME`)
    #[arg(long, requires = "exec")]
    pub source: Option<String>,

    /// Tint with a label name or hex colour
    #[arg(long, value_name = "COLOUR")]
    pub tint: Option<String>,

    /// Tint algorithm (defaults to `[tint] strategy`)
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Write the accepted image here (an optional `format:` prefix forces the encoding)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print an import report to stdout
    #[arg(long)]
    pub report: bool,

    /// Producer deadline in milliseconds (defaults to `[limits] producer_timeout_ms`)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Spawn this producer and read its stdout instead of our stdin
    #[arg(long, num_args = 1.., allow_hyphen_values = true, value_name = "CMD")]
    pub exec: Vec<String>,
}

/// Execute the import command.
pub async fn execute(args: ImportArgs, config: &Config) -> anyhow::Result<()> {
    let bounds = if args.icon {
        config.limits.icon.bounds()
    } else {
        config.limits.image.bounds()
    };
    let limit = args
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.producer_timeout());

    let image = if args.exec.is_empty() {
        let stdin = BufReader::new(tokio::io::stdin());
        AsyncStreamValidator::new(bounds)
            .parse_with_timeout(stdin, limit)
            .await?
    } else {
        let source = args
            .source
            .as_deref()
            .map(|name| source_line(name, args.icon));
        read_from_producer(&args.exec, source.as_deref(), bounds, limit).await?
    };

    let mut report = ImportReport::new(&image);
    let image = if args.tint.is_some() || args.strategy.is_some() {
        let colour = resolve_colour(args.tint.as_deref(), config)?;
        let strategy = resolve_strategy(args.strategy, config);
        tracing::debug!(%colour, %strategy, "Tinting accepted image");
        report.tint = Some(colour.to_string());
        report.strategy = Some(strategy.to_string());
        strategy.apply(&image, colour)
    } else {
        image
    };

    if let Some(output) = &args.output {
        render_to(image, output).await?;
    }

    if args.report {
        let stdout = std::io::stdout();
        let mut writer = ReportWriter::from_config(stdout.lock(), &config.output);
        writer.write(&report)?;
        writer.flush()?;
    }

    Ok(())
}

/// The line a producer reads to learn what to send.
fn source_line(name: &str, icon: bool) -> String {
    if icon && !Path::new(name).is_absolute() {
        format!("xdgicon:{name}")
    } else {
        name.to_string()
    }
}

/// Spawn `cmd`, optionally send it `source`, and validate what it prints.
///
/// The producer is killed if validation fails or the deadline passes, and a
/// producer that exits unsuccessfully after a well-formed image still fails
/// the import.
async fn read_from_producer(
    cmd: &[String],
    source: Option<&str>,
    bounds: Bounds,
    limit: Duration,
) -> anyhow::Result<PixelBuffer> {
    let Some((program, rest)) = cmd.split_first() else {
        anyhow::bail!("No producer command given");
    };
    let deadline = Instant::now() + limit;

    let mut child = Command::new(program)
        .args(rest)
        .stdin(if source.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;
    tracing::debug!(producer = %program, pid = ?child.id(), "Spawned producer");

    if let (Some(name), Some(mut stdin)) = (source, child.stdin.take()) {
        stdin.write_all(format!("{name}\n").as_bytes()).await?;
        stdin.shutdown().await?;
    }

    let Some(stdout) = child.stdout.take() else {
        anyhow::bail!("Producer stdout was not captured");
    };
    let image = AsyncStreamValidator::new(bounds)
        .parse_with_timeout(BufReader::new(stdout), limit)
        .await?;

    let status = tokio::time::timeout_at(deadline, child.wait())
        .await
        .map_err(|_| anyhow::anyhow!("Producer did not exit within {}ms", limit.as_millis()))??;
    if !status.success() {
        anyhow::bail!("Producer failed after sending an image ({status})");
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tintgate_core::ImportError;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[test]
    fn import_args_default() {
        let args = ImportArgs::default();
        assert!(!args.icon);
        assert!(!args.report);
        assert!(args.exec.is_empty());
        assert!(args.tint.is_none());
    }

    #[test]
    fn relative_icon_names_use_xdgicon() {
        assert_eq!(source_line("firefox", true), "xdgicon:firefox");
        assert_eq!(source_line("/usr/share/a.png", true), "/usr/share/a.png");
        assert_eq!(source_line("photo.png", false), "photo.png");
    }

    #[tokio::test]
    async fn producer_image_is_accepted() {
        let cmd = sh(r"printf '1 1\n\001\002\003\004'");
        let image = read_from_producer(&cmd, None, Bounds::ICON, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(image.data(), &[1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn producer_receives_source_line() {
        // Echo the requested name back as the payload of a 1x1 image.
        let cmd = sh(r#"read name; printf '1 1\n%s' "$name""#);
        let image = read_from_producer(&cmd, Some("abcd"), Bounds::ICON, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(image.data(), b"abcd");
    }

    #[tokio::test]
    async fn oversized_producer_is_rejected() {
        let cmd = sh(r"printf '600 1\n'; sleep 5");
        let err = read_from_producer(&cmd, None, Bounds::ICON, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ImportError>(),
            Some(ImportError::SizeViolation { width: 600, .. })
        ));
    }

    #[tokio::test]
    async fn failing_producer_is_rejected() {
        let cmd = sh(r"printf '1 1\n\001\002\003\004'; exit 3");
        let err = read_from_producer(&cmd, None, Bounds::ICON, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Producer failed"));
    }

    #[tokio::test]
    async fn stalled_producer_times_out() {
        let cmd = sh("sleep 5");
        let err = read_from_producer(&cmd, None, Bounds::ICON, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ImportError>(),
            Some(ImportError::Timeout { .. })
        ));
    }
}
