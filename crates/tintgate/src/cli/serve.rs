//! The `tintgate serve` command: producer side of an import.
//!
//! Decodes a local image and prints it in wire format on stdout. Without a
//! PATH argument the name is read as one line from stdin, which is how an
//! importing side asks for a specific file. Names of the form `xdgicon:NAME`
//! are looked up in the hicolor icon theme.

use clap::Args;
use std::io::{BufRead, Read};
use std::path::{Path, PathBuf};
use tintgate_core::wire::serve_image;
use tintgate_core::ImageCodec;

/// Longest name accepted on stdin.
const MAX_NAME_LEN: u64 = 4096;

/// Icon sizes searched, largest first.
const ICON_SIZES: [&str; 8] = [
    "512x512", "256x256", "128x128", "64x64", "48x48", "32x32", "24x24", "16x16",
];

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Image to send (read from stdin when omitted)
    pub path: Option<PathBuf>,
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs) -> anyhow::Result<()> {
    let name = match args.path {
        Some(path) => path.to_string_lossy().into_owned(),
        None => read_name(std::io::stdin().lock())?,
    };
    let path = resolve(&name, &icon_roots())?;
    tracing::debug!("Serving {:?}", path);

    tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        serve_image(&ImageCodec::new(), &path, stdout.lock())
    })
    .await??;
    Ok(())
}

fn read_name<R: BufRead>(reader: R) -> anyhow::Result<String> {
    let mut line = String::new();
    reader.take(MAX_NAME_LEN).read_line(&mut line)?;
    let name = line.strip_suffix('\n').unwrap_or(&line);
    if name.is_empty() {
        anyhow::bail!("No image name given on stdin");
    }
    Ok(name.to_string())
}

/// Map a requested name to a file.
fn resolve(name: &str, icon_roots: &[PathBuf]) -> anyhow::Result<PathBuf> {
    let Some(icon) = name.strip_prefix("xdgicon:") else {
        return Ok(super::expand(Path::new(name)));
    };
    if icon.is_empty() || icon.contains('/') || icon.starts_with('.') {
        anyhow::bail!("Invalid icon name {icon:?}");
    }
    icon_roots
        .iter()
        .flat_map(|root| {
            ICON_SIZES
                .iter()
                .map(move |size| root.join(size).join("apps").join(format!("{icon}.png")))
        })
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| anyhow::anyhow!("Icon {icon:?} not found in the hicolor theme"))
}

/// `icons/hicolor` under the user data dir and every `XDG_DATA_DIRS` entry.
fn icon_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(dirs) = directories::BaseDirs::new() {
        roots.push(dirs.data_dir().to_path_buf());
    }
    let system = std::env::var("XDG_DATA_DIRS")
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());
    roots.extend(system.split(':').filter(|d| !d.is_empty()).map(PathBuf::from));
    roots
        .into_iter()
        .map(|dir| dir.join("icons").join("hicolor"))
        .collect()
}
