//! ImageMagick-backed media operations.
//!
//! Shells out to `identify` for metadata probes and `convert` for derived
//! images. ImageMagick must be on `PATH`; everything else in the pipeline
//! is tool-agnostic through the [`MediaBackend`] trait, so only this module
//! (and the `#[ignore]`d tests below) touch it.
//!
//! Derivations always pass `-auto-orient` so EXIF rotation is baked into
//! the output, and `-unsharp 0x.5` to compensate for resampling softness.

use crate::derived::SizeSpec;
use crate::media::backend::{BackendError, MediaBackend, RawProbe};
use crate::media::fields;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::Command;

/// Production backend. `symlink_originals` switches [`SizeSpec::Original`]
/// from copying to symlinking (development mode).
#[derive(Debug, Clone, Default)]
pub struct MagickBackend {
    symlink_originals: bool,
}

impl MagickBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_symlinked_originals() -> Self {
        Self {
            symlink_originals: true,
        }
    }
}

/// The `identify -format` template: one line per probe tag, then width and
/// height. Missing tags produce empty lines, which keeps the line count
/// fixed and the parse positional.
fn identify_format() -> String {
    let mut format = String::new();
    for tag in fields::probe_tags() {
        format.push_str(&format!("%[{tag}]\\n"));
    }
    format.push_str("%[width]\\n%[height]");
    format
}

fn run_tool(mut cmd: Command) -> Result<Vec<u8>, BackendError> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    let output = cmd.output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BackendError::Tool(format!(
            "{program} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    Ok(output.stdout)
}

impl MediaBackend for MagickBackend {
    fn probe(&self, path: &Path) -> Result<RawProbe, BackendError> {
        let mut cmd = Command::new("identify");
        cmd.arg("-format").arg(identify_format()).arg(path);
        let stdout = run_tool(cmd)?;
        let text = String::from_utf8_lossy(&stdout);
        let lines: Vec<&str> = text.lines().collect();

        let tags = fields::probe_tags();
        if lines.len() < tags.len() + 2 {
            return Err(BackendError::Tool(format!(
                "identify returned {} lines, expected {}",
                lines.len(),
                tags.len() + 2
            )));
        }

        let mut fields_map = BTreeMap::new();
        for (tag, value) in tags.iter().zip(&lines) {
            if !value.trim().is_empty() {
                fields_map.insert(tag.to_string(), value.trim().to_string());
            }
        }
        let parse_dim = |line: &str| {
            line.trim()
                .parse::<u32>()
                .map_err(|_| BackendError::Tool(format!("bad dimension from identify: {line:?}")))
        };
        Ok(RawProbe {
            width: parse_dim(lines[tags.len()])?,
            height: parse_dim(lines[tags.len() + 1])?,
            fields: fields_map,
        })
    }

    fn derive(&self, source: &Path, dest: &Path, spec: SizeSpec) -> Result<(), BackendError> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        match spec {
            SizeSpec::Max(n) => {
                let mut cmd = Command::new("convert");
                cmd.arg(source)
                    .arg("-auto-orient")
                    .args(["-thumbnail", &format!("{n}x{n}")])
                    .args(["-unsharp", "0x.5"])
                    .arg(dest);
                run_tool(cmd)?;
            }
            SizeSpec::Min(n) => {
                let fill = format!("{n}x{n}^");
                let extent = format!("{n}x{n}");
                let mut cmd = Command::new("convert");
                cmd.arg(source)
                    .arg("-auto-orient")
                    .args(["-thumbnail", &fill])
                    .args(["-gravity", "center"])
                    .args(["-extent", &extent])
                    .args(["-unsharp", "0x.5"])
                    .arg(dest);
                run_tool(cmd)?;
            }
            SizeSpec::Original => {
                place_original(source, dest, self.symlink_originals)?;
            }
        }
        Ok(())
    }
}

fn place_original(source: &Path, dest: &Path, symlink: bool) -> Result<(), BackendError> {
    if dest.exists() {
        fs::remove_file(dest)?;
    }
    if symlink {
        let absolute = fs::canonicalize(source)?;
        symlink_file(&absolute, dest)?;
    } else {
        fs::copy(source, dest)?;
    }
    Ok(())
}

#[cfg(unix)]
fn symlink_file(source: &Path, dest: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, dest)
}

#[cfg(not(unix))]
fn symlink_file(source: &Path, dest: &Path) -> std::io::Result<()> {
    // Symlinks need elevated rights on this platform; fall back to a copy.
    fs::copy(source, dest).map(|_| ())
}
