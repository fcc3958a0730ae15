//! Clipboard image capture through an external clipboard utility (`xclip`).

use std::{
    ffi::OsString,
    path::Path,
    process::{Output, Stdio},
};

use async_trait::async_trait;
use tempfile::TempPath;
use tokio::process::Command;

use crate::{errors::Error, Result};

/// MIME types that count as "the clipboard holds an image".
pub const IMAGE_MIME_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/gif"];

/// Does the clipboard tool's TARGETS listing mention an image type?
pub fn contains_image(targets: &[u8]) -> bool {
    IMAGE_MIME_TYPES
        .iter()
        .any(|mime| contains_bytes(targets, mime.as_bytes()))
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// An image pulled from the clipboard into a temp file.
///
/// The file is deleted when this value is dropped, so callers keep it alive
/// exactly for the duration of one send.
#[derive(Debug)]
pub struct CapturedImage {
    path: TempPath,
}

impl CapturedImage {
    pub fn new(path: TempPath) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
pub trait ClipboardReader: Send + Sync {
    async fn capture_image(&self) -> Result<CapturedImage>;
}

/// `xclip -selection clipboard ...` driven clipboard reader.
#[derive(Clone, Debug)]
pub struct XclipClipboard {
    program: OsString,
    /// Arguments placed before the xclip arguments; empty outside tests.
    prefix_args: Vec<OsString>,
}

impl XclipClipboard {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            prefix_args: Vec::new(),
        }
    }

    #[cfg(test)]
    fn with_prefix_args(
        program: impl Into<OsString>,
        prefix_args: impl IntoIterator<Item = impl Into<OsString>>,
    ) -> Self {
        Self {
            program: program.into(),
            prefix_args: prefix_args.into_iter().map(Into::into).collect(),
        }
    }

    fn command(&self, target: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.prefix_args)
            .args(["-selection", "clipboard", "-t", target, "-o"])
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    async fn query_targets(&self) -> Result<Output> {
        let out = self
            .command("TARGETS")
            .output()
            .await
            .map_err(|e| Error::Clipboard(format!("{} error: {e}", self.program_name())))?;

        if !out.status.success() {
            return Err(Error::Clipboard(format!(
                "{} exited with {}: {}",
                self.program_name(),
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        Ok(out)
    }
}

#[async_trait]
impl ClipboardReader for XclipClipboard {
    async fn capture_image(&self) -> Result<CapturedImage> {
        let targets = self.query_targets().await?;
        if !contains_image(&targets.stdout) {
            return Err(Error::NoImageInClipboard);
        }

        let tmp = tempfile::Builder::new()
            .prefix("clipboard-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| Error::Clipboard(format!("temp file error: {e}")))?;
        let (file, path) = tmp.into_parts();

        // `path` removes the file on every early return below.
        let mut cmd = self.command("image/png");
        cmd.stdout(Stdio::from(file)).stderr(Stdio::null());
        let status = cmd
            .status()
            .await
            .map_err(|e| Error::Clipboard(format!("{} save error: {e}", self.program_name())))?;

        if !status.success() {
            return Err(Error::Clipboard(format!(
                "{} save error: exited with {status}",
                self.program_name()
            )));
        }

        tracing::debug!(path = %path.display(), "clipboard image captured");
        Ok(CapturedImage::new(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_image_mime_types_in_targets_output() {
        assert!(contains_image(b"TARGETS\nimage/png\ntext/plain\n"));
        assert!(contains_image(b"image/jpeg"));
        assert!(contains_image(b"TARGETS\nimage/gif"));
    }

    #[test]
    fn rejects_targets_without_supported_images() {
        assert!(!contains_image(b""));
        assert!(!contains_image(b"TARGETS\nUTF8_STRING\ntext/plain\n"));
        assert!(!contains_image(b"image/webp\nimage/bmp"));
    }

    #[test]
    fn captured_image_file_is_removed_on_drop() {
        let tmp = tempfile::Builder::new()
            .prefix("clipboard-")
            .suffix(".png")
            .tempfile()
            .unwrap();
        let img = CapturedImage::new(tmp.into_temp_path());
        let path = img.path().to_path_buf();
        assert!(path.exists());
        drop(img);
        assert!(!path.exists());
    }

    #[cfg(unix)]
    mod fake_xclip {
        use super::super::*;

        /// Writes a shell script that answers like xclip and returns a reader running it via `sh`.
        fn fake(dir: &Path, targets: &str, image: &str, save_exit: i32) -> XclipClipboard {
            let script = dir.join("fake-xclip.sh");
            let body = format!(
                "case \"$*\" in\n  *TARGETS*) printf '{targets}' ;;\n  *) printf '{image}'; exit {save_exit} ;;\nesac\n"
            );
            std::fs::write(&script, body).unwrap();
            XclipClipboard::with_prefix_args("sh", [script])
        }

        #[tokio::test]
        async fn capture_writes_piped_bytes_to_a_png_temp_file() {
            let dir = tempfile::tempdir().unwrap();
            let clip = fake(dir.path(), "TARGETS\\nimage/png\\n", "PNGDATA", 0);

            let img = clip.capture_image().await.unwrap();
            let path = img.path().to_path_buf();
            assert!(path.to_string_lossy().ends_with(".png"));
            assert_eq!(std::fs::read(&path).unwrap(), b"PNGDATA");

            drop(img);
            assert!(!path.exists());
        }

        #[tokio::test]
        async fn capture_fails_without_image_targets() {
            let dir = tempfile::tempdir().unwrap();
            let clip = fake(dir.path(), "TARGETS\\ntext/plain\\n", "ignored", 0);

            let err = clip.capture_image().await.unwrap_err();
            assert!(matches!(err, Error::NoImageInClipboard));
        }

        #[tokio::test]
        async fn failing_save_is_a_clipboard_error() {
            let dir = tempfile::tempdir().unwrap();
            let clip = fake(dir.path(), "image/png", "partial", 3);

            let err = clip.capture_image().await.unwrap_err();
            assert!(matches!(err, Error::Clipboard(_)));
        }

        #[tokio::test]
        async fn missing_program_is_a_clipboard_error() {
            let clip = XclipClipboard::new("/nonexistent/tgb-xclip");
            let err = clip.capture_image().await.unwrap_err();
            assert!(matches!(err, Error::Clipboard(_)));
        }
    }
}
