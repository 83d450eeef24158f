//! Artifact naming and writing for published posts.
//!
//! Every published record produces two files under the site root:
//!
//! ```text
//! posts/20250304101500-great-new-gadget.html
//! images/20250304101500-great-new-gadget.png
//! ```
//!
//! The stem is `{timestamp}-{slug}`, shared by both files. If either file
//! already exists (two rows with the same keyword in the same second), the
//! stem gets a `-2`, `-3`, ... suffix until both names are free. Existing
//! files are never overwritten.
//!
//! Paths are kept as `/`-separated strings relative to the site root, since
//! they double as URL paths.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// `strftime` format of the artifact timestamp prefix.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Where one record's post and image go, relative to the site root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub post: String,
    pub image: String,
}

impl ArtifactPaths {
    /// Pick the first collision-free pair of names for `stem`.
    pub fn allocate(
        root: &Path,
        posts_dir: &str,
        images_dir: &str,
        stem: &str,
        image_ext: &str,
    ) -> Self {
        let posts_dir = posts_dir.trim_matches('/');
        let images_dir = images_dir.trim_matches('/');
        let mut n = 1;
        loop {
            let name = if n == 1 {
                stem.to_string()
            } else {
                format!("{stem}-{n}")
            };
            let candidate = Self {
                post: format!("{posts_dir}/{name}.html"),
                image: format!("{images_dir}/{name}.{image_ext}"),
            };
            if !candidate.post_path(root).exists() && !candidate.image_path(root).exists() {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn post_path(&self, root: &Path) -> PathBuf {
        root.join(&self.post)
    }

    pub fn image_path(&self, root: &Path) -> PathBuf {
        root.join(&self.image)
    }

    /// Write the image, then the post page.
    ///
    /// On any failure both files are removed again, so a failed record
    /// leaves nothing behind. The names came from [`allocate`](Self::allocate),
    /// so removal can't clobber a file that existed before.
    pub fn write(&self, root: &Path, image: &[u8], page: &str) -> io::Result<()> {
        let image_path = self.image_path(root);
        let post_path = self.post_path(root);
        let result = (|| -> io::Result<()> {
            create_parent(&image_path)?;
            fs::write(&image_path, image)?;
            create_parent(&post_path)?;
            fs::write(&post_path, page)
        })();
        if result.is_err() {
            for path in [&image_path, &post_path] {
                if let Err(e) = discard(path) {
                    warn!(path = %path.display(), error = %e, "could not remove partial output");
                }
            }
        }
        result
    }
}

/// Remove `path` if it exists. A file that was never written is not an error.
fn discard(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn create_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
