use std::future::Future;
use std::path::PathBuf;

use super::{AssetError, AssetSource};

/// Reads shader sources from a directory on disk.
#[derive(Debug, Clone)]
pub struct FsAssetSource {
    root: PathBuf,
}

impl FsAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl AssetSource for FsAssetSource {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<String, AssetError>> {
        let full = self.root.join(path);
        let path = path.to_string();
        async move {
            std::fs::read_to_string(&full).map_err(|e| AssetError::Fetch {
                path,
                reason: format!("{}: {e}", full.display()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reports_path() {
        let source = FsAssetSource::new(std::env::temp_dir().join("horizon-no-such-dir"));
        let err = pollster::block_on(source.fetch("disc/vertex.wgsl")).unwrap_err();
        let AssetError::Fetch { path, .. } = err else {
            panic!("expected fetch error");
        };
        assert_eq!(path, "disc/vertex.wgsl");
    }

    #[test]
    fn reads_the_shipped_shader_directory() {
        let source = FsAssetSource::new(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders"));
        let text = pollster::block_on(source.fetch("dither/fragment.wgsl")).unwrap();
        assert!(text.contains("fs_main"));
    }
}
