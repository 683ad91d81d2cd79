use std::future::{ready, Future};

use super::{AssetError, AssetSource};

macro_rules! shader_files {
    ($($path:literal),* $(,)?) => {
        &[$(($path, include_str!(concat!("../../shaders/", $path)))),*]
    };
}

const FILES: &[(&str, &str)] = shader_files![
    "noises/vertex.wgsl",
    "noises/fragment.wgsl",
    "stars/vertex.wgsl",
    "stars/fragment.wgsl",
    "disc/vertex.wgsl",
    "disc/fragment.wgsl",
    "distortionHole/vertex.wgsl",
    "distortionHole/fragment.wgsl",
    "distortionDisc/vertex.wgsl",
    "distortionDisc/fragment.wgsl",
    "composition/vertex.wgsl",
    "composition/fragment.wgsl",
    "dither/vertex.wgsl",
    "dither/fragment.wgsl",
    "includes/perlin.wgsl",
    "includes/remap.wgsl",
];

/// Shader sources compiled into the binary.
#[derive(Debug, Copy, Clone, Default)]
pub struct EmbeddedAssets;

impl AssetSource for EmbeddedAssets {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<String, AssetError>> {
        let found = FILES
            .iter()
            .find(|(p, _)| *p == path)
            .map(|(_, text)| (*text).to_string());
        ready(found.ok_or_else(|| AssetError::Fetch {
            path: path.to_string(),
            reason: "not embedded".to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(path: &str) -> String {
        pollster::block_on(EmbeddedAssets.fetch(path)).unwrap()
    }

    #[test]
    fn unknown_path_is_a_fetch_error() {
        let err = pollster::block_on(EmbeddedAssets.fetch("nope.wgsl")).unwrap_err();
        assert!(matches!(err, AssetError::Fetch { ref path, .. } if path == "nope.wgsl"));
    }

    #[test]
    fn dither_cells_follow_the_composed_resolution() {
        // The surface can be larger than the composed target when the pixel
        // ratio is capped, so cells must not come from framebuffer position.
        let dither = text("dither/fragment.wgsl");
        assert!(!dither.contains("@builtin(position)"));
        assert!(dither.contains("let pixel = vec2<f32>(in.uv.x, 1.0 - in.uv.y) * resolution;"));
        assert!(dither.contains("let cell = floor(pixel / grid);"));
    }
}
