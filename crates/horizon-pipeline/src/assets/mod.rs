//! Shader asset loading.
//!
//! An [`AssetSource`] retrieves text by path. [`load_shader_sources`] fetches
//! the fourteen stage sources concurrently, runs include substitution on the
//! fragment stages, and joins everything before returning: either every
//! source is available or the combined failure is reported once.

mod embedded;
mod fs;
pub mod include;
mod memory;

use std::future::Future;

use futures::future::join_all;
use thiserror::Error;

pub use embedded::EmbeddedAssets;
pub use fs::FsAssetSource;
pub use memory::MemoryAssets;

/// Extension appended to include paths that lack one.
pub const SHADER_EXTENSION: &str = ".wgsl";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("failed to fetch `{path}`: {reason}")]
    Fetch { path: String, reason: String },

    #[error("{} shader source(s) failed to load: {}", .0.len(), summarize(.0))]
    Aggregate(Vec<AssetError>),
}

fn summarize(errors: &[AssetError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Text retrieval capability.
///
/// Paths are relative to the shader root, e.g. `disc/fragment.wgsl`.
pub trait AssetSource {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<String, AssetError>>;
}

/// Vertex + fragment source of one program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSources {
    pub vertex: String,
    pub fragment: String,
}

/// Every shader source the pipeline needs, include-processed.
#[derive(Debug, Clone)]
pub struct ShaderSources {
    pub noises: StageSources,
    pub stars: StageSources,
    pub disc: StageSources,
    pub distortion_hole: StageSources,
    pub distortion_disc: StageSources,
    pub composition: StageSources,
    pub dither: StageSources,
}

/// Program directories under the shader root, in [`ShaderSources`] field order.
pub const PROGRAM_DIRS: [&str; 7] = [
    "noises",
    "stars",
    "disc",
    "distortionHole",
    "distortionDisc",
    "composition",
    "dither",
];

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    fn file(self) -> &'static str {
        match self {
            Self::Vertex => "vertex.wgsl",
            Self::Fragment => "fragment.wgsl",
        }
    }
}

async fn load_stage<S: AssetSource + ?Sized>(
    source: &S,
    path: String,
    stage: Stage,
) -> Result<String, AssetError> {
    let code = source.fetch(&path).await?;
    Ok(match stage {
        Stage::Vertex => code,
        Stage::Fragment => include::process_includes(source, &code).await,
    })
}

/// Loads all program sources from `source`.
///
/// Fetches are issued together and joined; failures are collected into a
/// single [`AssetError::Aggregate`].
pub async fn load_shader_sources<S: AssetSource + ?Sized>(
    source: &S,
) -> Result<ShaderSources, AssetError> {
    let jobs = PROGRAM_DIRS.iter().flat_map(|dir| {
        [Stage::Vertex, Stage::Fragment]
            .into_iter()
            .map(move |stage| (format!("{dir}/{}", stage.file()), stage))
    });

    let results = join_all(jobs.map(|(path, stage)| load_stage(source, path, stage))).await;

    let mut codes = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(code) => codes.push(code),
            Err(e) => {
                log::error!("{e}");
                errors.push(e);
            }
        }
    }
    if !errors.is_empty() {
        return Err(AssetError::Aggregate(errors));
    }

    let mut codes = codes.into_iter();
    let mut next = || StageSources {
        vertex: codes.next().unwrap_or_default(),
        fragment: codes.next().unwrap_or_default(),
    };

    Ok(ShaderSources {
        noises: next(),
        stars: next(),
        disc: next(),
        distortion_hole: next(),
        distortion_disc: next(),
        composition: next(),
        dither: next(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_set() -> MemoryAssets {
        let mut assets = MemoryAssets::new();
        for dir in PROGRAM_DIRS {
            assets.insert(format!("{dir}/vertex.wgsl"), format!("// {dir} vs"));
            assets.insert(format!("{dir}/fragment.wgsl"), format!("// {dir} fs"));
        }
        assets
    }

    #[test]
    fn loads_every_program() {
        let sources = pollster::block_on(load_shader_sources(&full_set())).unwrap();
        assert_eq!(sources.disc.vertex, "// disc vs");
        assert_eq!(sources.distortion_hole.fragment, "// distortionHole fs");
        assert_eq!(sources.dither.fragment, "// dither fs");
    }

    #[test]
    fn failures_are_aggregated() {
        let mut assets = full_set();
        assets.remove("stars/vertex.wgsl");
        assets.remove("dither/fragment.wgsl");

        let err = pollster::block_on(load_shader_sources(&assets)).unwrap_err();
        let AssetError::Aggregate(errors) = &err else {
            panic!("expected aggregate, got {err:?}");
        };
        assert_eq!(errors.len(), 2);
        assert!(err.to_string().contains("stars/vertex.wgsl"));
        assert!(err.to_string().contains("dither/fragment.wgsl"));
    }

    #[test]
    fn fragments_get_includes_resolved() {
        let mut assets = full_set();
        assets.insert(
            "composition/fragment.wgsl",
            "#include ../includes/remap;\nfn main() {}",
        );
        assets.insert("includes/remap.wgsl", "fn remap() {}");

        let sources = pollster::block_on(load_shader_sources(&assets)).unwrap();
        assert_eq!(sources.composition.fragment, "fn remap() {}\nfn main() {}");
    }

    #[test]
    fn embedded_set_is_complete() {
        let sources = pollster::block_on(load_shader_sources(&EmbeddedAssets)).unwrap();
        for stage in [&sources.disc, &sources.composition, &sources.dither] {
            assert!(stage.vertex.contains("vs_main"));
            assert!(stage.fragment.contains("fs_main"));
            assert!(!stage.fragment.contains("#include"));
        }
    }
}
