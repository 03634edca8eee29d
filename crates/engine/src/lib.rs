use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod assets;

pub use app::{
    run_app, run_app_with_metrics, AppAssets, AppError, AppShell, Camera, CameraPose,
    CameraSettings, InputManager, LoopConfig, LoopMetricsSnapshot, MetricsHandle, PointerRelease,
    RendererConfig, RendererInitError, Scene, SceneBase, SceneContext, SceneError, SceneFactory,
    SceneKind, ShellCommand, TilemapLayer, TransitionState, User, ViewTelemetry, WorldRenderer,
    WorldState,
};
pub use assets::{
    AssetError, AssetManifest, PlaceholderTextureLoader, PngTextureLoader, TextureLoader,
    TextureRegistry, MANIFEST_FILE_NAME,
};

pub const ROOT_ENV_VAR: &str = "CAMPUS_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    /// Directory holding the asset manifest; texture paths are relative to it.
    pub asset_dir: PathBuf,
    pub manifest_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "CAMPUS_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
PowerShell: $env:{env_var}=\"C:\\path\\to\\campus\"\n\
Bash/zsh: export {env_var}=\"/path/to/campus\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    Ok(app_paths_for_root(root))
}

pub fn app_paths_for_root(root: PathBuf) -> AppPaths {
    let asset_dir = root.join("assets").join("base");
    let manifest_path = asset_dir.join(MANIFEST_FILE_NAME);
    AppPaths {
        root,
        asset_dir,
        manifest_path,
    }
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            for candidate in exe_dir.ancestors() {
                if is_repo_marker(candidate) {
                    return Ok(normalize_path(candidate));
                }
            }

            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_marker_requires_cargo_toml() {
        let cwd = env::current_dir().expect("cwd");
        assert!(!is_repo_marker(&cwd.join("definitely_not_a_marker")));
    }

    #[test]
    fn repo_marker_accepts_cargo_toml_with_assets() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("Cargo.toml"), "[workspace]\n").expect("write");
        assert!(!is_repo_marker(temp.path()));

        fs::create_dir(temp.path().join("assets")).expect("mkdir");
        assert!(is_repo_marker(temp.path()));
    }

    #[test]
    fn manifest_lives_under_base_assets() {
        let paths = app_paths_for_root(PathBuf::from("/srv/campus"));
        assert_eq!(paths.asset_dir, PathBuf::from("/srv/campus/assets/base"));
        assert_eq!(
            paths.manifest_path,
            PathBuf::from("/srv/campus/assets/base/manifest.json")
        );
    }
}
