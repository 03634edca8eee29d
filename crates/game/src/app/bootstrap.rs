use std::path::{Path, PathBuf};
use std::rc::Rc;

use campus_engine::app::bridge::GameBridge;
use campus_engine::{
    resolve_app_paths, AppAssets, AppPaths, AssetError, AssetManifest, LoopConfig, MetricsHandle,
    PlaceholderTextureLoader, PngTextureLoader, RendererConfig, StartupError, WorldRenderer,
};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::campus::Roster;
use super::scenes::CampusSceneFactory;
use super::ui::{CampusShell, ShellSettings, WorldStore};

const USER_EMAIL_ENV_VAR: &str = "CAMPUS_USER_EMAIL";
const ROSTER_ENV_VAR: &str = "CAMPUS_ROSTER";
const PLACEHOLDER_ART_ENV_VAR: &str = "CAMPUS_PLACEHOLDER_ART";
const AVATAR_SHEETS_ENV_VAR: &str = "CAMPUS_AVATAR_SHEETS";

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Assets(#[from] AssetError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) world: WorldRenderer,
    pub(crate) shell: Box<CampusShell>,
    pub(crate) assets: AppAssets,
    pub(crate) metrics: MetricsHandle,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Campus Startup ===");

    let settings = EnvSettings::from_lookup(|var| std::env::var(var).ok());
    let roster = Rc::new(load_roster(settings.roster_path.as_deref()));
    let assets = load_assets(settings.placeholder_art)?;

    let world = WorldRenderer::new(
        GameBridge::new(),
        Box::new(CampusSceneFactory::new(Rc::clone(&roster))),
        RendererConfig {
            avatar_sheets: settings.avatar_sheets,
            ..RendererConfig::default()
        },
    );
    let metrics = MetricsHandle::default();
    let shell = CampusShell::new(WorldStore::new(roster), settings.shell(), metrics.clone());

    Ok(AppWiring {
        config: LoopConfig::default(),
        world,
        shell: Box::new(shell),
        assets,
        metrics,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct EnvSettings {
    user_email: Option<String>,
    roster_path: Option<PathBuf>,
    /// Generated art instead of the PNG files named by the manifest.
    placeholder_art: bool,
    avatar_sheets: bool,
}

impl EnvSettings {
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let user_email = lookup(USER_EMAIL_ENV_VAR)
            .map(|raw| raw.trim().to_string())
            .filter(|email| {
                let valid = email.contains('@');
                if !valid {
                    warn!(var = USER_EMAIL_ENV_VAR, value = email.as_str(), "invalid_email_ignored");
                }
                valid
            });
        let roster_path = lookup(ROSTER_ENV_VAR)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);
        let placeholder_art = lookup(PLACEHOLDER_ART_ENV_VAR)
            .and_then(|raw| parse_flag(PLACEHOLDER_ART_ENV_VAR, &raw))
            .unwrap_or(false);
        let avatar_sheets = lookup(AVATAR_SHEETS_ENV_VAR)
            .and_then(|raw| parse_flag(AVATAR_SHEETS_ENV_VAR, &raw))
            .unwrap_or(false);
        Self {
            user_email,
            roster_path,
            placeholder_art,
            avatar_sheets,
        }
    }

    fn shell(&self) -> ShellSettings {
        match &self.user_email {
            Some(email) => ShellSettings {
                login_email: email.clone(),
                auto_login: true,
            },
            None => ShellSettings::default(),
        }
    }
}

fn parse_flag(var: &'static str, raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            warn!(var, value = raw, "invalid_env_flag; using default");
            None
        }
    }
}

/// An unreadable roster is not fatal: the built-in campus is used instead.
fn load_roster(path: Option<&Path>) -> Roster {
    let Some(path) = path else {
        return Roster::builtin();
    };
    match Roster::load(path) {
        Ok(roster) => {
            info!(
                path = %path.display(),
                buildings = roster.buildings.len(),
                "roster_loaded"
            );
            roster
        }
        Err(err) => {
            warn!(error = %err, "roster_load_failed; using built-in campus");
            Roster::builtin()
        }
    }
}

fn load_assets(placeholder_art: bool) -> Result<AppAssets, BootstrapError> {
    if placeholder_art {
        info!("using_placeholder_art");
        return Ok(AppAssets {
            manifest: AssetManifest::builtin(),
            loader: Box::new(PlaceholderTextureLoader),
        });
    }

    let paths = resolve_app_paths()?;
    info!(
        root = %paths.root.display(),
        manifest = %paths.manifest_path.display(),
        "startup_paths"
    );
    Ok(png_assets(&paths)?)
}

/// Missing texture files are not checked here; they fail renderer init.
fn png_assets(paths: &AppPaths) -> Result<AppAssets, AssetError> {
    let manifest = AssetManifest::load(&paths.manifest_path)?;
    Ok(AppAssets {
        manifest,
        loader: Box::new(PngTextureLoader::new(paths.asset_dir.clone())),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use campus_engine::app_paths_for_root;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let settings = EnvSettings::from_lookup(lookup(&[]));
        assert_eq!(settings, EnvSettings::default());
        assert_eq!(settings.shell(), ShellSettings::default());
    }

    #[test]
    fn user_email_enables_auto_login() {
        let settings = EnvSettings::from_lookup(lookup(&[(USER_EMAIL_ENV_VAR, " ada@acme.com ")]));
        let shell = settings.shell();
        assert_eq!(shell.login_email, "ada@acme.com");
        assert!(shell.auto_login);
    }

    #[test]
    fn malformed_email_is_ignored() {
        let settings = EnvSettings::from_lookup(lookup(&[(USER_EMAIL_ENV_VAR, "not-an-email")]));
        assert!(settings.user_email.is_none());
        assert!(!settings.shell().auto_login);
    }

    #[test]
    fn flags_accept_common_spellings() {
        let settings = EnvSettings::from_lookup(lookup(&[
            (PLACEHOLDER_ART_ENV_VAR, "Yes"),
            (AVATAR_SHEETS_ENV_VAR, "1"),
        ]));
        assert!(settings.placeholder_art);
        assert!(settings.avatar_sheets);

        let settings = EnvSettings::from_lookup(lookup(&[(PLACEHOLDER_ART_ENV_VAR, "off")]));
        assert!(!settings.placeholder_art);
    }

    #[test]
    fn invalid_flag_falls_back_to_default() {
        assert_eq!(parse_flag(AVATAR_SHEETS_ENV_VAR, "maybe"), None);
        let settings = EnvSettings::from_lookup(lookup(&[(AVATAR_SHEETS_ENV_VAR, "maybe")]));
        assert!(!settings.avatar_sheets);
    }

    #[test]
    fn blank_roster_path_is_ignored() {
        let settings = EnvSettings::from_lookup(lookup(&[(ROSTER_ENV_VAR, "  ")]));
        assert!(settings.roster_path.is_none());
    }

    #[test]
    fn broken_roster_falls_back_to_builtin() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("roster.json");
        fs::write(&path, "{ not json").expect("write");

        let roster = load_roster(Some(&path));
        assert_eq!(roster.buildings.len(), Roster::builtin().buildings.len());
        assert_eq!(load_roster(None).ambient.len(), 3);
    }

    #[test]
    fn placeholder_art_skips_the_manifest_file() {
        let assets = load_assets(true).expect("assets");
        assert_eq!(assets.manifest, AssetManifest::builtin());
    }

    #[test]
    fn missing_texture_file_fails_renderer_init() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = app_paths_for_root(temp.path().to_path_buf());
        fs::create_dir_all(&paths.asset_dir).expect("asset dir");
        fs::write(
            &paths.manifest_path,
            r#"{ "textures": [ { "key": "tile_grass_1", "path": "tiles/grass_1.png" } ] }"#,
        )
        .expect("write manifest");

        let assets = png_assets(&paths).expect("manifest parses");
        assert_eq!(assets.manifest.textures.len(), 1);

        let roster = Rc::new(Roster::builtin());
        let mut world = WorldRenderer::new(
            GameBridge::new(),
            Box::new(CampusSceneFactory::new(roster)),
            RendererConfig::default(),
        );
        let result = world.init((800.0, 600.0), &assets.manifest, assets.loader.as_ref());
        assert!(result.is_err());
        assert!(!world.is_initialized());
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = app_paths_for_root(temp.path().to_path_buf());
        assert!(matches!(
            png_assets(&paths),
            Err(AssetError::ReadManifest { .. })
        ));
    }
}
