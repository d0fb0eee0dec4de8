use engine::{
    resolve_app_paths, AssetError, AssetLoader, AudioSink, FileStore, FsAssetLoader,
    KeyValueStore, LoopConfig, MetricsHandle, StartupError, TracingAudio,
};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::audio::speech_params;
use super::config::GameConfig;
use super::hud::ItemIcons;
use super::loop_runner::GameHost;
use super::world::progress::ProgressError;
use super::world::registry::RegistryError;
use super::world::player::Cue;
use super::world::{Game, GameDeps, GameError, ItemRef, NpcType, Progress, Registry};

#[derive(Debug, Error)]
pub(crate) enum BootError {
    #[error(transparent)]
    Paths(#[from] StartupError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Game(#[from] GameError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) host: GameHost,
    pub(crate) metrics: MetricsHandle,
}

pub(crate) fn build_app() -> Result<AppWiring, BootError> {
    init_tracing();
    info!("=== Cottage Startup ===");

    let config = GameConfig::from_env();
    let paths = resolve_app_paths()?;
    info!(
        root = %paths.root.display(),
        saves = %paths.save_dir.display(),
        "paths_resolved"
    );
    let mut assets = FsAssetLoader::new(&paths.assets_dir);
    let store = FileStore::new(&paths.save_dir);
    let game = load_game(&config, &mut assets, store, || Box::new(TracingAudio))?;

    let metrics = MetricsHandle::default();
    Ok(AppWiring {
        config: LoopConfig::default(),
        host: GameHost::new(game, metrics.clone()),
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

/// Builds the game from the saved blob when there is one, else from the
/// shipped world. A save that fails to load is logged and skipped.
pub(crate) fn load_game<S>(
    config: &GameConfig,
    assets: &mut dyn AssetLoader,
    store: S,
    audio: impl Fn() -> Box<dyn AudioSink>,
) -> Result<Game, BootError>
where
    S: KeyValueStore + Clone + 'static,
{
    let progress = load_progress(config, assets)?;
    let icons = load_icons(assets);
    check_sound_bank(assets)?;
    let deps = || -> Result<GameDeps, BootError> {
        Ok(GameDeps {
            registry: Registry::with_builtin()?,
            progress: progress.clone(),
            audio: audio(),
            store: Box::new(store.clone()),
            icons: icons.clone(),
        })
    };

    if config.new_game {
        info!(key = %config.save_key, "save_ignored_new_game");
    } else if let Some(saved) = read_save(config, &store) {
        match Game::from_data(saved, deps()?, assets, config) {
            Ok(game) => {
                info!(key = %config.save_key, "save_restored");
                return Ok(game);
            }
            Err(err) => warn!(key = %config.save_key, error = %err, "save_rejected"),
        }
    }

    let world = assets.load_object(&config.world_url)?;
    Ok(Game::from_data(world, deps()?, assets, config)?)
}

fn read_save(config: &GameConfig, store: &dyn KeyValueStore) -> Option<Value> {
    let text = match store.get(&config.save_key) {
        Ok(Some(text)) => text,
        Ok(None) => return None,
        Err(err) => {
            warn!(key = %config.save_key, error = %err, "save_read_failed");
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key = %config.save_key, error = %err, "save_parse_failed");
            None
        }
    }
}

fn load_progress(config: &GameConfig, assets: &mut dyn AssetLoader) -> Result<Progress, BootError> {
    match assets.load_object(&config.progress_url) {
        Ok(value) => Ok(Progress::from_value(value)?),
        Err(AssetError::Missing { .. }) => {
            info!(url = %config.progress_url, "progress_table_builtin");
            Ok(Progress::standard())
        }
        Err(AssetError::Read { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            info!(url = %config.progress_url, "progress_table_builtin");
            Ok(Progress::standard())
        }
        Err(err) => Err(err.into()),
    }
}

/// Every cue and speech sample must be present before the first frame.
fn check_sound_bank(assets: &mut dyn AssetLoader) -> Result<(), AssetError> {
    let names = Cue::ALL
        .iter()
        .map(|cue| cue.sfx_name())
        .chain([NpcType::Cat, NpcType::Ghost].map(|npc| speech_params(npc).sample));
    let mut bytes = 0;
    let mut count = 0;
    for name in names {
        let clip = assets.load_audio(&format!("sfx/{name}.wav"))?;
        bytes += clip.byte_len();
        count += 1;
    }
    info!(clips = count, bytes, "sound_bank_ready");
    Ok(())
}

fn load_icons(assets: &mut dyn AssetLoader) -> ItemIcons {
    let mut icons = ItemIcons::new();
    for item in ItemRef::all() {
        let url = item.image_url();
        match assets.load_image(&url) {
            Ok(image) => {
                icons.insert(item, image);
            }
            Err(err) => warn!(url = %url, error = %err, "item_icon_missing"),
        }
    }
    icons
}
