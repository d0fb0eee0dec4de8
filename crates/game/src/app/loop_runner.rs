use std::process::ExitCode;

use engine::{
    run_app_with_metrics, Color, CursorHint, DrawContext, FrameTime, Host, InputSnapshot,
    MetricsHandle,
};
use tracing::{error, info};

use super::bootstrap::AppWiring;
use super::world::{Game, GameError};

const FPS_TEXT_SIZE: f32 = 16.0;

/// Adapts the game to the engine's frame loop.
pub(crate) struct GameHost {
    game: Game,
    metrics: MetricsHandle,
}

impl GameHost {
    pub(crate) fn new(game: Game, metrics: MetricsHandle) -> Self {
        Self { game, metrics }
    }
}

impl Host for GameHost {
    type Error = GameError;

    fn tick(&mut self, frame: FrameTime, input: &InputSnapshot) -> Result<(), GameError> {
        self.game.tick(frame, input)
    }

    fn draw(&mut self, ctx: &mut dyn DrawContext) {
        self.game.draw(ctx);
        if self.game.debug_enabled() {
            let fps = self.metrics.snapshot().fps;
            ctx.fill_text(&format!("{fps:.0} fps"), 8.0, 8.0, FPS_TEXT_SIZE, Color::DEBUG_GREEN);
        }
    }

    fn cursor(&self) -> CursorHint {
        self.game.cursor()
    }

    fn shutdown(&mut self) {
        self.game.shutdown();
        info!("game_shutdown");
    }
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    if let Err(err) = run_app_with_metrics(app.config, app.host, app.metrics) {
        error!(error = %err, "startup_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
