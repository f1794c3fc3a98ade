use std::time::{Duration, Instant};

mod device;
mod effect;
mod gl;
#[cfg(test)]
mod recording;
mod scene;
mod settings;
mod shader;
mod transform;
mod vertex;

use log::{debug, error, info, LevelFilter};
use miniquad::{Context, EventHandler};
use simple_logger::SimpleLogger;

use gl::{GlDevice, GlStore};
use scene::{QuadScene, Scene};
use settings::Settings;
use transform::Viewport;

const STATS_EVERY: usize = 120;

/// Elapsed time between callbacks, plus an fps sample every `STATS_EVERY` frames.
struct FrameClock {
    last_frame: Instant,
    frame_count: usize,
    accumulate_time: u128,
}

impl FrameClock {
    fn new(now: Instant) -> Self {
        Self {
            last_frame: now,
            frame_count: 0,
            accumulate_time: 0,
        }
    }

    fn tick(&mut self, now: Instant) -> Duration {
        let elapsed = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        self.frame_count += 1;
        self.accumulate_time += elapsed.as_micros();
        elapsed
    }

    fn fps(&mut self) -> Option<u128> {
        if self.frame_count == 0 || self.frame_count % STATS_EVERY != 0 {
            return None;
        }
        let fps = 1_000_000 / (self.accumulate_time / STATS_EVERY as u128).max(1);
        self.accumulate_time = 0;
        Some(fps)
    }
}

struct Stage {
    store: GlStore,
    scene: QuadScene,
    clock: FrameClock,
}

impl Stage {
    pub fn new(ctx: &mut Context) -> anyhow::Result<Stage> {
        let mut store = GlStore::new();
        let mut scene = QuadScene::new();
        scene.init(&mut GlDevice::new(ctx, &mut store))?;

        Ok(Stage {
            store,
            scene,
            clock: FrameClock::new(Instant::now()),
        })
    }
}

impl EventHandler for Stage {
    fn update(&mut self, ctx: &mut Context) {
        let elapsed = self.clock.tick(Instant::now());

        let (width, height) = ctx.screen_size();
        self.scene
            .update(elapsed.as_secs_f32(), Viewport::new(width, height));

        if let Some(fps) = self.clock.fps() {
            debug!("fps: {}, rotation: {:.1}", fps, self.scene.rotation());
        }
    }

    fn resize_event(&mut self, _ctx: &mut Context, width: f32, height: f32) {
        debug!("resized to {}x{}", width, height);
    }

    fn draw(&mut self, ctx: &mut Context) {
        self.scene.draw(&mut GlDevice::new(ctx, &mut self.store));
    }

    fn quit_requested_event(&mut self, ctx: &mut Context) {
        self.scene.teardown(&mut GlDevice::new(ctx, &mut self.store));
    }
}

impl Drop for Stage {
    fn drop(&mut self) {
        // no-op when quit_requested_event already tore the scene down
        self.scene.teardown(&mut GlDevice::detached(&mut self.store));
    }
}

fn main() {
    if let Err(err) = SimpleLogger::new().with_level(LevelFilter::Trace).init() {
        eprintln!("failed to install logger: {}", err);
    }
    let settings = Settings::from_env();
    log::set_max_level(settings.log_level);
    info!("starting {} ({}x{})", settings.title, settings.width, settings.height);

    miniquad::start(settings.conf(), |ctx| match Stage::new(ctx) {
        Ok(stage) => Box::new(stage),
        Err(err) => {
            error!("{:#}", err);
            std::process::exit(1);
        }
    });
}
