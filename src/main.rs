//! Demo binary: open the field in a window, or render a headless PNG.
//!
//! ```text
//! driftfield --count 120
//! driftfield --snapshot field.png --frames 90 --pointer 400 200
//! RUST_LOG=driftfield=debug driftfield --config field.json
//! ```

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::{Path, PathBuf};
    use std::process::ExitCode;

    use clap::Parser;
    use driftfield::{
        ContainerHost, FieldSettings, ImageSurface, ManualScheduler, ParticleEffect, ParticleField, PointerEvent,
        SurfaceDimensions, Vec2,
    };

    #[derive(Parser, Debug)]
    #[command(name = "driftfield", version, about = "Pointer-reactive particle field")]
    struct Args {
        /// JSON settings file; missing keys fall back to defaults.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the particle count.
        #[arg(long)]
        count: Option<usize>,

        /// Seed for reproducible layouts.
        #[arg(long)]
        seed: Option<u64>,

        /// Render headless and write a PNG instead of opening a window.
        #[arg(long, value_name = "PNG")]
        snapshot: Option<PathBuf>,

        /// Frames to simulate before the snapshot.
        #[arg(long, default_value_t = 60, requires = "snapshot")]
        frames: u32,

        #[arg(long, default_value_t = 1280, requires = "snapshot")]
        width: u32,

        #[arg(long, default_value_t = 480, requires = "snapshot")]
        height: u32,

        /// Hold the pointer at X Y (surface pixels) for the whole snapshot.
        #[arg(long, num_args = 2, value_names = ["X", "Y"], requires = "snapshot")]
        pointer: Option<Vec<f32>>,
    }

    /// A fixed-size container with no window behind it.
    struct OffscreenHost {
        size: SurfaceDimensions,
        applied: Option<SurfaceDimensions>,
    }

    impl ContainerHost for OffscreenHost {
        fn container_size(&self) -> Option<SurfaceDimensions> {
            Some(self.size)
        }

        fn container_origin(&self) -> Vec2 {
            Vec2::ZERO
        }

        fn viewport_width(&self) -> f32 {
            self.size.width
        }

        fn apply_surface_size(&mut self, dims: SurfaceDimensions) {
            self.applied = Some(dims);
        }
    }

    fn load_settings(args: &Args) -> Result<FieldSettings, Box<dyn std::error::Error>> {
        let mut settings = match &args.config {
            Some(path) => {
                log::info!("loading settings from {}", path.display());
                FieldSettings::from_json_file(path)?
            }
            None => FieldSettings::default(),
        };
        if let Some(count) = args.count {
            settings = settings.with_particle_count(count);
        }
        settings.validate()?;
        Ok(settings)
    }

    fn snapshot(args: &Args, settings: FieldSettings, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let field = match args.seed {
            Some(seed) => ParticleField::with_seed(settings.clone(), seed),
            None => ParticleField::new(settings.clone()),
        };
        let mut host = OffscreenHost {
            size: SurfaceDimensions::new(args.width as f32, args.height as f32),
            applied: None,
        };
        let mut scheduler = ManualScheduler::new();
        let Some(mut effect) = ParticleEffect::start(field, &mut host, &mut scheduler) else {
            return Err("offscreen container has no size".into());
        };

        let dims = host.applied.unwrap_or_default();
        let mut surface = ImageSurface::new(dims.width as u32, dims.height as u32, settings.palette.background);

        if let Some([x, y]) = args.pointer.as_deref() {
            effect.handle_pointer(
                &PointerEvent::Move {
                    client: Vec2::new(*x, *y),
                },
                &host,
            );
        }

        for _ in 0..args.frames {
            let Some(fired) = scheduler.fire_next() else {
                break;
            };
            effect.handle_frame(fired, &mut scheduler, &mut surface);
        }

        surface.save_png(path)?;
        log::info!(
            "wrote {}x{} snapshot after {} frames to {}",
            surface.width(),
            surface.height(),
            effect.ticks(),
            path.display()
        );
        Ok(())
    }

    pub fn main() -> ExitCode {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        let args = Args::parse();

        let settings = match load_settings(&args) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("{}", e);
                return ExitCode::FAILURE;
            }
        };

        let result = match &args.snapshot {
            Some(path) => snapshot(&args, settings, path),
            None => driftfield::window::run(settings, args.seed).map_err(Into::into),
        };

        match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                log::error!("{}", e);
                ExitCode::FAILURE
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    cli::main()
}

// The browser build starts from the library's wasm entry point.
#[cfg(target_arch = "wasm32")]
fn main() {}
