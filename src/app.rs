use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use tiny_rasterizer::{
    Error, Mesh, PrimitiveMode, RenderSettings, Renderer, Result, ShadingModel, Texture,
    TextureSlot,
};

/// Runtime parameters of the binary. Loaded from a JSON file with `-c`, then
/// overridden by the remaining command-line flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub width: u32,
    pub height: u32,
    pub print_fps: bool,
    pub model_path: PathBuf,
    /// Render headless into this PNG instead of opening a window.
    pub output: Option<PathBuf>,
    /// Grey-scale depth view written next to `output`. Requires `output`.
    pub depth_output: Option<PathBuf>,
    /// Frames rendered in headless mode; the last one is saved.
    pub frames: u32,
    pub settings: RenderSettings,
}

impl Default for Params {
    fn default() -> Self {
        return Params {
            width: 800,
            height: 800,
            print_fps: false,
            model_path: PathBuf::from("assets/diablo3_pose/diablo3_pose.obj"),
            output: None,
            depth_output: None,
            frames: 1,
            settings: RenderSettings::default(),
        };
    }
}

impl Params {
    pub fn from_json_str(source: &str) -> Result<Params> {
        return Ok(serde_json::from_str(source)?);
    }

    pub fn from_json_file(path: &Path) -> Result<Params> {
        let source = fs::read_to_string(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        return Params::from_json_str(&source);
    }

    /// Builds parameters from command-line arguments (program name excluded).
    pub fn from_args(args: &[String]) -> Result<Params> {
        let mut params = Params::default();
        // The config file is the base layer, wherever `-c` appears.
        if let Some(index) = args.iter().position(|arg| arg == "-c") {
            let path = args
                .get(index + 1)
                .ok_or_else(|| Error::Arguments("`-c` expects a value".to_string()))?;
            params = Params::from_json_file(Path::new(path))?;
        }

        let mut iter = args.iter();
        while let Some(flag) = iter.next() {
            let mut value = || {
                iter.next()
                    .ok_or_else(|| Error::Arguments(format!("`{}` expects a value", flag)))
            };
            match flag.as_str() {
                "-c" => {
                    value()?;
                }
                "-p" => params.model_path = PathBuf::from(value()?),
                "-s" => params.settings.shading = value()?.parse()?,
                "-m" => params.settings.primitive = value()?.parse()?,
                "-o" => params.output = Some(PathBuf::from(value()?)),
                "-d" => params.depth_output = Some(PathBuf::from(value()?)),
                "-n" => params.frames = parse_number(flag, value()?)?,
                "--width" => params.width = parse_number(flag, value()?)?,
                "--height" => params.height = parse_number(flag, value()?)?,
                "--fps" => params.print_fps = true,
                other => return Err(Error::Arguments(format!("unknown flag `{}`", other))),
            }
        }
        if params.depth_output.is_some() && params.output.is_none() {
            return Err(Error::Arguments(
                "the depth view is only written by headless runs, pass `-o` with `-d`".to_string(),
            ));
        }
        return Ok(params);
    }
}

fn parse_number(flag: &str, value: &str) -> Result<u32> {
    return value
        .parse()
        .map_err(|_| Error::Arguments(format!("`{}` expects a number, got `{}`", flag, value)));
}

/// `<dir>/<stem><suffix>.tga` for a model at `<dir>/<stem>.obj`.
pub fn texture_path(model_path: &Path, slot: TextureSlot) -> PathBuf {
    let stem = model_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    return model_path.with_file_name(format!("{}{}.tga", stem, slot.file_suffix()));
}

/// Loads the mesh and whichever of its textures exist next to it.
pub fn load_renderer(params: &Params) -> Result<Renderer> {
    let mesh = Mesh::load(&params.model_path)?;
    let mut renderer = Renderer::new(mesh, params.settings.clone());
    for slot in TextureSlot::ALL {
        let path = texture_path(&params.model_path, slot);
        if !path.exists() {
            warn!(path = %path.display(), ?slot, "Texture not found, slot left unbound");
            continue;
        }
        renderer.set_texture(slot, Some(Texture::open(&path)?));
    }
    return Ok(renderer);
}

/// Key-driven changes to the running renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Exit,
    Shade(ShadingModel),
    ToggleWireframe,
}

impl Action {
    /// Returns `false` for `Exit`.
    pub fn apply(self, renderer: &mut Renderer) -> bool {
        match self {
            Action::Exit => return false,
            Action::Shade(model) => {
                info!(%model, "Shading model");
                renderer.set_shading_model(model);
            }
            Action::ToggleWireframe => {
                let mode = match renderer.settings().primitive {
                    PrimitiveMode::Wireframe => PrimitiveMode::Filled,
                    PrimitiveMode::Filled => PrimitiveMode::Wireframe,
                };
                info!(%mode, "Primitive mode");
                renderer.set_primitive_mode(mode);
            }
        }
        return true;
    }
}

/// Renders `params.frames` frames and writes the last one to disk.
pub fn render_to_file(params: &Params, renderer: &mut Renderer, output: &Path) -> Result<()> {
    let begin = Instant::now();
    for _ in 0..params.frames.max(1) {
        renderer.render(params.width, params.height)?;
        if params.print_fps {
            info!(fps = renderer.stats().fps(), "Frame");
        }
    }
    let stats = renderer.stats();
    info!(
        frames = params.frames.max(1),
        total_ms = begin.elapsed().as_secs_f64() * 1000.0,
        drawn = stats.drawn,
        culled = stats.culled,
        "Rendered"
    );

    renderer.frame().save(output)?;
    info!(path = %output.display(), "Saved frame");
    if let Some(depth_output) = &params.depth_output {
        renderer.frame().depth_image().save(depth_output)?;
        info!(path = %depth_output.display(), "Saved depth view");
    }
    return Ok(());
}

#[cfg(feature = "window")]
mod window {
    use std::time::Instant;

    use show_image::{create_window, event, ImageInfo, ImageView, WindowOptions};
    use tracing::info;

    use super::{Action, Params};
    use tiny_rasterizer::{Renderer, ShadingModel};

    /// Maps released keys to actions: Escape exits, 1-4 pick the shading
    /// model, W toggles wireframe.
    fn key_action(window_event: event::WindowEvent) -> Option<Action> {
        if let event::WindowEvent::KeyboardInput(event) = window_event {
            if !event.input.state.is_released() {
                return None;
            }
            return match event.input.key_code? {
                event::VirtualKeyCode::Escape => Some(Action::Exit),
                event::VirtualKeyCode::Key1 => Some(Action::Shade(ShadingModel::Unlit)),
                event::VirtualKeyCode::Key2 => Some(Action::Shade(ShadingModel::Diffuse)),
                event::VirtualKeyCode::Key3 => Some(Action::Shade(ShadingModel::Phong)),
                event::VirtualKeyCode::Key4 => Some(Action::Shade(ShadingModel::NormalMapped)),
                event::VirtualKeyCode::W => Some(Action::ToggleWireframe),
                _ => None,
            };
        }
        return None;
    }

    /// Launches the window and renders until Escape is released.
    pub fn run(params: &Params, renderer: &mut Renderer) -> Result<(), Box<dyn std::error::Error>> {
        let window_options = WindowOptions {
            size: Some([params.width, params.height]),
            ..Default::default()
        };
        let window = create_window("output", window_options)?;
        let event_channel = window.event_channel()?;

        let mut running = true;
        let mut frame_counter_time_begin = Instant::now();
        let mut frame_counter: u32 = 0;
        while running {
            let frame = renderer.render(params.width, params.height)?;
            let pixels = frame.to_rgba_bytes();
            let image = ImageView::new(ImageInfo::rgba8(frame.width(), frame.height()), &pixels);
            window.set_image("image", image)?;

            // Draining every event that piled up since the last frame.
            for window_event in event_channel.try_iter() {
                if let Some(action) = key_action(window_event) {
                    running &= action.apply(renderer);
                }
            }

            if params.print_fps {
                frame_counter += 1;
                let elapsed = frame_counter_time_begin.elapsed().as_secs_f32();
                if elapsed > 1.0 {
                    let stats = renderer.stats();
                    info!(
                        fps = frame_counter as f32 / elapsed,
                        drawn = stats.drawn,
                        culled = stats.culled,
                        fragments = stats.fragments,
                        "Frame rate"
                    );
                    frame_counter_time_begin = Instant::now();
                    frame_counter = 0;
                }
            }
        }
        return Ok(());
    }
}

/// Loads the assets and either renders headless to `params.output` or opens a window.
pub fn run(params: Params) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut renderer = load_renderer(&params)?;
    info!(
        width = params.width,
        height = params.height,
        shading = %params.settings.shading,
        primitive = %params.settings.primitive,
        "Renderer ready"
    );

    if let Some(output) = &params.output {
        render_to_file(&params, &mut renderer, output)?;
        return Ok(());
    }

    #[cfg(feature = "window")]
    return window::run(&params, &mut renderer);

    #[cfg(not(feature = "window"))]
    return Err(Error::Arguments(
        "built without the `window` feature, pass `-o <file.png>`".to_string(),
    )
    .into());
}
