//! Application event loop.
//!
//! [`run`] opens the window (or binds the page canvas), builds the GPU [`Context`], preloads the
//! planet textures and then hands every frame to the [`SceneDirector`]. Anything that finishes
//! asynchronously comes back through the event loop as a [`FlowEvent`]: on the web this is the
//! whole initialisation, on both platforms it is the label font and submitted label text.
//!
//! # Lifecycle Flow
//!
//! Each redraw:
//! 1. Feed the elapsed time into the director's fixed-step clock
//! 2. Apply the camera controller and tell the label where the eye is
//! 3. Turn a pending label request into a mesh (loading the font on first use)
//! 4. Batch the draw items into instance buffers and render them letterboxed
//! 5. Present the frame

use std::{fmt::Debug, iter, rc::Rc, sync::Arc};

use cgmath::EuclideanSpace;
use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    config::SceneConfig,
    context::Context,
    data_structures::texture::Texture,
    render::SceneRenderer,
    resources::{
        PlatformSource,
        font::{self, LabelFont},
        texture::{LoadError, TextureCache},
    },
    scene::director::SceneDirector,
};

/// Everything that only exists once the GPU is up and the textures are in.
#[derive(Debug)]
pub struct AppState {
    pub(crate) ctx: Context,
    director: SceneDirector,
    renderer: SceneRenderer,
    font: Option<Rc<LabelFont>>,
    font_requested: bool,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>, config: SceneConfig) -> anyhow::Result<Self> {
        let ctx = Context::new(window, &config).await?;

        let rule = config.clone();
        let cache = TextureCache::new(PlatformSource::new(config.asset_root.clone()))
            .with_settings(move |url| rule.texture_settings(url))
            .with_progress(|progress| {
                #[cfg(target_arch = "wasm32")]
                crate::web::show_progress(progress);
                #[cfg(not(target_arch = "wasm32"))]
                log::info!("loading textures: {:.0}%", progress);
            });

        if let Err(e) = cache.preload_all(&config.texture_urls()).await {
            // Failed maps are left out of their material; the scene still renders
            log::error!("{} ({:?})", e, e.urls());
        }
        #[cfg(target_arch = "wasm32")]
        crate::web::hide_loading();

        let textures = cache.ready().unwrap_or_default();
        let director = SceneDirector::new(&config, &textures);
        let renderer = SceneRenderer::new(
            &ctx.device,
            &ctx.queue,
            &ctx.material_bind_group_layout,
            director.materials(),
        );

        Ok(Self {
            ctx,
            director,
            renderer,
            font: None,
            font_requested: false,
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.is_surface_configured = true;
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            self.ctx.depth_texture = Texture::create_depth_texture(
                &self.ctx.device,
                [self.ctx.config.width, self.ctx.config.height],
                "depth_texture",
            );
        }
    }

    /// Builds the mesh for the latest label request. Returns `true` when the font still has
    /// to be loaded first; the request stays pending until then.
    fn update_label(&mut self) -> bool {
        let Some(font) = self.font.clone() else {
            return self.director.label().has_request() && !self.font_requested;
        };
        if let Some(text) = self.director.label_mut().take_request() {
            log::info!("building label {:?}", text);
            if self
                .renderer
                .set_label_mesh(&self.ctx.device, font.text_mesh(&text))
            {
                self.director.label_mut().show(text);
            } else {
                self.director.label_mut().hide();
            }
        }
        false
    }

    fn render(&mut self) -> Result<(), wgpu::CurrentSurfaceTexture> {
        // invoke main render loop
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let items = self.director.draw_items();
        self.renderer
            .prepare(&self.ctx.device, &self.ctx.queue, &items);

        let output = match self.ctx.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(t) | wgpu::CurrentSurfaceTexture::Suboptimal(t) => t,
            other => return Err(other),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            let (x, y, width, height) = self.ctx.viewport();
            if width < 1.0 || height < 1.0 {
                log::debug!("viewport collapsed, skipping draw");
            } else {
                render_pass.set_viewport(x, y, width, height, 0.0, 1.0);
                self.renderer.draw(&self.ctx, &mut render_pass);
            }
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        self.ctx.window.pre_present_notify();
        output.present();
        Ok(())
    }
}

pub(crate) enum FlowEvent {
    #[allow(dead_code)]
    Initialized(Box<AppState>),
    /// Text submitted for the floating label.
    #[allow(dead_code)]
    Text(String),
    FontLoaded(Result<LabelFont, LoadError>),
}

impl Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(_) => f.write_str("Initialized"),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::FontLoaded(result) => f
                .debug_tuple("FontLoaded")
                .field(&result.as_ref().map(|_| ()))
                .finish(),
        }
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<FlowEvent>,
    state: Option<AppState>,
    // Taken once the window exists
    config: Option<SceneConfig>,
    font_url: String,
    asset_root: String,
    #[cfg(not(target_arch = "wasm32"))]
    stdin_lines: std::sync::mpsc::Receiver<String>,
    last_time: Instant,
}

impl App {
    fn new(event_loop: &EventLoop<FlowEvent>, config: SceneConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy,
            state: None,
            font_url: config.font_url.clone(),
            asset_root: config.asset_root.clone(),
            config: Some(config),
            #[cfg(not(target_arch = "wasm32"))]
            stdin_lines: spawn_stdin_reader(),
            last_time: Instant::now(),
        })
    }

    /// Starts loading the label font; the result arrives as [`FlowEvent::FontLoaded`].
    fn request_font(&mut self) {
        if let Some(state) = &mut self.state {
            state.font_requested = true;
        }
        log::info!("loading font {}", self.font_url);
        let source = PlatformSource::new(self.asset_root.clone());
        let url = self.font_url.clone();
        let load = async move { font::load_font(&source, &url).await };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let result = self.async_runtime.block_on(load);
            if self.proxy.send_event(FlowEvent::FontLoaded(result)).is_err() {
                log::warn!("event loop closed before the font arrived");
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = load.await;
                if proxy.send_event(FlowEvent::FontLoaded(result)).is_err() {
                    log::warn!("event loop closed before the font arrived");
                }
            });
        }
    }

    fn submit_text(&mut self, text: &str) {
        let Some(state) = &mut self.state else {
            log::warn!("scene not ready, dropping label text");
            return;
        };
        state.director.submit_text(text);
    }
}

/// Native label input: every line typed on stdin becomes the label text.
#[cfg(not(target_arch = "wasm32"))]
fn spawn_stdin_reader() -> std::sync::mpsc::Receiver<String> {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        while matches!(stdin.read_line(&mut line), Ok(n) if n > 0) {
            if tx.send(std::mem::take(&mut line)).is_err() {
                break;
            }
        }
    });
    rx
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(config) = self.config.take() else {
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes()
            .with_title("carrot orbit")
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height()));

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;

            window_attributes = window_attributes.with_canvas(crate::web::canvas());
            crate::web::bind_label_input(self.proxy.clone());
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("cannot create a window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let init_future = AppState::new(window, config);

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok(app_state) => self.state = Some(app_state),
                Err(e) => {
                    log::error!("App initialization failed: {:#}", e);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match init_future.await {
                    Ok(app_state) => {
                        if proxy
                            .send_event(FlowEvent::Initialized(Box::new(app_state)))
                            .is_err()
                        {
                            log::error!("event loop closed during initialization");
                        }
                    }
                    Err(e) => log::error!("App initialization failed: {:#}", e),
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            FlowEvent::Initialized(state) => {
                // This is the message from our wasm `spawn_local`
                let mut state = *state;
                let size = state.ctx.window.inner_size();
                state.resize(size.width, size.height);
                state.ctx.window.request_redraw();
                self.state = Some(state);
                self.last_time = Instant::now();
            }
            FlowEvent::Text(text) => self.submit_text(&text),
            FlowEvent::FontLoaded(result) => {
                let Some(state) = &mut self.state else {
                    return;
                };
                match result {
                    Ok(font) => {
                        log::info!("font ready: {:?}", font);
                        state.font = Some(Rc::new(font));
                        state.update_label();
                    }
                    Err(e) => {
                        // Retry with the next submission
                        log::error!("{}", e);
                        state.font_requested = false;
                        state.director.label_mut().take_request();
                    }
                }
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            state.ctx.camera.controller.handle_mouse(dx, dy);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };

        state.ctx.camera.controller.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => state
                .director
                .set_blinking(button_state == ElementState::Pressed),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                state.director.advance(dt.as_secs_f32());

                state
                    .ctx
                    .camera
                    .controller
                    .update(&mut state.ctx.camera.camera, dt);
                state.ctx.write_camera();
                let eye = state.ctx.camera.camera.eye().to_vec();
                state.director.set_camera_eye(eye);

                #[cfg(not(target_arch = "wasm32"))]
                while let Ok(line) = self.stdin_lines.try_recv() {
                    state.director.submit_text(&line);
                }
                if state.update_label() {
                    self.request_font();
                }

                let Some(state) = &mut self.state else {
                    return;
                };
                match state.render() {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::CurrentSurfaceTexture::Lost | wgpu::CurrentSurfaceTexture::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {:?}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

pub fn run(config: SceneConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| anyhow::anyhow!("cannot initialise console logging: {}", e))?;
    }

    log::info!("starting with assets from {}", config.asset_root);
    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}
