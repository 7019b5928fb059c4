use crate::common::{config::Config, surface::Surface};
use anyhow::Context;
use std::{
    num::NonZeroU32,
    sync::atomic::{AtomicBool, Ordering},
};
use winit::{
    dpi::PhysicalSize,
    event::{Event, WindowEvent},
    event_loop::EventLoopBuilder,
};

/// Mirrors `surface` into a desktop window until the window is closed, then
/// raises `quit`.
pub fn winit_window_loop(
    config: &Config,
    surface: &Surface,
    quit: &AtomicBool,
) -> anyhow::Result<()> {
    let event_loop = EventLoopBuilder::new()
        .build()
        .context("Failed to init event loop")?;
    let window = winit::window::WindowBuilder::new()
        .with_inner_size(PhysicalSize::new(
            config.screen.width as u32,
            config.screen.height as u32,
        ))
        .with_title("fbconsole preview")
        .build(&event_loop)
        .context("Failed to create window")?;
    let window_ctx = softbuffer::Context::new(&window)
        .map_err(|e| anyhow::anyhow!("Failed to initialize softbuffer: {e}"))?;
    let mut window_surface = softbuffer::Surface::new(&window_ctx, &window)
        .map_err(|e| anyhow::anyhow!("Failed to create surface: {e}"))?;

    event_loop
        .run(|event, target| {
            let Event::WindowEvent { event, window_id } = event else {
                return;
            };
            if window_id != window.id() {
                return;
            }
            match event {
                WindowEvent::CloseRequested => {
                    tracing::info!("preview window closed");
                    quit.store(true, Ordering::Relaxed);
                    target.exit();
                }
                WindowEvent::RedrawRequested => {
                    let PhysicalSize {
                        width: window_width,
                        height: window_height,
                    } = window.inner_size();
                    let (Some(w), Some(h)) =
                        (NonZeroU32::new(window_width), NonZeroU32::new(window_height))
                    else {
                        return;
                    };
                    if let Err(e) = window_surface.resize(w, h) {
                        tracing::warn!("preview resize failed: {e}");
                        return;
                    }
                    let mut buffer = match window_surface.buffer_mut() {
                        Ok(buffer) => buffer,
                        Err(e) => {
                            tracing::warn!("preview buffer unavailable: {e}");
                            return;
                        }
                    };

                    buffer.fill(0);
                    surface.scanout(&mut buffer, window_width as usize, window_height as usize);

                    window.pre_present_notify();
                    if let Err(e) = buffer.present() {
                        tracing::warn!("preview present failed: {e}");
                    }
                    window.request_redraw();
                }
                _ => {}
            }
        })
        .context("Event loop")
}
