//! Canvas 2D surface for the browser

use glam::Vec2;
use std::f64::consts::TAU;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::{DrawCommand, Surface};

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    size: Vec2,
    pixel_ratio: f64,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into()?;
        let pixel_ratio = web_sys::window()
            .map(|w| w.device_pixel_ratio())
            .unwrap_or(1.0)
            .max(1.0);

        let mut surface = Self {
            size: Vec2::new(canvas.client_width() as f32, canvas.client_height() as f32),
            canvas,
            ctx,
            pixel_ratio,
        };
        surface.resize(surface.size.x, surface.size.y);
        Ok(surface)
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Match the backing store to a CSS size, scaled for high-DPI screens
    pub fn resize(&mut self, width: f32, height: f32) {
        self.size = Vec2::new(width, height);
        let style = self.canvas.style();
        let _ = style.set_property("width", &format!("{}px", width));
        let _ = style.set_property("height", &format!("{}px", height));

        self.canvas
            .set_width((width as f64 * self.pixel_ratio) as u32);
        self.canvas
            .set_height((height as f64 * self.pixel_ratio) as u32);
        let _ = self
            .ctx
            .set_transform(self.pixel_ratio, 0.0, 0.0, self.pixel_ratio, 0.0, 0.0);
    }

    fn circle_path(&self, center: Vec2, radius: f32) {
        self.ctx.begin_path();
        let _ = self
            .ctx
            .arc(center.x as f64, center.y as f64, radius as f64, 0.0, TAU);
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn draw(&mut self, command: &DrawCommand) {
        match command {
            DrawCommand::Clear { color } => {
                self.ctx.set_fill_style_str(color);
                self.ctx
                    .fill_rect(0.0, 0.0, self.size.x as f64, self.size.y as f64);
            }
            DrawCommand::FillRect { pos, size, color } => {
                self.ctx.set_fill_style_str(color);
                self.ctx
                    .fill_rect(pos.x as f64, pos.y as f64, size.x as f64, size.y as f64);
            }
            DrawCommand::FillCircle {
                center,
                radius,
                color,
            } => {
                self.ctx.set_fill_style_str(color);
                self.circle_path(*center, *radius);
                self.ctx.fill();
            }
            DrawCommand::StrokeCircle {
                center,
                radius,
                color,
                line_width,
            } => {
                self.ctx.set_stroke_style_str(color);
                self.ctx.set_line_width(*line_width as f64);
                self.circle_path(*center, *radius);
                self.ctx.stroke();
            }
        }
    }
}
