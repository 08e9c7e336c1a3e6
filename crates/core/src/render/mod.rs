use std::fmt;

use crate::{
    cache::{BarSurface, SurfaceCache},
    config::{Rgb, ScopeConfig},
    diff::BarDelta,
};

pub mod font;

pub use font::GlyphFont;

use font::GLYPH_ADVANCE;

/// Separator placed between status line entries.
const STATUS_SEPARATOR: &str = "     -     ";

/// RGBA8 framebuffer the pipeline composes into. Layout matches what the
/// `pixels` crate expects for its frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    width: u32,
    height: u32,
    frame: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = self.offset(x, y);
        self.frame[offset..offset + 4].try_into().ok()
    }

    pub fn fill(&mut self, color: Rgb) {
        let rgba = color.rgba();
        for pixel in self.frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&rgba);
        }
    }

    /// Copies `surface` with its top-left corner at `(x, y)`. Whatever falls
    /// outside the canvas is clipped.
    pub fn blit(&mut self, surface: &BarSurface, x: i64, y: i64) {
        let (src_w, src_h) = (surface.width() as i64, surface.height() as i64);
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + src_w).min(self.width as i64);
        let y1 = (y + src_h).min(self.height as i64);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let span = (x1 - x0) as usize * 4;
        let src = surface.pixels();
        for row in y0..y1 {
            let src_offset = (((row - y) * src_w + (x0 - x)) * 4) as usize;
            let dst_offset = self.offset(x0 as u32, row as u32);
            self.frame[dst_offset..dst_offset + span]
                .copy_from_slice(&src[src_offset..src_offset + span]);
        }
    }

    /// Draws `text` on a single line starting at `(x, y)`.
    pub fn draw_text(&mut self, font: &GlyphFont, text: &str, x: u32, y: u32, color: Rgb) {
        let rgba = color.rgba();
        let mut pen = x;
        for c in text.chars() {
            if pen >= self.width {
                break;
            }
            if let Some(rows) = font.glyph(c) {
                for (dy, bits) in rows.iter().enumerate() {
                    for dx in 0..5 {
                        if bits & (0b10000 >> dx) != 0 {
                            self.put(pen + dx, y + dy as u32, rgba);
                        }
                    }
                }
            }
            pen += GLYPH_ADVANCE;
        }
    }

    fn put(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x < self.width && y < self.height {
            let offset = self.offset(x, y);
            self.frame[offset..offset + 4].copy_from_slice(&rgba);
        }
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }
}

/// Width in pixels of each bar when `count` bars share `width`.
pub fn bar_thickness(width: u32, count: usize) -> u32 {
    if count == 0 {
        return 0;
    }
    (width as u64 / count as u64) as u32
}

/// Rescales `values` linearly into `[height / 10, height - 12]`, keeping
/// their relative order.
pub fn normalize(values: &[u32], height: u32) -> Vec<u32> {
    let (Some(&min), Some(&max)) = (values.iter().min(), values.iter().max()) else {
        return Vec::new();
    };

    let target_min = height as f64 / 10.0;
    let target_max = (height as f64 - 12.0).max(target_min);
    if min == max {
        return vec![target_max.round() as u32; values.len()];
    }

    let span = (max - min) as f64;
    values
        .iter()
        .map(|&value| {
            let t = (value - min) as f64 / span;
            (t * (target_max - target_min) + target_min).round() as u32
        })
        .collect()
}

/// Metrics shown in the status line; `None` entries are hidden.
#[derive(Debug, Clone, Default)]
pub struct StatusLine {
    pub algorithm: Option<String>,
    pub iterations: Option<u64>,
    pub elapsed: Option<f64>,
    pub rate: Option<f64>,
    pub array_len: usize,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(5);
        if let Some(name) = &self.algorithm {
            parts.push(format!("Algorithm: {name}"));
        }
        if let Some(calls) = self.iterations {
            parts.push(format!("Calls: {calls}"));
        }
        if let Some(elapsed) = self.elapsed {
            parts.push(format!("Time elapsed: {elapsed:.6}"));
        }
        if let Some(rate) = self.rate {
            parts.push(format!("Rate: {rate:.6}"));
        }
        parts.push(format!("ArrayLength: {}", self.array_len));
        f.write_str(&parts.join(STATUS_SEPARATOR))
    }
}

/// Draws background, status text and bars, and flashes individual bars.
#[derive(Debug, Clone)]
pub struct RenderPipeline {
    background: Rgb,
    bar_color: Rgb,
    highlight_color: Rgb,
    text_color: Rgb,
    completion_color: Rgb,
    font: Option<GlyphFont>,
}

impl RenderPipeline {
    pub fn new(config: &ScopeConfig) -> Self {
        Self {
            background: config.background,
            bar_color: config.bar_color,
            highlight_color: config.highlight_color,
            text_color: Rgb::GREEN,
            completion_color: Rgb::GREEN,
            font: Some(GlyphFont),
        }
    }

    pub fn bar_color(&self) -> Rgb {
        self.bar_color
    }

    pub fn highlight_color(&self) -> Rgb {
        self.highlight_color
    }

    pub fn completion_color(&self) -> Rgb {
        self.completion_color
    }

    /// Draws a full frame: background, the status line, then every bar in
    /// the normal bar colour.
    pub fn compose(
        &self,
        canvas: &mut Canvas,
        surfaces: &mut SurfaceCache,
        bars: &[BarDelta],
        thickness: u32,
        status: &StatusLine,
    ) {
        canvas.fill(self.background);
        if let Some(font) = &self.font {
            canvas.draw_text(font, &status.to_string(), 0, 0, self.text_color);
        }
        for bar in bars {
            self.paint(canvas, surfaces, bar, thickness, self.bar_color);
        }
    }

    /// Redraws a single bar in `color`.
    pub fn paint(
        &self,
        canvas: &mut Canvas,
        surfaces: &mut SurfaceCache,
        bar: &BarDelta,
        thickness: u32,
        color: Rgb,
    ) {
        let surface = surfaces.get_or_create(bar.value, thickness);
        surface.fill(color);
        let x = bar.index as i64 * thickness as i64;
        let y = canvas.height() as i64 - bar.value as i64;
        canvas.blit(surface, x, y);
    }

    /// Drops the font handle.
    pub fn release_font(&mut self) {
        self.font = None;
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(values: &[u32]) -> Vec<BarDelta> {
        values
            .iter()
            .enumerate()
            .map(|(index, &value)| BarDelta {
                index,
                value,
                changed: false,
            })
            .collect()
    }

    #[test]
    fn thickness_never_overflows_width() {
        for width in [10, 99, 500, 1000] {
            for count in 1..=1200usize {
                assert!(bar_thickness(width, count) as usize * count <= width as usize);
            }
        }
        assert_eq!(bar_thickness(1000, 3), 333);
        assert_eq!(bar_thickness(1000, 0), 0);
    }

    #[test]
    fn normalize_maps_into_target_band_in_order() {
        let height = 500;
        let values = [900, 20, 4_000, 1_500, 20, 730];
        let scaled = normalize(&values, height);

        assert!(scaled.iter().all(|&v| (50..=488).contains(&v)));
        assert_eq!(scaled[1], 50);
        assert_eq!(scaled[2], 488);
        for i in 0..values.len() {
            for j in 0..values.len() {
                if values[i] < values[j] {
                    assert!(scaled[i] <= scaled[j], "order broken at {i}, {j}");
                }
            }
        }
    }

    #[test]
    fn normalize_handles_degenerate_input() {
        assert!(normalize(&[], 100).is_empty());
        assert_eq!(normalize(&[700, 700], 100), vec![88, 88]);
    }

    #[test]
    fn blit_clips_to_canvas() {
        let mut canvas = Canvas::new(10, 10);
        let mut surface = BarSurface::new(4, 20);
        surface.fill(Rgb::WHITE);

        canvas.blit(&surface, 8, -5);
        assert_eq!(canvas.pixel(9, 0), Some(Rgb::WHITE.rgba()));
        assert_eq!(canvas.pixel(7, 0), Some([0, 0, 0, 0]));
        canvas.blit(&surface, 20, 0);
    }

    #[test]
    fn compose_draws_bars_from_the_bottom() {
        let config = ScopeConfig {
            width: 30,
            height: 40,
            ..Default::default()
        };
        let pipeline = RenderPipeline::new(&config);
        let mut canvas = Canvas::new(30, 40);
        let mut surfaces = SurfaceCache::new();

        pipeline.compose(
            &mut canvas,
            &mut surfaces,
            &bars(&[10, 20, 30]),
            10,
            &StatusLine::default(),
        );

        let white = Rgb::WHITE.rgba();
        let black = Rgb::BLACK.rgba();
        assert_eq!(canvas.pixel(5, 39), Some(white));
        assert_eq!(canvas.pixel(5, 30), Some(white));
        assert_eq!(canvas.pixel(5, 29), Some(black));
        assert_eq!(canvas.pixel(25, 10), Some(white));
        assert_eq!(surfaces.len(), 3);
    }

    #[test]
    fn status_line_joins_enabled_entries() {
        let status = StatusLine {
            algorithm: Some("Bubble sort".to_string()),
            iterations: Some(42),
            elapsed: None,
            rate: None,
            array_len: 7,
        };
        assert_eq!(
            status.to_string(),
            "Algorithm: Bubble sort     -     Calls: 42     -     ArrayLength: 7"
        );
    }
}
