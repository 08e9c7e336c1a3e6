//! Value-keyed memoization of tones and bar surfaces. Entries live until the
//! owning session releases them.

use std::collections::{btree_map::Entry, BTreeMap, HashMap};

use crate::{config::Rgb, synth::WaveformSynthesizer, Result};

/// PCM tones keyed by the value (Hz) they sonify.
#[derive(Debug)]
pub struct WaveformCache {
    synth: WaveformSynthesizer,
    duration: f64,
    tones: BTreeMap<u32, Vec<u8>>,
    syntheses: usize,
}

impl WaveformCache {
    pub fn new(synth: WaveformSynthesizer, duration: f64) -> Self {
        Self {
            synth,
            duration,
            tones: BTreeMap::new(),
            syntheses: 0,
        }
    }

    /// Returns the tone for `value`, synthesizing it on first use.
    pub fn get_or_create(&mut self, value: u32) -> Result<&[u8]> {
        match self.tones.entry(value) {
            Entry::Occupied(entry) => Ok(entry.into_mut().as_slice()),
            Entry::Vacant(entry) => {
                let tone = self.synth.tone(self.duration, f64::from(value))?;
                self.syntheses += 1;
                Ok(entry.insert(tone).as_slice())
            }
        }
    }

    /// Synthesizes every value not cached yet and returns the full mapping.
    /// Progress is logged roughly every tenth of the input.
    pub fn populate(&mut self, values: &[u32]) -> Result<&BTreeMap<u32, Vec<u8>>> {
        let interval = ((values.len() as f64 / 10.0).round() as usize).max(1);
        for (index, value) in values.iter().enumerate() {
            if index % interval == 0 {
                tracing::debug!(processed = index, total = values.len(), "preprocessing tones");
            }
            self.get_or_create(*value)?;
        }
        tracing::debug!(entries = self.tones.len(), "preprocessing complete");
        Ok(&self.tones)
    }

    pub fn tones(&self) -> &BTreeMap<u32, Vec<u8>> {
        &self.tones
    }

    /// How many tones were actually synthesized (cache misses).
    pub fn syntheses(&self) -> usize {
        self.syntheses
    }

    pub fn len(&self) -> usize {
        self.tones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tones.is_empty()
    }

    pub fn clear(&mut self) {
        self.tones.clear();
    }
}

/// Owned RGBA block of `width × height` pixels drawn for a single bar.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    color: Option<Rgb>,
}

impl BarSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
            color: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Colour of the last fill, if any.
    pub fn color(&self) -> Option<Rgb> {
        self.color
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn fill(&mut self, color: Rgb) {
        let rgba = color.rgba();
        for pixel in self.pixels.chunks_exact_mut(4) {
            pixel.copy_from_slice(&rgba);
        }
        self.color = Some(color);
    }

    fn resize_width(&mut self, width: u32) {
        self.width = width;
        self.pixels
            .resize(width as usize * self.height as usize * 4, 0);
        self.color = None;
    }
}

/// Bar surfaces keyed by bar height. Colour is not part of the key; callers
/// refill a surface before every blit.
#[derive(Debug, Default)]
pub struct SurfaceCache {
    surfaces: HashMap<u32, BarSurface>,
    allocations: usize,
}

impl SurfaceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the surface for a bar of height `value`. A cached surface
    /// whose width no longer matches `thickness` is resized in place.
    pub fn get_or_create(&mut self, value: u32, thickness: u32) -> &mut BarSurface {
        let allocations = &mut self.allocations;
        let surface = self.surfaces.entry(value).or_insert_with(|| {
            *allocations += 1;
            BarSurface::new(thickness, value)
        });
        if surface.width() != thickness {
            surface.resize_width(thickness);
        }
        surface
    }

    pub fn contains(&self, value: u32) -> bool {
        self.surfaces.contains_key(&value)
    }

    /// How many surfaces were allocated (cache misses).
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn clear(&mut self) {
        self.surfaces.clear();
    }
}
