// Shared fixtures for encoder integration tests.
#![allow(dead_code)]

use std::io::{self, Cursor, Seek, SeekFrom, Write};

use pixel_upscale::surface::{Palette, PixelFormat, Surface};

/// Seekable in-memory sink that accepts at most `budget` bytes in total.
///
/// Once the budget is exhausted, writes report fewer bytes than requested.
pub struct BudgetSink {
    inner: Cursor<Vec<u8>>,
    budget: usize,
    accepted: usize,
}

impl BudgetSink {
    pub fn new(budget: usize) -> Self {
        Self {
            inner: Cursor::new(Vec::new()),
            budget,
            accepted: 0,
        }
    }

    pub fn unlimited() -> Self {
        Self::new(usize::MAX)
    }

    pub fn bytes(&self) -> &[u8] {
        self.inner.get_ref()
    }

    pub fn tell(&mut self) -> u64 {
        self.inner.stream_position().expect("cursor position")
    }
}

impl Write for BudgetSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = buf.len().min(self.budget - self.accepted);
        let n = self.inner.write(&buf[..n])?;
        self.accepted += n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for BudgetSink {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

/// Sink whose writes always fail with an I/O error.
pub struct BrokenSink {
    pub position: u64,
}

impl Write for BrokenSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::other("device unplugged"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for BrokenSink {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        if let SeekFrom::Start(p) = pos {
            self.position = p;
        }
        Ok(self.position)
    }
}

/// Uniform `argb8888` surface.
pub fn uniform_argb(width: u32, height: u32, argb: u32) -> Surface {
    let pixels = vec![argb; (width * height) as usize];
    Surface::from_argb(width, height, &pixels).expect("uniform surface")
}

/// Deterministic pseudo-random `argb8888` surface (compresses poorly).
pub fn noise_argb(width: u32, height: u32, seed: u32) -> Surface {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    let pixels: Vec<u32> = (0..width * height)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            state
        })
        .collect();
    Surface::from_argb(width, height, &pixels).expect("noise surface")
}

/// 2x2 indexed surface: index 0 (dark grey) is the colour key.
///
/// Layout:
///   0 1
///   1 2
pub fn keyed_palette_2x2() -> (Surface, Vec<[u8; 3]>) {
    let colors = vec![[40, 40, 40], [200, 200, 200], [120, 120, 120]];
    let palette = Palette::new(colors.clone()).expect("palette");
    let mut surface = Surface::new(2, 2, PixelFormat::indexed8(palette)).expect("surface");
    surface.put_pixel(0, 0, 0);
    surface.put_pixel(1, 0, 1);
    surface.put_pixel(0, 1, 1);
    surface.put_pixel(1, 1, 2);
    surface.set_color_key(Some(0));
    (surface, colors)
}
