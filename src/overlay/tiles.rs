use image::{imageops, RgbaImage};

/// Computes tile placement origins and composites a base tile bitmap into
/// a reusable offscreen buffer.
///
/// Positions are only recomputed when the target or tile size changes and
/// the buffer is only reallocated when the target size changes; both are
/// rebuilt wholesale on invalidation rather than patched.
#[derive(Debug)]
pub struct TileCompositor {
    positions: Vec<(u32, u32)>,
    last_target: Option<(u32, u32)>,
    last_tile: Option<(u32, u32)>,
    buffer: Option<RgbaImage>,
    recomputes: u64,
}

impl Default for TileCompositor {
    fn default() -> Self {
        Self::new()
    }
}

impl TileCompositor {
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            last_target: None,
            last_tile: None,
            buffer: None,
            recomputes: 0,
        }
    }

    /// Tile origins covering `[0, target.0) x [0, target.1)`, stepping by
    /// the tile dimensions, x-major. Memoized against the last size pair.
    pub fn positions(&mut self, target: (u32, u32), tile: (u32, u32)) -> &[(u32, u32)] {
        if self.last_target == Some(target) && self.last_tile == Some(tile) {
            return &self.positions;
        }

        self.positions.clear();
        if tile.0 > 0 && tile.1 > 0 {
            let mut x = 0;
            while x < target.0 {
                let mut y = 0;
                while y < target.1 {
                    self.positions.push((x, y));
                    y += tile.1;
                }
                x += tile.0;
            }
        }
        self.last_target = Some(target);
        self.last_tile = Some(tile);
        self.recomputes += 1;
        &self.positions
    }

    /// How many times the position list was actually rebuilt.
    pub fn recompute_count(&self) -> u64 {
        self.recomputes
    }

    /// Drop the memoized geometry so the next paint recomputes everything.
    /// Called on window resize.
    pub fn invalidate(&mut self) {
        self.last_target = None;
        self.last_tile = None;
        self.buffer = None;
    }

    /// Paint `tile` at every computed origin into an offscreen buffer of
    /// `target` size. Tiles overlapping the right/bottom edge are clipped
    /// by the buffer bounds.
    pub fn composite(&mut self, tile: &RgbaImage, target: (u32, u32)) -> &RgbaImage {
        if let Some(buf) = &self.buffer {
            if (buf.width(), buf.height()) != target {
                self.buffer = None;
            }
        }

        self.positions(target, (tile.width(), tile.height()));
        let buffer = self
            .buffer
            .get_or_insert_with(|| RgbaImage::new(target.0, target.1));
        for pixel in buffer.pixels_mut() {
            *pixel = image::Rgba([0, 0, 0, 0]);
        }
        for &(x, y) in &self.positions {
            imageops::overlay(buffer, tile, x as i64, y as i64);
        }
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::TileCompositor;
    use image::RgbaImage;

    #[test]
    fn positions_cover_full_hd_with_expected_grid() {
        let mut compositor = TileCompositor::new();
        let positions = compositor.positions((1920, 1080), (100, 50));

        assert_eq!(positions.len(), 20 * 22);
        assert_eq!(positions.first(), Some(&(0, 0)));
        assert_eq!(positions.last(), Some(&(1900, 1050)));
    }

    #[test]
    fn positions_are_memoized_for_unchanged_sizes() {
        let mut compositor = TileCompositor::new();
        compositor.positions((800, 600), (64, 64));
        assert_eq!(compositor.recompute_count(), 1);
        compositor.positions((800, 600), (64, 64));
        assert_eq!(compositor.recompute_count(), 1);
        compositor.positions((800, 600), (32, 64));
        assert_eq!(compositor.recompute_count(), 2);
    }

    #[test]
    fn invalidate_forces_a_recompute() {
        let mut compositor = TileCompositor::new();
        compositor.positions((800, 600), (64, 64));
        compositor.invalidate();
        compositor.positions((800, 600), (64, 64));
        assert_eq!(compositor.recompute_count(), 2);
    }

    #[test]
    fn zero_sized_tile_yields_no_positions() {
        let mut compositor = TileCompositor::new();
        assert!(compositor.positions((800, 600), (0, 10)).is_empty());
    }

    #[test]
    fn composite_fills_the_target_and_clips_edge_tiles() {
        let tile = RgbaImage::from_pixel(60, 60, image::Rgba([255, 0, 0, 255]));
        let mut compositor = TileCompositor::new();
        let buffer = compositor.composite(&tile, (100, 100));

        assert_eq!((buffer.width(), buffer.height()), (100, 100));
        // interior of the first tile and of a clipped edge tile
        assert_eq!(buffer.get_pixel(10, 10).0, [255, 0, 0, 255]);
        assert_eq!(buffer.get_pixel(99, 99).0, [255, 0, 0, 255]);
    }

    #[test]
    fn composite_reuses_the_buffer_for_a_stable_target() {
        let tile = RgbaImage::from_pixel(16, 16, image::Rgba([0, 255, 0, 255]));
        let mut compositor = TileCompositor::new();

        let first = compositor.composite(&tile, (64, 64)) as *const RgbaImage;
        let second = compositor.composite(&tile, (64, 64)) as *const RgbaImage;
        assert_eq!(first, second);
        assert_eq!(compositor.recompute_count(), 1);
    }
}
