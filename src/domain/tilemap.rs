/// Tile grid storage.
///
/// Cells are addressed two ways:
///   - tile space (`tile`, `set`, rectangles): used by level building
///   - pixel space (`TileQuery`): used by the physics probes
///
/// Anything outside the grid reads as Air and ignores writes.

use std::fmt;

use super::tile::{tile_index, TileKind, TileQuery, TILE_SIZE};

/// Axis-aligned rectangle in tile coordinates.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct TileRect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl TileRect {
    pub fn new(x: usize, y: usize, w: usize, h: usize) -> Self {
        TileRect { x, y, w, h }
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tilemap {
    width: usize,
    height: usize,
    cells: Vec<Vec<TileKind>>,
}

impl Tilemap {
    /// All-air grid of `width` x `height` tiles.
    pub fn new(width: usize, height: usize) -> Self {
        Tilemap { width, height, cells: vec![vec![TileKind::Air; width]; height] }
    }

    /// Build from equal-length rows of tile chars. Unknown chars become Air.
    #[cfg(test)]
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.chars().count());
        let mut map = Tilemap::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate().take(width) {
                map.cells[y][x] = TileKind::from_char(ch).unwrap_or_default();
            }
        }
        map
    }

    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }

    pub fn pixel_width(&self) -> i32 { self.width as i32 * TILE_SIZE }
    pub fn pixel_height(&self) -> i32 { self.height as i32 * TILE_SIZE }

    #[inline]
    pub fn tile(&self, tx: usize, ty: usize) -> TileKind {
        if tx < self.width && ty < self.height {
            self.cells[ty][tx]
        } else {
            TileKind::Air
        }
    }

    #[inline]
    pub fn set(&mut self, tx: usize, ty: usize, kind: TileKind) {
        if tx < self.width && ty < self.height {
            self.cells[ty][tx] = kind;
        }
    }

    /// Fill a rectangle, clipped to the grid.
    pub fn fill_rect(&mut self, rect: TileRect, kind: TileKind) {
        for ty in rect.y..rect.y + rect.h {
            for tx in rect.x..rect.x + rect.w {
                self.set(tx, ty, kind);
            }
        }
    }

    /// Copy a rectangle out of the grid, row-major. Cells outside the grid read as Air.
    pub fn read_rect(&self, rect: TileRect) -> Vec<Vec<TileKind>> {
        (rect.y..rect.y + rect.h)
            .map(|ty| (rect.x..rect.x + rect.w).map(|tx| self.tile(tx, ty)).collect())
            .collect()
    }

    /// Copy every cell inside `rect` from `other` (same dimensions assumed).
    pub fn restore_rect(&mut self, other: &Tilemap, rect: TileRect) {
        for ty in rect.y..rect.y + rect.h {
            for tx in rect.x..rect.x + rect.w {
                self.set(tx, ty, other.tile(tx, ty));
            }
        }
    }

    /// Bounding box of all tiles of `kind`, or None if there are none.
    pub fn bounding_box(&self, kind: TileKind) -> Option<TileRect> {
        let mut min = (usize::MAX, usize::MAX);
        let mut max = (0, 0);
        let mut found = false;
        for (ty, row) in self.cells.iter().enumerate() {
            for (tx, &cell) in row.iter().enumerate() {
                if cell == kind {
                    found = true;
                    min = (min.0.min(tx), min.1.min(ty));
                    max = (max.0.max(tx), max.1.max(ty));
                }
            }
        }
        found.then(|| TileRect::new(min.0, min.1, max.0 - min.0 + 1, max.1 - min.1 + 1))
    }

    /// Pixel → tile index, None when outside the grid.
    fn cell_index(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        let tx = tile_index(x);
        let ty = tile_index(y);
        if tx < 0 || ty < 0 || tx as usize >= self.width || ty as usize >= self.height {
            return None;
        }
        Some((tx as usize, ty as usize))
    }
}

/// One line per row, in the level file legend.
impl fmt::Display for Tilemap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            let line: String = row.iter().map(|t| t.to_char()).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

impl TileQuery for Tilemap {
    fn tile_at(&self, x: i32, y: i32) -> TileKind {
        match self.cell_index(x, y) {
            Some((tx, ty)) => self.cells[ty][tx],
            None => TileKind::Air,
        }
    }

    fn set_tile(&mut self, x: i32, y: i32, kind: TileKind) {
        if let Some((tx, ty)) = self.cell_index(x, y) {
            self.cells[ty][tx] = kind;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_queries_hit_the_containing_tile() {
        let map = Tilemap::from_rows(&["_#", "S_"]);
        assert_eq!(map.tile_at(16, 0), TileKind::Solid);
        assert_eq!(map.tile_at(31, 15), TileKind::Solid);
        assert_eq!(map.tile_at(0, 16), TileKind::Sand);
        assert!(map.is_solid(20, 4));
        assert!(!map.is_solid(4, 20));
        assert!(map.is_solid_or_soft(4, 20));
    }

    #[test]
    fn out_of_range_reads_are_air() {
        let map = Tilemap::from_rows(&["##", "##"]);
        assert_eq!(map.tile_at(-1, 0), TileKind::Air);
        assert_eq!(map.tile_at(0, -1), TileKind::Air);
        assert_eq!(map.tile_at(32, 0), TileKind::Air);
        assert_eq!(map.tile_at(0, 32), TileKind::Air);
        assert!(!map.is_solid(-100, -100));
    }

    #[test]
    fn out_of_range_writes_are_ignored() {
        let mut map = Tilemap::from_rows(&["__"]);
        let before = map.clone();
        map.set_tile(-5, 0, TileKind::Solid);
        map.set_tile(100, 0, TileKind::Solid);
        map.set_tile(0, 16, TileKind::Solid);
        assert_eq!(map, before);
    }

    #[test]
    fn set_then_read_returns_written_kind() {
        let mut map = Tilemap::new(4, 4);
        map.set_tile(40, 50, TileKind::Sand);
        assert_eq!(map.tile_at(40, 50), TileKind::Sand);
        assert_eq!(map.tile(2, 3), TileKind::Sand);
    }

    #[test]
    fn rectangles_fill_and_read() {
        let mut map = Tilemap::new(5, 4);
        map.fill_rect(TileRect::new(1, 1, 3, 2), TileKind::Sand);
        let rows = map.read_rect(TileRect::new(0, 1, 5, 1));
        assert_eq!(rows, vec![vec![
            TileKind::Air, TileKind::Sand, TileKind::Sand, TileKind::Sand, TileKind::Air,
        ]]);
        assert_eq!(map.bounding_box(TileKind::Sand), Some(TileRect::new(1, 1, 3, 2)));
        assert_eq!(map.bounding_box(TileKind::Solid), None);
    }

    #[test]
    fn fill_is_clipped_to_grid() {
        let mut map = Tilemap::new(2, 2);
        map.fill_rect(TileRect::new(1, 1, 10, 10), TileKind::Solid);
        assert_eq!(map.tile(1, 1), TileKind::Solid);
        assert_eq!(map.tile(0, 0), TileKind::Air);
    }

    #[test]
    fn display_uses_level_legend() {
        let map = Tilemap::from_rows(&["#S", "._"]);
        assert_eq!(map.to_string(), "#S\n__\n");
    }

    #[test]
    fn restore_rect_only_touches_rect() {
        let base = Tilemap::from_rows(&["SSS", "SSS"]);
        let mut map = Tilemap::new(3, 2);
        map.restore_rect(&base, TileRect::new(1, 0, 2, 1));
        assert_eq!(map.tile(0, 0), TileKind::Air);
        assert_eq!(map.tile(1, 0), TileKind::Sand);
        assert_eq!(map.tile(2, 0), TileKind::Sand);
        assert_eq!(map.tile(1, 1), TileKind::Air);
    }
}
