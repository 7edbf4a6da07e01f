/// Tile kinds and the narrow terrain query surface the physics consumes.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

/// Edge length of a tile, in pixels.
pub const TILE_SIZE: i32 = 16;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum TileKind {
    #[default]
    Air,
    Solid, // Impassable
    Sand,  // Soft: stand on it from above, dig it out
}

impl TileKind {
    /// Blocks movement from every direction.
    pub fn is_solid(self) -> bool {
        matches!(self, TileKind::Solid)
    }

    /// Diggable terrain.
    pub fn is_soft(self) -> bool {
        matches!(self, TileKind::Sand)
    }

    pub fn is_solid_or_soft(self) -> bool {
        self.is_solid() || self.is_soft()
    }

    pub fn from_char(c: char) -> Option<TileKind> {
        match c {
            '#' => Some(TileKind::Solid),
            'S' => Some(TileKind::Sand),
            '_' | '.' | ' ' => Some(TileKind::Air),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            TileKind::Air => '_',
            TileKind::Solid => '#',
            TileKind::Sand => 'S',
        }
    }
}

/// Pixel-addressed terrain access.
///
/// Out-of-range reads classify as `Air`; out-of-range writes are ignored.
/// Implementors only provide the raw read/write, the classifications
/// are derived here.
pub trait TileQuery {
    fn tile_at(&self, x: i32, y: i32) -> TileKind;

    fn set_tile(&mut self, x: i32, y: i32, kind: TileKind);

    fn is_solid(&self, x: i32, y: i32) -> bool {
        self.tile_at(x, y).is_solid()
    }

    fn is_solid_or_soft(&self, x: i32, y: i32) -> bool {
        self.tile_at(x, y).is_solid_or_soft()
    }
}

/// Tile index containing pixel coordinate `p` (floor division).
#[inline]
pub fn tile_index(p: i32) -> i32 {
    p.div_euclid(TILE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sand_is_soft_not_solid() {
        assert!(TileKind::Sand.is_soft());
        assert!(!TileKind::Sand.is_solid());
        assert!(TileKind::Sand.is_solid_or_soft());
    }

    #[test]
    fn air_blocks_nothing() {
        assert!(!TileKind::Air.is_solid_or_soft());
    }

    #[test]
    fn chars_round_trip() {
        for kind in [TileKind::Air, TileKind::Solid, TileKind::Sand] {
            assert_eq!(TileKind::from_char(kind.to_char()), Some(kind));
        }
        assert_eq!(TileKind::from_char('?'), None);
    }

    #[test]
    fn tile_index_floors_negative_pixels() {
        assert_eq!(tile_index(0), 0);
        assert_eq!(tile_index(15), 0);
        assert_eq!(tile_index(16), 1);
        assert_eq!(tile_index(-1), -1);
    }
}
