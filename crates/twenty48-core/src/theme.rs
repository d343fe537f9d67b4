//! Tile colours for renderers.

/// Background for tiles beyond the 2048 palette
pub const FALLBACK_TILE_COLOR: u32 = 0x3C3A32;

/// Background colour for empty cells
pub const EMPTY_CELL_COLOR: u32 = 0xCDC1B4;

/// Get hex colour code for a tile value
pub fn tile_color(value: u32) -> u32 {
    match value {
        0 => EMPTY_CELL_COLOR,
        2 => 0xEEE4DA,
        4 => 0xEDE0C8,
        8 => 0xF2B179,
        16 => 0xF59563,
        32 => 0xF67C5F,
        64 => 0xF65E3B,
        128 => 0xEDCF72,
        256 => 0xEDCC61,
        512 => 0xEDC850,
        1024 => 0xEDC53F,
        2048 => 0xEDC22E,
        _ => FALLBACK_TILE_COLOR,
    }
}

/// CSS form of `tile_color`, e.g. `#eee4da`
pub fn tile_color_css(value: u32) -> String {
    format!("#{:06x}", tile_color(value))
}
