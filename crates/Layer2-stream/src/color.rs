//! Deterministic per-source colors.

use crossterm::style::{Color, StyledContent, Stylize};

/// Palette sources are spread over
pub const PALETTE: [Color; 6] = [
    Color::Blue,
    Color::Cyan,
    Color::Green,
    Color::Magenta,
    Color::Red,
    Color::Yellow,
];

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1. Stable across runs and toolchains, unlike `DefaultHasher`.
fn fnv1_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        hash.wrapping_mul(FNV_PRIME) ^ u32::from(*byte)
    })
}

/// Color assigned to a source name
pub fn color_of(name: &str) -> Color {
    PALETTE[(fnv1_32(name.as_bytes()) % PALETTE.len() as u32) as usize]
}

/// Source name wrapped in its color
pub fn colorize(name: &str) -> StyledContent<&str> {
    name.with(color_of(name))
}
