//! Display color assignment for active documents.

use rand::Rng;

/// Percentage applied to each channel when deriving a border shade.
pub const BORDER_SHADE_PERCENT: i32 = -25;

/// A random `#rrggbb` display color. Assignment is random by design;
/// a document keeps its color only for as long as it stays in the store.
pub fn random_color() -> String {
    let mut rng = rand::rng();
    format!("#{:06x}", rng.random_range(0..0x100_0000u32))
}

/// Shifts each channel of a `#rrggbb` color by `percent`, clamping to the
/// channel range. Malformed input passes through unchanged.
pub fn shade_color(color: &str, percent: i32) -> String {
    let Some(hex) = color.strip_prefix('#') else {
        return color.to_string();
    };
    if hex.len() != 6 {
        return color.to_string();
    }

    let mut shifted = String::from("#");
    for i in 0..3 {
        let Some(pair) = hex.get(i * 2..i * 2 + 2) else {
            return color.to_string();
        };
        let Ok(channel) = u8::from_str_radix(pair, 16) else {
            return color.to_string();
        };
        let value = (channel as i32 * (100 + percent) / 100).clamp(0, 255);
        shifted.push_str(&format!("{value:02x}"));
    }
    shifted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shade_darkens_each_channel_by_a_quarter() {
        assert_eq!(shade_color("#808080", BORDER_SHADE_PERCENT), "#606060");
        assert_eq!(shade_color("#ffffff", BORDER_SHADE_PERCENT), "#bfbfbf");
        assert_eq!(shade_color("#000000", BORDER_SHADE_PERCENT), "#000000");
    }

    #[test]
    fn shade_passes_malformed_input_through() {
        assert_eq!(shade_color("red", BORDER_SHADE_PERCENT), "red");
        assert_eq!(shade_color("#ggg", BORDER_SHADE_PERCENT), "#ggg");
        // 6 bytes but not 6 hex digits: multibyte characters land on
        // slice boundaries and must pass through, not panic.
        assert_eq!(shade_color("#ab\u{e9}cd", BORDER_SHADE_PERCENT), "#ab\u{e9}cd");
        assert_eq!(shade_color("#\u{e9}\u{e9}\u{e9}", BORDER_SHADE_PERCENT), "#\u{e9}\u{e9}\u{e9}");
    }

    #[test]
    fn random_colors_are_well_formed() {
        for _ in 0..32 {
            let color = random_color();
            assert_eq!(color.len(), 7);
            assert!(color.starts_with('#'));
            assert!(u32::from_str_radix(&color[1..], 16).is_ok());
        }
    }
}
