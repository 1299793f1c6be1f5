//! Cluster color sets.
//!
//! Each cluster gets one subject color. The fills and strokes used by the
//! renderer are linear mixes of that subject into the dark canvas background,
//! so every member of a cluster shares the same derived set.

use serde::{Deserialize, Serialize};

/// Subject colors assigned to clusters in detection order.
pub const SUBJECT_COLORS: [&str; 11] = [
    "#5F95FF", "#61DDAA", "#65789B", "#F6BD16", "#7262FD", "#78D3F8", "#9661BC", "#F6903D",
    "#008685", "#F08BB4", "#F2F344",
];

/// Canvas background the subjects are mixed into.
pub const DARK_BACKGROUND: &str = "rgb(43, 47, 51)";

/// Derived colors for one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSet {
    /// The subject color itself.
    pub subject: String,
    /// Node body fill.
    pub main_fill: String,
    /// Node border.
    pub main_stroke: String,
    /// Fill when highlighted.
    pub highlight_fill: String,
    /// Border when active or selected.
    pub active_stroke: String,
}

impl ColorSet {
    /// Derive a color set from a subject color over `background`.
    ///
    /// Unparseable colors fall back to using the subject verbatim.
    pub fn from_subject(subject: &str, background: &str) -> Self {
        let (Some(fg), Some(bg)) = (parse_color(subject), parse_color(background)) else {
            return Self::flat(subject);
        };
        Self {
            subject: subject.to_string(),
            main_fill: mix(bg, fg, 0.2),
            main_stroke: mix(bg, fg, 0.8),
            highlight_fill: mix(bg, fg, 0.6),
            active_stroke: subject.to_string(),
        }
    }

    /// Every slot set to the same color.
    pub fn flat(color: &str) -> Self {
        Self {
            subject: color.to_string(),
            main_fill: color.to_string(),
            main_stroke: color.to_string(),
            highlight_fill: color.to_string(),
            active_stroke: color.to_string(),
        }
    }
}

/// Color sets for a list of subjects, cycled by index.
#[derive(Debug, Clone)]
pub struct Palette {
    sets: Vec<ColorSet>,
}

impl Palette {
    /// Build a palette from subject colors.
    pub fn new<S: AsRef<str>>(subjects: &[S], background: &str) -> Self {
        let mut sets: Vec<ColorSet> = subjects
            .iter()
            .map(|s| ColorSet::from_subject(s.as_ref(), background))
            .collect();
        if sets.is_empty() {
            sets.push(ColorSet::from_subject(SUBJECT_COLORS[0], background));
        }
        Self { sets }
    }

    /// Color set for the `i`-th cluster.
    pub fn get(&self, i: usize) -> &ColorSet {
        &self.sets[i % self.sets.len()]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(&SUBJECT_COLORS, DARK_BACKGROUND)
    }
}

fn parse_color(text: &str) -> Option<[f64; 3]> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix('#') {
        if !hex.is_ascii() {
            return None;
        }
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return None,
        };
        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
        return Some([channel(0)? as f64, channel(2)? as f64, channel(4)? as f64]);
    }
    let inner = text.strip_prefix("rgb(")?.strip_suffix(')')?;
    let mut parts = inner.split(',').map(|p| p.trim().parse::<f64>().ok());
    let r = parts.next()??;
    let g = parts.next()??;
    let b = parts.next()??;
    if parts.next().is_some() {
        return None;
    }
    Some([r, g, b])
}

fn mix(bg: [f64; 3], fg: [f64; 3], ratio: f64) -> String {
    let c = |i: usize| (bg[i] + (fg[i] - bg[i]) * ratio).round().clamp(0.0, 255.0) as u8;
    format!("rgb({}, {}, {})", c(0), c(1), c(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_subject_matches_reference_mix() {
        let set = ColorSet::from_subject("#5F95FF", DARK_BACKGROUND);
        assert_eq!(set.main_fill, "rgb(53, 67, 92)");
        assert_eq!(set.main_stroke, "rgb(85, 129, 214)");
        assert_eq!(set.active_stroke, "#5F95FF");
    }

    #[test]
    fn test_palette_cycles() {
        let palette = Palette::default();
        assert_eq!(palette.get(0), palette.get(SUBJECT_COLORS.len()));
        assert_ne!(palette.get(0), palette.get(1));
    }

    #[test]
    fn test_unparseable_subject_is_flat() {
        let set = ColorSet::from_subject("tomato", DARK_BACKGROUND);
        assert_eq!(set.main_fill, "tomato");
        assert_eq!(parse_color("#fff"), Some([255.0, 255.0, 255.0]));
    }
}
