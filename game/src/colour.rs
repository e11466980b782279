use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::generator::Rng;

pub const GHOST_ALPHA: f32 = 0.5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Default for Colour {
    fn default() -> Self {
        Self::RED
    }
}

impl Colour {
    pub const RED: Colour = Colour::rgb(255, 0, 0);
    pub const BLACK: Colour = Colour::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn named(name: &str) -> Self {
        match name {
            "red" => Self::rgb(255, 0, 0),
            "green" => Self::rgb(0, 255, 0),
            "blue" => Self::rgb(0, 0, 255),
            "cyan" => Self::rgb(0, 255, 255),
            "magenta" => Self::rgb(255, 0, 255),
            "yellow" => Self::rgb(255, 255, 0),
            _ => Self::BLACK,
        }
    }

    /// Corners of the RGB cube, minus black and white.
    pub fn palette() -> Vec<Colour> {
        (1u8..7)
            .map(|bits| {
                let channel = |mask: u8| if bits & mask != 0 { 255 } else { 0 };
                Self::rgb(channel(0b100), channel(0b010), channel(0b001))
            })
            .collect()
    }

    pub fn random(rng: &mut Rng) -> Self {
        let palette = Self::palette();
        palette[rng.next_below(palette.len() as u32) as usize]
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn ghost(self) -> Self {
        self.with_alpha(GHOST_ALPHA)
    }

    /// Scale the channels by `factor`; factors outside `[0, 1]` leave the colour as is.
    pub fn darken(self, factor: f32) -> Self {
        if !(0.0..=1.0).contains(&factor) {
            return self;
        }
        let scale = |c: u8| (c as f32 * factor).floor() as u8;
        Self {
            r: scale(self.r),
            g: scale(self.g),
            b: scale(self.b),
            a: self.a,
        }
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Colour {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || Error::InvalidColour(s.to_string());
        let inner = s
            .trim()
            .strip_prefix("rgba(")
            .or_else(|| s.trim().strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(bad)?;

        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return Err(bad());
        }
        let channel = |p: &str| p.parse::<u8>().map_err(|_| bad());
        let a = match parts.get(3) {
            Some(p) => p.parse::<f32>().map_err(|_| bad())?,
            None => 1.0,
        };
        Ok(Self::rgba(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?, a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_six_saturated_colours() {
        let palette = Colour::palette();
        assert_eq!(palette.len(), 6);
        assert!(!palette.contains(&Colour::BLACK));
        assert!(!palette.contains(&Colour::rgb(255, 255, 255)));
        assert!(palette.iter().all(|c| [c.r, c.g, c.b].contains(&255)));
    }

    #[test]
    fn display_and_parse_agree() {
        let c = Colour::named("cyan").ghost();
        assert_eq!(c.to_string(), "rgba(0, 255, 255, 0.5)");
        assert_eq!(c.to_string().parse::<Colour>().expect("parse"), c);
        assert_eq!("rgb(1, 2, 3)".parse::<Colour>().expect("parse"), Colour::rgb(1, 2, 3));
        assert!("hsl(1, 2, 3)".parse::<Colour>().is_err());
    }

    #[test]
    fn darken_ignores_out_of_range_factors() {
        let c = Colour::rgb(200, 100, 51);
        assert_eq!(c.darken(1.5), c);
        assert_eq!(c.darken(0.5), Colour::rgb(100, 50, 25));
    }

    #[test]
    fn unknown_names_fall_back_to_black() {
        assert_eq!(Colour::named("mauve"), Colour::BLACK);
    }
}
