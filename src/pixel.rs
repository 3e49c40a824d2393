use crate::config::MutationRates;
use crate::random::random_int_between;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Colour channel. Doubles as the predation signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    /// Also the tie-break priority for `Pixel::dominant_channel`.
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    /// The channel that eats this one: red -> blue -> green -> red.
    pub const fn predator(self) -> Channel {
        match self {
            Channel::Red => Channel::Blue,
            Channel::Green => Channel::Red,
            Channel::Blue => Channel::Green,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

const MAX_INTENSITY: i32 = 255;

/// Three-channel intensity value. `alive` only records where the pixel came from
/// (an organism body rather than food) and plays no part in predation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pixel {
    pub red: u32,
    pub green: u32,
    pub blue: u32,
    pub alive: bool,
}

impl Pixel {
    pub const fn new(red: u32, green: u32, blue: u32, alive: bool) -> Self {
        Pixel {
            red,
            green,
            blue,
            alive,
        }
    }

    /// A pixel with `intensity` on a single channel and zero elsewhere.
    pub fn single(channel: Channel, intensity: u32, alive: bool) -> Self {
        let mut pixel = Pixel::new(0, 0, 0, alive);
        match channel {
            Channel::Red => pixel.red = intensity,
            Channel::Green => pixel.green = intensity,
            Channel::Blue => pixel.blue = intensity,
        }
        pixel
    }

    pub fn mass(&self) -> u32 {
        self.red + self.green + self.blue
    }

    pub fn intensity(&self, channel: Channel) -> u32 {
        match channel {
            Channel::Red => self.red,
            Channel::Green => self.green,
            Channel::Blue => self.blue,
        }
    }

    /// Channel with the highest intensity; ties go to red, then green.
    pub fn dominant_channel(&self) -> Channel {
        let mut best = Channel::Red;
        for channel in [Channel::Green, Channel::Blue] {
            if self.intensity(channel) > self.intensity(best) {
                best = channel;
            }
        }
        best
    }

    /// Shifts every channel by an independent integer in `±pixel_delta`, clamped to 0..=255.
    pub fn mutate<R: Rng + ?Sized>(&self, rates: &MutationRates, rng: &mut R) -> Pixel {
        let delta = rates.pixel_delta as i32;
        let mut shift = |value: u32| -> u32 {
            let shifted = value as i32 + random_int_between(rng, -delta, delta + 1);
            shifted.clamp(0, MAX_INTENSITY) as u32
        };
        Pixel {
            red: shift(self.red),
            green: shift(self.green),
            blue: shift(self.blue),
            alive: self.alive,
        }
    }

    /// Inert food left behind by a dead body cell: every channel scaled and floored.
    pub fn to_food(&self, factor: f64) -> Pixel {
        let scale = |value: u32| (value as f64 * factor).floor().max(0.0) as u32;
        Pixel::new(scale(self.red), scale(self.green), scale(self.blue), false)
    }
}
