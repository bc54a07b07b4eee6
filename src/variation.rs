//! Visual variation axes used to diversify prompts for one dream.
//!
//! Each prompt in a diversified set is steered towards its own time of day,
//! weather, viewing distance and season. Distances are dealt out as a
//! permutation so no two variations in a set are alike.

use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Dawn,
    Morning,
    Midday,
    Dusk,
    Night,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weather {
    Clear,
    Overcast,
    AfterRain,
    Fog,
    Snowfall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distance {
    CloseUp,
    MidShot,
    Wide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 5] = [
        TimeOfDay::Dawn,
        TimeOfDay::Morning,
        TimeOfDay::Midday,
        TimeOfDay::Dusk,
        TimeOfDay::Night,
    ];

    fn phrase(&self) -> &'static str {
        match self {
            TimeOfDay::Dawn => "at dawn",
            TimeOfDay::Morning => "in the morning",
            TimeOfDay::Midday => "at midday",
            TimeOfDay::Dusk => "at dusk",
            TimeOfDay::Night => "at night",
        }
    }
}

impl Weather {
    pub const ALL: [Weather; 5] = [
        Weather::Clear,
        Weather::Overcast,
        Weather::AfterRain,
        Weather::Fog,
        Weather::Snowfall,
    ];

    fn phrase(&self) -> &'static str {
        match self {
            Weather::Clear => "clear sky",
            Weather::Overcast => "overcast sky",
            Weather::AfterRain => "just after rain",
            Weather::Fog => "light fog",
            Weather::Snowfall => "gentle snowfall",
        }
    }
}

impl Distance {
    pub const ALL: [Distance; 3] = [Distance::CloseUp, Distance::MidShot, Distance::Wide];

    fn phrase(&self) -> &'static str {
        match self {
            Distance::CloseUp => "close-up view",
            Distance::MidShot => "mid-distance view",
            Distance::Wide => "wide distant view",
        }
    }
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Autumn, Season::Winter];

    fn phrase(&self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
            Season::Winter => "winter",
        }
    }
}

/// One point in the variation space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variation {
    pub time_of_day: TimeOfDay,
    pub weather: Weather,
    pub distance: Distance,
    pub season: Season,
}

impl fmt::Display for Variation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}",
            self.time_of_day.phrase(),
            self.weather.phrase(),
            self.distance.phrase(),
            self.season.phrase()
        )
    }
}

/// Pick `count` pairwise distinct variations, at most one per distance.
pub fn plan<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<Variation> {
    let mut distances = Distance::ALL;
    distances.shuffle(rng);

    distances
        .into_iter()
        .take(count)
        .map(|distance| Variation {
            time_of_day: pick(rng, &TimeOfDay::ALL),
            weather: pick(rng, &Weather::ALL),
            distance,
            season: pick(rng, &Season::ALL),
        })
        .collect()
}

fn pick<R: Rng + ?Sized, T: Copy>(rng: &mut R, options: &[T]) -> T {
    options[rng.gen_range(0..options.len())]
}

/// Numbered lines for the diversified user prompt.
pub fn describe(variations: &[Variation]) -> String {
    variations
        .iter()
        .enumerate()
        .map(|(i, v)| format!("Prompt {}: {}", i + 1, v))
        .collect::<Vec<_>>()
        .join("\n")
}
