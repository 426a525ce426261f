use serde::{Deserialize, Serialize};

/// Direction of the glucose curve, as reported by the CGM.
///
/// Raw codes follow the usual 1..=7 numbering, from rising fast to falling
/// fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GlucoseTrend {
    UpUpUp,
    UpUp,
    Up,
    Flat,
    Down,
    DownDown,
    DownDownDown,
}

impl GlucoseTrend {
    pub fn raw_value(&self) -> u8 {
        match self {
            GlucoseTrend::UpUpUp => 1,
            GlucoseTrend::UpUp => 2,
            GlucoseTrend::Up => 3,
            GlucoseTrend::Flat => 4,
            GlucoseTrend::Down => 5,
            GlucoseTrend::DownDown => 6,
            GlucoseTrend::DownDownDown => 7,
        }
    }

    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(GlucoseTrend::UpUpUp),
            2 => Some(GlucoseTrend::UpUp),
            3 => Some(GlucoseTrend::Up),
            4 => Some(GlucoseTrend::Flat),
            5 => Some(GlucoseTrend::Down),
            6 => Some(GlucoseTrend::DownDown),
            7 => Some(GlucoseTrend::DownDownDown),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            GlucoseTrend::UpUpUp => "⇈",
            GlucoseTrend::UpUp => "↑",
            GlucoseTrend::Up => "↗",
            GlucoseTrend::Flat => "→",
            GlucoseTrend::Down => "↘",
            GlucoseTrend::DownDown => "↓",
            GlucoseTrend::DownDownDown => "⇊",
        }
    }
}
