//! Wire format between the global hook and the host.
//!
//! Each notification is two words: a signal word and a coordinate word. The
//! coordinate word packs x into the low 16 bits and y into the high 16 bits,
//! both signed.

use crate::capture::types::ScreenPoint;

/// Marker placed in the auxiliary data field of every pointer event the host
/// injects. The hook lets marked events through without looking at them.
pub const SENTINEL: u32 = 0xFF99_8877;

/// Whether an event's auxiliary data carries [`SENTINEL`]
pub fn is_synthetic(extra_info: usize) -> bool {
    extra_info == SENTINEL as usize
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Signal {
    None = 0,
    Show = 1,
    Move = 2,
    Commit = 3,
    Cancel = 4,
}

impl Signal {
    pub fn from_word(word: u32) -> Option<Self> {
        match word {
            0 => Some(Signal::None),
            1 => Some(Signal::Show),
            2 => Some(Signal::Move),
            3 => Some(Signal::Commit),
            4 => Some(Signal::Cancel),
            _ => None,
        }
    }

    pub fn word(self) -> u32 {
        self as u32
    }
}

/// One undecoded notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSignal {
    pub signal: u32,
    pub coords: u32,
}

impl RawSignal {
    pub fn new(signal: Signal, point: ScreenPoint) -> Self {
        Self {
            signal: signal.word(),
            coords: pack_point(point),
        }
    }
}

/// Pack a point into one coordinate word. Each axis is truncated to 16 bits.
pub fn pack_point(point: ScreenPoint) -> u32 {
    let x = point.x as i16 as u16 as u32;
    let y = point.y as i16 as u16 as u32;
    x | (y << 16)
}

/// Unpack a coordinate word, sign-extending both axes
pub fn unpack_point(word: u32) -> ScreenPoint {
    let x = (word & 0xFFFF) as u16 as i16;
    let y = (word >> 16) as u16 as i16;
    ScreenPoint::new(x.into(), y.into())
}
