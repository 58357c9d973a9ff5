use crate::{constants::Constants, error::Error, prelude::SV};

use gnss::prelude::Constellation;

/// GLONASS FDMA channel numbers per orbital slot (k in [-7, +6]).
/// Slot index is PRN - 1.
const GLONASS_CHANNELS: [i8; 24] = [
    1, -4, 5, 6, 1, -4, 5, 6, -2, -7, 0, -1, -2, -7, 0, -1, 4, -3, 3, 2, 4, -3, 3, 2,
];

/// Returns the FDMA channel number of a GLONASS vehicle, None for
/// slots outside the nominal constellation.
pub fn glonass_channel(prn: u8) -> Option<i8> {
    if (1..=24).contains(&prn) {
        Some(GLONASS_CHANNELS[(prn - 1) as usize])
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Carrier {
    /// L1 (GPS/QZSS) same frequency as E1
    #[default]
    L1,
    /// L2 (GPS/QZSS)
    L2,
    /// L5 (GPS/QZSS) same frequency as E5A
    L5,
    /// E1 (Galileo)
    E1,
    /// E5 (Galileo)
    E5,
    /// B1I (BDS)
    B1I,
    /// B2I/B2B (BDS)
    B2,
    /// G1 (GLONASS) FDMA, with channel number
    G1(i8),
    /// G2 (GLONASS) FDMA, with channel number
    G2(i8),
    /// S (IRNSS)
    S,
}

impl std::fmt::Display for Carrier {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        match self {
            Self::L1 => write!(f, "L1"),
            Self::L2 => write!(f, "L2"),
            Self::L5 => write!(f, "L5"),
            Self::E1 => write!(f, "E1"),
            Self::E5 => write!(f, "E5"),
            Self::B1I => write!(f, "B1I"),
            Self::B2 => write!(f, "B2I/B2B"),
            Self::G1(k) => write!(f, "G1({})", k),
            Self::G2(k) => write!(f, "G2({})", k),
            Self::S => write!(f, "S"),
        }
    }
}

impl Carrier {
    pub fn frequency(&self) -> f64 {
        match self {
            Self::L1 | Self::E1 => 1575.42E6_f64,
            Self::L2 => 1227.60E6_f64,
            Self::L5 => 1176.45E6_f64,
            Self::E5 => 1191.795E6_f64,
            Self::B1I => 1561.098E6_f64,
            Self::B2 => 1207.14E6_f64,
            Self::G1(k) => 1602.0E6_f64 + (*k as f64) * 9.0E6 / 16.0,
            Self::G2(k) => 1246.0E6_f64 + (*k as f64) * 7.0E6 / 16.0,
            Self::S => 2492.028E6_f64,
        }
    }

    pub fn wavelength(&self) -> f64 {
        Constants::SPEED_OF_LIGHT_M_S / self.frequency()
    }

    /// [Carrier] a station observed, from the vehicle identity and the
    /// one byte signal id carried on the wire. Signal id 0 (and ids we
    /// have no table entry for) map to the constellation's primary
    /// open signal. GLONASS resolves the per slot FDMA channel.
    pub fn from_signal_id(sv: SV, signal_id: u8) -> Result<Self, Error> {
        match sv.constellation {
            Constellation::GPS | Constellation::QZSS => match signal_id {
                3 | 4 => Ok(Self::L2),
                6 | 7 => Ok(Self::L5),
                _ => Ok(Self::L1),
            },
            Constellation::Galileo => match signal_id {
                5 | 6 => Ok(Self::E5),
                _ => Ok(Self::E1),
            },
            Constellation::BeiDou => match signal_id {
                2 | 3 => Ok(Self::B2),
                _ => Ok(Self::B1I),
            },
            Constellation::Glonass => {
                let k = glonass_channel(sv.prn)
                    .ok_or(Error::UnknownCarrierFrequency(sv, signal_id))?;
                match signal_id {
                    2 | 3 => Ok(Self::G2(k)),
                    _ => Ok(Self::G1(k)),
                }
            },
            Constellation::IRNSS => Ok(Self::S),
            _ => Err(Error::UnknownCarrierFrequency(sv, signal_id)),
        }
    }
}
