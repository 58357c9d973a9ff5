//! Station wire formats: the compact binary observation frame and
//! the 16 byte meteorological payload.
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{error::Error, prelude::SV};

use gnss::prelude::Constellation;

/// One per-vehicle observation inside a frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ObservationRecord {
    pub sv: SV,
    /// Reported carrier to noise density [dB-Hz]
    pub snr: u8,
    /// Receiver signal id, 0 when the station predates the 4 byte
    /// record layout
    pub signal_id: u8,
}

/// Decoded meteorological record.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeteoRecord {
    /// Station electronics temperature [°C]
    pub board_temp: f64,
    /// Ambient temperature [°C]
    pub ambient_temp: f64,
    /// Barometric pressure [hPa]
    pub pressure: f64,
    /// Relative humidity [%]
    pub humidity: f64,
}

/// Single ASCII byte constellation id, as stations emit it.
fn constellation_from_wire(byte: u8) -> Result<Constellation, Error> {
    let c = byte as char;
    if !c.is_ascii_alphabetic() {
        return Err(Error::MalformedFrame);
    }
    Constellation::from_str(&c.to_string()).or(Err(Error::MalformedFrame))
}

fn constellation_to_wire(constellation: Constellation) -> u8 {
    // gnss-rs prints the standard single letter in lower hex
    format!("{:x}", constellation)
        .bytes()
        .next()
        .unwrap_or(b'?')
}

/// Decodes one observation frame: 8 byte big-endian signed timestamp
/// (UNIX s), then N records. Records are 4 bytes (constellation id,
/// vehicle id, SNR, signal id) when the payload length divides by 4,
/// 3 bytes with implicit signal id 0 otherwise. A frame shorter than
/// its header or with an indivisible payload is malformed: the frame
/// is discarded, the link stays up.
pub fn decode_observation_frame(bytes: &[u8]) -> Result<(i64, Vec<ObservationRecord>), Error> {
    if bytes.len() < 8 {
        return Err(Error::MalformedFrame);
    }

    let mut header = [0u8; 8];
    header.copy_from_slice(&bytes[..8]);
    let timestamp = i64::from_be_bytes(header);

    let payload = &bytes[8..];
    let record_size = if payload.len() % 4 == 0 {
        4
    } else if payload.len() % 3 == 0 {
        3
    } else {
        return Err(Error::MalformedFrame);
    };

    let mut records = Vec::with_capacity(payload.len() / record_size);
    for record in payload.chunks_exact(record_size) {
        let constellation = constellation_from_wire(record[0])?;
        let prn = record[1];
        let snr = record[2];
        let signal_id = if record_size == 4 { record[3] } else { 0 };
        records.push(ObservationRecord {
            sv: SV::new(constellation, prn),
            snr,
            signal_id,
        });
    }

    Ok((timestamp, records))
}

/// Encodes an observation frame, the inverse of
/// [decode_observation_frame]. `with_signal_id` selects the 4 byte
/// record layout.
pub fn encode_observation_frame(
    timestamp: i64,
    records: &[ObservationRecord],
    with_signal_id: bool,
) -> Vec<u8> {
    let record_size = if with_signal_id { 4 } else { 3 };
    let mut bytes = Vec::with_capacity(8 + records.len() * record_size);
    bytes.extend_from_slice(&timestamp.to_be_bytes());

    for record in records {
        bytes.push(constellation_to_wire(record.sv.constellation));
        bytes.push(record.sv.prn);
        bytes.push(record.snr);
        if with_signal_id {
            bytes.push(record.signal_id);
        }
    }

    bytes
}

/// Decodes the meteorological payload: four big-endian f32 (board
/// temperature, ambient temperature, pressure x100, humidity).
pub fn decode_meteo_payload(bytes: &[u8]) -> Result<MeteoRecord, Error> {
    if bytes.len() < 16 {
        return Err(Error::MalformedMeteoPayload);
    }

    let field = |offset: usize| -> f64 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&bytes[offset..offset + 4]);
        f32::from_be_bytes(raw) as f64
    };

    Ok(MeteoRecord {
        board_temp: field(0),
        ambient_temp: field(4),
        pressure: field(8) / 100.0,
        humidity: field(12),
    })
}
