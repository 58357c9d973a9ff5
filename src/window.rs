//! Common visibility window detection.
//!
//! A station only records when enough vehicles sit inside its sky
//! gates at the same time. The detector turns a parsed ephemeris set
//! into the merged list of such time windows.
use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use rayon::prelude::*;

use crate::{
    cfg::Observer,
    constants::Constants,
    coords::{Frame, LookAngle},
    ephemeris::{EphemerisSet, SatelliteTrack},
    prelude::SV,
};

/// One common visibility window: while it is open, every vehicle in
/// `sat_ids` intersects the station gates at least part of the time,
/// and at the bounds the simultaneous count meets the station
/// threshold. Bounds include the settle margin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationWindow {
    /// Window opening [UNIX s], settle margin included
    pub from_epoch: i64,
    /// Window closing [UNIX s], settle margin included
    pub to_epoch: i64,
    /// Vehicles this window was built from
    pub sat_ids: BTreeSet<SV>,
}

impl std::fmt::Display for ObservationWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{};{};", self.from_epoch, self.to_epoch)?;
        let mut first = true;
        for sv in &self.sat_ids {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{}", sv)?;
            first = false;
        }
        Ok(())
    }
}

/// Epochs one vehicle spends inside the station gates.
fn admissible_epochs(
    sv: SV,
    track: &SatelliteTrack,
    set_frame: Frame,
    observer: &Observer,
) -> Vec<i64> {
    let mut epochs = Vec::new();
    let mut prev_elevation: Option<f64> = None;

    for (epoch, sample) in track.iter() {
        let look: LookAngle = match sample.look {
            Some(look) => look,
            None if set_frame == Frame::Ecef => observer.look_angle(&sample.position_km),
            None => {
                debug!("{} described in {} without look angles", sv, set_frame);
                break;
            },
        };

        let ascending = prev_elevation.map(|prev| prev < look.elevation);
        prev_elevation = Some(look.elevation);

        if observer.descending_only && ascending == Some(true) {
            continue;
        }

        if !observer.admits(&look) {
            continue;
        }

        epochs.push(epoch);
    }

    epochs
}

/// Epoch ordered index of vehicles inside the station gates.
/// Only epochs with at least one admissible vehicle appear.
/// Vehicles are independent: the admission scan runs in parallel.
fn in_view_index(set: &EphemerisSet, observer: &Observer) -> BTreeMap<i64, BTreeSet<SV>> {
    let vehicles: Vec<_> = set
        .satellites()
        .filter(|(sv, _)| observer.admits_constellation(sv.constellation))
        .collect();

    let per_vehicle: Vec<(SV, Vec<i64>)> = vehicles
        .par_iter()
        .map(|(sv, track)| (*sv, admissible_epochs(*sv, track, set.frame, observer)))
        .collect();

    let mut index = BTreeMap::<i64, BTreeSet<SV>>::new();
    for (sv, epochs) in per_vehicle {
        for epoch in epochs {
            index.entry(epoch).or_default().insert(sv);
        }
    }
    index
}

/// Detects merged common visibility windows of `observer` over the
/// ephemeris set. Deterministic for identical inputs. With
/// `now = Some(t)`, windows already closed at `t` are dropped.
pub fn detect(set: &EphemerisSet, observer: &Observer, now: Option<i64>) -> Vec<ObservationWindow> {
    let index: Vec<(i64, BTreeSet<SV>)> = in_view_index(set, observer).into_iter().collect();

    let min_cnt = observer.min_sat_cnt_in_window;
    let min_len = observer.min_common_window_secs;
    let margin = Constants::WINDOW_MARGIN_SECS;

    let mut windows: Vec<ObservationWindow> = Vec::new();

    let mut i = 0;
    while i < index.len() {
        let (candidate_epoch, candidate_set) = &index[i];
        if candidate_set.len() < min_cnt {
            i += 1;
            continue;
        }

        // expand backward while the in-view sets intersect the
        // candidate set; the earliest epoch still meeting the count
        // threshold becomes the provisional start
        let mut start = *candidate_epoch;
        let mut j = i;
        loop {
            let (epoch, in_view) = &index[j];
            if in_view.is_disjoint(candidate_set) {
                break;
            }
            if in_view.len() >= min_cnt {
                start = *epoch;
            }
            if j == 0 {
                break;
            }
            j -= 1;
        }

        // expand forward symmetrically; stop early when the window is
        // still short of the minimum duration and the count dropped
        // below the threshold
        let mut end = *candidate_epoch;
        let mut k = i;
        let mut disjoint_at = None;
        while k < index.len() {
            let (epoch, in_view) = &index[k];
            if in_view.is_disjoint(candidate_set) {
                disjoint_at = Some(k);
                break;
            }
            if in_view.len() >= min_cnt {
                end = *epoch;
            } else if end - start < min_len {
                break;
            }
            k += 1;
        }

        if end - start >= min_len {
            let padded_from = start - margin;
            let padded_to = end + margin;

            match windows.last_mut() {
                // merge with the previous window when the padded
                // ranges overlap or touch, keeping all vehicles
                Some(last) if last.to_epoch >= padded_from => {
                    last.to_epoch = last.to_epoch.max(padded_to);
                    last.sat_ids.extend(candidate_set.iter().copied());
                },
                _ => windows.push(ObservationWindow {
                    from_epoch: padded_from,
                    to_epoch: padded_to,
                    sat_ids: candidate_set.clone(),
                }),
            }
        }

        // resume after the consumed extent; an epoch that broke the
        // expansion by disjointness may itself seed the next window
        i = match disjoint_at {
            Some(at) => at,
            None => k + 1,
        };
    }

    if let Some(now) = now {
        windows.retain(|w| w.to_epoch >= now);
    }

    windows
}
