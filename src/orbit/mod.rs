//! Orbit position serving: a day-keyed cache of final products and a
//! rolling ultra-rapid entry, both fetched on demand.
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use hifitime::Epoch;
use log::{debug, info};

use crate::{
    cfg::Observer,
    coords::{Frame, LookAngle, Position},
    ephemeris::EphemerisSet,
    error::Error,
    prelude::SV,
    window::{self, ObservationWindow},
};

mod fetch;

pub use fetch::CodArchive;

/// Calendar key of one daily product.
pub type DayKey = (i32, u16);

/// Byte source for orbit products. The production implementation
/// talks to the archive over HTTP ([CodArchive]); tests inject
/// canned bodies. Implementations return the decompressed SP3 text.
pub trait ProductSource: Send + Sync {
    /// Final product of one UTC day. A day the archive has not
    /// published yet must map to [Error::NotYetPublished].
    fn fetch_final(&self, year: i32, day_of_year: u16) -> Result<Vec<u8>, Error>;

    /// The rolling ultra-rapid product.
    fn fetch_ultra_rapid(&self) -> Result<Vec<u8>, Error>;
}

#[derive(Default)]
struct CacheState {
    /// Day-keyed final products, populated lazily, never evicted:
    /// the set of days actually queried stays small.
    daily: HashMap<DayKey, Arc<EphemerisSet>>,
    /// Rolling ultra-rapid product, replaced wholesale on refresh.
    ultra_rapid: Option<Arc<EphemerisSet>>,
    /// Keys with a fetch in flight. Concurrent callers for the same
    /// key wait for the pending result instead of downloading twice.
    pending: HashSet<DayKey>,
    ultra_rapid_pending: bool,
}

/// Serves vehicle positions for arbitrary epochs, fetching and
/// parsing orbit products on demand. Reads that do not require a
/// fetch never block on fetches of other keys.
pub struct OrbitCache<S: ProductSource> {
    source: S,
    state: Mutex<CacheState>,
    fetch_done: Condvar,
}

/// (year, day of year) of a UNIX instant.
pub fn day_key(t: i64) -> DayKey {
    let epoch = Epoch::from_unix_seconds(t as f64);
    let (year, ..) = epoch.to_gregorian_utc();
    (year, epoch.day_of_year().floor() as u16)
}

fn unix_now() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs() as i64,
        Err(_) => 0,
    }
}

impl<S: ProductSource> OrbitCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: Mutex::new(CacheState::default()),
            fetch_done: Condvar::new(),
        }
    }

    /// The product source this cache fetches through.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// ECEF position of `sv` at `t`. The ultra-rapid product answers
    /// when its validity range strictly contains `t` (fresher, wider
    /// vehicle coverage); otherwise the day's final product does,
    /// fetched synchronously on first use.
    pub fn position_at(&self, sv: SV, t: i64) -> Result<Position, Error> {
        let set = self.resolve_set(t)?;
        set.position_at(sv, t)
    }

    /// [LookAngle] of `sv` at `t` as seen from `observer`.
    pub fn look_angle_at(&self, sv: SV, t: i64, observer: &Observer) -> Result<LookAngle, Error> {
        let position = self.position_at(sv, t)?;
        Ok(observer.look_angle(&position.km))
    }

    /// Observation windows of `observer` over the ultra-rapid
    /// product, fetching it first if it was never loaded. With
    /// `exclude_past`, windows already closed now are dropped.
    pub fn windows_for(
        &self,
        observer: &Observer,
        exclude_past: bool,
    ) -> Result<Vec<ObservationWindow>, Error> {
        let set = match self.cached_ultra_rapid() {
            Some(set) => set,
            None => {
                self.reparse_ultra_rapid()?;
                self.cached_ultra_rapid().ok_or(Error::NoProductLoaded)?
            },
        };
        let now = exclude_past.then(unix_now);
        Ok(window::detect(&set, observer, now))
    }

    /// Replaces the rolling ultra-rapid entry with a freshly fetched
    /// and parsed product. The swap is atomic: concurrent readers
    /// observe the previous or the new set, never a partial one.
    pub fn reparse_ultra_rapid(&self) -> Result<(), Error> {
        {
            let mut state = self.lock_state();
            while state.ultra_rapid_pending {
                state = self.wait_fetch(state);
            }
            state.ultra_rapid_pending = true;
        }

        let fetched = self.source.fetch_ultra_rapid().map(|bytes| {
            let content = String::from_utf8_lossy(&bytes);
            Arc::new(EphemerisSet::parse(&content, None, Frame::Ecef))
        });

        let mut state = self.lock_state();
        state.ultra_rapid_pending = false;
        self.fetch_done.notify_all();

        let set = fetched?;
        info!(
            "ultra-rapid orbits replaced: {} vehicles, [{:?}, {:?}]",
            set.nb_satellites(),
            set.first_epoch(),
            set.last_epoch()
        );
        state.ultra_rapid = Some(set);
        Ok(())
    }

    fn cached_ultra_rapid(&self) -> Option<Arc<EphemerisSet>> {
        self.lock_state().ultra_rapid.clone()
    }

    /// The set serving epoch `t`, fetching the daily product when
    /// neither cache can answer. At most one fetch per day key is in
    /// flight; concurrent callers share the pending result.
    fn resolve_set(&self, t: i64) -> Result<Arc<EphemerisSet>, Error> {
        let key = day_key(t);

        let mut state = self.lock_state();

        if let Some(ultra) = &state.ultra_rapid {
            if ultra.covers(t) {
                return Ok(ultra.clone());
            }
        }

        loop {
            if let Some(set) = state.daily.get(&key) {
                return Ok(set.clone());
            }
            if !state.pending.contains(&key) {
                break;
            }
            state = self.wait_fetch(state);
        }

        state.pending.insert(key);
        drop(state);

        debug!("fetching final orbit product for {:04}-{:03}", key.0, key.1);
        let fetched = self.source.fetch_final(key.0, key.1).map(|bytes| {
            let content = String::from_utf8_lossy(&bytes);
            Arc::new(EphemerisSet::parse(&content, None, Frame::Ecef))
        });

        let mut state = self.lock_state();
        state.pending.remove(&key);
        self.fetch_done.notify_all();

        let set = fetched?;
        state.daily.insert(key, set.clone());
        Ok(set)
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, CacheState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn wait_fetch<'a>(
        &self,
        guard: std::sync::MutexGuard<'a, CacheState>,
    ) -> std::sync::MutexGuard<'a, CacheState> {
        match self.fetch_done.wait(guard) {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
