//! Mouse (race participant)
//!
//! A mouse holds its race history in ingestion order and answers every
//! windowed statistic by walking that history backward from the most recent
//! race. Time windows are anchored at the mouse's own latest race, never at
//! wall-clock time, so replayed statistics cannot see the future.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use super::color::MouseColor;
use super::race::{normalize_name, Race};
use super::summary::{RepeatWins, TimeSummary};
use crate::error::{Error, Result};
use crate::models::MouseRecord;

/// How one race counts for one mouse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Lost,
    /// Reset, cancelled or not yet completed
    Unresolved,
}

/// Win/loss tally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinLoss {
    pub wins: u32,
    pub losses: u32,
}

impl WinLoss {
    pub fn new(wins: u32, losses: u32) -> Self {
        Self { wins, losses }
    }

    pub fn total(&self) -> u32 {
        self.wins + self.losses
    }

    /// wins / (wins + losses), 0.0 when empty
    pub fn ratio(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.wins as f64 / self.total() as f64
        }
    }

    fn record(&mut self, won: bool) {
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
    }
}

/// Time-windowed win ratio
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowRatio {
    /// 0.0 whenever there are no wins in the window
    pub ratio: f64,
    pub wins: u32,
    pub losses: u32,
}

/// Share of a mouse's wins per lane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneDistribution {
    pub wins_by_lane: Vec<u32>,
    pub ratios: Vec<f64>,
    pub current_lane: usize,
    pub current_lane_ratio: f64,
}

/// Winning-time distribution found by an escalating window search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinTimes {
    #[serde(flatten)]
    pub summary: TimeSummary,
    /// Number of steps the cutoff was pushed back
    pub escalations: u32,
    /// Window actually searched, in seconds
    pub window_secs: i64,
}

/// Escalation rule for [`Mouse::win_times_since`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationPolicy {
    /// Cutoff step in seconds; 0 disables escalation
    pub step_secs: u64,
    /// Give up once the window would exceed this many seconds
    pub max_horizon_secs: Option<u64>,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            step_secs: 3600,
            max_horizon_secs: None,
        }
    }
}

impl EscalationPolicy {
    fn step(&self) -> Option<Duration> {
        seconds(self.step_secs).filter(|step| *step > Duration::zero())
    }

    fn max_horizon(&self) -> Option<Duration> {
        self.max_horizon_secs.and_then(seconds)
    }
}

/// Statistics for one named time window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalStats {
    pub win_ratio: f64,
    pub wins: u32,
    pub losses: u32,
    pub current_lane: WinLoss,
    pub average_repeat_wins: f64,
    pub max_repeat_wins: u32,
    pub win_times: Option<WinTimes>,
}

/// A race participant and its history
#[derive(Debug)]
pub struct Mouse {
    pub name: String,
    pub family_id: u32,
    pub site_rating: f64,
    pub color: MouseColor,
    lane_count: usize,
    races: Vec<Arc<Race>>,
    race_ids: HashSet<String>,
    completed: usize,
    wins: usize,
    losses: usize,
    resets: usize,
    cancellations: usize,
    /// Whole-history streak summary, cleared on every append
    repeat_wins_cache: OnceLock<RepeatWins>,
}

impl Mouse {
    /// Create a mouse from leaderboard metadata
    pub fn new(record: &MouseRecord, lane_count: usize) -> Result<Self> {
        let name = normalize_name(&record.name);
        if name.is_empty() {
            return Err(Error::InvalidParticipant {
                name: record.name.clone(),
                reason: "empty name".to_string(),
            });
        }

        let family = record.family.trim();
        if family.is_empty() || !family.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::InvalidParticipant {
                name,
                reason: format!("family {:?} is not a number", record.family),
            });
        }
        let family_id = family.parse::<u32>().map_err(|e| Error::InvalidParticipant {
            name: name.clone(),
            reason: e.to_string(),
        })?;

        let color = record.color.parse::<MouseColor>()?;

        Ok(Self {
            name,
            family_id,
            site_rating: record.rating,
            color,
            lane_count,
            races: Vec::new(),
            race_ids: HashSet::new(),
            completed: 0,
            wins: 0,
            losses: 0,
            resets: 0,
            cancellations: 0,
            repeat_wins_cache: OnceLock::new(),
        })
    }

    pub fn races(&self) -> &[Arc<Race>] {
        &self.races
    }

    pub fn latest_race(&self) -> Option<&Arc<Race>> {
        self.races.last()
    }

    pub fn has_history(&self) -> bool {
        !self.races.is_empty()
    }

    pub fn completed_count(&self) -> usize {
        self.completed
    }

    pub fn win_count(&self) -> usize {
        self.wins
    }

    pub fn loss_count(&self) -> usize {
        self.losses
    }

    pub fn reset_count(&self) -> usize {
        self.resets
    }

    pub fn cancelled_count(&self) -> usize {
        self.cancellations
    }

    pub fn outcome(&self, race: &Race) -> Outcome {
        if !race.completed() {
            Outcome::Unresolved
        } else if race.is_won_by(&self.name) {
            Outcome::Won
        } else {
            Outcome::Lost
        }
    }

    /// Append the next race in ingestion order
    pub fn append_race(&mut self, race: Arc<Race>) -> Result<()> {
        if self.race_ids.contains(&race.id) {
            return Err(Error::DuplicateRace {
                race_id: race.id.clone(),
                mouse: self.name.clone(),
            });
        }
        if !race.involves(&self.name) {
            return Err(Error::malformed(
                &race.id,
                format!("{} is not in lanes {:?}", self.name, race.lanes),
            ));
        }

        match self.outcome(&race) {
            Outcome::Won => {
                self.completed += 1;
                self.wins += 1;
            }
            Outcome::Lost => {
                self.completed += 1;
                self.losses += 1;
            }
            Outcome::Unresolved => {}
        }
        if race.is_reset {
            self.resets += 1;
        }
        if race.is_cancelled {
            self.cancellations += 1;
        }

        self.race_ids.insert(race.id.clone());
        self.races.push(race);
        self.repeat_wins_cache = OnceLock::new();

        if self.wins + self.losses != self.completed {
            return Err(Error::Integrity {
                mouse: self.name.clone(),
                wins: self.wins,
                losses: self.losses,
                completed: self.completed,
            });
        }
        Ok(())
    }

    /// wins / (wins + losses) over the whole history
    pub fn lifetime_win_ratio(&self) -> f64 {
        WinLoss::new(self.wins as u32, self.losses as u32).ratio()
    }

    /// Days between the first and the latest race start
    pub fn age_days(&self) -> Option<i64> {
        let first = self.races.iter().find_map(|r| r.event_starts_at)?;
        let last = self.races.iter().rev().find_map(|r| r.event_starts_at)?;
        Some((last - first).num_days())
    }

    /// Timestamp every time window is anchored at
    pub fn now_reference(&self) -> Option<DateTime<Utc>> {
        self.races.iter().rev().find_map(|r| r.reference_time())
    }

    /// Cutoff for a window of length `delta`.
    ///
    /// Windows reaching past the earliest representable time start there.
    pub fn cutoff_since(&self, delta: Duration) -> Option<DateTime<Utc>> {
        self.now_reference().map(|now| back_from(now, delta))
    }

    /// Wins and losses among the last `n` races.
    ///
    /// Every visited race consumes budget, so unresolved recent races shrink
    /// the tally.
    pub fn win_loss_last_n(&self, n: usize) -> WinLoss {
        let mut tally = WinLoss::default();
        for race in self.races.iter().rev().take(n) {
            match self.outcome(race) {
                Outcome::Won => tally.record(true),
                Outcome::Lost => tally.record(false),
                Outcome::Unresolved => {}
            }
        }
        tally
    }

    /// Lane held in the most recent race
    pub fn current_lane(&self) -> Result<usize> {
        self.latest_race()
            .and_then(|race| race.lane_of(&self.name))
            .ok_or_else(|| Error::NoHistory {
                mouse: self.name.clone(),
            })
    }

    /// Per-lane share of wins completed on or after `cutoff` (`None` = all)
    pub fn lane_distribution_among_wins(
        &self,
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<LaneDistribution> {
        let current_lane = self.current_lane()?;

        let mut wins_by_lane = vec![0u32; self.lane_count];
        for race in self.races.iter().filter(|r| within(r, cutoff)) {
            if self.outcome(race) != Outcome::Won {
                continue;
            }
            if let Some(slot) = race.lane_of(&self.name).and_then(|l| wins_by_lane.get_mut(l)) {
                *slot += 1;
            }
        }

        let denominator = wins_by_lane.iter().sum::<u32>().max(1) as f64;
        let ratios: Vec<f64> = wins_by_lane
            .iter()
            .map(|&w| w as f64 / denominator)
            .collect();
        let current_lane_ratio = ratios.get(current_lane).copied().unwrap_or(0.0);

        Ok(LaneDistribution {
            wins_by_lane,
            ratios,
            current_lane,
            current_lane_ratio,
        })
    }

    /// Wins and losses in the current lane, bounded by a cutoff and a race budget.
    ///
    /// The budget counts every resolved race inside the cutoff, whatever lane
    /// the mouse ran in.
    pub fn current_lane_win_loss(
        &self,
        cutoff: Option<DateTime<Utc>>,
        max_races: Option<usize>,
    ) -> Result<WinLoss> {
        let lane = self.current_lane()?;
        let mut budget = max_races;
        let mut tally = WinLoss::default();

        for race in self.races.iter().rev() {
            if !race.is_resolved() || !within(race, cutoff) {
                continue;
            }
            if let Some(remaining) = budget.as_mut() {
                if *remaining == 0 {
                    break;
                }
                *remaining -= 1;
            }
            if race.lane_of(&self.name) == Some(lane) {
                tally.record(race.is_won_by(&self.name));
            }
        }
        Ok(tally)
    }

    /// Win ratio over races completed within `delta` of the latest race
    pub fn win_ratio_since(&self, delta: Duration) -> WindowRatio {
        let Some(cutoff) = self.cutoff_since(delta) else {
            return WindowRatio::default();
        };

        let mut tally = WinLoss::default();
        for race in self.races.iter().filter(|r| within(r, Some(cutoff))) {
            match self.outcome(race) {
                Outcome::Won => tally.record(true),
                Outcome::Lost => tally.record(false),
                Outcome::Unresolved => {}
            }
        }

        WindowRatio {
            ratio: if tally.wins == 0 { 0.0 } else { tally.ratio() },
            wins: tally.wins,
            losses: tally.losses,
        }
    }

    /// Winning race times within `delta`, widening the window step by step
    /// until at least one win is found.
    ///
    /// The search never goes past this mouse's oldest winning race, and stops
    /// early at the policy's horizon. `None` when no win qualifies.
    pub fn win_times_since(&self, delta: Duration, policy: &EscalationPolicy) -> Option<WinTimes> {
        let now = self.now_reference()?;
        let base = back_from(now, delta);

        let samples: Vec<(DateTime<Utc>, f64)> = self
            .races
            .iter()
            .filter(|r| self.outcome(r) == Outcome::Won)
            .filter_map(|r| Some((r.completed_at?, r.elapsed_seconds()?)))
            .collect();
        let latest = samples.iter().map(|(t, _)| *t).max()?;

        let (cutoff, escalations) = if latest >= base {
            (base, 0)
        } else {
            let step_ms = policy.step()?.num_milliseconds();
            let gap_ms = (base - latest).num_milliseconds();
            // gap_ms > 0 here; ceil without overflowing near i64::MAX
            let steps = (gap_ms - 1) / step_ms + 1;
            let cutoff = steps
                .checked_mul(step_ms)
                .and_then(Duration::try_milliseconds)
                .map_or(DateTime::<Utc>::MIN_UTC, |back| back_from(base, back));
            (cutoff, u32::try_from(steps).unwrap_or(u32::MAX))
        };

        let window = now - cutoff;
        if let Some(horizon) = policy.max_horizon() {
            if window > horizon {
                return None;
            }
        }

        let times: Vec<f64> = samples
            .iter()
            .filter(|(t, _)| *t >= cutoff)
            .map(|(_, secs)| *secs)
            .collect();

        Some(WinTimes {
            summary: TimeSummary::from_samples(&times)?,
            escalations,
            window_secs: window.num_seconds(),
        })
    }

    /// Repeat-win streaks over resolved races on or after `cutoff`.
    ///
    /// Unbounded queries refresh the memoized whole-history summary.
    pub fn repeat_win_streaks(&self, cutoff: Option<DateTime<Utc>>) -> RepeatWins {
        let outcomes = self
            .races
            .iter()
            .rev()
            .filter(|r| r.is_resolved() && within(r, cutoff))
            .map(|r| r.is_won_by(&self.name));
        let summary = RepeatWins::encode(outcomes);

        if cutoff.is_none() {
            // Already set means an equal summary for the same history
            let _ = self.repeat_wins_cache.set(summary.clone());
        }
        summary
    }

    /// Whole-history streak summary, recomputed only when history grew
    pub fn repeat_wins(&self) -> RepeatWins {
        match self.repeat_wins_cache.get() {
            Some(cached) => cached.clone(),
            None => self.repeat_win_streaks(None),
        }
    }

    /// All statistics for one named time window
    pub fn interval_statistics(
        &self,
        delta: Duration,
        policy: &EscalationPolicy,
    ) -> Result<IntervalStats> {
        let cutoff = self.cutoff_since(delta);
        let ratio = self.win_ratio_since(delta);
        let current_lane = self.current_lane_win_loss(cutoff, None)?;
        let streaks = self.repeat_win_streaks(cutoff);

        Ok(IntervalStats {
            win_ratio: ratio.ratio,
            wins: ratio.wins,
            losses: ratio.losses,
            current_lane,
            average_repeat_wins: streaks.average,
            max_repeat_wins: streaks.max,
            win_times: self.win_times_since(delta, policy),
        })
    }
}

fn seconds(secs: u64) -> Option<Duration> {
    i64::try_from(secs).ok().and_then(Duration::try_seconds)
}

/// `at - delta`, saturating at the earliest representable time
fn back_from(at: DateTime<Utc>, delta: Duration) -> DateTime<Utc> {
    at.checked_sub_signed(delta).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Race completed on or after the cutoff (`None` = unbounded)
fn within(race: &Race, cutoff: Option<DateTime<Utc>>) -> bool {
    match cutoff {
        None => true,
        Some(cutoff) => race.completed_at.is_some_and(|t| t >= cutoff),
    }
}
