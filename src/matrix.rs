//! Hour-by-place occupancy matrix
//!
//! A 24 x P table of hours occupied per (hour-of-day, place) for one calendar
//! day. Cells are fractions of the hour in [0, 1]; because stops are disjoint
//! in time, every row sums to at most 1. The matrix is the basis of the
//! home-stay ratio and the cross-day routine index.

use chrono::{NaiveDate, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::MobilityError;
use crate::types::Stop;

/// Hours in a matrix day
pub const HOURS_PER_DAY: usize = 24;

/// Exclusive end of the night-time hour range used for home detection
pub const NIGHT_END_HOUR: usize = 6;

/// 24 x P hour-by-place occupancy for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourMatrix {
    /// `rows[hour][place]`, 24 rows
    rows: Vec<Vec<f64>>,
}

impl HourMatrix {
    /// An all-zero matrix with the given place count.
    pub fn zeros(num_places: usize) -> Self {
        Self {
            rows: vec![vec![0.0; num_places]; HOURS_PER_DAY],
        }
    }

    /// Build the occupancy matrix for one calendar day from a clustered stop
    /// set. Stops arriving on other days and noise stops (negative place id)
    /// are ignored.
    ///
    /// A contributing stop whose departure falls on a different day than its
    /// arrival is a precondition violation: the caller must split stops at
    /// midnight first. A place id at or beyond `num_places` is likewise
    /// rejected.
    pub fn from_stops(
        stops: &[Stop],
        day: NaiveDate,
        num_places: usize,
    ) -> Result<Self, MobilityError> {
        let mut matrix = Self::zeros(num_places);
        for stop in stops {
            if stop.arrival.date_naive() != day || stop.place_id < 0 {
                continue;
            }
            matrix.add_stop(stop, num_places)?;
        }
        Ok(matrix)
    }

    /// Accumulate one stop's hour slots.
    fn add_stop(&mut self, stop: &Stop, num_places: usize) -> Result<(), MobilityError> {
        if stop.departure.date_naive() != stop.arrival.date_naive() {
            return Err(MobilityError::StraddlesMidnight {
                arrival: stop.arrival.to_rfc3339(),
                departure: stop.departure.to_rfc3339(),
            });
        }
        let place = stop.place_id as usize;
        if place >= num_places {
            return Err(MobilityError::PlaceOutOfRange {
                place_id: stop.place_id,
                num_places,
            });
        }

        let arrival_hour = stop.arrival.hour() as usize;
        let departure_hour = stop.departure.hour() as usize;
        let arrival_minute = stop.arrival.minute() as f64;
        let departure_minute = stop.departure.minute() as f64;

        if arrival_hour == departure_hour {
            self.rows[arrival_hour][place] += (departure_minute - arrival_minute) / 60.0;
        } else {
            self.rows[arrival_hour][place] += 1.0 - arrival_minute / 60.0;
            for hour in (arrival_hour + 1)..departure_hour {
                self.rows[hour][place] += 1.0;
            }
            self.rows[departure_hour][place] += departure_minute / 60.0;
        }
        Ok(())
    }

    /// Number of place columns.
    pub fn num_places(&self) -> usize {
        self.rows[0].len()
    }

    /// Cell value; zero for an out-of-range place column.
    pub fn get(&self, hour: usize, place: usize) -> f64 {
        self.rows[hour].get(place).copied().unwrap_or(0.0)
    }

    /// Sum of all cells: total stop hours on the day.
    pub fn sum(&self) -> f64 {
        self.rows.iter().flatten().sum()
    }

    /// Hours occupied at one place across the whole day.
    pub fn place_hours(&self, place: usize) -> f64 {
        self.rows.iter().map(|row| row.get(place).copied().unwrap_or(0.0)).sum()
    }

    /// The place with the greatest cumulative occupancy over the night hours
    /// (00:00-06:00), or -1 when the night-time sum is zero.
    pub fn home_place_id(&self) -> i32 {
        let mut best: i32 = -1;
        let mut best_sum = 0.0;
        for place in 0..self.num_places() {
            let night_sum: f64 = (0..NIGHT_END_HOUR).map(|h| self.rows[h][place]).sum();
            if night_sum > best_sum {
                best_sum = night_sum;
                best = place as i32;
            }
        }
        best
    }

    /// Occupancy overlap with another day's matrix in [0, 1], or -1 when
    /// either matrix sums to zero (not comparable).
    ///
    /// `overlap = sum(min(cell, cell')) / min(sum, sum')`. Matrices of
    /// different widths are compared as if the narrower one had zero columns
    /// appended, which leaves the formula unchanged.
    pub fn overlap(&self, other: &Self) -> f64 {
        let self_sum = self.sum();
        let other_sum = other.sum();
        if self_sum == 0.0 || other_sum == 0.0 {
            return -1.0;
        }

        let width = self.num_places().max(other.num_places());
        let mut shared = 0.0;
        for hour in 0..HOURS_PER_DAY {
            for place in 0..width {
                shared += self.get(hour, place).min(other.get(hour, place));
            }
        }
        shared / self_sum.min(other_sum)
    }

    /// Mean absolute cell difference against another matrix.
    pub fn mean_abs_error(&self, other: &Self) -> f64 {
        let width = self.num_places().max(other.num_places());
        if width == 0 {
            return 0.0;
        }
        let mut total = 0.0;
        for hour in 0..HOURS_PER_DAY {
            for place in 0..width {
                total += (self.get(hour, place) - other.get(hour, place)).abs();
            }
        }
        total / (HOURS_PER_DAY * width) as f64
    }
}
