//! Rating events as they come out of the task and the actor self-reports.

use serde::{Deserialize, Serialize};

/// One rating at a point in time, in seconds from video start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingEvent {
    pub time: f64,
    pub value: f64,
}

impl RatingEvent {
    pub fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

/// An ordered run of rating events. Input order is not trusted; the
/// normalizers sort before handing a series to the resampler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRatingSeries {
    events: Vec<RatingEvent>,
}

impl RawRatingSeries {
    pub fn new(events: Vec<RatingEvent>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[RatingEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn first(&self) -> Option<&RatingEvent> {
        self.events.first()
    }

    pub fn last(&self) -> Option<&RatingEvent> {
        self.events.last()
    }

    pub fn last_time(&self) -> Option<f64> {
        self.events.last().map(|event| event.time)
    }

    pub fn push(&mut self, event: RatingEvent) {
        self.events.push(event);
    }

    /// Stable sort by time, so events sharing a timestamp keep their
    /// recorded order.
    pub fn sort_by_time(&mut self) {
        self.events.sort_by(|a, b| a.time.total_cmp(&b.time));
    }

    pub fn is_sorted_by_time(&self) -> bool {
        self.events.windows(2).all(|pair| pair[0].time <= pair[1].time)
    }
}

impl FromIterator<RatingEvent> for RawRatingSeries {
    fn from_iter<I: IntoIterator<Item = RatingEvent>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A row of an actor's self-rating file: Likert rating plus elapsed seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRow {
    pub rating: f64,
    pub time: f64,
}

/// A mouse-movement sample recorded by the task.
///
/// lab.js stores these as `[time, player_time, rating]` triples; hand-edited
/// exports sometimes use objects instead, so both shapes are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiveSample {
    Triple(f64, f64, f64),
    Object {
        time: f64,
        #[serde(default)]
        player_time: Option<f64>,
        rating: f64,
    },
}

impl LiveSample {
    /// Browser clock time in milliseconds.
    pub fn time_ms(&self) -> f64 {
        match *self {
            LiveSample::Triple(time, _, _) => time,
            LiveSample::Object { time, .. } => time,
        }
    }

    pub fn rating(&self) -> f64 {
        match *self {
            LiveSample::Triple(_, _, rating) => rating,
            LiveSample::Object { rating, .. } => rating,
        }
    }
}
