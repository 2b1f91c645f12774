//! Static breakpoint tables mapping a score to exactly one category.

use serde::Serialize;

/// How a breakpoint treats a value equal to its boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    /// `value >= at` enters the band.
    AtOrAbove,
    /// `value > at` enters the band.
    Above,
}

/// A category together with its label and canned advice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band<C> {
    pub category: C,
    pub label: &'static str,
    pub advice: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint<C> {
    pub at: f64,
    pub edge: Edge,
    pub band: Band<C>,
}

impl<C> Breakpoint<C> {
    fn admits(&self, value: f64) -> bool {
        match self.edge {
            Edge::AtOrAbove => value >= self.at,
            Edge::Above => value > self.at,
        }
    }
}

/// Ordered table: `base` covers everything below the first breakpoint, and
/// each breakpoint opens a band that lasts until the next one.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdTable<C: 'static> {
    pub name: &'static str,
    pub base: Band<C>,
    pub breakpoints: &'static [Breakpoint<C>],
}

impl<C: Copy + 'static> ThresholdTable<C> {
    /// Band for `value`. NaN never passes a breakpoint and lands in `base`.
    pub fn lookup(&self, value: f64) -> &Band<C> {
        self.breakpoints
            .iter()
            .rev()
            .find(|breakpoint| breakpoint.admits(value))
            .map(|breakpoint| &breakpoint.band)
            .unwrap_or(&self.base)
    }

    pub fn category(&self, value: f64) -> C {
        self.lookup(value).category
    }

    /// Boundaries must be finite and strictly ascending.
    pub fn is_well_formed(&self) -> bool {
        self.breakpoints.iter().all(|bp| bp.at.is_finite())
            && self
                .breakpoints
                .windows(2)
                .all(|pair| pair[0].at < pair[1].at)
    }

    /// Explicit intervals, one per band, in ascending order.
    pub fn intervals(&self) -> Vec<Interval<C>> {
        let mut intervals = Vec::with_capacity(self.breakpoints.len() + 1);
        let mut lower = None;
        let mut band = self.base;

        for breakpoint in self.breakpoints {
            let upper = Some(Bound {
                at: breakpoint.at,
                inclusive: breakpoint.edge == Edge::Above,
            });
            intervals.push(Interval { lower, upper, band });
            lower = Some(Bound {
                at: breakpoint.at,
                inclusive: breakpoint.edge == Edge::AtOrAbove,
            });
            band = breakpoint.band;
        }

        intervals.push(Interval {
            lower,
            upper: None,
            band,
        });
        intervals
    }

    /// Every boundary value, for checks at `at ± epsilon`.
    pub fn boundaries(&self) -> impl Iterator<Item = f64> + '_ {
        self.breakpoints.iter().map(|breakpoint| breakpoint.at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub at: f64,
    pub inclusive: bool,
}

/// One band of a table expressed as an interval; `None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval<C> {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
    pub band: Band<C>,
}

impl<C> Interval<C> {
    pub fn contains(&self, value: f64) -> bool {
        let above_lower = match self.lower {
            None => true,
            Some(bound) if bound.inclusive => value >= bound.at,
            Some(bound) => value > bound.at,
        };
        let below_upper = match self.upper {
            None => true,
            Some(bound) if bound.inclusive => value <= bound.at,
            Some(bound) => value < bound.at,
        };
        above_lower && below_upper
    }
}
