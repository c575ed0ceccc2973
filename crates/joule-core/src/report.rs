// SPDX-License-Identifier: Apache-2.0
//! Result aggregation and report generation.

use crate::result::ParseResult;
use crate::stats::Statistics;
use crate::validator::ValidationResult;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Which half of an exchange an outcome belongs to.
///
/// Error responses (CALLERROR/CALLRESULTERROR) count as the response half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Direction {
    /// The CALL/SEND half.
    Request,
    /// The CALLRESULT/CALLERROR half.
    Response,
}

impl Direction {
    /// Report key for this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Request => "request",
            Direction::Response => "response",
        }
    }
}

/// Immutable summary of one validation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    /// Errors per exchange id, then per `request`/`response`, in
    /// validation-then-parse order.
    pub invalid_messages: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    /// Diagnostics for lines that never yielded a correlation id.
    pub non_parsable_messages: BTreeMap<String, Vec<String>>,
    /// Counters over the whole run.
    pub statistics: Statistics,
}

#[derive(Debug, Clone, Default)]
struct SlotOutcome {
    parse: Option<ParseResult>,
    validation: Option<ValidationResult>,
}

impl SlotOutcome {
    /// Parse-valid AND validate-valid; a missing half counts as valid.
    fn is_valid(&self) -> bool {
        self.parse.as_ref().is_none_or(ParseResult::is_valid)
            && self
                .validation
                .as_ref()
                .is_none_or(ValidationResult::is_valid)
    }

    /// Validation errors first, then parse errors, preserving order.
    fn errors(&self) -> Vec<String> {
        let mut errors: Vec<String> = self
            .validation
            .iter()
            .flat_map(|v| v.errors().iter().cloned())
            .collect();
        errors.extend(self.parse.iter().flat_map(|p| p.errors().iter().cloned()));
        errors
    }
}

/// Stateful reducer over decode and validation outcomes.
///
/// Feed results incrementally, query [`Aggregator::statistics`] at any
/// time, and freeze everything with [`Aggregator::create_report`]. One
/// instance serves one validation run but can be [`Aggregator::reset`]
/// for reuse.
#[derive(Debug, Default)]
pub struct Aggregator {
    results: BTreeMap<String, BTreeMap<Direction, SlotOutcome>>,
    non_parsable: BTreeMap<String, Vec<String>>,
    report: Option<Report>,
}

impl Aggregator {
    /// An empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the decode outcome for one half of `exchange_id`.
    ///
    /// No-op on an empty id.
    pub fn add_parser_result(
        &mut self,
        exchange_id: &str,
        direction: Direction,
        result: ParseResult,
    ) {
        if exchange_id.is_empty() {
            return;
        }
        debug!(exchange_id, direction = direction.as_str(), "adding parser result");
        self.slot(exchange_id, direction).parse = Some(result);
    }

    /// Record the validation outcome for one half of `exchange_id`.
    ///
    /// No-op on an empty id.
    pub fn add_validation_results(
        &mut self,
        exchange_id: &str,
        direction: Direction,
        result: ValidationResult,
    ) {
        if exchange_id.is_empty() {
            return;
        }
        debug!(exchange_id, direction = direction.as_str(), "adding validation result");
        self.slot(exchange_id, direction).validation = Some(result);
    }

    /// Record the diagnostics of a line that never parsed.
    ///
    /// No-op on an empty key.
    pub fn add_non_parsable_message(&mut self, line_key: &str, result: ParseResult) {
        if line_key.is_empty() {
            return;
        }
        debug!(line_key, "adding non-parsable message");
        self.non_parsable
            .insert(line_key.to_string(), result.errors().to_vec());
    }

    /// Generate the report, or return the one already generated.
    ///
    /// The first call freezes a snapshot; later calls return it unchanged
    /// even if more results were added in between. This is an intentional
    /// immutability guarantee, not a live view.
    pub fn create_report(&mut self) -> Report {
        if let Some(report) = &self.report {
            return report.clone();
        }
        debug!("creating report from aggregated results");

        let mut report = Report {
            non_parsable_messages: self.non_parsable.clone(),
            statistics: self.compute_statistics(),
            ..Report::default()
        };

        for (exchange_id, halves) in &self.results {
            for (direction, outcome) in halves {
                if outcome.is_valid() {
                    continue;
                }
                report
                    .invalid_messages
                    .entry(exchange_id.clone())
                    .or_default()
                    .insert(direction.as_str().to_string(), outcome.errors());
            }
        }

        self.report = Some(report.clone());
        report
    }

    /// Current statistics.
    ///
    /// Computed from the accumulated results while no report exists; read
    /// from the frozen snapshot afterwards.
    pub fn statistics(&self) -> Statistics {
        match &self.report {
            Some(report) => report.statistics,
            None => self.compute_statistics(),
        }
    }

    /// Clear all state for reuse.
    pub fn reset(&mut self) {
        debug!("resetting aggregator state");
        self.results.clear();
        self.non_parsable.clear();
        self.report = None;
    }

    fn slot(&mut self, exchange_id: &str, direction: Direction) -> &mut SlotOutcome {
        self.results
            .entry(exchange_id.to_string())
            .or_default()
            .entry(direction)
            .or_default()
    }

    fn compute_statistics(&self) -> Statistics {
        let mut stats = Statistics {
            unparsable_messages: self.non_parsable.len() as u64,
            ..Statistics::default()
        };
        for halves in self.results.values() {
            for (direction, outcome) in halves {
                match (direction, outcome.is_valid()) {
                    (Direction::Request, true) => stats.valid_requests += 1,
                    (Direction::Request, false) => stats.invalid_requests += 1,
                    (Direction::Response, true) => stats.valid_responses += 1,
                    (Direction::Response, false) => stats.invalid_responses += 1,
                }
            }
        }
        stats
    }
}
