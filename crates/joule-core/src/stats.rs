// SPDX-License-Identifier: Apache-2.0
//! Running counters over validation outcomes.

use serde::Serialize;

/// Counters summarizing one validation run.
///
/// All percentage helpers guard their denominator and return exactly
/// `0.0` when the relevant total is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    /// Requests that passed both decoding and validation.
    pub valid_requests: u64,
    /// Responses (including error responses) that passed both.
    pub valid_responses: u64,
    /// Requests that failed decoding or validation.
    pub invalid_requests: u64,
    /// Responses that failed decoding or validation.
    pub invalid_responses: u64,
    /// Lines that never yielded a usable correlation id.
    pub unparsable_messages: u64,
}

impl Statistics {
    /// All counted requests and responses.
    pub fn total(&self) -> u64 {
        self.valid_requests + self.invalid_requests + self.valid_responses + self.invalid_responses
    }

    /// All counted requests.
    pub fn total_requests(&self) -> u64 {
        self.valid_requests + self.invalid_requests
    }

    /// All counted responses.
    pub fn total_responses(&self) -> u64 {
        self.valid_responses + self.invalid_responses
    }

    /// Share of requests that were valid, in percent.
    pub fn valid_request_percentage(&self) -> f64 {
        percentage(self.valid_requests, self.total_requests())
    }

    /// Share of requests that were invalid, in percent.
    pub fn invalid_request_percentage(&self) -> f64 {
        percentage(self.invalid_requests, self.total_requests())
    }

    /// Share of responses that were valid, in percent.
    pub fn valid_response_percentage(&self) -> f64 {
        percentage(self.valid_responses, self.total_responses())
    }

    /// Share of responses that were invalid, in percent.
    pub fn invalid_response_percentage(&self) -> f64 {
        percentage(self.invalid_responses, self.total_responses())
    }

    /// Share of all messages that were valid, in percent.
    pub fn total_valid_percentage(&self) -> f64 {
        percentage(self.valid_requests + self.valid_responses, self.total())
    }

    /// Share of all messages that were invalid, in percent.
    pub fn total_invalid_percentage(&self) -> f64 {
        percentage(self.invalid_requests + self.invalid_responses, self.total())
    }
}

fn percentage(fraction: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (fraction as f64 / total as f64) * 100.0
}
