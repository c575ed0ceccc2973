// SPDX-License-Identifier: Apache-2.0
//! Capture validation service: wires the decoder, validator, and
//! aggregator into one batch run and renders the result.

use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use joule_core::{Aggregator, Decoder, Direction, Report, ValidationResult, Validator};
use joule_ocpp::{Message, Version};
use joule_registry::SchemaRegistry;
use tracing::{error, info};

/// Runs the decode → validate → aggregate pipeline over captured lines.
pub struct Service<R> {
    validator: Validator<R>,
}

impl<R: SchemaRegistry> Service<R> {
    /// A service validating against `registry`.
    pub fn new(registry: R) -> Self {
        Self {
            validator: Validator::new(registry),
        }
    }

    /// Validate `lines` as an OCPP `version` capture and build the report.
    ///
    /// `default_response_action` resolves orphaned CALLRESULT frames whose
    /// request never appears in the capture.
    pub fn validate_lines<S: AsRef<str>>(
        &self,
        version: Version,
        lines: &[S],
        default_response_action: Option<&str>,
    ) -> Report {
        let decoder = match default_response_action {
            Some(action) => Decoder::with_default_response_action(action),
            None => Decoder::new(),
        };
        let outcome = decoder.parse(lines);

        let mut aggregator = Aggregator::new();
        for (line_key, result) in &outcome.non_parsable {
            aggregator.add_non_parsable_message(line_key, result.clone());
        }

        for (id, exchange) in &outcome.exchanges {
            let slots = [
                (Direction::Request, &exchange.request),
                (Direction::Response, &exchange.response),
                (Direction::Response, &exchange.response_error),
            ];

            for (direction, slot) in slots {
                // An untouched slot carries neither a message nor errors;
                // only populated halves reach the report.
                if slot.message().is_none() && slot.is_valid() {
                    continue;
                }
                aggregator.add_parser_result(id, direction, slot.clone());
            }

            // Schema validation only makes sense for exchanges that decoded
            // cleanly; the parse diagnostics already cover the rest.
            if !exchange.is_valid() {
                continue;
            }
            for (direction, slot) in slots {
                if let Some(message) = slot.message() {
                    let result = self.validate(version, message);
                    aggregator.add_validation_results(id, direction, result);
                }
            }
        }

        aggregator.create_report()
    }

    /// Folds hard validator failures into an ordinary invalid result so a
    /// missing schema shows up in the report instead of aborting the run.
    fn validate(&self, version: Version, message: &Message) -> ValidationResult {
        self.validator
            .validate_message(version, message)
            .unwrap_or_else(|e| {
                let mut result = ValidationResult::new();
                result.add_error(e.to_string());
                result
            })
    }
}

/// Logs the report: one error line per offending message, then a summary
/// statistics table.
pub fn log_report(report: &Report) {
    for (line_key, errors) in &report.non_parsable_messages {
        error!(key = %line_key, errors = ?errors, "message could not be parsed");
    }
    for (id, directions) in &report.invalid_messages {
        for (direction, errors) in directions {
            error!(id = %id, direction = %direction, errors = ?errors, "message failed validation");
        }
    }

    if report.invalid_messages.is_empty() && report.non_parsable_messages.is_empty() {
        info!("all messages are valid");
    }
    info!("\n{}", statistics_table(report));
}

fn statistics_table(report: &Report) -> Table {
    let stats = &report.statistics;
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["", "Valid", "Invalid", "Total"])
        .add_row(vec![
            Cell::new("Requests"),
            Cell::new(format!(
                "{} ({:.1}%)",
                stats.valid_requests,
                stats.valid_request_percentage()
            )),
            Cell::new(format!(
                "{} ({:.1}%)",
                stats.invalid_requests,
                stats.invalid_request_percentage()
            )),
            Cell::new(stats.total_requests()),
        ])
        .add_row(vec![
            Cell::new("Responses"),
            Cell::new(format!(
                "{} ({:.1}%)",
                stats.valid_responses,
                stats.valid_response_percentage()
            )),
            Cell::new(format!(
                "{} ({:.1}%)",
                stats.invalid_responses,
                stats.invalid_response_percentage()
            )),
            Cell::new(stats.total_responses()),
        ])
        .add_row(vec![
            Cell::new("All messages"),
            Cell::new(format!("{:.1}%", stats.total_valid_percentage())),
            Cell::new(format!("{:.1}%", stats.total_invalid_percentage())),
            Cell::new(stats.total()),
        ])
        .add_row(vec![
            Cell::new("Unparsable lines"),
            Cell::new(""),
            Cell::new(report.statistics.unparsable_messages),
            Cell::new(""),
        ]);
    table
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use joule_registry::{LocalSchemaRegistry, RegisterOptions};

    fn registry_with_heartbeat() -> LocalSchemaRegistry {
        let registry = LocalSchemaRegistry::new();
        registry
            .register_schema(
                Version::V16,
                "HeartbeatRequest",
                br#"{"type": "object", "additionalProperties": false}"#,
                RegisterOptions::default(),
            )
            .unwrap();
        registry
            .register_schema(
                Version::V16,
                "HeartbeatResponse",
                br#"{"type": "object", "required": ["currentTime"]}"#,
                RegisterOptions::default(),
            )
            .unwrap();
        registry
    }

    #[test]
    fn clean_capture_yields_empty_report() {
        let service = Service::new(registry_with_heartbeat());
        let report = service.validate_lines(
            Version::V16,
            &[
                r#"[2,"1","Heartbeat",{}]"#,
                r#"[3,"1",{"currentTime":"2027-01-01T00:00:00Z"}]"#,
            ],
            None,
        );

        assert!(report.invalid_messages.is_empty());
        assert!(report.non_parsable_messages.is_empty());
        assert_eq!(report.statistics.valid_requests, 1);
        assert_eq!(report.statistics.valid_responses, 1);
    }

    #[test]
    fn schema_violation_lands_under_the_offending_direction() {
        let service = Service::new(registry_with_heartbeat());
        let report = service.validate_lines(
            Version::V16,
            &[r#"[2,"1","Heartbeat",{}]"#, r#"[3,"1",{}]"#],
            None,
        );

        let directions = &report.invalid_messages["1"];
        assert!(!directions.contains_key("request"));
        assert_eq!(directions["response"].len(), 1);
        assert!(directions["response"][0].contains("currentTime"));
        assert_eq!(report.statistics.valid_requests, 1);
        assert_eq!(report.statistics.invalid_responses, 1);
    }

    #[test]
    fn missing_schema_is_reported_not_fatal() {
        let service = Service::new(LocalSchemaRegistry::new());
        let report = service.validate_lines(Version::V16, &[r#"[2,"9","Reset",{}]"#], None);

        assert_eq!(
            report.invalid_messages["9"]["request"],
            ["no schema found for action ResetRequest in OCPP version 1.6"]
        );
    }

    #[test]
    fn parse_errors_skip_schema_validation() {
        let service = Service::new(registry_with_heartbeat());
        let report = service.validate_lines(
            Version::V16,
            &[r#"[2,"5","Heartbeat"]"#, "not json"],
            None,
        );

        assert_eq!(
            report.invalid_messages["5"]["request"],
            ["Expected 4 elements in the message, got 3"]
        );
        assert_eq!(
            report.non_parsable_messages["line 2"],
            ["Message is not a valid OCPP message"]
        );
        assert_eq!(report.statistics.unparsable_messages, 1);
    }

    #[test]
    fn default_response_action_resolves_orphans() {
        let service = Service::new(registry_with_heartbeat());
        let report = service.validate_lines(
            Version::V16,
            &[r#"[3,"7",{"currentTime":"2027-01-01T00:00:00Z"}]"#],
            Some("Heartbeat"),
        );

        assert!(report.invalid_messages.is_empty());
        assert_eq!(report.statistics.valid_responses, 1);
    }
}
