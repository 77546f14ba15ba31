use blindquote_core::config::{AppConfig, LoadOptions};
use blindquote_core::PriceBook;
use blindquote_db::RepositoryQuoteStorage;
use serde::Serialize;

use super::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

/// Exit code 0 when every check passes, 1 otherwise.
pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_price_book(&config));
            checks.push(check_quote_storage(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["price_book", "quote_storage"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_price_book(config: &AppConfig) -> DoctorCheck {
    let source = config
        .pricing
        .matrix_path
        .as_ref()
        .map(|path| format!("`{}`", path.display()))
        .unwrap_or_else(|| "built-in book".to_string());

    match PriceBook::from_path_or_default(config.pricing.matrix_path.as_deref()) {
        Ok(book) => {
            let fabrics: Vec<&str> = book.fabrics().map(|fabric| fabric.code()).collect();
            if fabrics.is_empty() {
                return DoctorCheck {
                    name: "price_book",
                    status: CheckStatus::Fail,
                    details: format!("{source} defines no fabrics"),
                };
            }
            DoctorCheck {
                name: "price_book",
                status: CheckStatus::Pass,
                details: format!("{source} covers {}", fabrics.join(", ")),
            }
        }
        Err(error) => {
            DoctorCheck { name: "price_book", status: CheckStatus::Fail, details: error.to_string() }
        }
    }
}

fn check_quote_storage(config: &AppConfig) -> DoctorCheck {
    let storage = match RepositoryQuoteStorage::open(&config.storage) {
        Ok(storage) => storage,
        Err(error) => {
            return DoctorCheck {
                name: "quote_storage",
                status: CheckStatus::Fail,
                details: error.to_string(),
            };
        }
    };

    match storage.list_slots() {
        Ok(slots) => {
            let has_saved_quote = slots.iter().any(|slot| slot.key == config.storage.slot_key);
            DoctorCheck {
                name: "quote_storage",
                status: CheckStatus::Pass,
                details: format!(
                    "connected using `{}`; slot `{}` {}",
                    config.storage.url,
                    config.storage.slot_key,
                    if has_saved_quote { "holds a saved quote" } else { "is empty" }
                ),
            }
        }
        Err(error) => DoctorCheck {
            name: "quote_storage",
            status: CheckStatus::Fail,
            details: format!("failed to read quote slots: {error}"),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
