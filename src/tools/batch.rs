//! Batch cost estimation on a bounded worker pool

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use parking_lot::Mutex;
use serde_json::{json, Value};

use super::pricing::{estimate_request_schema, estimate_value, round_usd};
use crate::mcp::{Tool, ToolAnnotations, ToolError};

/// Hard cap on concurrent workers regardless of configuration
pub const MAX_WORKERS: usize = 32;

/// Hard cap on requests in one batch
pub const MAX_BATCH_SIZE: usize = 500;

#[derive(Debug, Default)]
struct Totals {
    total_usd: f64,
    failed: usize,
}

/// Prices many estimate requests at once.
///
/// Items are spread across at most `max_concurrency` scoped worker threads;
/// the call returns only after every item has been priced. A failing item
/// is reported in place and does not fail the batch.
#[derive(Debug)]
pub struct BatchEstimateTool {
    default_concurrency: usize,
}

impl BatchEstimateTool {
    pub fn new(default_concurrency: usize) -> Self {
        Self {
            default_concurrency: default_concurrency.clamp(1, MAX_WORKERS),
        }
    }
}

impl Default for BatchEstimateTool {
    fn default() -> Self {
        Self::new(4)
    }
}

impl Tool for BatchEstimateTool {
    fn name(&self) -> &str {
        "batch_estimate_cost"
    }

    fn description(&self) -> &str {
        "Estimate the cost of many generation requests in one call. Invalid items are reported individually."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "requests": {
                    "type": "array",
                    "items": estimate_request_schema(),
                    "minItems": 1,
                    "maxItems": MAX_BATCH_SIZE
                },
                "max_concurrency": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_WORKERS,
                    "description": "Maximum number of items priced in parallel"
                }
            },
            "required": ["requests"]
        })
    }

    fn annotations(&self) -> Option<ToolAnnotations> {
        Some(ToolAnnotations::read_only().with_title("Batch estimate generation cost"))
    }

    fn invoke(&self, arguments: Value) -> Result<Value, ToolError> {
        let requests = arguments
            .get("requests")
            .and_then(Value::as_array)
            .ok_or_else(|| ToolError::invalid_params("Missing required argument: requests"))?;
        if requests.is_empty() {
            return Err(ToolError::invalid_params("requests must not be empty"));
        }

        let concurrency = arguments
            .get("max_concurrency")
            .and_then(Value::as_u64)
            .map(|n| (n as usize).clamp(1, MAX_WORKERS))
            .unwrap_or(self.default_concurrency);
        let workers = concurrency.min(requests.len());

        let next = AtomicUsize::new(0);
        let slots: Mutex<Vec<Value>> = Mutex::new(vec![Value::Null; requests.len()]);
        let totals = Mutex::new(Totals::default());

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(request) = requests.get(index) else {
                        break;
                    };

                    let entry = match estimate_value(request.clone()) {
                        Ok(estimate) => {
                            totals.lock().total_usd += estimate.total_usd;
                            json!({ "index": index, "ok": true, "estimate": estimate })
                        }
                        Err(err) => {
                            totals.lock().failed += 1;
                            json!({ "index": index, "ok": false, "error": err.to_string() })
                        }
                    };
                    slots.lock()[index] = entry;
                });
            }
        });

        let totals = totals.into_inner();
        tracing::debug!(
            items = requests.len(),
            workers,
            failed = totals.failed,
            "Batch estimate finished"
        );

        Ok(json!({
            "results": slots.into_inner(),
            "total_usd": round_usd(totals.total_usd),
            "failed": totals.failed,
            "workers": workers,
        }))
    }
}
