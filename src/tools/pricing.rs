//! Image generation cost estimates from a static price table

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::mcp::{Tool, ToolAnnotations, ToolError};

/// Per-image list prices in USD at standard quality: (provider, model, price)
pub const PRICE_TABLE: &[(&str, &str, f64)] = &[
    ("openai", "gpt-image-1", 0.042),
    ("openai", "dall-e-3", 0.040),
    ("openai", "dall-e-2", 0.020),
    ("gemini", "imagen-3", 0.030),
    ("stability", "sd3.5-large", 0.065),
    ("stability", "stable-image-core", 0.030),
    ("replicate", "flux-schnell", 0.003),
    ("replicate", "flux-pro", 0.055),
];

/// Price multiplier applied for high-definition output
pub const HD_MULTIPLIER: f64 = 2.0;

/// Upper bound on images in a single estimate
pub const MAX_COUNT: u32 = 1000;

static PRICE_INDEX: Lazy<HashMap<String, f64>> = Lazy::new(|| {
    PRICE_TABLE
        .iter()
        .map(|(provider, model, price)| (price_key(provider, model), *price))
        .collect()
});

fn price_key(provider: &str, model: &str) -> String {
    format!("{}/{}", provider, model).to_ascii_lowercase()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Standard,
    Hd,
}

/// One estimate request
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EstimateRequest {
    pub provider: String,
    pub model: String,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default)]
    pub quality: Quality,
}

fn default_count() -> u32 {
    1
}

/// Priced estimate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimate {
    pub provider: String,
    pub model: String,
    pub count: u32,
    pub quality: Quality,
    pub unit_price_usd: f64,
    pub total_usd: f64,
}

/// Schema of a single estimate request, shared with the batch tool
pub fn estimate_request_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "provider": {"type": "string", "description": "Provider name (openai, gemini, stability, replicate)"},
            "model": {"type": "string", "description": "Model identifier"},
            "count": {"type": "integer", "minimum": 1, "maximum": MAX_COUNT, "default": 1, "description": "Number of images"},
            "quality": {"type": "string", "enum": ["standard", "hd"], "default": "standard"}
        },
        "required": ["provider", "model"]
    })
}

/// Look up the unit price for a provider/model pair (case-insensitive)
pub fn unit_price(provider: &str, model: &str) -> Option<f64> {
    PRICE_INDEX.get(&price_key(provider, model)).copied()
}

pub fn estimate(request: &EstimateRequest) -> Result<Estimate, ToolError> {
    if request.count == 0 || request.count > MAX_COUNT {
        return Err(ToolError::invalid_params(format!(
            "count must be between 1 and {}",
            MAX_COUNT
        )));
    }

    let base = unit_price(&request.provider, &request.model).ok_or_else(|| {
        ToolError::not_found("model", &price_key(&request.provider, &request.model))
            .with_data(json!({ "provider": request.provider, "model": request.model }))
    })?;

    let unit = match request.quality {
        Quality::Standard => base,
        Quality::Hd => base * HD_MULTIPLIER,
    };

    Ok(Estimate {
        provider: request.provider.to_ascii_lowercase(),
        model: request.model.to_ascii_lowercase(),
        count: request.count,
        quality: request.quality,
        unit_price_usd: round_usd(unit),
        total_usd: round_usd(unit * f64::from(request.count)),
    })
}

/// Parse and price a raw JSON request
pub fn estimate_value(arguments: Value) -> Result<Estimate, ToolError> {
    let request: EstimateRequest = serde_json::from_value(arguments)
        .map_err(|e| ToolError::invalid_params(format!("Invalid estimate request: {}", e)))?;
    estimate(&request)
}

pub(crate) fn round_usd(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Estimates what a generation request would cost
#[derive(Debug, Default)]
pub struct EstimateCostTool;

impl Tool for EstimateCostTool {
    fn name(&self) -> &str {
        "estimate_cost"
    }

    fn description(&self) -> &str {
        "Estimate the cost in USD of generating images with a provider and model."
    }

    fn input_schema(&self) -> Value {
        estimate_request_schema()
    }

    fn annotations(&self) -> Option<ToolAnnotations> {
        Some(ToolAnnotations::read_only().with_title("Estimate generation cost"))
    }

    fn invoke(&self, arguments: Value) -> Result<Value, ToolError> {
        let estimate = estimate_value(arguments)?;
        serde_json::to_value(estimate).map_err(|e| ToolError::Other(e.into()))
    }
}

/// Lists every priced provider/model pair
#[derive(Debug, Default)]
pub struct ListModelsTool;

impl Tool for ListModelsTool {
    fn name(&self) -> &str {
        "list_models"
    }

    fn description(&self) -> &str {
        "List the image generation models with known pricing, optionally for one provider."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "provider": {"type": "string", "description": "Only list models of this provider"}
            }
        })
    }

    fn annotations(&self) -> Option<ToolAnnotations> {
        Some(ToolAnnotations::read_only().with_title("List models"))
    }

    fn invoke(&self, arguments: Value) -> Result<Value, ToolError> {
        let provider = arguments
            .get("provider")
            .and_then(Value::as_str)
            .map(str::to_ascii_lowercase);

        let models: Vec<Value> = PRICE_TABLE
            .iter()
            .filter(|(p, _, _)| provider.as_deref().map_or(true, |wanted| *p == wanted))
            .map(|(p, m, price)| json!({"provider": p, "model": m, "unit_price_usd": price}))
            .collect();

        Ok(json!({ "count": models.len(), "models": models }))
    }
}
