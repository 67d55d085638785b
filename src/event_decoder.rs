use std::collections::HashMap;

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_json_abi::{Event, EventParam, JsonAbi};
use alloy_primitives::{Bytes, Log, B256};
use anyhow::{anyhow, Result};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct DecodedParam {
    pub name: String,
    pub param_type: String,
    pub value: DynSolValue,
    pub indexed: bool,
}

#[derive(Debug, Clone)]
pub struct DecodedEvent {
    pub name: String,
    pub signature: B256,
    pub params: Vec<DecodedParam>,
}

/// Outcome of matching a raw log entry against the known schema. A log that
/// belongs to another contract (or carries undecodable payload) is
/// `Unrecognized` and gets skipped by the caller, never an error.
#[derive(Debug, Clone)]
pub enum DecodedLog {
    Decoded(DecodedEvent),
    Unrecognized,
}

pub struct EventDecoder {
    events: HashMap<B256, Event>,
}

impl EventDecoder {
    /// Build a decoder over all events declared in the ABI
    pub fn new(abi: &JsonAbi) -> Self {
        let events = abi
            .events()
            .map(|event| (event.selector(), event.clone()))
            .collect();

        Self { events }
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Decode a raw log entry against the known event schema
    pub fn decode_log(&self, log: &Log) -> DecodedLog {
        let Some(&selector) = log.topics().first() else {
            return DecodedLog::Unrecognized;
        };
        let Some(event) = self.events.get(&selector) else {
            return DecodedLog::Unrecognized;
        };

        match self.decode_log_with_event(log, event) {
            Ok(decoded) => DecodedLog::Decoded(decoded),
            Err(e) => {
                debug!("Skipping undecodable log with topic {selector}: {e}");
                DecodedLog::Unrecognized
            }
        }
    }

    fn decode_log_with_event(&self, log: &Log, event: &Event) -> Result<DecodedEvent> {
        // Indexed parameters live in topics[1..], everything else is
        // ABI-encoded as a tuple in the data section
        let non_indexed: Vec<&EventParam> =
            event.inputs.iter().filter(|p| !p.indexed).collect();
        let mut data_values = self.decode_data_params(&non_indexed, &log.data.data)?.into_iter();
        let mut topics = log.topics().iter().skip(1);

        let mut params = Vec::with_capacity(event.inputs.len());
        for input in &event.inputs {
            let value = if input.indexed {
                let topic = topics
                    .next()
                    .ok_or_else(|| anyhow!("Not enough topics for indexed parameter: {}", input.name))?;
                self.decode_indexed_param(input, *topic)?
            } else {
                data_values
                    .next()
                    .ok_or_else(|| anyhow!("Missing data value for parameter: {}", input.name))?
            };

            params.push(DecodedParam {
                name: input.name.clone(),
                param_type: input.ty.to_string(),
                value,
                indexed: input.indexed,
            });
        }

        Ok(DecodedEvent {
            name: event.name.clone(),
            signature: event.selector(),
            params,
        })
    }

    /// Decode an indexed parameter from a topic
    fn decode_indexed_param(&self, param: &EventParam, topic: B256) -> Result<DynSolValue> {
        let sol_type = DynSolType::parse(&param.ty)?;

        match &sol_type {
            // Dynamic types are stored in topics as their keccak256 hash;
            // the original value cannot be recovered
            DynSolType::String | DynSolType::Bytes | DynSolType::Array(_) => {
                Ok(DynSolValue::FixedBytes(topic.0.into(), 32))
            }
            _ => sol_type
                .abi_decode_params(topic.as_slice())
                .map_err(|e| anyhow!("Failed to decode indexed parameter {}: {}", param.name, e)),
        }
    }

    /// Decode non-indexed parameters from the log data section
    fn decode_data_params(&self, params: &[&EventParam], data: &Bytes) -> Result<Vec<DynSolValue>> {
        if params.is_empty() {
            return Ok(Vec::new());
        }

        let param_types: Result<Vec<DynSolType>> = params
            .iter()
            .map(|p| {
                DynSolType::parse(&p.ty)
                    .map_err(|e| anyhow!("Unsupported parameter type {} for {}: {}", p.ty, p.name, e))
            })
            .collect();
        let tuple_type = DynSolType::Tuple(param_types?);

        let decoded = tuple_type
            .abi_decode_params(data)
            .map_err(|e| anyhow!("Failed to decode log data: {}", e))?;

        match decoded {
            DynSolValue::Tuple(values) => Ok(values),
            _ => Err(anyhow!("Expected tuple from log data decoding")),
        }
    }
}

impl DecodedEvent {
    /// Human-readable argument dump, one `name: type = value` per parameter
    pub fn format_params(&self) -> String {
        self.params
            .iter()
            .map(|p| format!("{}: {} = {}", p.name, p.param_type, format_value(&p.value)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Render the event as `{name, signature, args: {param -> value}}`
    pub fn to_json(&self) -> Value {
        let mut args = serde_json::Map::new();
        for param in &self.params {
            args.insert(param.name.clone(), value_to_json(&param.value));
        }

        let mut event_json = serde_json::Map::new();
        event_json.insert("name".to_string(), Value::String(self.name.clone()));
        event_json.insert(
            "signature".to_string(),
            Value::String(format!("{:#x}", self.signature)),
        );
        event_json.insert("args".to_string(), Value::Object(args));

        Value::Object(event_json)
    }
}

fn value_to_json(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::Int(i, _) => Value::String(i.to_string()),
        DynSolValue::Uint(u, _) => Value::String(u.to_string()),
        DynSolValue::FixedBytes(bytes, _) => Value::String(format!("0x{}", hex::encode(bytes))),
        DynSolValue::Bytes(bytes) => Value::String(format!("0x{}", hex::encode(bytes))),
        DynSolValue::Address(addr) => Value::String(format!("{:#x}", addr)),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Array(arr) => Value::Array(arr.iter().map(value_to_json).collect()),
        DynSolValue::Tuple(tuple) => Value::Array(tuple.iter().map(value_to_json).collect()),
        _ => Value::String(format!("{:?}", value)),
    }
}

/// Format a decoded value for human-readable display
fn format_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::Uint(u, _) => u.to_string(),
        DynSolValue::FixedBytes(bytes, _) => format!("0x{}", hex::encode(bytes)),
        DynSolValue::Bytes(bytes) => format!("0x{}", hex::encode(bytes)),
        DynSolValue::Address(addr) => format!("{:#x}", addr),
        DynSolValue::String(s) => format!("\"{}\"", s),
        DynSolValue::Array(arr) => {
            let formatted: Vec<String> = arr.iter().map(format_value).collect();
            format!("[{}]", formatted.join(", "))
        }
        DynSolValue::Tuple(tuple) => {
            let formatted: Vec<String> = tuple.iter().map(format_value).collect();
            format!("({})", formatted.join(", "))
        }
        _ => format!("{:?}", value),
    }
}
