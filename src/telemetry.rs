use log::Level;
use serde_json::{Map, Number, Value};

pub const LOG_TARGET: &str = "scroll_stage";

pub fn log_event(level: Level, event: &str, fields: Value) {
    if level > log::max_level() {
        return;
    }

    let payload = event_payload(now_unix_seconds(), level, event, fields);
    log::log!(target: LOG_TARGET, level, "{}", Value::Object(payload));
}

fn event_payload(ts: u64, level: Level, event: &str, fields: Value) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("ts".to_string(), Value::Number(Number::from(ts)));
    payload.insert(
        "level".to_string(),
        Value::String(level.as_str().to_ascii_lowercase()),
    );
    payload.insert("event".to_string(), Value::String(event.to_string()));

    if let Value::Object(extra) = fields {
        for (key, value) in extra {
            payload.insert(key, value);
        }
    }

    payload
}

#[cfg(target_arch = "wasm32")]
fn now_unix_seconds() -> u64 {
    (js_sys::Date::now() / 1_000.0) as u64
}

#[cfg(not(target_arch = "wasm32"))]
fn now_unix_seconds() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|value| value.as_secs())
        .unwrap_or(0)
}
