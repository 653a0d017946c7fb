use thiserror::Error;

#[derive(Error, Debug)]
pub enum StageError {
    #[error("no global window")]
    MissingWindow,

    #[error("window has no document")]
    MissingDocument,

    #[error("invalid stage config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("javascript error: {0}")]
    Js(String),
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for StageError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        Self::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}
