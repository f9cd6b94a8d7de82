use serde::{Deserialize, Serialize};

/// Value of an instance prop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum PropValue {
    String(String),
    Number(f64),
    Boolean(bool),
    /// Asset id, e.g. the `src` of an image.
    Asset(String),
    Json(serde_json::Value),
}

/// One entry of an instance's ordered prop list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prop {
    pub id: String,
    pub prop: String,
    pub value: PropValue,
}

impl Prop {
    pub fn new(id: impl Into<String>, prop: impl Into<String>, value: PropValue) -> Self {
        Self {
            id: id.into(),
            prop: prop.into(),
            value,
        }
    }
}
