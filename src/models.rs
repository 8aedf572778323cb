use serde::{Deserialize, Serialize};

// Body of an admitted request
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AdmittedBody {
    #[serde(rename = "Message")]
    pub message: String,
}

// Body of a rejected (or failed) request
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ErrorBody {
    #[serde(rename = "Error")]
    pub error: String,
}
