use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ExtractRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub images: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DownloadParams {
    #[serde(default)]
    pub url: Option<String>,
    /// Overrides the configured/default `Referer` for this fetch.
    #[serde(default)]
    pub referer: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
