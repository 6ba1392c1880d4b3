use serde::{Deserialize, Serialize};

/// Extensions accepted by the upload endpoint (lowercase, with the dot)
pub const SUPPORTED_EXTENSIONS: [&str; 4] = [".stl", ".obj", ".ply", ".3mf"];

/// A file accepted by the upload endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub file_id: String,
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
    /// Blob URL, or `local://cache/{fileId}` when the bytes only live in
    /// the process-local store
    pub upload_url: String,
}

/// Lowercased extension including the dot, e.g. `.stl`
pub fn file_extension(file_name: &str) -> Option<String> {
    file_name
        .rfind('.')
        .map(|idx| file_name[idx..].to_ascii_lowercase())
}

pub fn is_supported_model(file_name: &str) -> bool {
    file_extension(file_name)
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Content type stored alongside the blob
pub fn content_type_for(file_name: &str) -> &'static str {
    match file_extension(file_name).as_deref() {
        Some(".stl") => "model/stl",
        Some(".obj") => "model/obj",
        Some(".ply") => "model/ply",
        Some(".3mf") => "model/3mf",
        _ => "application/octet-stream",
    }
}
