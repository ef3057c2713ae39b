//! MIME type detection for message artifacts

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::types::{ArtifactData, MessageArtifact};

/// Enough leading bytes for every magic number `infer` knows about.
const SNIFF_PREFIX: usize = 64;

/// Guess MIME by inspecting bytes (magic numbers)
pub fn guess_mime_from_bytes(bytes: &[u8]) -> Option<String> {
    infer::get(bytes).map(|k| k.mime_type().to_string())
}

/// Guess MIME by file path or URL (extension-based)
pub fn guess_mime_from_path_or_url(path_or_url: &str) -> Option<String> {
    let path = path_or_url
        .split(['?', '#'])
        .next()
        .unwrap_or(path_or_url);
    mime_guess::from_path(path)
        .first_raw()
        .map(|s| s.to_string())
}

/// Combined guess: prefer bytes, fall back to extension, otherwise octet-stream
pub fn guess_mime(bytes: Option<&[u8]>, path_or_url: Option<&str>) -> String {
    if let Some(b) = bytes
        && let Some(m) = guess_mime_from_bytes(b)
    {
        return m;
    }
    if let Some(p) = path_or_url
        && let Some(m) = guess_mime_from_path_or_url(p)
    {
        return m;
    }
    "application/octet-stream".to_string()
}

/// Resolve the MIME type of an artifact: explicit type, then content sniffing,
/// then the artifact name or URL extension.
pub fn artifact_mime(artifact: &MessageArtifact) -> String {
    if let Some(mime) = artifact.mime_type.as_deref().filter(|m| !m.is_empty()) {
        return mime.to_string();
    }
    match &artifact.data {
        ArtifactData::Text(_) => "text/plain".to_string(),
        ArtifactData::Url(url) => {
            if let Some(mime) = url
                .strip_prefix("data:")
                .and_then(|rest| rest.split([';', ',']).next())
                .filter(|m| !m.is_empty())
            {
                return mime.to_string();
            }
            guess_mime(None, artifact.name.as_deref().or(Some(url.as_str())))
        }
        ArtifactData::Base64(payload) => {
            let sniffed = sniff_base64(payload);
            guess_mime(sniffed.as_deref(), artifact.name.as_deref())
        }
    }
}

/// Decode just enough of a base64 payload to sniff its magic number.
fn sniff_base64(payload: &str) -> Option<Vec<u8>> {
    // 4 base64 chars encode 3 bytes
    let take = (SNIFF_PREFIX / 3 * 4).min(payload.len() / 4 * 4);
    STANDARD.decode(&payload.as_bytes()[..take]).ok()
}

pub fn is_image(mime: &str) -> bool {
    mime.starts_with("image/")
}

/// `data:<mime>;base64,<payload>`
pub fn data_url(mime: &str, base64_payload: &str) -> String {
    format!("data:{mime};base64,{base64_payload}")
}
