//! Source map relocation.
//!
//! Rolldown writes `sources` relative to `<dir>/<chunk>`; the script template
//! can place the script deeper than that, so every source gets one `../` per
//! extra directory level.

use serde_json::Value;

/// Rewrite `map` for a script written to `script_path` (relative, `/`-separated).
pub fn relocate(map: &str, script_path: &str) -> std::result::Result<String, String> {
    let mut value: Value = serde_json::from_str(map).map_err(|e| e.to_string())?;
    let depth = script_path.matches('/').count();
    let prefix = "../".repeat(depth);

    let object = value
        .as_object_mut()
        .ok_or_else(|| "source map is not a JSON object".to_string())?;

    if let Some(Value::Array(sources)) = object.get_mut("sources") {
        for source in sources.iter_mut() {
            if let Value::String(path) = source {
                *path = format!("{prefix}{path}");
            }
        }
    }

    let file = script_path.rsplit('/').next().unwrap_or(script_path);
    object.insert("file".to_string(), Value::String(file.to_string()));

    serde_json::to_string(&value).map_err(|e| e.to_string())
}

/// The trailing comment linking a script to its map.
pub fn mapping_comment(script_path: &str) -> String {
    let file = script_path.rsplit('/').next().unwrap_or(script_path);
    format!("//# sourceMappingURL={file}.map\n")
}
