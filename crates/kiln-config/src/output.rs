//! Output directory layout and filename templates.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ConfigError, Result};
use crate::helpers::{
    default_asset_template, default_output_dir, default_script_template, default_style_template,
    default_true,
};

/// Default `[contenthash]` length, also used for manifest versions.
pub const DEFAULT_HASH_LENGTH: usize = 20;

/// Artifact category. Each category has its own filename template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Script,
    Style,
    Asset,
    /// Source maps and manifests; named after the artifact they describe
    Auxiliary,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Script => "script",
            Category::Style => "style",
            Category::Asset => "asset",
            Category::Auxiliary => "auxiliary",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputOptions {
    /// Build directory, relative to the project root
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_script_template")]
    pub script: String,

    #[serde(default = "default_style_template")]
    pub style: String,

    #[serde(default = "default_asset_template")]
    pub asset: String,

    /// Prefix for URLs exported by asset modules
    #[serde(default)]
    pub public_path: String,

    /// Emit `<script>.map` beside every script
    #[serde(default = "default_true")]
    pub sourcemap: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            script: default_script_template(),
            style: default_style_template(),
            asset: default_asset_template(),
            public_path: String::new(),
            sourcemap: true,
        }
    }
}

impl OutputOptions {
    pub fn template(&self, category: Category) -> Result<OutputTemplate> {
        match category {
            Category::Script => OutputTemplate::parse(&self.script),
            Category::Style => OutputTemplate::parse(&self.style),
            Category::Asset => OutputTemplate::parse(&self.asset),
            Category::Auxiliary => Err(ConfigError::InvalidTemplate {
                template: String::new(),
                message: "auxiliary artifacts have no template".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Name,
    Ext,
    ContentHash(usize),
}

/// A parsed filename template such as `js/[name].[contenthash:8].js`.
///
/// Supported placeholders: `[name]`, `[ext]` (including the leading dot),
/// `[contenthash]` and `[contenthash:N]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl OutputTemplate {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |message: String| ConfigError::InvalidTemplate {
            template: raw.to_string(),
            message,
        };

        if raw.trim().is_empty() {
            return Err(invalid("template is empty".to_string()));
        }
        // Leading separator or a `C:` drive prefix
        if raw.starts_with(['/', '\\']) || raw.get(1..2) == Some(":") {
            return Err(invalid("template must be a relative path".to_string()));
        }
        if raw.split(['/', '\\']).any(|part| part == "..") {
            return Err(invalid("template must not contain '..'".to_string()));
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = raw;

        while let Some(open) = rest.find('[') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after
                .find(']')
                .ok_or_else(|| invalid("unterminated placeholder".to_string()))?;
            let placeholder = &after[..close];

            let segment = match placeholder {
                "name" => Segment::Name,
                "ext" => Segment::Ext,
                "contenthash" => Segment::ContentHash(DEFAULT_HASH_LENGTH),
                other => match other.strip_prefix("contenthash:") {
                    Some(len) => {
                        let len: usize = len
                            .parse()
                            .map_err(|_| invalid(format!("invalid hash length '{len}'")))?;
                        if len == 0 || len > 64 {
                            return Err(invalid("hash length must be between 1 and 64".to_string()));
                        }
                        Segment::ContentHash(len)
                    }
                    None => return Err(invalid(format!("unknown placeholder [{other}]"))),
                },
            };

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(segment);
            rest = &after[close + 1..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether two distinct logical names always render to distinct paths.
    pub fn distinguishes_names(&self) -> bool {
        self.segments.contains(&Segment::Name)
    }

    pub fn has_content_hash(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::ContentHash(_)))
    }

    /// Render a relative output path.
    ///
    /// `ext` carries its leading dot (`.png`) or is empty.
    pub fn render(&self, name: &str, ext: &str, content: &[u8]) -> String {
        let mut out = String::with_capacity(self.raw.len() + name.len());
        let mut hash: Option<String> = None;

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Name => out.push_str(name),
                Segment::Ext => out.push_str(ext),
                Segment::ContentHash(len) => {
                    let full = hash.get_or_insert_with(|| content_hash(content, 64));
                    out.push_str(&full[..*len]);
                }
            }
        }

        out
    }
}

impl fmt::Display for OutputTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Lowercase hex sha-256 of `content`, truncated to `len` characters.
pub fn content_hash(content: &[u8], len: usize) -> String {
    let digest = Sha256::digest(content);
    let mut hex = format!("{digest:x}");
    hex.truncate(len.min(hex.len()));
    hex
}
