//! Rule list: which transform chain applies to which file.
//!
//! Rules are evaluated in declaration order against the file path relative to the
//! project root (always with `/` separators). The first rule of a given kind that
//! matches a file wins.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// One step of a transform chain, listed in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformStep {
    /// Lower modern script syntax to the configured target
    Script,
    /// Compile Sass/SCSS to CSS
    Sass,
    /// Browserslist-aware prefixing and syntax lowering
    Postcss,
    /// Parse and validate plain CSS
    Css,
    /// Move the stylesheet out of the script into its own file
    Extract,
    /// Emit the file as-is and export its public URL
    Asset,
}

impl TransformStep {
    fn style_rank(&self) -> Option<u8> {
        match self {
            TransformStep::Sass => Some(0),
            TransformStep::Postcss => Some(1),
            TransformStep::Css => Some(2),
            TransformStep::Extract => Some(3),
            _ => None,
        }
    }
}

impl fmt::Display for TransformStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransformStep::Script => "script",
            TransformStep::Sass => "sass",
            TransformStep::Postcss => "postcss",
            TransformStep::Css => "css",
            TransformStep::Extract => "extract",
            TransformStep::Asset => "asset",
        })
    }
}

/// Which category of file a rule handles, derived from its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Script,
    Style,
    Asset,
}

/// A rule as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    /// Regex matched against the root-relative path
    pub test: String,

    /// Directory prefixes; empty means everywhere
    #[serde(default)]
    pub include: Vec<String>,

    /// Regex; matching files are skipped by this rule
    #[serde(default)]
    pub exclude: Option<String>,

    #[serde(rename = "use")]
    pub uses: Vec<TransformStep>,
}

/// A validated rule with compiled patterns.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub index: usize,
    pub kind: RuleKind,
    pub steps: Vec<TransformStep>,
    test: Regex,
    include: Vec<String>,
    exclude: Option<Regex>,
}

impl CompiledRule {
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.test.is_match(rel_path) {
            return false;
        }

        if !self.include.is_empty()
            && !self.include.iter().any(|prefix| {
                rel_path == prefix
                    || rel_path
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            })
        {
            return false;
        }

        !self
            .exclude
            .as_ref()
            .is_some_and(|exclude| exclude.is_match(rel_path))
    }

    pub fn has_step(&self, step: TransformStep) -> bool {
        self.steps.contains(&step)
    }
}

/// The compiled, ordered rule list.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    pub fn compile(rules: &[Rule]) -> Result<Self> {
        let compiled = rules
            .iter()
            .enumerate()
            .map(|(index, rule)| compile_rule(index, rule))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules: compiled })
    }

    /// First rule of `kind` that matches `rel_path`.
    pub fn find(&self, rel_path: &str, kind: RuleKind) -> Option<&CompiledRule> {
        self.rules
            .iter()
            .find(|rule| rule.kind == kind && rule.matches(rel_path))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn compile_rule(index: usize, rule: &Rule) -> Result<CompiledRule> {
    let test = compile_pattern(&format!("rules[{index}].test"), &rule.test)?;
    let exclude = rule
        .exclude
        .as_deref()
        .map(|pattern| compile_pattern(&format!("rules[{index}].exclude"), pattern))
        .transpose()?;

    let include = rule
        .include
        .iter()
        .map(|prefix| normalize_prefix(prefix))
        .filter(|prefix| !prefix.is_empty())
        .collect();

    let kind = chain_kind(index, &rule.uses)?;

    Ok(CompiledRule {
        index,
        kind,
        steps: rule.uses.clone(),
        test,
        include,
        exclude,
    })
}

pub(crate) fn compile_pattern(field: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
        field: field.to_string(),
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

fn normalize_prefix(prefix: &str) -> String {
    let prefix = prefix.replace('\\', "/");
    let prefix = prefix.strip_prefix("./").unwrap_or(&prefix);
    prefix.trim_end_matches('/').to_string()
}

fn chain_kind(index: usize, steps: &[TransformStep]) -> Result<RuleKind> {
    let invalid = |message: &str| ConfigError::InvalidRule {
        index,
        message: message.to_string(),
    };

    match steps {
        [] => Err(invalid("transform chain is empty")),
        [TransformStep::Script] => Ok(RuleKind::Script),
        [TransformStep::Asset] => Ok(RuleKind::Asset),
        _ if steps
            .iter()
            .any(|s| matches!(s, TransformStep::Script | TransformStep::Asset)) =>
        {
            Err(invalid("'script' and 'asset' must be the only step of their rule"))
        }
        _ => {
            let mut last_rank = None;
            for step in steps {
                let rank = step.style_rank();
                if rank <= last_rank {
                    return Err(invalid(
                        "style steps must appear once each, in the order sass, postcss, css, extract",
                    ));
                }
                last_rank = rank;
            }
            if steps.last() != Some(&TransformStep::Extract) {
                return Err(invalid("style chains must end with 'extract'"));
            }
            Ok(RuleKind::Style)
        }
    }
}
