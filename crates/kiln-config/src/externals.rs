//! External-reference table: imports that the host provides as globals.

use indexmap::IndexMap;

use crate::config::KilnConfig;

const WORDPRESS_NAMESPACE: &str = "@wordpress/";

/// WordPress packages that ship as bundled code rather than as a `wp.*` global.
const BUNDLED_WORDPRESS_PACKAGES: &[&str] = &[
    "@wordpress/dataviews",
    "@wordpress/fields",
    "@wordpress/icons",
    "@wordpress/interface",
    "@wordpress/sync",
    "@wordpress/undo-manager",
    "@wordpress/upload-media",
];

/// An import resolved to a host global.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct External {
    /// Import specifier as written in source
    pub request: String,
    /// Global expression, e.g. `wp.blockEditor`
    pub global: String,
    /// Host script handle, e.g. `wp-block-editor`
    pub handle: String,
}

/// Lookup table from import request to host global.
///
/// Explicit entries always win. With `use_defaults`, the host's conventional
/// mappings fill in for anything not listed.
#[derive(Debug, Clone, Default)]
pub struct ExternalTable {
    explicit: IndexMap<String, String>,
    use_defaults: bool,
}

impl ExternalTable {
    pub fn new(explicit: IndexMap<String, String>, use_defaults: bool) -> Self {
        Self {
            explicit,
            use_defaults,
        }
    }

    pub fn from_config(config: &KilnConfig) -> Self {
        Self::new(
            config.externals.clone(),
            config.plugins.manifest.enabled && config.plugins.manifest.use_defaults,
        )
    }

    pub fn lookup(&self, request: &str) -> Option<External> {
        if let Some(global) = self.explicit.get(request) {
            return Some(External {
                request: request.to_string(),
                global: global.clone(),
                handle: script_handle(request),
            });
        }

        if !self.use_defaults {
            return None;
        }

        default_global(request).map(|global| External {
            request: request.to_string(),
            global,
            handle: script_handle(request),
        })
    }

    pub fn is_external(&self, request: &str) -> bool {
        self.lookup(request).is_some()
    }

    /// Explicitly configured requests, in declaration order.
    pub fn explicit(&self) -> impl Iterator<Item = (&str, &str)> {
        self.explicit.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The host script handle that provides `request`.
pub fn script_handle(request: &str) -> String {
    if let Some(pkg) = request.strip_prefix(WORDPRESS_NAMESPACE) {
        return format!("wp-{pkg}");
    }
    match request {
        "lodash-es" => "lodash".to_string(),
        other => other.to_string(),
    }
}

fn default_global(request: &str) -> Option<String> {
    match request {
        "react" => return Some("React".to_string()),
        "react-dom" => return Some("ReactDOM".to_string()),
        "lodash" | "lodash-es" => return Some("lodash".to_string()),
        "jquery" => return Some("jQuery".to_string()),
        "moment" => return Some("moment".to_string()),
        _ => {}
    }

    let pkg = request.strip_prefix(WORDPRESS_NAMESPACE)?;
    if pkg.is_empty() || pkg.contains('/') || BUNDLED_WORDPRESS_PACKAGES.contains(&request) {
        return None;
    }
    Some(format!("wp.{}", camel_case(pkg)))
}

fn camel_case(kebab: &str) -> String {
    let mut out = String::with_capacity(kebab.len());
    let mut upper = false;
    for ch in kebab.chars() {
        if ch == '-' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}
