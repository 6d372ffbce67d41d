//! Route template compilation.
//!
//! A template such as `user/{id:int}/{name}` is turned into an anchored,
//! case-insensitive regular expression with one named capture group per
//! placeholder, plus the ordered placeholder metadata used to coerce the
//! captured text. Literal text is escaped. Unknown type tags are inserted
//! verbatim as a regex fragment, which lets callers write patterns such as
//! `{lang:(en|fr)}` without a dedicated type. Fragments may not contain
//! `{`, `}` or `/`.
use std::{fmt, sync::Arc};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    core::{
        error::{ConfigError, ConfigResult},
        params::{ParamValue, Params},
    },
    metrics::record_pattern_compilation,
    ports::pattern_cache::PatternCache,
};

const ALPHANUMERIC: &str = r"[a-zA-Z0-9\-._~+]+";
const INTEGER: &str = r"-?[0-9]+";
const NUMERIC: &str = r"[0-9.\-]+";
const BOOLEAN: &str = r"true|false|t|f|yes|no|y|n|0|1";

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([A-Za-z0-9_]*)(?::([^{}/]*))?\}").expect("valid placeholder regex")
});

/// Declared type of a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    /// `{name}` with no tag: string characters, no coercion
    Untyped,
    String,
    Integer,
    Number,
    Boolean,
    /// Unknown tag used as an inline regex fragment
    Raw(String),
}

impl ParamType {
    /// Map a type tag to its kind. Tags are case-insensitive.
    pub fn from_tag(tag: Option<&str>) -> Self {
        let Some(tag) = tag.filter(|tag| !tag.is_empty()) else {
            return ParamType::Untyped;
        };
        match tag.to_ascii_lowercase().as_str() {
            "string" => ParamType::String,
            "int" | "integer" => ParamType::Integer,
            "numeric" | "number" | "float" | "double" => ParamType::Number,
            "bool" | "boolean" => ParamType::Boolean,
            _ => ParamType::Raw(tag.to_string()),
        }
    }

    fn fragment(&self) -> &str {
        match self {
            ParamType::Untyped | ParamType::String => ALPHANUMERIC,
            ParamType::Integer => INTEGER,
            ParamType::Number => NUMERIC,
            ParamType::Boolean => BOOLEAN,
            ParamType::Raw(fragment) => fragment,
        }
    }

    /// Coerce captured text. `None` means the capture is unusable and the
    /// route must not match.
    pub fn coerce(&self, raw: &str) -> Option<ParamValue> {
        match self {
            ParamType::Integer => raw.parse().ok().map(ParamValue::Int),
            ParamType::Number => raw.parse().ok().map(ParamValue::Float),
            ParamType::Boolean => match raw.to_ascii_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" => Some(ParamValue::Bool(true)),
                "false" | "f" | "no" | "n" | "0" => Some(ParamValue::Bool(false)),
                _ => None,
            },
            ParamType::Untyped | ParamType::String | ParamType::Raw(_) => {
                Some(ParamValue::Str(raw.to_string()))
            }
        }
    }
}

/// One `{...}` occurrence in a template.
#[derive(Debug, Clone)]
pub struct Placeholder {
    name: Option<String>,
    kind: ParamType,
    group: String,
}

impl Placeholder {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn kind(&self) -> &ParamType {
        &self.kind
    }
}

/// Matcher plus ordered placeholder metadata for one template.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    matcher: Regex,
    placeholders: Vec<Placeholder>,
}

impl CompiledPattern {
    /// Compile `template` without consulting any cache.
    pub fn compile(template: &str) -> ConfigResult<Self> {
        let invalid = |reason: String| ConfigError::InvalidTemplate {
            template: template.to_string(),
            reason,
        };

        let mut expression = String::from("(?i)^");
        let mut placeholders = Vec::new();
        let mut literal_start = 0;

        for captures in PLACEHOLDER.captures_iter(template) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            push_literal(&mut expression, &template[literal_start..whole.start()])
                .map_err(invalid)?;
            literal_start = whole.end();

            let name = captures
                .get(1)
                .map(|m| m.as_str())
                .filter(|name| !name.is_empty());
            let tag = captures.get(2).map(|m| m.as_str());
            if name.is_none() && tag.is_none_or(str::is_empty) {
                return Err(invalid(format!("empty placeholder \"{}\"", whole.as_str())));
            }

            let kind = ParamType::from_tag(tag);
            let group = format!("sy_p{}", placeholders.len());
            expression.push_str(&format!("(?P<{group}>{})", kind.fragment()));
            placeholders.push(Placeholder {
                name: name.map(str::to_string),
                kind,
                group,
            });
        }

        if placeholders.is_empty() {
            return Err(invalid("no placeholder found".to_string()));
        }
        push_literal(&mut expression, &template[literal_start..]).map_err(invalid)?;
        expression.push('$');

        let matcher = Regex::new(&expression).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            source: template.to_string(),
            matcher,
            placeholders,
        })
    }

    /// Template this pattern was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn placeholders(&self) -> &[Placeholder] {
        &self.placeholders
    }

    /// True when at least one placeholder carries an explicit name.
    pub fn is_named(&self) -> bool {
        self.placeholders.iter().any(|p| p.name.is_some())
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.captures(path).is_some()
    }

    /// Match a normalized path and decode every capture.
    pub fn captures(&self, path: &str) -> Option<Params> {
        let captures = self.matcher.captures(path)?;

        let mut values = Vec::with_capacity(self.placeholders.len());
        for placeholder in &self.placeholders {
            let raw = captures.name(&placeholder.group)?.as_str();
            values.push(placeholder.kind.coerce(raw)?);
        }

        if !self.is_named() {
            return Some(Params::Positional(values));
        }

        let pairs = self
            .placeholders
            .iter()
            .zip(values)
            .enumerate()
            .map(|(index, (placeholder, value))| {
                let key = placeholder
                    .name
                    .clone()
                    .unwrap_or_else(|| index.to_string());
                (key, value)
            })
            .collect();
        Some(Params::Named(pairs))
    }
}

impl fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.matcher.as_str())
    }
}

fn push_literal(expression: &mut String, literal: &str) -> Result<(), String> {
    if literal.contains(['{', '}']) {
        return Err(format!("unbalanced brace in \"{literal}\""));
    }
    expression.push_str(&regex::escape(literal));
    Ok(())
}

/// Compiles templates, going through an optional shared cache.
///
/// Without a cache every call recompiles. Concurrent callers may both
/// compile the same template; the result is identical so the race is benign.
#[derive(Clone, Default)]
pub struct PatternCompiler {
    cache: Option<Arc<dyn PatternCache>>,
}

impl PatternCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(cache: Arc<dyn PatternCache>) -> Self {
        Self { cache: Some(cache) }
    }

    pub fn compile(&self, template: &str) -> ConfigResult<Arc<CompiledPattern>> {
        if let Some(cached) = self.cache.as_ref().and_then(|cache| cache.get(template)) {
            record_pattern_compilation("cache");
            return Ok(cached);
        }

        let compiled = Arc::new(CompiledPattern::compile(template)?);
        record_pattern_compilation("compiled");
        tracing::debug!(template, pattern = %compiled, "Compiled route pattern");

        if let Some(cache) = &self.cache {
            cache.set(template, compiled.clone());
        }
        Ok(compiled)
    }
}
