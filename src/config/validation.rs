use std::collections::HashSet;

use tracing_subscriber::EnvFilter;

use crate::{
    config::models::{GroupConfig, RouteConfig, RouterConfig},
    core::{
        path_finder::normalize_template,
        pattern::CompiledPattern,
        route::HandlerTarget,
        router::{join_prefix, parse_method},
    },
};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Route conflict detected: {message}")]
    RouteConflict { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Router configuration validator
///
/// Reports every problem at once instead of stopping at the first, which
/// is what the builder does.
pub struct RouterConfigValidator;

impl RouterConfigValidator {
    /// Validate the entire router configuration
    pub fn validate(config: &RouterConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        let known = Self::validate_methods(config, &mut errors);

        if let Err(e) = EnvFilter::try_new(&config.logging.level) {
            errors.push(ValidationError::InvalidField {
                field: "logging.level".to_string(),
                message: e.to_string(),
            });
        }

        Self::validate_keys("middleware", &config.middleware, &mut errors);
        Self::validate_keys("priority_middleware", &config.priority_middleware, &mut errors);

        let mut group_names = HashSet::new();
        for (i, group) in config.groups.iter().enumerate() {
            Self::validate_group(i, group, &mut errors);
            if !group_names.insert(group.name.as_str()) {
                errors.push(ValidationError::RouteConflict {
                    message: format!("Group '{}' declared more than once", group.name),
                });
            }
        }

        if config.routes.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "routes".to_string(),
            });
        }

        let mut registered = HashSet::new();
        for (i, route) in config.routes.iter().enumerate() {
            Self::validate_route(i, route, config, &known, &mut errors);

            for template in Self::expand(route, &config.groups) {
                let key = (route.method.trim().to_ascii_uppercase(), template);
                if !registered.insert(key.clone()) {
                    errors.push(ValidationError::RouteConflict {
                        message: format!("Duplicate route {} /{}", key.0, key.1),
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// Returns the upper-cased names that parsed, wildcard included.
    fn validate_methods(config: &RouterConfig, errors: &mut Vec<ValidationError>) -> HashSet<String> {
        let mut known = HashSet::new();

        if config.methods.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "methods".to_string(),
            });
        }

        let wildcard = std::iter::once(("wildcard_method".to_string(), &config.wildcard_method));
        let listed = config
            .methods
            .iter()
            .enumerate()
            .map(|(i, m)| (format!("methods[{i}]"), m));

        for (field, name) in wildcard.chain(listed) {
            match parse_method(name) {
                Ok(method) => {
                    known.insert(method.to_string());
                }
                Err(e) => errors.push(ValidationError::InvalidField {
                    field,
                    message: e.to_string(),
                }),
            }
        }
        known
    }

    fn validate_keys(field: &str, keys: &[String], errors: &mut Vec<ValidationError>) {
        for (i, key) in keys.iter().enumerate() {
            if key.trim().is_empty() {
                errors.push(ValidationError::InvalidField {
                    field: format!("{field}[{i}]"),
                    message: "Middleware key must not be empty".to_string(),
                });
            }
        }
    }

    fn validate_group(index: usize, group: &GroupConfig, errors: &mut Vec<ValidationError>) {
        if group.name.trim().is_empty() {
            errors.push(ValidationError::MissingField {
                field: format!("groups[{index}].name"),
            });
        }
        if group.prefix.contains(['{', '}']) {
            errors.push(ValidationError::InvalidField {
                field: format!("groups[{index}].prefix"),
                message: "Group prefixes cannot contain placeholders".to_string(),
            });
        }
        Self::validate_keys(&format!("groups[{index}].middleware"), &group.middleware, errors);
        Self::validate_keys(
            &format!("groups[{index}].priority_middleware"),
            &group.priority_middleware,
            errors,
        );
    }

    fn validate_route(
        index: usize,
        route: &RouteConfig,
        config: &RouterConfig,
        known: &HashSet<String>,
        errors: &mut Vec<ValidationError>,
    ) {
        let field = |name: &str| format!("routes[{index}].{name}");

        match parse_method(&route.method) {
            Ok(method) if !known.contains(method.as_str()) => {
                errors.push(ValidationError::InvalidField {
                    field: field("method"),
                    message: format!("'{method}' is not one of the configured methods"),
                });
            }
            Ok(_) => {}
            Err(e) => errors.push(ValidationError::InvalidField {
                field: field("method"),
                message: e.to_string(),
            }),
        }

        if let Err(e) = HandlerTarget::parse(&route.handler) {
            errors.push(ValidationError::InvalidField {
                field: field("handler"),
                message: e.to_string(),
            });
        }

        let path = normalize_template(&route.path);
        if path.contains(['{', '}']) {
            if let Err(e) = CompiledPattern::compile(path) {
                errors.push(ValidationError::InvalidField {
                    field: field("path"),
                    message: e.to_string(),
                });
            }
        }

        for group in &route.groups {
            if !config.groups.iter().any(|g| &g.name == group) {
                errors.push(ValidationError::InvalidField {
                    field: field("groups"),
                    message: format!("Group '{group}' is not declared"),
                });
            }
        }

        Self::validate_keys(&field("middleware"), &route.middleware, errors);
        Self::validate_keys(&field("priority_middleware"), &route.priority_middleware, errors);
    }

    /// Templates a route registers under, one per group (or one if ungrouped).
    fn expand(route: &RouteConfig, groups: &[GroupConfig]) -> Vec<String> {
        if route.groups.is_empty() {
            return vec![normalize_template(&route.path).to_string()];
        }
        route
            .groups
            .iter()
            .filter_map(|name| groups.iter().find(|g| &g.name == name))
            .map(|group| join_prefix(&group.prefix, &route.path))
            .collect()
    }

    /// Format multiple validation errors into a single message
    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        if errors.len() == 1 {
            return errors[0].to_string();
        }

        let mut message = format!("Found {} validation errors:\n", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, error));
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_valid_config() -> RouterConfig {
        RouterConfig::builder()
            .group(GroupConfig::new("api", "/api"))
            .route(RouteConfig::new("GET", "/users/{id:int}", "Users::show").in_group("api"))
            .route(RouteConfig::new("ANY", "/health", "Health"))
            .build()
    }

    #[test]
    fn validate_accepts_minimal_config() {
        assert!(RouterConfigValidator::validate(&minimal_valid_config()).is_ok());
    }

    #[test]
    fn validate_rejects_empty_routes() {
        let config = RouterConfig::default();
        let err = RouterConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("routes"));
    }

    #[test]
    fn validate_collects_every_problem() {
        let mut config = minimal_valid_config();
        config.routes.push(RouteConfig::new("BREW", "/pot", "Pot"));
        config.routes.push(RouteConfig::new("GET", "/a/{", "A"));
        config.routes.push(RouteConfig::new("GET", "/b", "::nope"));
        config.routes.push(RouteConfig::new("GET", "/c", "C").in_group("missing"));

        let message = RouterConfigValidator::validate(&config).unwrap_err().to_string();
        assert!(message.contains("Found 4 validation errors"), "{message}");
        assert!(message.contains("routes[2].method"));
        assert!(message.contains("routes[3].path"));
        assert!(message.contains("routes[4].handler"));
        assert!(message.contains("Group 'missing' is not declared"));
    }

    #[test]
    fn validate_rejects_duplicates_after_group_expansion() {
        let mut config = minimal_valid_config();
        config
            .routes
            .push(RouteConfig::new("get", "api/users/{id:int}/", "Other"));

        let message = RouterConfigValidator::validate(&config).unwrap_err().to_string();
        assert!(message.contains("Duplicate route GET /api/users/{id:int}"), "{message}");
    }

    #[test]
    fn validate_rejects_duplicate_groups_and_bad_level() {
        let mut config = minimal_valid_config();
        config.groups.push(GroupConfig::new("api", "/v2"));
        config.logging.level = "switchyard=loudest".to_string();

        let message = RouterConfigValidator::validate(&config).unwrap_err().to_string();
        assert!(message.contains("Group 'api' declared more than once"));
        assert!(message.contains("logging.level"));
    }

    #[test]
    fn validate_and_builder_agree_on_placeholder_prefixes() {
        let mut config = minimal_valid_config();
        config.groups.push(GroupConfig::new("tenant", "/t/{id:int}"));

        let message = RouterConfigValidator::validate(&config).unwrap_err().to_string();
        assert!(message.contains("groups[1].prefix"), "{message}");
        assert!(matches!(
            crate::core::RouterBuilder::from_config(&config).err(),
            Some(crate::core::ConfigError::InvalidTemplate { .. })
        ));
    }
}
