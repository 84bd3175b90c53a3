//! Reverse path generation.
//!
//! [`reverse`] turns a route name and a set of placeholder values back into a
//! path by substituting values into the route's original pattern text.

use std::collections::HashMap;
use std::hash::BuildHasher;

use switchyard_core::{SwitchyardError, SwitchyardResult};

use super::pattern::RoutePattern;
use super::registry::RouteRegistry;

/// Generates the path for the route named `name`.
///
/// With `params` set to `None` the pattern is returned in template form:
/// required placeholders stay as their bracket text and optional ones are
/// dropped. With `params` set, every required named placeholder must have a
/// value. Regex and negated patterns yield `/` unless `substitute_regex` is
/// `false`, in which case their raw text is returned.
///
/// The registry must have been prepared with
/// [`RouteRegistry::prepare_named`].
///
/// # Errors
///
/// [`SwitchyardError::RouteNameNotPrepared`],
/// [`SwitchyardError::UnknownRouteName`], or
/// [`SwitchyardError::MissingPlaceholderValue`].
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use switchyard_http::urls::pattern::RoutePattern;
/// use switchyard_http::urls::registry::{Route, RouteRegistry};
/// use switchyard_http::urls::reverse::reverse;
///
/// let mut registry = RouteRegistry::new();
/// let pattern = RoutePattern::compile("/dogs/[i:dog_id]/collars").unwrap();
/// registry.add(Route::new(&["GET"], pattern, ()).with_name("collars")).unwrap();
/// registry.prepare_named().unwrap();
///
/// let params = HashMap::from([("dog_id", "7")]);
/// assert_eq!(reverse(&registry, "collars", Some(&params), true).unwrap(), "/dogs/7/collars");
/// assert_eq!(
///     reverse::<_, std::collections::hash_map::RandomState>(&registry, "collars", None, true).unwrap(),
///     "/dogs/[i:dog_id]/collars"
/// );
/// ```
pub fn reverse<H, S: BuildHasher>(
    registry: &RouteRegistry<H>,
    name: &str,
    params: Option<&HashMap<&str, &str, S>>,
    substitute_regex: bool,
) -> SwitchyardResult<String> {
    let route = registry.find_by_name(name)?;
    match route.pattern() {
        Some(pattern) => substitute_pattern(name, pattern, params, substitute_regex),
        None => Ok(if substitute_regex {
            "/".to_string()
        } else {
            route.status_code().unwrap_or_default().to_string()
        }),
    }
}

/// Substitutes values into a compiled pattern's text.
///
/// `route` is only used for error messages.
pub fn substitute_pattern<S: BuildHasher>(
    route: &str,
    pattern: &RoutePattern,
    params: Option<&HashMap<&str, &str, S>>,
    substitute_regex: bool,
) -> SwitchyardResult<String> {
    if pattern.is_regex_like() || pattern.is_catch_all() {
        return Ok(if substitute_regex {
            "/".to_string()
        } else {
            pattern.raw().to_string()
        });
    }

    let raw = pattern.raw();
    let mut result = String::with_capacity(raw.len());
    let mut cursor = 0;

    for placeholder in pattern.placeholders() {
        let (start, end) = placeholder.span;
        result.push_str(&raw[cursor..start]);
        cursor = end;

        let value = placeholder
            .name
            .as_deref()
            .and_then(|n| params.and_then(|p| p.get(n)));

        match value {
            Some(value) => {
                result.push_str(placeholder.separator.as_str());
                result.push_str(value);
            }
            None if placeholder.optional => {}
            // Unnamed placeholders can never be filled, so they stay as written.
            None if params.is_none() || placeholder.name.is_none() => {
                result.push_str(&raw[start..end]);
            }
            None => {
                return Err(SwitchyardError::MissingPlaceholderValue {
                    route: route.to_string(),
                    placeholder: placeholder.name.clone().unwrap_or_default(),
                });
            }
        }
    }

    result.push_str(&raw[cursor..]);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::urls::registry::Route;

    type Params<'a> = HashMap<&'a str, &'a str>;

    fn registry() -> RouteRegistry<()> {
        let mut registry = RouteRegistry::new();
        for (pattern, name) in [
            ("/dogs", "dogs"),
            ("/dogs/[i:dog_id]/collars", "dog-collars"),
            ("/dogs/[i:dog_id]/collars/[a:collar_slug]/?", "dog-collar-details"),
            ("/dog/foo", "dog-foo"),
            ("/dog/[i:dog_id]?", "dog-optional-details"),
            ("@/dog/regex", "dog-regex"),
            ("!@/dog/regex", "dog-neg-regex"),
            ("@\\.(json|csv)$", "complex-regex"),
            ("!@^/admin/", "complex-neg-regex"),
            ("/output.[xml|json:format]?", "output"),
            ("/[i:]/[:name]", "unnamed"),
        ] {
            let route = Route::new(&[], RoutePattern::compile(pattern).unwrap(), ());
            registry.add(route.with_name(name)).unwrap();
        }
        registry.prepare_named().unwrap();
        registry
    }

    fn path_for(name: &str, params: Option<&Params<'_>>) -> SwitchyardResult<String> {
        reverse(&registry(), name, params, true)
    }

    #[test]
    fn test_template_form() {
        assert_eq!(path_for("dogs", None).unwrap(), "/dogs");
        assert_eq!(path_for("dog-collars", None).unwrap(), "/dogs/[i:dog_id]/collars");
        assert_eq!(
            path_for("dog-collar-details", None).unwrap(),
            "/dogs/[i:dog_id]/collars/[a:collar_slug]/?"
        );
        assert_eq!(path_for("dog-foo", None).unwrap(), "/dog/foo");
        assert_eq!(path_for("dog-optional-details", None).unwrap(), "/dog");
    }

    #[test]
    fn test_substitution() {
        let params = Params::from([("dog_id", "idnumberandstuff")]);
        assert_eq!(
            path_for("dog-collars", Some(&params)).unwrap(),
            "/dogs/idnumberandstuff/collars"
        );

        let params = Params::from([("dog_id", "idnumberandstuff"), ("collar_slug", "d12f3d1f2d3")]);
        assert_eq!(
            path_for("dog-collar-details", Some(&params)).unwrap(),
            "/dogs/idnumberandstuff/collars/d12f3d1f2d3/?"
        );
    }

    #[test]
    fn test_values_are_verbatim() {
        let params = Params::from([("dog_id", "a b/c")]);
        assert_eq!(path_for("dog-optional-details", Some(&params)).unwrap(), "/dog/a b/c");
    }

    #[test]
    fn test_optional_with_separator() {
        let params = Params::from([("format", "json")]);
        assert_eq!(path_for("output", Some(&params)).unwrap(), "/output.json");
        assert_eq!(path_for("output", Some(&Params::new())).unwrap(), "/output");
    }

    #[test]
    fn test_missing_required_value() {
        let err = path_for("dog-collars", Some(&Params::new())).unwrap_err();
        assert!(matches!(
            err,
            SwitchyardError::MissingPlaceholderValue { route, placeholder }
                if route == "dog-collars" && placeholder == "dog_id"
        ));
    }

    #[test]
    fn test_unnamed_placeholder_is_kept() {
        let params = Params::from([("name", "bob")]);
        assert_eq!(path_for("unnamed", Some(&params)).unwrap(), "/[i:]/bob");
    }

    #[test]
    fn test_regex_routes() {
        assert_eq!(path_for("dog-regex", None).unwrap(), "/");
        assert_eq!(path_for("dog-neg-regex", None).unwrap(), "/");
        assert_eq!(path_for("complex-regex", None).unwrap(), "/");
        assert_eq!(path_for("complex-neg-regex", None).unwrap(), "/");

        let registry = registry();
        assert_eq!(
            reverse::<_, std::collections::hash_map::RandomState>(&registry, "dog-regex", None, false)
                .unwrap(),
            "@/dog/regex"
        );
        assert_eq!(
            reverse::<_, std::collections::hash_map::RandomState>(&registry, "complex-regex", None, false)
                .unwrap(),
            "@\\.(json|csv)$"
        );
        assert_ne!(
            reverse::<_, std::collections::hash_map::RandomState>(&registry, "dog-neg-regex", None, false)
                .unwrap(),
            "/"
        );
    }

    #[test]
    fn test_unknown_and_unprepared() {
        assert!(matches!(
            path_for("nope", None),
            Err(SwitchyardError::UnknownRouteName(_))
        ));

        let mut registry: RouteRegistry<()> = RouteRegistry::new();
        registry
            .add(Route::new(&[], RoutePattern::compile("/").unwrap(), ()).with_name("home"))
            .unwrap();
        assert!(matches!(
            reverse::<_, std::collections::hash_map::RandomState>(&registry, "home", None, true),
            Err(SwitchyardError::RouteNameNotPrepared)
        ));
    }
}
