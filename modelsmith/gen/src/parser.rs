//! Path parameter extraction from route templates.
//!
//! Templates may use either `{param}` or `:param` segments.

/// Extracts parameter names from a path template.
///
/// ## Examples
///
/// ```
/// use modelsmith_gen::parser::extract_path_params;
///
/// assert_eq!(extract_path_params("/bottles"), vec![] as Vec<&str>);
/// assert_eq!(extract_path_params("/bottles/{bottleID}"), vec!["bottleID"]);
/// assert_eq!(
///     extract_path_params("/accounts/:accountID/bottles/:bottleID"),
///     vec!["accountID", "bottleID"]
/// );
/// ```
pub fn extract_path_params(path: &str) -> Vec<&str> {
    let mut params = Vec::new();

    for segment in path.split('/') {
        if let Some(name) = segment.strip_prefix(':') {
            if !name.is_empty() {
                params.push(name);
            }
            continue;
        }

        let mut pos = 0;
        for (idx, c) in segment.char_indices() {
            if c == '{' {
                pos = idx + 1; // Start after '{'
            } else if c == '}' && pos > 0 {
                let param = &segment[pos..idx];
                if !param.is_empty() {
                    params.push(param);
                }
                pos = 0;
            }
        }
    }

    params
}

/// Substitutes path parameters with their values.
///
/// ## Examples
///
/// ```
/// use modelsmith_gen::parser::substitute_path_params;
///
/// let path = substitute_path_params("/bottles/:bottleID", &[("bottleID", "7")]);
/// assert_eq!(path, "/bottles/7");
/// ```
pub fn substitute_path_params(path: &str, params: &[(&str, &str)]) -> String {
    path.split('/')
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':')
                && let Some((_, value)) = params.iter().find(|(n, _)| *n == name)
            {
                return (*value).to_string();
            }
            let mut out = segment.to_string();
            for (name, value) in params {
                out = out.replace(&format!("{{{name}}}"), value);
            }
            out
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Rewrites a template into a `format!` string, returning the parameter
/// names in placeholder order.
///
/// ## Examples
///
/// ```
/// use modelsmith_gen::parser::format_template;
///
/// let (fmt, params) = format_template("/accounts/:accountID/bottles/{bottleID}");
/// assert_eq!(fmt, "/accounts/{}/bottles/{}");
/// assert_eq!(params, vec!["accountID", "bottleID"]);
/// ```
pub fn format_template(path: &str) -> (String, Vec<&str>) {
    let params = extract_path_params(path);
    let escaped: Vec<String> = path
        .split('/')
        .map(|segment| {
            if segment.starts_with(':') && segment.len() > 1 {
                return "{}".to_string();
            }
            let mut out = String::new();
            let mut in_param = false;
            for c in segment.chars() {
                match (c, in_param) {
                    ('{', false) => {
                        in_param = true;
                        out.push_str("{}");
                    }
                    ('}', true) => in_param = false,
                    (_, true) => {}
                    ('}', false) => out.push_str("}}"),
                    (c, false) => out.push(c),
                }
            }
            out
        })
        .collect();
    (escaped.join("/"), params)
}

/// Joins a resource base path and an action route path.
///
/// Route paths starting with `//` are absolute and ignore the base path.
///
/// ## Examples
///
/// ```
/// use modelsmith_gen::parser::join_path;
///
/// assert_eq!(join_path("/bottles", "/:bottleID"), "/bottles/:bottleID");
/// assert_eq!(join_path("/bottles", ""), "/bottles");
/// assert_eq!(join_path("/bottles", "//health"), "/health");
/// ```
pub fn join_path(base: &str, path: &str) -> String {
    if let Some(absolute) = path.strip_prefix("//") {
        return format!("/{absolute}");
    }
    let base = base.trim_end_matches('/');
    match (base.is_empty(), path.is_empty()) {
        (true, true) => "/".to_string(),
        (_, true) => base.to_string(),
        _ if path.starts_with('/') => format!("{base}{path}"),
        _ => format!("{base}/{path}"),
    }
}

/// Returns `true` if `name` is a template parameter of every path.
///
/// An action without routes has no path parameters.
pub fn is_path_param<S: AsRef<str>>(paths: &[S], name: &str) -> bool {
    !paths.is_empty()
        && paths
            .iter()
            .all(|path| extract_path_params(path.as_ref()).contains(&name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_no_params() {
        assert_eq!(extract_path_params("/bottles"), Vec::<&str>::new());
        assert_eq!(extract_path_params("/"), Vec::<&str>::new());
        assert_eq!(extract_path_params("/a/:/b"), Vec::<&str>::new());
    }

    #[test]
    fn extract_mixed_syntax() {
        assert_eq!(
            extract_path_params("/accounts/:accountID/bottles/{bottleID}"),
            vec!["accountID", "bottleID"]
        );
        assert_eq!(extract_path_params("/{a}/{b}"), vec!["a", "b"]);
    }

    #[test]
    fn substitute_both_syntaxes() {
        assert_eq!(
            substitute_path_params(
                "/accounts/:accountID/bottles/{bottleID}",
                &[("accountID", "1"), ("bottleID", "2")]
            ),
            "/accounts/1/bottles/2"
        );
        assert_eq!(substitute_path_params("/b/:id", &[]), "/b/:id");
    }

    #[test]
    fn format_template_without_params() {
        let (fmt, params) = format_template("/plain");
        assert_eq!(fmt, "/plain");
        assert!(params.is_empty());
    }

    #[test]
    fn path_param_must_appear_in_every_route() {
        let paths = ["/bottles/:bottleID", "/accounts/:accountID/bottles/{bottleID}"];
        assert!(is_path_param(&paths, "bottleID"));
        assert!(!is_path_param(&paths, "accountID"));
        assert!(!is_path_param::<&str>(&[], "bottleID"));
    }

    #[test]
    fn join_path_normalizes_slashes() {
        assert_eq!(join_path("/accounts/", "bottles"), "/accounts/bottles");
        assert_eq!(join_path("", ""), "/");
        assert_eq!(join_path("", "/x"), "/x");
    }
}
