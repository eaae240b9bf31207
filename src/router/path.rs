use std::collections::BTreeMap;

/// Marks a path segment as a named variable, e.g. `/users/:id`.
pub const VARIABLE_MARKER: char = ':';

/// Segment index (after trimming `/`) to variable name.
pub type PathVariables = BTreeMap<usize, String>;

/// Splits a path into its segments after trimming leading and trailing `/`.
///
/// `"/"` and `""` yield a single empty segment.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.trim_matches('/').split('/')
}

/// Extracts the named variables of a path template.
pub fn path_variables(path: &str) -> PathVariables {
    if !path.contains(VARIABLE_MARKER) {
        return PathVariables::new();
    }

    segments(path)
        .enumerate()
        .filter_map(|(index, segment)| {
            segment
                .strip_prefix(VARIABLE_MARKER)
                .map(|name| (index, name.to_string()))
        })
        .collect()
}

/// Checks a concrete request path against a template.
///
/// Literal segments compare exactly, variable segments accept any non-empty
/// segment. Both sides must have the same number of segments.
pub fn template_matches(template: &str, path: &str) -> bool {
    let template_segments: Vec<&str> = segments(template).collect();
    let path_segments: Vec<&str> = segments(path).collect();

    if template_segments.len() != path_segments.len() {
        return false;
    }

    template_segments
        .iter()
        .zip(path_segments.iter())
        .all(|(expected, actual)| {
            if expected.starts_with(VARIABLE_MARKER) {
                !actual.is_empty()
            } else {
                expected == actual
            }
        })
}

/// Pairs the variables of a template with the segments of a request path.
///
/// Variables with no segment at their index are left out.
pub fn bind_values(variables: &PathVariables, path: &str) -> BTreeMap<String, String> {
    let path_segments: Vec<&str> = segments(path).collect();

    variables
        .iter()
        .filter_map(|(index, name)| {
            path_segments
                .get(*index)
                .filter(|value| !value.is_empty())
                .map(|value| (name.clone(), value.to_string()))
        })
        .collect()
}
