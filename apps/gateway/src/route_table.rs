use labmesh_core::{AppError, AppResult};
use url::Url;

/// One path prefix served by one upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRoute {
    prefix: String,
    upstream: Url,
}

impl UpstreamRoute {
    /// Returns the matched path prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Builds the upstream URL for the original path and query, unchanged.
    #[must_use]
    pub fn target_url(&self, path: &str, query: Option<&str>) -> Url {
        let mut target = self.upstream.clone();
        target.set_path(path);
        target.set_query(query);
        target
    }
}

/// Prefix routing table; the longest matching prefix wins.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<UpstreamRoute>,
}

impl RouteTable {
    /// Parses `"/prefix=http://upstream,..."`.
    pub fn parse(value: &str) -> AppResult<Self> {
        let mut routes = value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(parse_route)
            .collect::<AppResult<Vec<_>>>()?;

        if routes.is_empty() {
            return Err(AppError::Validation(
                "GATEWAY_ROUTES must define at least one route".to_owned(),
            ));
        }

        routes.sort_by(|left, right| right.prefix.len().cmp(&left.prefix.len()));
        Ok(Self { routes })
    }

    /// Finds the route for a request path, matching on whole path segments.
    #[must_use]
    pub fn route_for(&self, path: &str) -> Option<&UpstreamRoute> {
        self.routes.iter().find(|route| {
            route.prefix == "/"
                || path == route.prefix
                || path
                    .strip_prefix(route.prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

fn parse_route(entry: &str) -> AppResult<UpstreamRoute> {
    let (prefix, upstream) = entry.split_once('=').ok_or_else(|| {
        AppError::Validation(format!("route '{entry}' must look like '/prefix=http://upstream'"))
    })?;

    let prefix = prefix.trim();
    if !prefix.starts_with('/') {
        return Err(AppError::Validation(format!(
            "route prefix '{prefix}' must start with '/'"
        )));
    }
    let prefix = match prefix.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    let upstream = Url::parse(upstream.trim()).map_err(|error| {
        AppError::Validation(format!("invalid upstream url in route '{entry}': {error}"))
    })?;
    if !matches!(upstream.scheme(), "http" | "https") {
        return Err(AppError::Validation(format!(
            "upstream in route '{entry}' must be http or https"
        )));
    }

    Ok(UpstreamRoute {
        prefix: prefix.to_owned(),
        upstream,
    })
}
