//! Fragment parsing.
//!
//! `#<route>` or `#<route>/<parameter>`, optionally followed by `?key=value`
//! pairs. Parsing never fails: anything unrecognised simply produces a route
//! name that is missing from the route table, and dispatch falls back to the
//! home view.

pub const DEFAULT_HOME_ROUTE: &str = "#home";

pub const HOME: &str = "#home";
pub const LOGIN: &str = "#login";
pub const REGISTER: &str = "#register";
pub const RESET: &str = "#reset";
pub const DISCOVER: &str = "#discover";
pub const MY_POEMS: &str = "#my-poems";
pub const ADD_POEM: &str = "#add-poem";
pub const VIEW_POEM: &str = "#view-poem";
pub const EDIT_POEM: &str = "#edit-poem";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteState {
    pub name: String,
    pub param: Option<String>,
    pub query: Vec<(String, String)>,
}

impl RouteState {
    pub fn new(name: impl Into<String>, param: Option<String>) -> Self {
        RouteState {
            name: name.into(),
            param,
            query: Vec::new(),
        }
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The fragment that navigates back to this route.
    pub fn to_fragment(&self) -> String {
        match &self.param {
            Some(param) => format!("{}/{}", self.name, param),
            None => self.name.clone(),
        }
    }
}

pub fn parse_route(fragment: &str, home_route: &str) -> RouteState {
    let fragment = fragment.trim();
    if fragment.is_empty() || fragment == "#" {
        return RouteState::new(home_route, None);
    }

    let fragment = if fragment.starts_with('#') {
        fragment.to_owned()
    } else {
        format!("#{fragment}")
    };

    // Recovery links from the auth service land as `#access_token=..&type=recovery`.
    if fragment[1..].contains('=') && !fragment.contains('/') && !fragment.contains('?') {
        let query = parse_query(&fragment[1..]);
        let name = if query.iter().any(|(k, v)| k == "type" && v == "recovery") {
            RESET.to_owned()
        } else {
            home_route.to_owned()
        };
        return RouteState {
            name,
            param: None,
            query,
        };
    }

    let (path, query) = match fragment.split_once('?') {
        Some((path, query)) => (path, parse_query(query)),
        None => (fragment.as_str(), Vec::new()),
    };

    let (name, param) = match path.split_once('/') {
        Some((name, param)) if !param.is_empty() => (name, Some(param.to_owned())),
        Some((name, _)) => (name, None),
        None => (path, None),
    };

    RouteState {
        name: name.to_owned(),
        param,
        query,
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(key), decode(value))
        })
        .collect()
}

fn decode(text: &str) -> String {
    let text = text.replace('+', " ");
    urlencoding::decode(&text)
        .map(|decoded| decoded.into_owned())
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fragment_is_home() {
        assert_eq!(parse_route("", HOME), RouteState::new(HOME, None));
        assert_eq!(parse_route("#", HOME), RouteState::new(HOME, None));
        assert_eq!(parse_route("", DISCOVER).name, DISCOVER);
    }

    #[test]
    fn splits_on_the_first_separator() {
        assert_eq!(
            parse_route("#view-poem/42", HOME),
            RouteState::new(VIEW_POEM, Some("42".into()))
        );
        assert_eq!(
            parse_route("#view-poem/42/extra", HOME).param.as_deref(),
            Some("42/extra")
        );
        assert_eq!(parse_route("#discover/", HOME), RouteState::new(DISCOVER, None));
        assert_eq!(parse_route("my-poems", HOME).name, MY_POEMS);
    }

    #[test]
    fn unknown_routes_parse_without_error() {
        assert_eq!(
            parse_route("#unknown-route", HOME),
            RouteState::new("#unknown-route", None)
        );
        assert_eq!(parse_route("#%%%/??", HOME).name, "#%%%");
    }

    #[test]
    fn query_pairs_are_decoded() {
        let route = parse_route("#reset?type=recovery&access_token=a%2Bb&refresh_token=r", HOME);
        assert_eq!(route.name, RESET);
        assert_eq!(route.query_value("type"), Some("recovery"));
        assert_eq!(route.query_value("access_token"), Some("a+b"));
        assert_eq!(route.query_value("missing"), None);
    }

    #[test]
    fn bare_recovery_fragment_maps_to_reset() {
        let route = parse_route("#access_token=tok&expires_in=3600&type=recovery", HOME);
        assert_eq!(route.name, RESET);
        assert_eq!(route.query_value("access_token"), Some("tok"));

        let other = parse_route("#error=denied", HOME);
        assert_eq!(other.name, HOME);
    }

    #[test]
    fn round_trips_to_a_fragment() {
        assert_eq!(parse_route("#edit-poem/9", HOME).to_fragment(), "#edit-poem/9");
        assert_eq!(parse_route("", HOME).to_fragment(), "#home");
    }
}
