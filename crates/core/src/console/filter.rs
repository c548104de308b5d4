//! Client-side route filtering.

use crate::route::Route;

/// Routes whose name or codes contain `needle`, case-insensitively.
/// A blank needle keeps every route.
pub fn filter_routes<'a>(routes: &'a [Route], needle: &str) -> Vec<&'a Route> {
    routes.iter().filter(|route| route.matches(needle)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_filter_by_code_and_name() {
        let routes = vec![
            fixtures::route("r1", "1140", "4521"),
            fixtures::route("r2", "2200", "9911"),
            fixtures::named_route("r3", "Mumbai Depot Run", "3300", "1140"),
        ];

        let ids = |found: Vec<&Route>| found.iter().map(|r| r.id.clone()).collect::<Vec<_>>();

        assert_eq!(ids(filter_routes(&routes, "1140")), vec!["r1", "r3"]);
        assert_eq!(ids(filter_routes(&routes, "mumbai")), vec!["r3"]);
        assert_eq!(ids(filter_routes(&routes, "  ")).len(), 3);
        assert!(filter_routes(&routes, "chennai").is_empty());
    }
}
