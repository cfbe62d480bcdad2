//! Resource coverage rules
//!
//! Decides whether an advertised grant covers a required resource. URIs with
//! a host are compared scheme- and host-exactly before their paths are looked
//! at; anything else (repo slugs, plain paths, service names, malformed URIs)
//! is compared on the raw string with the same glob/prefix rules.

use url::Url;

use crate::models::ResourceGrant;

/// Does `grant` cover `requirement`? One-directional.
pub fn matches(grant: &str, requirement: &str) -> bool {
    if grant == requirement {
        return true;
    }

    match (parse_hosted(grant), parse_hosted(requirement)) {
        (Some(g), Some(r)) => {
            if g.scheme() != r.scheme() || g.host_str() != r.host_str() || g.port() != r.port() {
                return false;
            }
            path_covers(g.path(), r.path())
        }
        _ => path_covers(grant, requirement),
    }
}

/// First grant, in advertisement order, that covers `requirement`
pub fn covering_grant<'a>(grants: &'a [ResourceGrant], requirement: &str) -> Option<&'a ResourceGrant> {
    grants.iter().find(|g| matches(&g.uri, requirement))
}

/// Parse as a URI only when it carries a non-empty host
fn parse_hosted(s: &str) -> Option<Url> {
    let url = Url::parse(s).ok()?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Some(url),
        _ => None,
    }
}

fn path_covers(grant: &str, requirement: &str) -> bool {
    if grant == requirement || grant == "/" {
        return true;
    }

    // `/foo/*` covers anything under `/foo/`, at any depth
    if grant.ends_with("/*") {
        return requirement.starts_with(&grant[..grant.len() - 1]);
    }

    // Parent covers child only across a separator: `/foo` covers `/foo/bar`, not `/foobar`
    let parent = grant.trim_end_matches('/');
    requirement.len() > parent.len()
        && requirement.starts_with(parent)
        && requirement[parent.len()..].starts_with('/')
}
