use crate::error::RouteError;
use crate::router::pattern::{Pattern, Segment};
use std::collections::HashMap;

/// One segment of the routing trie.
///
/// Children keep their insertion order, which is also the order they are tried in
/// during lookup: the first registered child at a level wins a tie.
#[derive(Debug, Default)]
pub(crate) struct Node {
    segment: Option<Segment>,
    /// The canonical pattern of the route that terminates at this node, if any.
    pattern: Option<String>,
    children: Vec<Node>,
}

/// A successful trie walk: the matched pattern and the captured values.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Found<'n> {
    pub(crate) pattern: &'n str,
    pub(crate) captures: HashMap<String, String>,
}

impl Node {
    pub(crate) fn root() -> Self {
        Self::default()
    }

    fn child(segment: Segment) -> Self {
        Self { segment: Some(segment), pattern: None, children: Vec::new() }
    }

    /// Walks (and extends where needed) the trie along `pattern`, marking the last node.
    pub(crate) fn insert(&mut self, pattern: &Pattern) -> Result<(), RouteError> {
        let mut node = self;
        for segment in pattern.segments() {
            if let Segment::CatchAll(_) = segment
                && let Some(existing) = node.children.iter().find_map(|c| match &c.segment {
                    Some(s @ Segment::CatchAll(_)) if s != segment => Some(s.to_string()),
                    _ => None,
                })
            {
                return Err(RouteError::ConflictingCatchAll {
                    pattern: pattern.to_string(),
                    segment: segment.to_string(),
                    existing,
                });
            }

            let index = match node.children.iter().position(|c| c.segment.as_ref() == Some(segment)) {
                Some(index) => index,
                None => {
                    node.children.push(Node::child(segment.clone()));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[index];
        }

        node.pattern = Some(pattern.as_str().to_string());
        Ok(())
    }

    /// Depth-first search over `parts`, trying children in insertion order.
    pub(crate) fn search<'n>(&'n self, parts: &[&str]) -> Option<Found<'n>> {
        let mut captures = Vec::new();
        let pattern = self.search_from(parts, &mut captures)?;
        Some(Found { pattern, captures: captures.into_iter().collect() })
    }

    fn search_from<'n>(&'n self, parts: &[&str], captures: &mut Vec<(String, String)>) -> Option<&'n str> {
        let Some((head, rest)) = parts.split_first() else {
            return self.pattern.as_deref();
        };

        for child in &self.children {
            let found = match &child.segment {
                Some(Segment::Literal(text)) if text == head => child.search_from(rest, captures),
                Some(Segment::Literal(_)) | None => None,
                Some(Segment::Param(name)) => {
                    captures.push((name.clone(), (*head).to_string()));
                    let found = child.search_from(rest, captures);
                    if found.is_none() {
                        captures.pop();
                    }
                    found
                }
                Some(Segment::CatchAll(name)) => child.pattern.as_deref().inspect(|_| {
                    captures.push((name.clone(), parts.join("/")));
                }),
            };

            if found.is_some() {
                return found;
            }
        }

        None
    }

    /// Every pattern registered below this node, in trie order.
    pub(crate) fn patterns(&self) -> Vec<&str> {
        let mut patterns = Vec::new();
        self.collect_patterns(&mut patterns);
        patterns
    }

    fn collect_patterns<'n>(&'n self, out: &mut Vec<&'n str>) {
        if let Some(pattern) = &self.pattern {
            out.push(pattern);
        }
        for child in &self.children {
            child.collect_patterns(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::pattern::split_path;

    fn trie(patterns: &[&str]) -> Node {
        let mut root = Node::root();
        for pattern in patterns {
            root.insert(&Pattern::parse(pattern).unwrap()).unwrap();
        }
        root
    }

    fn search<'n>(root: &'n Node, path: &str) -> Option<Found<'n>> {
        let parts = split_path(path).collect::<Vec<_>>();
        root.search(&parts)
    }

    #[test]
    fn test_root_pattern() {
        let root = trie(&["/"]);
        assert_eq!(search(&root, "/").unwrap().pattern, "/");
        assert!(search(&root, "/a").is_none());
    }

    #[test]
    fn test_intermediate_node_is_not_a_route() {
        let root = trie(&["/a/b/c"]);
        assert!(search(&root, "/a/b").is_none());
        assert!(search(&root, "/a/b/c/d").is_none());
        assert_eq!(search(&root, "/a/b/c").unwrap().pattern, "/a/b/c");
    }

    #[test]
    fn test_backtracks_into_next_sibling() {
        let root = trie(&["/user/info/detail", "/user/:id"]);
        let found = search(&root, "/user/info").unwrap();
        assert_eq!(found.pattern, "/user/:id");
        assert_eq!(found.captures.get("id").map(String::as_str), Some("info"));
    }

    #[test]
    fn test_failed_branch_drops_its_captures() {
        let root = trie(&["/:a/x", "/:b/y"]);
        let found = search(&root, "/v/y").unwrap();
        assert_eq!(found.pattern, "/:b/y");
        assert_eq!(found.captures.len(), 1);
        assert_eq!(found.captures.get("b").map(String::as_str), Some("v"));
    }

    #[test]
    fn test_param_registered_first_wins() {
        let root = trie(&["/user/:id", "/user/info"]);
        let found = search(&root, "/user/info").unwrap();
        assert_eq!(found.pattern, "/user/:id");
    }

    #[test]
    fn test_catch_all_requires_a_segment() {
        let root = trie(&["/assets/*filepath"]);
        assert!(search(&root, "/assets").is_none());
        let found = search(&root, "/assets/js/app.js").unwrap();
        assert_eq!(found.captures.get("filepath").map(String::as_str), Some("js/app.js"));
    }

    #[test]
    fn test_conflicting_catch_all() {
        let mut root = trie(&["/static/*filepath"]);
        let err = root.insert(&Pattern::parse("/static/*path").unwrap()).unwrap_err();
        assert!(matches!(err, RouteError::ConflictingCatchAll { .. }));
        // the same catch-all again is a re-registration, not a conflict
        assert!(root.insert(&Pattern::parse("/static/*filepath").unwrap()).is_ok());
    }

    #[test]
    fn test_patterns() {
        let root = trie(&["/", "/a", "/a/:b", "/c/*d"]);
        assert_eq!(root.patterns(), vec!["/", "/a", "/a/:b", "/c/*d"]);
    }
}
