/// A route table to register and a request path to resolve against it.
#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    routes: &'static [&'static str],
    path: &'static str,
}

impl TestCase {
    pub const fn new(name: &'static str, group: TestGroup, routes: &'static [&'static str], path: &'static str) -> Self {
        Self { name, group, routes, path }
    }

    pub const fn small(name: &'static str, routes: &'static [&'static str], path: &'static str) -> Self {
        Self::new(name, TestGroup::Small, routes, path)
    }

    pub const fn large(name: &'static str, routes: &'static [&'static str], path: &'static str) -> Self {
        Self::new(name, TestGroup::Large, routes, path)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn routes(&self) -> &'static [&'static str] {
        self.routes
    }

    pub fn path(&self) -> &'static str {
        self.path
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Large,
}

/// A route table shaped like a typical REST API.
pub static API_ROUTES: &[&str] = &[
    "/",
    "/login",
    "/logout",
    "/user/info",
    "/user/:id",
    "/user/:id/posts",
    "/user/:id/posts/:post",
    "/user/:id/followers",
    "/v1/ping",
    "/v1/repos/:owner/:repo",
    "/v1/repos/:owner/:repo/issues",
    "/v1/repos/:owner/:repo/issues/:number",
    "/v1/repos/:owner/:repo/pulls",
    "/v1/repos/:owner/:repo/contents/*path",
    "/assets/*filepath",
];
