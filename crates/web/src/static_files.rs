use crate::context::Context;
use crate::handler::Handler;
use http::StatusCode;
use std::path::{Component, Path, PathBuf};
use tracing::warn;

/// Serves files below a root directory from a catch-all route.
///
/// The captured remainder of the path is resolved against `root`; anything that would
/// leave `root` (`..`, absolute paths) is answered with a 404.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    /// Name of the catch-all parameter the handler reads the file path from.
    pub const PARAM: &'static str = "filepath";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn locate(&self, relative: &str) -> Option<PathBuf> {
        let relative = Path::new(relative);
        relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
            .then(|| self.root.join(relative))
    }
}

impl Handler for StaticFiles {
    fn handle(&self, ctx: &mut Context) {
        match self.locate(ctx.param(Self::PARAM)) {
            Some(path) => ctx.file(path),
            None => {
                warn!(path = %ctx.path(), "rejected static file path");
                let message = format!("404 NOT FOUND: {}\n", ctx.path());
                ctx.string(StatusCode::NOT_FOUND, message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StaticFiles;
    use std::path::PathBuf;

    #[test]
    fn test_locate() {
        let files = StaticFiles::new("/srv/static");
        assert_eq!(files.locate("css/a.css"), Some(PathBuf::from("/srv/static/css/a.css")));
        assert_eq!(files.locate("../etc/passwd"), None);
        assert_eq!(files.locate("css/../../x"), None);
        assert_eq!(files.locate("/etc/passwd"), None);
    }
}
