use std::io;
use thiserror::Error;

/// Registration-time failures. A router that produced one of these must not be served.
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("catch-all segment must be the last segment of pattern '{pattern}'")]
    CatchAllNotLast { pattern: String },

    #[error("empty parameter name in pattern '{pattern}'")]
    EmptyParamName { pattern: String },

    #[error("parameter '{name}' appears more than once in pattern '{pattern}'")]
    DuplicateParamName { pattern: String, name: String },

    #[error("catch-all '{segment}' in pattern '{pattern}' conflicts with existing catch-all '{existing}'")]
    ConflictingCatchAll { pattern: String, segment: String, existing: String },
}

impl RouteError {
    pub fn catch_all_not_last<S: ToString>(pattern: S) -> Self {
        Self::CatchAllNotLast { pattern: pattern.to_string() }
    }

    pub fn empty_param_name<S: ToString>(pattern: S) -> Self {
        Self::EmptyParamName { pattern: pattern.to_string() }
    }

    pub fn duplicate_param_name<S: ToString, N: ToString>(pattern: S, name: N) -> Self {
        Self::DuplicateParamName { pattern: pattern.to_string(), name: name.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("no renderer configured")]
    MissingRenderer,

    #[error("template error: {source}")]
    Template {
        #[from]
        source: Box<handlebars::TemplateError>,
    },

    #[error("render error: {source}")]
    Render {
        #[from]
        source: Box<handlebars::RenderError>,
    },

    #[error("serialize template data error: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl From<handlebars::TemplateError> for RenderError {
    fn from(e: handlebars::TemplateError) -> Self {
        Self::Template { source: Box::new(e) }
    }
}

impl From<handlebars::RenderError> for RenderError {
    fn from(e: handlebars::RenderError) -> Self {
        Self::Render { source: Box::new(e) }
    }
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("engine must be set")]
    MissingEngine,

    #[error("address must be set")]
    MissingAddress,

    #[error("invalid address: {source}")]
    InvalidAddress { source: io::Error },
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("build server error: {source}")]
    Build {
        #[from]
        source: ServerBuildError,
    },

    #[error("bind {address:?} error: {source}")]
    Bind { address: Vec<std::net::SocketAddr>, source: io::Error },
}
