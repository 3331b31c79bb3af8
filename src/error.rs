use std::fmt;

use thiserror::Error;

// Fatal to a whole translation.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("xml parse error: {0}")]
    Xml(String),
    #[error("document has no root element")]
    MissingRoot,
    #[error("root element is <{0}>, expected <svg>")]
    UnexpectedRoot(String),
    #[error("translation aborted")]
    Aborted,
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl From<roxmltree::Error> for DocumentError {
    fn from(value: roxmltree::Error) -> Self {
        match value {
            roxmltree::Error::NoRootNode => DocumentError::MissingRoot,
            other => DocumentError::Xml(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    #[error("malformed number at byte {offset}")]
    InvalidNumber { offset: usize },
    #[error("command '{command}' is missing coordinates at byte {offset}")]
    MissingCoordinates { command: char, offset: usize },
    #[error("unknown path command '{command}' at byte {offset}")]
    UnknownCommand { command: char, offset: usize },
    #[error("path data must start with a moveto")]
    MissingMoveTo,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("unknown transform function '{0}'")]
    UnknownFunction(String),
    #[error("wrong arguments for transform function '{0}'")]
    InvalidArguments(String),
    #[error("malformed transform list")]
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImageError {
    #[error("image reference is not a data URI")]
    NotDataUri,
    #[error("data URI payload is not base64-encoded")]
    UnsupportedEncoding,
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),
    #[error("unsupported image media type '{0}'")]
    UnsupportedMediaType(String),
    #[error("image has no usable size")]
    InvalidSize,
    #[error("image decode failed: {0}")]
    Decode(String),
}

// Local to one element: the element is skipped and traversal continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ElementError {
    #[error("invalid path data: {0}")]
    InvalidPath(#[from] PathError),
    #[error("invalid transform: {0}")]
    InvalidTransform(#[from] TransformError),
    #[error("missing required attribute '{0}'")]
    MissingAttribute(&'static str),
    #[error("invalid value for attribute '{name}': {value:?}")]
    InvalidAttribute { name: &'static str, value: String },
    #[error("reference to unknown id '#{0}'")]
    UnresolvedReference(String),
    #[error("reference cycle through '#{0}'")]
    ReferenceCycle(String),
    #[error("reuse nesting deeper than {0} levels")]
    ReuseTooDeep(usize),
    #[error("embedded image: {0}")]
    Image(#[from] ImageError),
    #[error("gradient '#{0}' has no stops")]
    InvalidGradient(String),
    #[error("unsupported element <{0}>")]
    UnsupportedElement(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
        }
    }
}

// Recovered problems, returned next to the commands of one translation.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    Element {
        tag: String,
        id: Option<String>,
        error: ElementError,
    },
    DefinitionConflict {
        id: String,
        previous: String,
        replacement: String,
    },
    UnsupportedFeature {
        tag: String,
        feature: String,
    },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::Element { .. } | Diagnostic::DefinitionConflict { .. } => {
                Severity::Warning
            }
            Diagnostic::UnsupportedFeature { .. } => Severity::Info,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Diagnostic::Element { .. } => "element",
            Diagnostic::DefinitionConflict { .. } => "definition_conflict",
            Diagnostic::UnsupportedFeature { .. } => "unsupported_feature",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Element { tag, id, error } => match id {
                Some(id) => write!(f, "<{tag} id=\"{id}\">: {error}"),
                None => write!(f, "<{tag}>: {error}"),
            },
            Diagnostic::DefinitionConflict {
                id,
                previous,
                replacement,
            } => write!(
                f,
                "duplicate id '{id}': <{replacement}> replaces earlier <{previous}>"
            ),
            Diagnostic::UnsupportedFeature { tag, feature } => {
                write!(f, "<{tag}>: {feature} is not supported and was ignored")
            }
        }
    }
}
