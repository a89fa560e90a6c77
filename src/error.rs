/// Error raised by a persistence sink call. The importer treats any sink
/// failure as fatal and stops feeding the sink immediately.
#[derive(Debug)]
pub struct SinkError {
    message: String,
}

impl SinkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "persistence sink error: {}", self.message)
    }
}

impl std::error::Error for SinkError {}

#[derive(Debug)]
pub enum ImportError {
    XmlParse(quick_xml::Error),
    /// Document structure violates the nesting the importer requires.
    Structure {
        element: &'static str,
        reason: &'static str,
    },
    /// An extended-data scalar failed to parse. Fatal: once a sample is
    /// lost mid-stream, index alignment with the points can no longer be
    /// trusted.
    NumericFormat {
        element: &'static str,
        value: String,
    },
    Sink(SinkError),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::XmlParse(e) => write!(f, "XML parse error: {e}"),
            Self::Structure { element, reason } => {
                write!(f, "Unexpected <{element}>: {reason}")
            }
            Self::NumericFormat { element, value } => {
                write!(f, "Unable to parse <{element}> value '{value}'")
            }
            Self::Sink(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::XmlParse(e) => Some(e),
            Self::Sink(e) => Some(e),
            _ => None,
        }
    }
}

impl From<quick_xml::Error> for ImportError {
    fn from(e: quick_xml::Error) -> Self {
        Self::XmlParse(e)
    }
}

impl From<SinkError> for ImportError {
    fn from(e: SinkError) -> Self {
        Self::Sink(e)
    }
}
