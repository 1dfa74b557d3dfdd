use foundation::TimeError;

use crate::widgets::WidgetKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    Time(TimeError),
    InvalidLocation(String),
    UnknownWidget(String),
    Widget { kind: WidgetKind, message: String },
}

impl std::fmt::Display for SceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneError::Time(e) => write!(f, "lighting date: {e}"),
            SceneError::InvalidLocation(msg) => write!(f, "invalid location: {msg}"),
            SceneError::UnknownWidget(id) => write!(f, "unknown widget {id:?}"),
            SceneError::Widget { kind, message } => {
                write!(f, "{} widget failed: {message}", kind.id())
            }
        }
    }
}

impl std::error::Error for SceneError {}

impl From<TimeError> for SceneError {
    fn from(e: TimeError) -> Self {
        SceneError::Time(e)
    }
}
