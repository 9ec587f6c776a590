use foundation::LayerKey;
use tracing::info;

/// User-visible, non-fatal conditions raised by the layer manager.
///
/// Nothing here aborts anything; the manager stays usable after every one
/// of these. The UI drains the log and presents the messages.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    NoDataForSelection,
    AnimationNeedsTwoYears { selected: usize },
    ResolutionFailed { message: String },
    GeometryUnavailable { key: LayerKey },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::NoDataForSelection => write!(f, "no data for this selection"),
            Notice::AnimationNeedsTwoYears { selected } => {
                write!(f, "select at least two years to animate ({selected} selected)")
            }
            Notice::ResolutionFailed { message } => {
                write!(f, "could not resolve selection: {message}")
            }
            Notice::GeometryUnavailable { key } => {
                write!(f, "no geometry available for {key}")
            }
        }
    }
}

/// Append-only log of notices, drained by the UI.
#[derive(Debug, Default)]
pub struct NoticeLog {
    notices: Vec<Notice>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notice: Notice) {
        info!(%notice, "user-visible condition");
        self.notices.push(notice);
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
