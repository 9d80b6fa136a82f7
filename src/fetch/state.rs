use std::sync::Arc;

/// Snapshot of one keyed read, as a renderer sees it.
///
/// `Loading` keeps whatever data was on screen before a revalidation so the
/// renderer can keep showing it. A first read has `previous: None`.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    Idle,
    Loading { previous: Option<Arc<[T]>> },
    Ready { data: Arc<[T]> },
    Empty,
    Failed { reason: String },
}

impl<T> FetchState<T> {
    /// An empty result is `Empty`, never `Ready` with no items
    pub fn from_items(items: Vec<T>) -> Self {
        if items.is_empty() {
            FetchState::Empty
        } else {
            FetchState::Ready { data: items.into() }
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading { .. })
    }

    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            FetchState::Ready { .. } | FetchState::Empty | FetchState::Failed { .. }
        )
    }

    /// Data a renderer should display: the ready data, or the data kept
    /// through a revalidation.
    pub fn data(&self) -> Option<&[T]> {
        match self {
            FetchState::Ready { data } => Some(data),
            FetchState::Loading {
                previous: Some(previous),
            } => Some(previous),
            _ => None,
        }
    }

    pub(crate) fn displayed(&self) -> Option<Arc<[T]>> {
        match self {
            FetchState::Ready { data } => Some(Arc::clone(data)),
            FetchState::Loading { previous } => previous.clone(),
            _ => None,
        }
    }
}

/// What a producer resolves to. A listing yields a `Vec`, a detail read an
/// `Option` where `None` means not found.
pub trait FetchData<T> {
    fn into_items(self) -> Vec<T>;
}

impl<T> FetchData<T> for Vec<T> {
    fn into_items(self) -> Vec<T> {
        self
    }
}

impl<T> FetchData<T> for Option<T> {
    fn into_items(self) -> Vec<T> {
        self.into_iter().collect()
    }
}
