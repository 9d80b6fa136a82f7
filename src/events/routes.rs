use std::fmt::Display;

pub const EVENTS_KEY: &str = "events";

/// Views the catalog moves between. Resolving a path to a view is left to
/// whatever router hosts the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Listing,
    EventDetail(String),
    AddEvent,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Listing => "/".to_string(),
            Route::EventDetail(id) => format!("/wydarzenia/{}", id),
            Route::AddEvent => "/wydarzenia/dodaj".to_string(),
        }
    }

    /// Cache key of the data a view reads, if it reads any
    pub fn resource_key(&self) -> Option<String> {
        match self {
            Route::Listing => Some(EVENTS_KEY.to_string()),
            Route::EventDetail(id) => Some(event_key(id)),
            Route::AddEvent => None,
        }
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

pub fn event_key(id: &str) -> String {
    format!("{}/{}", EVENTS_KEY, id)
}
