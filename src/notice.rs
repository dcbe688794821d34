use serde::Serialize;


#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Default,
    Destructive,
}

/// Short-lived message for the user, shown by the client as a toast.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub variant: Variant,
}

impl Notice {
    pub fn info<T: Into<String>, D: Into<String>>(title: T, description: D) -> Self {
        Notice {
            title: title.into(),
            description: description.into(),
            variant: Variant::Default,
        }
    }

    pub fn destructive<T: Into<String>, D: Into<String>>(title: T, description: D) -> Self {
        Notice {
            title: title.into(),
            description: description.into(),
            variant: Variant::Destructive,
        }
    }
}
