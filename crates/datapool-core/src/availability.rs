//! Typed absence of optional catalog structure, in place of printed warnings.

use std::fmt;

/// Why an optional piece of catalog structure is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    NoSubdatasets,
    NoResolutions,
}

impl Notice {
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Notice::NoSubdatasets => "No subdatasets defined for this dataset.",
            Notice::NoResolutions => "No resolutions defined for this dataset.",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of a query for optional structure: the value, or a notice saying
/// the dataset does not define it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability<T> {
    Available(T),
    Undefined(Notice),
}

impl<T> Availability<T> {
    /// Log the notice at WARN when undefined, then return `self`.
    pub(crate) fn warn_if_undefined(self) -> Self {
        if let Availability::Undefined(notice) = &self {
            log::warn!("{notice}");
        }
        self
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available(_))
    }

    #[must_use]
    pub fn available(&self) -> Option<&T> {
        match self {
            Availability::Available(value) => Some(value),
            Availability::Undefined(_) => None,
        }
    }

    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Availability::Available(value) => Some(value),
            Availability::Undefined(_) => None,
        }
    }

    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Availability::Available(_) => None,
            Availability::Undefined(notice) => Some(*notice),
        }
    }
}
