//! Source-specific normalizers producing the canonical schema
//!
//! The Google and Apple exports share nothing but the coercion primitives, so
//! each has its own module and [`StoreKind`] dispatches between them.

pub mod apple;
pub mod google;

use polars::prelude::DataFrame;

pub use apple::normalize_apple;
pub use google::normalize_google;

/// Which rows the Google identity filter removes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DropPolicy {
    /// Drop a row only when App and Category are both null
    #[default]
    BothMissing,
    /// Drop a row when either App or Category is null
    AnyMissing,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeOptions {
    pub drop_policy: DropPolicy,
}

/// The supported export sources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Google,
    Apple,
}

impl StoreKind {
    pub const ALL: [StoreKind; 2] = [StoreKind::Google, StoreKind::Apple];

    pub fn label(self) -> &'static str {
        match self {
            StoreKind::Google => "Google",
            StoreKind::Apple => "Apple",
        }
    }

    /// Raw export file expected in the data directory
    pub fn raw_file_name(self) -> &'static str {
        match self {
            StoreKind::Google => "google_playstore.csv",
            StoreKind::Apple => "apple_store.csv",
        }
    }

    /// Canonical artifact written to the output directory
    pub fn cleaned_file_name(self) -> &'static str {
        match self {
            StoreKind::Google => "cleaned_google.csv",
            StoreKind::Apple => "cleaned_apple.csv",
        }
    }

    /// Map a raw table of this source to the canonical schema
    pub fn normalize(
        self,
        raw: &DataFrame,
        options: &NormalizeOptions,
    ) -> crate::Result<DataFrame> {
        match self {
            StoreKind::Google => normalize_google(raw, options),
            StoreKind::Apple => normalize_apple(raw),
        }
    }
}
