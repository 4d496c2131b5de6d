//! Breed catalog and breed filter validation

use std::fmt;

use itertools::Itertools as _;

use crate::{
    cancel::CancelToken,
    http::{ApiHttpClient, FetchError},
};

/// Breeds endpoint, relative to the API base URL
const BREEDS_ENDPOINT: &str = "breeds";

/// A cat breed, as listed by the API
#[derive(Debug, Clone, Eq, PartialEq, serde::Deserialize)]
pub struct BreedRecord {
    /// Short breed identifier, used for filtering
    pub id: String,
    /// Human readable breed name
    pub name: String,
}

impl fmt::Display for BreedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Breed filter validation error
#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    /// No breed id was given
    #[error("Please provide a breed id")]
    Empty,
    /// Breed id is not in the catalog
    #[error("{candidate:?} is an invalid breed id")]
    UnknownBreed {
        /// Rejected breed id
        candidate: String,
        /// Full catalog, to help the user pick a valid id
        catalog: Vec<BreedRecord>,
    },
    /// Catalog could not be fetched
    #[error("Failed to get breed catalog: {0}")]
    CatalogUnavailable(#[from] FetchError),
}

/// Fetch the full breed catalog
pub async fn list_breeds(
    http: &ApiHttpClient,
    cancel: &CancelToken,
) -> Result<Vec<BreedRecord>, FetchError> {
    log::debug!("Getting breeds from The Cat API...");
    let breeds: Vec<BreedRecord> = http.get_json(http.endpoint(BREEDS_ENDPOINT), cancel).await?;
    log::debug!("Got {} breeds", breeds.len());
    Ok(breeds)
}

/// Check a breed id against the catalog
///
/// An empty id is rejected without fetching the catalog.
pub async fn validate_breed(
    http: &ApiHttpClient,
    candidate: &str,
    cancel: &CancelToken,
) -> Result<(), ValidationError> {
    if candidate.is_empty() {
        return Err(ValidationError::Empty);
    }
    let catalog = list_breeds(http, cancel).await?;
    check_membership(candidate, catalog)
}

/// Membership test of a breed id among catalog ids
fn check_membership(candidate: &str, catalog: Vec<BreedRecord>) -> Result<(), ValidationError> {
    if catalog.iter().any(|b| b.id == candidate) {
        log::debug!("Breed id {candidate:?} is valid");
        Ok(())
    } else {
        Err(ValidationError::UnknownBreed {
            candidate: candidate.to_owned(),
            catalog,
        })
    }
}

/// Render catalog as a single line of `Name (id)` entries
#[must_use]
pub fn render(breeds: &[BreedRecord]) -> String {
    format!("{}\n", breeds.iter().join(", "))
}
