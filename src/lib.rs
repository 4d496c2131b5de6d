//! Internal API exposed for `cats` binary

use std::{
    io::{self, Write},
    process::{ExitCode, Termination},
};

use crate::{
    cancel::CancelToken,
    catalog::{BreedRecord, ValidationError},
    cl::{ApiOptions, RunConfig},
    delivery::{DeliveryError, Sink},
    http::{ApiHttpClient, FetchError},
    search::{CatRecord, ResolveError},
};

pub mod cancel;
pub mod catalog;
pub mod cl;
pub mod delivery;
pub mod http;
pub mod search;

/// Successful end of a pipeline run
#[derive(Debug)]
pub enum Outcome {
    /// Breed catalog was requested and fetched
    BreedsListed(Vec<BreedRecord>),
    /// Image was written to sink
    Delivered {
        /// Where the image went
        sink: Sink,
        /// Image size in bytes
        size: u64,
    },
}

/// Failure of any pipeline stage
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// Breed filter was rejected
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Search request failed
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// No image in search results
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// Image download failed
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl PipelineError {
    /// How the process should terminate for this error
    #[must_use]
    pub fn disposition(&self) -> Disposition {
        match self {
            PipelineError::Validation(
                ValidationError::Empty | ValidationError::UnknownBreed { .. },
            ) => Disposition::InvalidInput,
            PipelineError::Validation(ValidationError::CatalogUnavailable(_))
            | PipelineError::Fetch(_)
            | PipelineError::Resolve(_)
            | PipelineError::Delivery(_) => Disposition::RuntimeError,
        }
    }
}

/// Terminal state of the process
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Disposition {
    /// Everything went fine
    Success,
    /// User input was rejected
    InvalidInput,
    /// Something failed at runtime
    RuntimeError,
}

impl Disposition {
    /// Process exit code
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Disposition::Success => 0,
            Disposition::RuntimeError => 1,
            Disposition::InvalidInput => 2,
        }
    }
}

impl Termination for Disposition {
    fn report(self) -> ExitCode {
        ExitCode::from(self.code())
    }
}

/// Run the pipeline: validate breed filter, search, resolve image URL, and deliver image
///
/// If the breed catalog is requested, only fetch it.
pub async fn run(
    config: &RunConfig,
    http: &ApiHttpClient,
    cancel: &CancelToken,
) -> Result<Outcome, PipelineError> {
    if config.show_breed_help {
        let breeds = catalog::list_breeds(http, cancel).await?;
        return Ok(Outcome::BreedsListed(breeds));
    }

    // An empty filter means no filter
    let breed_filter = config.breed_filter.as_deref().filter(|b| !b.is_empty());
    if let Some(breed) = breed_filter {
        catalog::validate_breed(http, breed, cancel).await?;
    }

    let cats = search::search_cats(http, breed_filter, cancel).await?;
    if let Some(breed) = breed_filter {
        check_breed_consistency(&cats, breed);
    }
    let image_url = search::resolve_image_url(&cats)?;

    let sink = config.sink();
    let size = delivery::deliver_image(http, image_url, &sink, cancel).await?;
    Ok(Outcome::Delivered { sink, size })
}

/// Warn if first search result is not of the requested breed
fn check_breed_consistency(cats: &[CatRecord], breed: &str) {
    if let Some(cat) = cats.first()
        && !cat.breeds.iter().any(|b| b.id == breed)
    {
        log::warn!(
            "Cat {} is not listed as breed {breed:?}, got {:?}",
            cat.id,
            cat.breeds.iter().map(|b| &b.id).collect::<Vec<_>>()
        );
    }
}

/// Run the pipeline, report the result to the user, and return how the process should terminate
pub async fn execute(config: &RunConfig, api: &ApiOptions, cancel: &CancelToken) -> Disposition {
    let http = match ApiHttpClient::new(api) {
        Ok(http) => http,
        Err(err) => {
            log::error!("{err:#}");
            return Disposition::RuntimeError;
        }
    };

    let result = run(config, &http, cancel).await;
    if let Err(err) = report(&result, &mut io::stdout(), &mut io::stderr()) {
        log::error!("Failed to write report: {err}");
        return Disposition::RuntimeError;
    }
    match result {
        Ok(_) => Disposition::Success,
        Err(err) => err.disposition(),
    }
}

/// Render run result for the user
fn report<O, E>(
    result: &Result<Outcome, PipelineError>,
    out: &mut O,
    err_out: &mut E,
) -> io::Result<()>
where
    O: Write,
    E: Write,
{
    match result {
        Ok(Outcome::BreedsListed(breeds)) => {
            write!(
                out,
                "{} available cat breeds:\n\n{}",
                breeds.len(),
                catalog::render(breeds)
            )?;
            out.flush()
        }
        Ok(Outcome::Delivered { .. }) => Ok(()),
        Err(PipelineError::Validation(ValidationError::UnknownBreed {
            candidate,
            catalog: breeds,
        })) => {
            write!(
                err_out,
                "'{candidate}' is an invalid breed id. Try one of these:\n\n{}",
                catalog::render(breeds)
            )?;
            err_out.flush()
        }
        Err(err) => {
            let prefix = match err.disposition() {
                Disposition::InvalidInput => "Invalid input",
                Disposition::Success | Disposition::RuntimeError => "Runtime error",
            };
            writeln!(err_out, "{prefix}: {}", cause_chain(err))?;
            err_out.flush()
        }
    }
}

/// Render error with all its causes, skipping causes already part of the parent message
fn cause_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_msg = cause.to_string();
        if !msg.contains(&cause_msg) {
            msg.push_str(": ");
            msg.push_str(&cause_msg);
        }
        source = cause.source();
    }
    msg
}
