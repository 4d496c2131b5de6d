//! cats main binary

use anyhow::Context as _;
use cats::{Disposition, cancel::CancelToken, cl, execute};
use clap::Parser as _;

#[tokio::main]
async fn main() -> anyhow::Result<Disposition> {
    // Parse CL args
    let cl_args = cl::CatsArgs::parse();

    // Init logger
    simple_logger::init_with_level(cl_args.run.log_level()).context("Failed to setup logger")?;

    // Cancel pending requests on Ctrl-C
    let cancel = CancelToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling");
            ctrl_c_cancel.cancel();
        }
    });

    // Run
    Ok(execute(&cl_args.run, &cl_args.api, &cancel).await)
}
