#![warn(clippy::all)]
#![doc = include_str!("../README.md")]

// Modules that make up the Profiler View library.
mod analysis;
mod args;
mod backend;
mod chart_session;
mod error;
mod file_dialog;
mod layout;
mod models;
mod notifier;
mod plot;
mod presenter;
mod suggestions;
mod traits;
mod workflow;

// Publicly expose the contents of these modules.
pub use self::{
    analysis::*,
    args::Arguments,
    backend::*,
    chart_session::*,
    error::*,
    file_dialog::*,
    layout::*,
    models::*,
    notifier::*,
    plot::*,
    presenter::*,
    suggestions::*,
    traits::*,
    workflow::*,
};
