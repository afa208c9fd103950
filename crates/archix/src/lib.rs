#![forbid(unsafe_code)]

//! Architecture diagrams as code.
//!
//! `archix` re-exports the topology model from `archix-core` and adds the parts that touch
//! the outside world: the variant driver ([`generate`]), Graphviz invocation
//! ([`GraphvizCommand`]) and declarative topology documents ([`Document`]).
//!
//! ```no_run
//! use archix::{Architecture, GenerateOptions, GraphvizCommand, Processor, Provider, details};
//!
//! struct Shop {
//!     api: archix::InstanceId,
//!     db: archix::InstanceId,
//!     link: archix::LinkId,
//! }
//!
//! let model = |arch: &mut Architecture| {
//!     let api = arch.instance("api").id();
//!     let db = arch.instance("db").id();
//!     let link = arch.to(api, db).id();
//!     Shop { api, db, link }
//! };
//! let providers = [Provider::new(|arch, shop: &Shop| arch.system("shop").is([shop.link]))];
//! let processors = [Processor::new("tech", |arch, shop: &Shop| {
//!     details(arch, "tech", [(vec![shop.api], "<BR/>rust"), (vec![shop.db], "<BR/>postgres")]);
//! })];
//!
//! let report = archix::generate(
//!     model,
//!     &providers,
//!     &processors,
//!     &GenerateOptions::default(),
//!     &GraphvizCommand::new(),
//! );
//! assert!(report.is_success());
//! ```

mod details;
pub mod document;
mod error;
pub mod generate;
pub mod graphviz;
mod grid;

pub use archix_core::*;

pub use details::details;
pub use document::{Document, DocumentFormat, DocumentHandles};
pub use error::{Error, Result};
pub use generate::{GenerateOptions, GenerateReport, Processor, Provider, generate};
pub use graphviz::{DotRenderer, GraphvizCommand, ImageFormat};
