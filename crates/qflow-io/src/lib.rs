//! # qflow-io: File formats for networks, demands, and solution reports
//!
//! - [`gml`] reads and writes directed GML graphs whose nodes carry a `type`
//!   attribute (`generator`, `repeater`, `client`) and whose edges carry an
//!   integral `capacity`. Files written by networkx's `write_gml` load as-is.
//! - [`demands`] reads and writes ordered demand lists as JSON or CSV.
//! - [`report`] renders the flat `name: value` solution report.

pub mod demands;
pub mod gml;
pub mod report;

pub use demands::{read_demands, write_demands, DemandFileError, DemandFormat};
pub use gml::{parse_gml, read_gml, to_gml_string, write_gml, GmlError};
pub use report::{render_report, write_report};
