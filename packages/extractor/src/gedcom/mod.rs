//! GEDCOM 5.5.1 export.
//!
//! Split into:
//! - `text`: date values, escaping and `CONC` splitting
//! - `writer`: record layout (`HEAD`, `INDI`, `FAM`, `TRLR`)

mod text;
mod writer;

pub use text::{escape_value, format_date, split_for_conc};
pub use writer::generate_gedcom;
