//! Trialscope Enrich - normalization, classification and table output
//!
//! Turns flat registry records into enriched trial rows plus one long table
//! per list-valued column, and reads/writes the CSV hand-off artifact and the
//! reference pipeline dataset.
//!
//! # Example
//!
//! ```ignore
//! use trialscope_enrich::{build_long_tables, enrich_records, read_flat_csv_path};
//!
//! let records = read_flat_csv_path("trials.csv".as_ref())?;
//! let enriched = enrich_records(records);
//! let tables = build_long_tables(&enriched);
//! println!("{} country rows", tables.countries.len());
//! ```

pub mod artifact;
pub mod classify;
pub mod enrich;
pub mod explode;
pub mod listcodec;
pub mod normalize;
pub mod output;
pub mod reference;
pub mod schema;
pub mod taxonomy;
pub mod transform;

// Re-exports
pub use artifact::{read_flat_csv, read_flat_csv_path, write_flat_csv, write_flat_csv_path};
pub use classify::{AreaClassifier, SponsorClassifier};
pub use enrich::{EnrichedTrialRecord, Enricher, area_counts, enrich_records};
pub use explode::{ListColumn, LongTableRow, LongTables, build_long_tables, explode};
pub use listcodec::{ListCodecError, decode_list, encode_list};
pub use normalize::{SponsorCanonicalizer, norm_text, parse_date};
pub use output::{TableStats, write_long_tables, write_reference, write_trials};
pub use reference::{PhaseStd, ReferenceRecord, load_reference, read_reference, standardize_phase};
pub use taxonomy::{AreaRule, Taxonomy, TaxonomyError};
