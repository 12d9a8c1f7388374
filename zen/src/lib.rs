pub mod bar;
pub mod config;
pub mod constant;
pub mod engine;
pub mod export;
pub mod fractal;
pub mod inclusion;
pub mod logging;
pub mod normalize;
pub mod receiver;
pub mod stroke;
pub mod utils;

pub use bar::{Bar, BarInput, FieldValue, Fractal, MalformedBar};
pub use config::ZenConfig;
pub use constant::{Const, ContainmentPolicy, DataError, FractalType, ProcessType};
pub use engine::{ZenOutput, ZenProcessor};
pub use export::{ExportPayload, FractalMarker, to_dataframe, write_parquet};
pub use fractal::{candidate_indices, detect_fractals};
pub use inclusion::{CarryBounds, InclusionMerger, MergeReport, merge_inclusive};
pub use logging::{init_logging, init_logging_with};
pub use normalize::normalize_direction;
pub use receiver::{load_bar_inputs, load_csv_bar_inputs, load_json_bar_inputs, relax_json_literals};
pub use stroke::{clear_unconfirmed, confirm_turning_points};
pub use utils::parse_timestamp;
