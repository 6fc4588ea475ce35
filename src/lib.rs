pub mod catalog;
pub mod config;
pub mod debug;
pub mod detection;
pub mod layout;
pub mod models;

pub use catalog::{CardCatalog, CardMatch, CardRecord, ScryfallCatalog, canonicalize};
pub use config::{RegionConfig, ScanConfig};
pub use debug::{DebugSink, DirectorySink, NoopSink};
pub use detection::{CardScanner, Region};
pub use models::{BoundingBox, CardReading, RawContour, RotatedRect};
