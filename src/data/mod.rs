// mod.rs - Data structures module

pub mod genome;
pub mod loaders;
pub mod snp;
pub mod window;

// Re-export main types for convenience
pub use genome::{Centromere, Centromeres, ChromosomeLengths};
pub use snp::{DiploidCall, OffspringSnp, ParentalSnp, Positioned, SnpCatalog};
pub use window::{
    GenotypedWindow, OffspringWindow, ParentalWindow, WindowBounds, WindowKey, WindowTable, Windowed,
};
