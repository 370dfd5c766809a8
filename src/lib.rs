// Library exports for mumrescue
pub mod chrom_registry;
pub mod collapse;
pub mod density;
pub mod emit;
pub mod error;
pub mod locus;
pub mod pipeline;
pub mod reader;
pub mod record;
pub mod rescue;
pub mod signature;
pub mod window;
