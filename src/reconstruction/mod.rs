pub mod combinations;
pub mod enumerator;
pub mod filters;
pub mod partition_table;
pub mod pipeline;
pub mod statistics;
pub mod subgroup;
pub mod traits;

pub use enumerator::enumerate;
pub use filters::{filter_by_median, filter_by_range};
pub use subgroup::assign_subgroup;
