//! File formats for atlasmerge: NIfTI-1 label volumes and tab-separated
//! label tables, plus atomic commits of finished outputs.

pub mod commit;
pub mod label_table;
pub mod nifti_io;

pub use commit::{commit_all, PendingOutput};
pub use label_table::{atlas_stem, read_label_table, sidecar_table_path, write_label_table, write_label_table_to};
pub use nifti_io::{read_grid, read_nifti, write_label_nifti};
