//! Locating the labelled meal images on disk.
//!
//! Images live in one directory per class, named `<class>_meals`, under the
//! configured data root. [`prepare`] fills those directories from a manifest
//! of URLs; [`labels`] walks them and turns every image into an
//! [`ImageRecord`] whose label is the class's position in the class list.

pub mod labels;
pub mod prepare;

pub use labels::{assign_labels, is_supported_image, ImageRecord, IMAGE_EXTENSIONS};
pub use prepare::{prepare_data_set, DatasetManifest, PreparationSummary};
