pub mod payments;
pub mod uploader;
