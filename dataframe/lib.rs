/*!
This crate holds the observations the footfall model is trained on. A [`Record`](struct.Record.html) is one observation of how many visitors a place had during one hour of a date bucket. The crate also provides the first stages of the training pipeline: loading records from the remote data source or a file, normalizing the visit rates into [0, 1], and splitting the records into train and test sets.
*/

#![allow(clippy::tabs_in_doc_comments)]

mod load;
mod normalize;
mod record;
mod split;

pub use self::load::*;
pub use self::normalize::*;
pub use self::record::*;
pub use self::split::*;
