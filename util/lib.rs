/*!
This crate contains small utilities shared by the other footfall crates.
*/

#![allow(clippy::tabs_in_doc_comments)]

pub mod finite;
pub mod progress_counter;
