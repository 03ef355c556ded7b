pub mod generic_extractor;
