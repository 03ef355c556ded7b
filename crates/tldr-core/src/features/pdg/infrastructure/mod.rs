pub mod generic_pdg_builder;
