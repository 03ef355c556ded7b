pub mod generic_dfg_builder;
