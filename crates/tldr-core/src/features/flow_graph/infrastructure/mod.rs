pub mod generic_cfg_builder;
