pub mod allowance_mapper;
