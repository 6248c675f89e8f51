pub mod abi;
pub mod emit_context;
pub mod emit_vector_arrangement;
pub mod emit_vector_basic;
pub mod emit_vector_compare;
pub mod emit_vector_helpers;
pub mod emit_vector_misc;
pub mod emit_vector_multiply;
pub mod emit_vector_paired;
pub mod emit_vector_saturated;
pub mod emit_vector_shift;
pub mod emit_vector_table;
pub mod hostcaps;
pub mod hostloc;
pub mod reg_alloc;
pub mod stack_layout;
pub mod strategy;
pub mod vm_state;
