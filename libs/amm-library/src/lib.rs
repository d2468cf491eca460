#![no_std]

pub mod full_math;
pub mod path;
pub mod swap_math;
