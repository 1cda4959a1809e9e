pub mod casting;
pub mod ceil_div;
pub mod full_math;
pub mod safe_math;
pub mod wad;
