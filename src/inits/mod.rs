pub(crate) mod markovchain;
pub(crate) mod kmeanplusplus;
pub(crate) mod kmc2;
pub(crate) mod afkmc2;
pub(crate) mod afkmc2_memoized;
