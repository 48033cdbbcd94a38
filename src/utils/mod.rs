#[cfg(test)]
mod macros;
mod models;

#[cfg(test)]
pub(crate) use self::macros::each_tile;
pub(crate) use self::models::alloc;
pub(crate) use self::models::sync;
